//! Operational queue: one row per flagged comment.

use crate::aggregate::{aggregate_flags_by_comment, CommentAggregate, LastWrite};
use crate::article_titles::ArticleTitles;
use crate::flag::{FlagRow, FlagType, QueueStatus, ReactionCounts, Severity, TriggerSource};
use crate::query::QueueQuery;
use crate::text::{summarize_comment_text, QUEUE_EXCERPT_LENGTH};
use crate::time_window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Id of the primary flag.
    pub id: String,
    pub comment_id: String,
    pub article_slug: String,
    pub article_title: String,
    pub comment_excerpt: String,
    pub flag_type: FlagType,
    pub trigger_source: TriggerSource,
    pub status: QueueStatus,
    /// Unique reporters.
    pub report_count: usize,
    pub flagged_at: DateTime<Utc>,
    pub last_action_at: DateTime<Utc>,
    pub reporter_names: Vec<String>,
    pub auto_hidden: bool,
    pub moderation_status: String,
    pub severity: Severity,
    pub hidden_reason: Option<String>,
    pub like_count: u32,
    pub dislike_count: u32,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub last_touched_by: Option<String>,
    pub comment_username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMeta {
    /// Matching items before pagination.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub window: TimeWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuePage {
    pub items: Vec<QueueItem>,
    pub meta: QueueMeta,
}

impl QueueItem {
    /// Project an aggregate into a queue row. Comments missing from the join
    /// have nothing to show and are skipped.
    fn from_aggregate(
        group: &CommentAggregate<'_>,
        reactions: &HashMap<String, ReactionCounts>,
        titles: &ArticleTitles,
    ) -> Option<Self> {
        let comment = group.comment?;
        let primary = group.primary;
        let counts = reactions.get(group.comment_id).copied().unwrap_or_default();

        Some(QueueItem {
            id: primary.id.clone(),
            comment_id: group.comment_id.to_string(),
            article_slug: comment.article_slug.clone(),
            article_title: titles.title(Some(&comment.article_slug)),
            comment_excerpt: summarize_comment_text(
                comment.comment_text.as_deref(),
                QUEUE_EXCERPT_LENGTH,
            ),
            flag_type: primary.flag_type.clone(),
            trigger_source: primary.trigger_source,
            status: group.queue_status(),
            report_count: group.manual_report_count(),
            flagged_at: group.flagged_at,
            last_action_at: group.last_action_at,
            reporter_names: group.reporter_names.iter().map(|n| n.to_string()).collect(),
            auto_hidden: comment.hidden(),
            moderation_status: comment.status().as_str().to_string(),
            severity: group.severity(),
            hidden_reason: comment.hidden_reason.clone(),
            like_count: counts.like_count,
            dislike_count: counts.dislike_count,
            assigned_to: written(group.assigned_to),
            notes: written(group.notes),
            last_touched_by: written(group.last_touched_by),
            comment_username: comment.username.clone(),
        })
    }

    fn matches(&self, query: &QueueQuery, window_start: DateTime<Utc>) -> bool {
        if self.flagged_at < window_start {
            return false;
        }
        if query.status.is_some_and(|status| self.status != status) {
            return false;
        }
        if query.flag_type.as_ref().is_some_and(|t| self.flag_type != *t) {
            return false;
        }
        if query
            .trigger_source
            .is_some_and(|source| self.trigger_source != source)
        {
            return false;
        }
        let resolved_requested =
            query.include_resolved || query.status == Some(QueueStatus::Resolved);
        if !resolved_requested && self.status == QueueStatus::Resolved {
            return false;
        }
        if query
            .article_slug
            .as_deref()
            .is_some_and(|slug| self.article_slug != slug)
        {
            return false;
        }
        true
    }
}

fn written(slot: Option<LastWrite<'_>>) -> Option<String> {
    slot.map(|w| w.value.to_string())
}

/// Build one page of the moderation queue.
///
/// Filters run after aggregation so a comment's classification always sees
/// all of its flags. Items are ordered by `flagged_at`, newest first.
pub fn build_queue(
    rows: &[FlagRow],
    reactions: &HashMap<String, ReactionCounts>,
    titles: &ArticleTitles,
    query: &QueueQuery,
    now: DateTime<Utc>,
) -> QueuePage {
    let window = query.window_or_default();
    let window_start = window.start(now);

    let mut items: Vec<QueueItem> = aggregate_flags_by_comment(rows)
        .iter()
        .filter_map(|group| QueueItem::from_aggregate(group, reactions, titles))
        .filter(|item| item.matches(query, window_start))
        .collect();
    items.sort_by(|a, b| b.flagged_at.cmp(&a.flagged_at));

    let total = items.len();
    let items = items
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    QueuePage {
        items,
        meta: QueueMeta {
            total,
            limit: query.limit,
            offset: query.offset,
            window,
        },
    }
}
