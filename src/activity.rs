//! Activity feed: one event per flag creation and one per resolution.

use crate::aggregate::aggregate_flags_by_comment;
use crate::article_titles::ArticleTitles;
use crate::flag::{CommentSnapshot, Flag, FlagRow, FlagType, TriggerSource};
use crate::query::ActivityQuery;
use crate::text::{flag_type_label, summarize_comment_text, ACTIVITY_EXCERPT_LENGTH};
use crate::time_window::TimeWindow;
use crate::trigger_details::{resolved_by, TriggerDetails};
use chrono::{DateTime, Utc};
use serde::Serialize;

const DEFAULT_RESOLVER: &str = "Moderator team";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Auto,
    Manual,
    Escalation,
    Resolution,
}

impl ActivityCategory {
    fn for_creation(flag: &Flag) -> Self {
        match flag.flag_type {
            FlagType::ManualHide => ActivityCategory::Escalation,
            FlagType::ManualReport => ActivityCategory::Manual,
            ref t if t.is_automatic() => ActivityCategory::Auto,
            _ if flag.trigger_source == TriggerSource::Moderator => ActivityCategory::Escalation,
            _ => ActivityCategory::Manual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub detail: String,
    pub category: ActivityCategory,
    pub flag_type: FlagType,
    pub flag_label: String,
    pub comment_id: String,
    pub article_slug: String,
    pub article_title: String,
    pub comment_excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMeta {
    /// Events inside the window before truncation.
    pub total: usize,
    pub limit: usize,
    pub window: Option<TimeWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityFeed {
    pub items: Vec<ActivityItem>,
    pub meta: ActivityMeta,
}

fn creation_summary(flag_type: &FlagType) -> &'static str {
    match flag_type {
        FlagType::ManualReport => "New manual report logged",
        FlagType::ManualHide => "Comment manually hidden by moderator",
        FlagType::AutoBannedPhrase => "Banned phrase detected",
        FlagType::AutoLinkSpam => "Link spam auto-hidden",
        FlagType::AutoDislikeThreshold => "Dislike threshold reached",
        FlagType::Unknown(_) => "Comment flagged",
    }
}

fn creation_detail(flag: &Flag, label: &str, title: &str) -> String {
    let base = format!("{label} on “{title}”.");

    let suffix = match TriggerDetails::of(flag) {
        TriggerDetails::ManualReport {
            reporter_username, ..
        } => Some(match reporter_username {
            Some(reporter) => format!("Reported by {reporter}."),
            None => "Report submitted by subscriber.".to_string(),
        }),
        TriggerDetails::ManualHide { reason, .. } => Some(match reason {
            Some(reason) => format!("Reason: {reason}."),
            None => "Hidden pending moderator review.".to_string(),
        }),
        TriggerDetails::BannedPhrase { phrase } => {
            phrase.map(|phrase| format!("Phrase matched: “{phrase}”."))
        }
        TriggerDetails::LinkSpam { link_count } => {
            link_count.map(|count| format!("Detected {count} links."))
        }
        TriggerDetails::DislikeThreshold {
            like_count: Some(likes),
            dislike_count: Some(dislikes),
        } => Some(format!("{dislikes} dislikes vs {likes} likes.")),
        _ => None,
    };

    match suffix {
        Some(suffix) => format!("{base} {suffix}"),
        None => base,
    }
}

fn resolution_summary(flag_type: &FlagType) -> &'static str {
    match flag_type {
        FlagType::ManualHide => "Moderator resolution recorded",
        _ => "Flag resolved",
    }
}

fn resolution_detail(flag: &Flag, label: &str, title: &str) -> String {
    let actor = resolved_by(&flag.trigger_details).unwrap_or_else(|| DEFAULT_RESOLVER.to_string());
    let detail = format!("{label} on “{title}” resolved by {actor}.");
    match flag.flag_type {
        FlagType::ManualHide => format!("{detail} Comment restored."),
        _ => detail,
    }
}

/// Comment fields carried by both events of one flag row.
struct EventContext<'a> {
    comment: &'a CommentSnapshot,
    title: String,
    excerpt: String,
}

impl EventContext<'_> {
    fn event(
        &self,
        flag: &Flag,
        id_suffix: &str,
        timestamp: DateTime<Utc>,
        summary: &str,
        detail: String,
        category: ActivityCategory,
    ) -> ActivityItem {
        ActivityItem {
            id: format!("{}-{id_suffix}", flag.id),
            timestamp,
            summary: summary.to_string(),
            detail,
            category,
            flag_type: flag.flag_type.clone(),
            flag_label: flag_type_label(&flag.flag_type).to_string(),
            comment_id: flag.comment_id.clone(),
            article_slug: self.comment.article_slug.clone(),
            article_title: self.title.clone(),
            comment_excerpt: self.excerpt.clone(),
        }
    }
}

/// Build the activity feed. Each event is windowed on its own timestamp, so
/// an old flag resolved recently still shows its resolution.
pub fn build_activity(
    rows: &[FlagRow],
    titles: &ArticleTitles,
    query: &ActivityQuery,
    now: DateTime<Utc>,
) -> ActivityFeed {
    let window_start = query.window.map(|window| window.start(now));
    let in_window = |at: DateTime<Utc>| window_start.map_or(true, |start| at >= start);

    let mut events = Vec::new();
    for group in aggregate_flags_by_comment(rows) {
        // rows whose own comment join is missing produce no events
        for (flag, comment) in group
            .rows
            .iter()
            .filter_map(|row| row.comment.as_ref().map(|comment| (&row.flag, comment)))
        {
            let created = in_window(flag.created_at);
            let resolved_at = flag.resolved_at.filter(|at| in_window(*at));
            if !created && resolved_at.is_none() {
                continue;
            }

            let context = EventContext {
                comment,
                title: titles.title(Some(&comment.article_slug)),
                excerpt: summarize_comment_text(
                    comment.comment_text.as_deref(),
                    ACTIVITY_EXCERPT_LENGTH,
                ),
            };
            let label = flag_type_label(&flag.flag_type);

            if created {
                events.push(context.event(
                    flag,
                    "created",
                    flag.created_at,
                    creation_summary(&flag.flag_type),
                    creation_detail(flag, label, &context.title),
                    ActivityCategory::for_creation(flag),
                ));
            }

            if let Some(resolved_at) = resolved_at {
                events.push(context.event(
                    flag,
                    "resolved",
                    resolved_at,
                    resolution_summary(&flag.flag_type),
                    resolution_detail(flag, label, &context.title),
                    ActivityCategory::Resolution,
                ));
            }
        }
    }

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let total = events.len();
    events.truncate(query.limit);

    ActivityFeed {
        items: events,
        meta: ActivityMeta {
            total,
            limit: query.limit,
            window: query.window,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::flag::ModerationStatus;
    use serde_json::json;
    use std::collections::HashMap;

    fn titles() -> ArticleTitles {
        let mut map = HashMap::new();
        map.insert(
            "dharma-modern-work".to_string(),
            "Dharma and Modern Work".to_string(),
        );
        ArticleTitles::from_map(map)
    }

    fn all_history(limit: usize) -> ActivityQuery {
        ActivityQuery {
            limit,
            window: None,
        }
    }

    #[test]
    fn test_resolved_flag_yields_two_events() {
        let a = comment("a", false, ModerationStatus::Visible);
        let mut hide = row("h1", &a, FlagType::ManualHide, ts(2, 0));
        hide.flag.trigger_details = json!({"reason": "abusive", "resolvedBy": "mod-ada"});
        let rows = vec![resolved(hide, ts(3, 0))];

        let feed = build_activity(&rows, &titles(), &all_history(20), ts(10, 0));
        assert_eq!(feed.meta.total, 2);

        let resolution = &feed.items[0];
        assert_eq!(resolution.id, "h1-resolved");
        assert_eq!(resolution.category, ActivityCategory::Resolution);
        assert_eq!(resolution.summary, "Moderator resolution recorded");
        assert_eq!(
            resolution.detail,
            "Manual hides on “Dharma and Modern Work” resolved by mod-ada. Comment restored."
        );

        let creation = &feed.items[1];
        assert_eq!(creation.id, "h1-created");
        assert_eq!(creation.category, ActivityCategory::Escalation);
        assert_eq!(creation.summary, "Comment manually hidden by moderator");
        assert_eq!(
            creation.detail,
            "Manual hides on “Dharma and Modern Work”. Reason: abusive."
        );
    }

    #[test]
    fn test_window_applies_per_event() {
        let a = comment("a", false, ModerationStatus::Visible);
        let rows = vec![resolved(
            row("s1", &a, FlagType::AutoLinkSpam, ts(1, 0)),
            ts(9, 0),
        )];
        let query = ActivityQuery {
            limit: 20,
            window: Some(TimeWindow::Last7Days),
        };

        let feed = build_activity(&rows, &titles(), &query, ts(10, 0));
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].id, "s1-resolved");
        assert_eq!(
            feed.items[0].detail,
            "Link spam on “Dharma and Modern Work” resolved by Moderator team."
        );
        assert_eq!(feed.meta.window, Some(TimeWindow::Last7Days));
    }

    #[test]
    fn test_creation_details_per_type() {
        let a = comment("a", false, ModerationStatus::Visible);
        let mut phrase = row("p", &a, FlagType::AutoBannedPhrase, ts(1, 0));
        phrase.flag.trigger_details = json!({"bannedPhrase": "crypto giveaway"});
        let mut links = row("l", &a, FlagType::AutoLinkSpam, ts(1, 1));
        links.flag.trigger_details = json!({"linkCount": 4});
        let mut dislikes = row("d", &a, FlagType::AutoDislikeThreshold, ts(1, 2));
        dislikes.flag.trigger_details = json!({"dislikeCount": 9});
        let reported = report("r", &a, "wren", ts(1, 3));
        let anonymous = row("r2", &a, FlagType::ManualReport, ts(1, 4));

        let rows = vec![phrase, links, dislikes, reported, anonymous];
        let feed = build_activity(&rows, &titles(), &all_history(20), ts(10, 0));
        let detail = |id: &str| {
            feed.items
                .iter()
                .find(|item| item.id == format!("{id}-created"))
                .map(|item| item.detail.clone())
                .unwrap()
        };

        let base = "on “Dharma and Modern Work”.";
        assert_eq!(detail("p"), format!("Banned phrases {base} Phrase matched: “crypto giveaway”."));
        assert_eq!(detail("l"), format!("Link spam {base} Detected 4 links."));
        assert_eq!(detail("d"), format!("Dislike threshold {base}"));
        assert_eq!(detail("r"), format!("Manual reports {base} Reported by wren."));
        assert_eq!(detail("r2"), format!("Manual reports {base} Report submitted by subscriber."));
    }

    #[test]
    fn test_categories() {
        let a = comment("a", false, ModerationStatus::Visible);
        let mut moderator_custom = row("m", &a, FlagType::Unknown("custom".into()), ts(1, 0));
        moderator_custom.flag.trigger_source = TriggerSource::Moderator;
        let rows = vec![
            row("s", &a, FlagType::AutoLinkSpam, ts(1, 1)),
            report("r", &a, "wren", ts(1, 2)),
            moderator_custom,
            row("u", &a, FlagType::Unknown("custom".into()), ts(1, 3)),
        ];
        let feed = build_activity(&rows, &titles(), &all_history(20), ts(10, 0));
        let categories: Vec<_> = feed.items.iter().map(|i| (i.id.as_str(), i.category)).collect();
        assert_eq!(
            categories,
            vec![
                ("u-created", ActivityCategory::Manual),
                ("r-created", ActivityCategory::Manual),
                ("s-created", ActivityCategory::Auto),
                ("m-created", ActivityCategory::Escalation),
            ]
        );
        assert_eq!(feed.items[0].summary, "Comment flagged");
        assert_eq!(feed.items[0].flag_label, "custom");
    }

    #[test]
    fn test_truncates_after_sorting() {
        let a = comment("a", false, ModerationStatus::Visible);
        let b = comment("b", false, ModerationStatus::Visible);
        let rows = vec![
            row("a1", &a, FlagType::AutoLinkSpam, ts(1, 0)),
            row("b1", &b, FlagType::AutoLinkSpam, ts(5, 0)),
            row("a2", &a, FlagType::ManualHide, ts(3, 0)),
        ];
        let feed = build_activity(&rows, &titles(), &all_history(2), ts(10, 0));
        let ids: Vec<_> = feed.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b1-created", "a2-created"]);
        assert_eq!(feed.meta.total, 3);
        assert_eq!(feed.meta.window, None);
    }

    #[test]
    fn test_rows_without_comment_are_skipped() {
        let a = comment("a", false, ModerationStatus::Visible);
        let mut orphan = row("a1", &a, FlagType::AutoLinkSpam, ts(1, 0));
        orphan.comment = None;
        let feed = build_activity(&[orphan], &titles(), &all_history(20), ts(10, 0));
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_unjoined_row_skipped_within_joined_group() {
        let a = comment("a", false, ModerationStatus::Visible);
        let mut unjoined = row("a2", &a, FlagType::ManualHide, ts(3, 0));
        unjoined.comment = None;
        let rows = vec![row("a1", &a, FlagType::AutoLinkSpam, ts(1, 0)), unjoined];

        let feed = build_activity(&rows, &titles(), &all_history(20), ts(10, 0));
        let ids: Vec<_> = feed.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a1-created"]);
        assert_eq!(feed.meta.total, 1);
    }
}
