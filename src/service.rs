//! Read surfaces: fetch through a `FlagSource`, then run the pure engine.

use crate::activity::{build_activity, ActivityFeed};
use crate::article_titles::ArticleTitles;
use crate::flag::{count_reactions, FlagRow, ReactionCounts};
use crate::metrics::{build_metrics, MetricsSummary};
use crate::query::{ActivityQuery, MetricsQuery, QueueQuery};
use crate::queue::{build_queue, QueuePage};
use crate::source::{FlagFetch, FlagSource, SourceError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage could not be read. The message is safe to show to callers.
    #[error("{message}")]
    Unavailable {
        message: &'static str,
        #[source]
        source: SourceError,
    },
}

pub struct ModerationService<S> {
    source: S,
    titles: ArticleTitles,
}

impl<S: FlagSource> ModerationService<S> {
    pub fn new(source: S, titles: ArticleTitles) -> Self {
        Self { source, titles }
    }

    pub fn titles(&self) -> &ArticleTitles {
        &self.titles
    }

    fn fetch(
        &self,
        fetch: &FlagFetch,
        target: &'static str,
        message: &'static str,
    ) -> Result<Vec<FlagRow>, ServiceError> {
        self.source.fetch_flags(fetch).map_err(|err| {
            log::error!(target: target, "Failed to load flags: {}", err);
            ServiceError::Unavailable {
                message,
                source: err,
            }
        })
    }

    pub fn queue(&self, query: &QueueQuery, now: DateTime<Utc>) -> Result<QueuePage, ServiceError> {
        let rows = self.fetch(
            &FlagFetch::for_queue(query),
            "moderation.queue",
            "Unable to load moderation queue",
        )?;

        let mut comment_ids: Vec<&str> = rows
            .iter()
            .filter(|row| row.comment.is_some())
            .map(|row| row.flag.comment_id.as_str())
            .collect();
        comment_ids.sort_unstable();
        comment_ids.dedup();

        let reactions: HashMap<String, ReactionCounts> = if comment_ids.is_empty() {
            HashMap::new()
        } else {
            match self.source.fetch_reactions(&comment_ids) {
                Ok(reactions) => count_reactions(&reactions),
                Err(err) => {
                    log::warn!(target: "moderation.queue", "Failed to load reactions: {}", err);
                    HashMap::new()
                }
            }
        };

        let page = build_queue(&rows, &reactions, &self.titles, query, now);
        log::debug!(
            target: "moderation.queue",
            "{} of {} items from {} flags",
            page.items.len(),
            page.meta.total,
            rows.len()
        );
        Ok(page)
    }

    pub fn activity(
        &self,
        query: &ActivityQuery,
        now: DateTime<Utc>,
    ) -> Result<ActivityFeed, ServiceError> {
        let rows = self.fetch(
            &FlagFetch::for_activity(query, now),
            "moderation.activity",
            "Unable to load moderation activity",
        )?;
        Ok(build_activity(&rows, &self.titles, query, now))
    }

    pub fn metrics(
        &self,
        query: &MetricsQuery,
        now: DateTime<Utc>,
    ) -> Result<MetricsSummary, ServiceError> {
        let rows = self.fetch(
            &FlagFetch::for_metrics(query, now),
            "moderation.metrics",
            "Unable to load moderation metrics",
        )?;
        Ok(build_metrics(&rows, query, now))
    }
}
