//! Data fetch seam towards the storage collaborator.

use crate::flag::{FlagRow, ReactionRow};
use crate::query::{ActivityQuery, MetricsQuery, QueueQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Lower time bound applied by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinceFilter {
    /// Flags created at or after the instant.
    Created(DateTime<Utc>),
    /// Flags created or resolved at or after the instant.
    CreatedOrResolved(DateTime<Utc>),
}

impl SinceFilter {
    pub fn admits(&self, row: &FlagRow) -> bool {
        match *self {
            SinceFilter::Created(start) => row.flag.created_at >= start,
            SinceFilter::CreatedOrResolved(start) => {
                row.flag.created_at >= start || row.flag.resolved_at.is_some_and(|at| at >= start)
            }
        }
    }
}

/// What a view needs from storage. Rows come back newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagFetch {
    pub since: Option<SinceFilter>,
    pub article_slug: Option<String>,
    pub max_rows: Option<usize>,
}

impl FlagFetch {
    /// The queue windows on the oldest evidence per comment, so sibling flags
    /// older than the window are still fetched.
    pub fn for_queue(query: &QueueQuery) -> Self {
        Self {
            since: None,
            article_slug: query.article_slug.clone(),
            max_rows: Some(query.fetch_limit()),
        }
    }

    pub fn for_activity(query: &ActivityQuery, now: DateTime<Utc>) -> Self {
        Self {
            since: query
                .window
                .map(|window| SinceFilter::CreatedOrResolved(window.start(now))),
            article_slug: None,
            max_rows: Some(query.fetch_limit()),
        }
    }

    pub fn for_metrics(query: &MetricsQuery, now: DateTime<Utc>) -> Self {
        Self {
            since: Some(SinceFilter::Created(query.window.start(now))),
            article_slug: None,
            max_rows: None,
        }
    }
}

pub trait FlagSource {
    fn fetch_flags(&self, fetch: &FlagFetch) -> Result<Vec<FlagRow>, SourceError>;

    fn fetch_reactions(&self, comment_ids: &[&str]) -> Result<Vec<ReactionRow>, SourceError>;
}

/// Everything a `SnapshotSource` serves, as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub flags: Vec<FlagRow>,
    #[serde(default)]
    pub reactions: Vec<ReactionRow>,
    /// Article slug to title.
    #[serde(default)]
    pub articles: HashMap<String, String>,
}

/// In-memory source over a snapshot exported from storage.
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Loaded snapshot {}: {} flags, {} reactions, {} articles",
            path.display(),
            snapshot.flags.len(),
            snapshot.reactions.len(),
            snapshot.articles.len()
        );
        Ok(Self::new(snapshot))
    }

    pub fn articles(&self) -> &HashMap<String, String> {
        &self.snapshot.articles
    }
}

impl FlagSource for SnapshotSource {
    fn fetch_flags(&self, fetch: &FlagFetch) -> Result<Vec<FlagRow>, SourceError> {
        let mut rows: Vec<FlagRow> = self
            .snapshot
            .flags
            .iter()
            .filter(|row| fetch.since.map_or(true, |since| since.admits(row)))
            .filter(|row| match fetch.article_slug.as_deref() {
                Some(slug) => row.comment.as_ref().is_some_and(|c| c.article_slug == slug),
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| b.flag.created_at.cmp(&a.flag.created_at));
        if let Some(max_rows) = fetch.max_rows {
            rows.truncate(max_rows);
        }
        Ok(rows)
    }

    fn fetch_reactions(&self, comment_ids: &[&str]) -> Result<Vec<ReactionRow>, SourceError> {
        Ok(self
            .snapshot
            .reactions
            .iter()
            .filter(|reaction| comment_ids.contains(&reaction.comment_id.as_str()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::flag::{FlagType, ModerationStatus, ReactionType};
    use crate::time_window::TimeWindow;

    fn snapshot() -> Snapshot {
        let a = comment("a", false, ModerationStatus::Visible);
        let mut b = comment("b", false, ModerationStatus::Visible);
        b.article_slug = "slow-reading".to_string();
        Snapshot {
            flags: vec![
                resolved(row("old", &a, FlagType::AutoLinkSpam, ts(1, 0)), ts(9, 0)),
                row("mid", &b, FlagType::AutoLinkSpam, ts(5, 0)),
                row("new", &a, FlagType::ManualHide, ts(8, 0)),
            ],
            reactions: vec![
                ReactionRow {
                    comment_id: "a".to_string(),
                    reaction_type: ReactionType::Like,
                },
                ReactionRow {
                    comment_id: "b".to_string(),
                    reaction_type: ReactionType::Dislike,
                },
            ],
            articles: HashMap::new(),
        }
    }

    fn ids(rows: &[FlagRow]) -> Vec<&str> {
        rows.iter().map(|r| r.flag.id.as_str()).collect()
    }

    #[test]
    fn test_rows_newest_first_and_capped() {
        let source = SnapshotSource::new(snapshot());
        let fetch = FlagFetch {
            max_rows: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(&source.fetch_flags(&fetch).unwrap()), vec!["new", "mid"]);
    }

    #[test]
    fn test_since_filters() {
        let source = SnapshotSource::new(snapshot());
        let created = FlagFetch {
            since: Some(SinceFilter::Created(ts(4, 0))),
            ..Default::default()
        };
        assert_eq!(ids(&source.fetch_flags(&created).unwrap()), vec!["new", "mid"]);

        let activity = FlagFetch::for_activity(
            &ActivityQuery {
                limit: 5,
                window: Some(TimeWindow::Last24Hours),
            },
            ts(9, 12),
        );
        assert_eq!(activity.max_rows, Some(20));
        assert_eq!(ids(&source.fetch_flags(&activity).unwrap()), vec!["old"]);
    }

    #[test]
    fn test_article_filter() {
        let source = SnapshotSource::new(snapshot());
        let fetch = FlagFetch::for_queue(&QueueQuery {
            article_slug: Some("slow-reading".to_string()),
            ..Default::default()
        });
        assert_eq!(ids(&source.fetch_flags(&fetch).unwrap()), vec!["mid"]);
    }

    #[test]
    fn test_reactions_by_comment() {
        let source = SnapshotSource::new(snapshot());
        let reactions = source.fetch_reactions(&["b"]).unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].reaction_type, ReactionType::Dislike);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, serde_json::to_string(&snapshot()).unwrap()).unwrap();

        let source = SnapshotSource::from_file(&path).unwrap();
        assert_eq!(source.fetch_flags(&FlagFetch::default()).unwrap().len(), 3);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SnapshotSource::from_file(&path),
            Err(SourceError::Parse { .. })
        ));
        assert!(matches!(
            SnapshotSource::from_file(dir.path().join("missing.json")),
            Err(SourceError::Io { .. })
        ));
    }
}
