pub mod activity;
pub mod aggregate;
pub mod article_titles;
pub mod config;
pub mod detection;
pub mod flag;
pub mod metrics;
pub mod priority;
pub mod query;
pub mod queue;
pub mod queue_status;
pub mod service;
pub mod severity;
pub mod source;
pub mod text;
pub mod time_window;
pub mod trigger_details;

#[cfg(test)]
mod scenario_test;

pub use activity::{build_activity, ActivityFeed, ActivityItem};
pub use aggregate::{aggregate_flags_by_comment, CommentAggregate};
pub use article_titles::{ArticleTitles, TitleLookup};
pub use config::EngineConfig;
pub use detection::{run_submission_detectors, Detectors, FlagDraft};
pub use flag::{
    CommentSnapshot, Flag, FlagRow, FlagStatus, FlagType, ModerationStatus, QueueStatus,
    ReactionCounts, Severity, TriggerSource,
};
pub use metrics::{build_metrics, MetricsSummary};
pub use priority::score_flag_priority;
pub use query::{ActivityQuery, MetricsQuery, QueryError, QueueQuery};
pub use queue::{build_queue, QueueItem, QueuePage};
pub use queue_status::derive_queue_status;
pub use service::{ModerationService, ServiceError};
pub use severity::compute_severity;
pub use source::{FlagSource, SnapshotSource, SourceError};
pub use time_window::TimeWindow;
