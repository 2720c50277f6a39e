//! Priority score used to pick the representative flag of a comment.

use crate::flag::{Flag, FlagStatus, FlagType};
use chrono::{DateTime, Utc};

/// Any open flag outranks any resolved one.
pub const OPEN_STATUS_BOOST: f64 = 100.0;
pub const UNKNOWN_FLAG_PRIORITY: f64 = 10.0;

// Keeps the time component below 1.0 for timestamps up to the year 2286,
// well under the smallest gap (5) between two base priorities.
const TIME_COMPONENT_DIVISOR: f64 = 1e13;
const TIME_COMPONENT_MAX: f64 = 0.999_999;

pub fn base_priority(flag_type: &FlagType) -> f64 {
    match flag_type {
        FlagType::ManualHide => 50.0,
        FlagType::ManualReport => 40.0,
        FlagType::AutoBannedPhrase => 35.0,
        FlagType::AutoLinkSpam => 25.0,
        FlagType::AutoDislikeThreshold => 20.0,
        FlagType::Unknown(_) => UNKNOWN_FLAG_PRIORITY,
    }
}

/// Recency tie-breaker in `[0, 1)`. Pre-epoch or missing timestamps score 0.
fn time_component(created_at: Option<DateTime<Utc>>) -> f64 {
    created_at
        .map(|at| at.timestamp_millis() as f64 / TIME_COMPONENT_DIVISOR)
        .unwrap_or(0.0)
        .clamp(0.0, TIME_COMPONENT_MAX)
}

/// Score a flag for primary-flag selection. Not persisted; only the relative
/// order within one comment matters.
pub fn score_flag_priority(
    flag_type: &FlagType,
    status: FlagStatus,
    created_at: Option<DateTime<Utc>>,
) -> f64 {
    let status_boost = match status {
        FlagStatus::Open => OPEN_STATUS_BOOST,
        FlagStatus::Resolved => 0.0,
    };
    base_priority(flag_type) + status_boost + time_component(created_at)
}

impl Flag {
    pub fn priority_score(&self) -> f64 {
        score_flag_priority(&self.flag_type, self.status, Some(self.created_at))
    }
}
