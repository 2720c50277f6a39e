//! Severity tiers for flagged comments.

use crate::flag::{FlagType, ModerationStatus, Severity};

/// Comment-level evidence the classifier looks at besides the flag type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityInputs {
    /// Unique reporters, not report flags.
    pub manual_report_count: usize,
    pub moderation_status: ModerationStatus,
    pub is_hidden: bool,
}

/// Reports at or above this count are high severity.
pub const HIGH_REPORT_COUNT: usize = 5;
/// Reports at or above this count are at least medium severity.
pub const MEDIUM_REPORT_COUNT: usize = 3;

/// Classify one flag type against the comment's current state.
///
/// Rules are checked in order and the first match wins. Banned phrases are
/// always high, even after a moderator restored the comment.
pub fn compute_severity(flag_type: &FlagType, inputs: &SeverityInputs) -> Severity {
    if *flag_type == FlagType::ManualHide
        || inputs.moderation_status == ModerationStatus::ManualHidden
    {
        return Severity::High;
    }

    match flag_type {
        FlagType::AutoBannedPhrase => Severity::High,
        FlagType::ManualReport => {
            if inputs.manual_report_count >= HIGH_REPORT_COUNT {
                Severity::High
            } else if inputs.manual_report_count >= MEDIUM_REPORT_COUNT || inputs.is_hidden {
                Severity::Medium
            } else {
                Severity::Low
            }
        }
        _ => hidden_tier(inputs.is_hidden),
    }
}

fn hidden_tier(is_hidden: bool) -> Severity {
    if is_hidden {
        Severity::Medium
    } else {
        Severity::Low
    }
}
