//! Workflow stage of a comment in the moderation queue.

use crate::flag::{FlagStatus, FlagType, ModerationStatus, QueueStatus};

/// Unique reporters at which a comment escalates regardless of hide state.
pub const ESCALATION_REPORT_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct QueueStatusInputs {
    pub flag_status: FlagStatus,
    pub flag_type: FlagType,
    pub moderation_status: ModerationStatus,
    pub auto_hidden: bool,
    pub manual_report_count: usize,
}

/// Derive the queue stage from current evidence. Resolution is terminal and
/// checked first; moderator hides and report volume escalate; detector hides
/// wait in triage.
pub fn derive_queue_status(inputs: &QueueStatusInputs) -> QueueStatus {
    if inputs.flag_status == FlagStatus::Resolved
        || inputs.moderation_status == ModerationStatus::Resolved
    {
        return QueueStatus::Resolved;
    }

    if inputs.flag_type == FlagType::ManualHide
        || inputs.moderation_status == ModerationStatus::ManualHidden
    {
        return QueueStatus::Escalated;
    }

    if inputs.manual_report_count >= ESCALATION_REPORT_COUNT {
        return QueueStatus::Escalated;
    }

    if inputs.auto_hidden || inputs.moderation_status == ModerationStatus::AutoHidden {
        return QueueStatus::Triage;
    }

    QueueStatus::Open
}
