use super::{FlagDraft, HideDecision};
use crate::config::DislikeThresholdConfig;
use crate::flag::{CommentSnapshot, FlagType, ModerationStatus, ReactionCounts};
use crate::trigger_details::TriggerDetails;

pub struct DislikeThresholdDetector {
    min_dislikes: u32,
    ratio: f64,
}

impl DislikeThresholdDetector {
    pub fn new(config: &DislikeThresholdConfig) -> Self {
        Self {
            min_dislikes: config.min_dislikes,
            ratio: config.ratio,
        }
    }

    pub fn crosses(&self, counts: ReactionCounts) -> bool {
        counts.dislike_count >= self.min_dislikes
            && f64::from(counts.dislike_count) >= f64::from(counts.like_count) * self.ratio
    }

    /// Evaluate a comment after its reactions changed. Comments that are
    /// already hidden or were restored by a moderator are left alone.
    pub fn check(&self, comment: &CommentSnapshot, counts: ReactionCounts) -> Option<FlagDraft> {
        if comment.hidden() || comment.status() != ModerationStatus::Visible {
            return None;
        }
        if !self.crosses(counts) {
            return None;
        }

        log::info!(
            "Dislike threshold reached on comment {}: {} dislikes vs {} likes",
            comment.id,
            counts.dislike_count,
            counts.like_count
        );
        Some(FlagDraft::system(
            FlagType::AutoDislikeThreshold,
            TriggerDetails::DislikeThreshold {
                like_count: Some(u64::from(counts.like_count)),
                dislike_count: Some(u64::from(counts.dislike_count)),
            },
            Some(HideDecision::auto("Hidden after community dislikes")),
        ))
    }
}
