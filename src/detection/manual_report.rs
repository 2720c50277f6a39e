//! Rules applied when a subscriber reports a comment.

use super::{FlagDraft, HideDecision};
use crate::flag::{CommentSnapshot, Flag, FlagType, TriggerSource};
use crate::trigger_details::{string_field, TriggerDetails};

pub const DEFAULT_REPORT_REASON: &str = "spam";
pub const MAX_REASON_CHARS: usize = 200;
/// `reason` recorded on the hide raised by report volume.
pub const REPORT_THRESHOLD_REASON: &str = "user_report_threshold";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportRejection {
    #[error("You cannot report your own comment")]
    OwnComment,
    #[error("You have already reported this comment")]
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub reporter_email: String,
    pub reporter_username: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub report: FlagDraft,
    /// System `manual_hide` raised when this report reached the threshold.
    pub threshold_hide: Option<FlagDraft>,
    /// Unique reporters with open reports, including this one.
    pub report_count: usize,
    pub report_threshold: usize,
    pub already_hidden: bool,
}

impl ReportOutcome {
    pub fn is_hidden(&self) -> bool {
        self.already_hidden || self.threshold_hide.is_some()
    }

    pub fn message(&self) -> &'static str {
        if self.is_hidden() {
            "Thanks for flagging. This comment has been hidden pending review."
        } else {
            "Thanks for flagging. Our moderators will review it soon."
        }
    }
}

/// Trim and cap a free-text reason, falling back to the default.
pub fn normalize_reason(reason: Option<&str>) -> String {
    let capped: String = reason
        .unwrap_or(DEFAULT_REPORT_REASON)
        .trim()
        .chars()
        .take(MAX_REASON_CHARS)
        .collect();
    if capped.is_empty() {
        DEFAULT_REPORT_REASON.to_string()
    } else {
        capped
    }
}

pub struct ReportEvaluator {
    threshold: usize,
}

impl ReportEvaluator {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Evaluate a new report against the comment and its existing flags.
    pub fn evaluate(
        &self,
        comment: &CommentSnapshot,
        existing_flags: &[Flag],
        request: &ReportRequest,
    ) -> Result<ReportOutcome, ReportRejection> {
        if comment.user_email == request.reporter_email {
            return Err(ReportRejection::OwnComment);
        }

        let mut reporters: Vec<String> = Vec::new();
        for flag in existing_flags.iter().filter(|f| {
            f.comment_id == comment.id && f.is_open() && f.flag_type == FlagType::ManualReport
        }) {
            let Some(email) =
                string_field(&flag.trigger_details, "reporterEmail").filter(|e| !e.is_empty())
            else {
                continue;
            };
            if email == request.reporter_email {
                return Err(ReportRejection::Duplicate);
            }
            if !reporters.contains(&email) {
                reporters.push(email);
            }
        }
        // blank addresses never count toward the unique reporter total
        if !request.reporter_email.is_empty() && !reporters.contains(&request.reporter_email) {
            reporters.push(request.reporter_email.clone());
        }
        let report_count = reporters.len();

        let report = FlagDraft {
            flag_type: FlagType::ManualReport,
            trigger_source: TriggerSource::User,
            trigger_details: TriggerDetails::ManualReport {
                reporter_email: Some(request.reporter_email.clone()),
                reporter_username: request.reporter_username.clone(),
                reason: Some(normalize_reason(request.reason.as_deref())),
            },
            last_touched_by: request
                .reporter_username
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| request.reporter_email.clone()),
            hide: None,
        };

        let already_hidden = comment.hidden();
        let threshold_hide = (!already_hidden && report_count >= self.threshold).then(|| {
            log::info!(
                "Comment {} reached {} unique reports, hiding pending review",
                comment.id,
                report_count
            );
            FlagDraft::system(
                FlagType::ManualHide,
                TriggerDetails::ManualHide {
                    reason: Some(REPORT_THRESHOLD_REASON.to_string()),
                    report_count: Some(report_count as u64),
                    threshold: Some(self.threshold as u64),
                },
                Some(HideDecision::manual(format!(
                    "Hidden after {report_count} user reports"
                ))),
            )
        });

        Ok(ReportOutcome {
            report,
            threshold_hide,
            report_count,
            report_threshold: self.threshold,
            already_hidden,
        })
    }
}
