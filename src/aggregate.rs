//! One grouping pass over flag rows, shared by the queue, activity and
//! metrics views.
//!
//! Groups keep the order in which their comment was first seen, and every
//! "pick one" rule keeps the earlier row on ties, so the same input always
//! yields the same aggregates.

use crate::flag::{CommentSnapshot, Flag, FlagRow, FlagType, QueueStatus, Severity};
use crate::queue_status::{derive_queue_status, QueueStatusInputs};
use crate::severity::{compute_severity, SeverityInputs};
use crate::trigger_details::count_field;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A workflow field value and the creation time of the flag that carried it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastWrite<'a> {
    pub value: &'a str,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentAggregate<'a> {
    pub comment_id: &'a str,
    /// First joined comment seen for this id.
    pub comment: Option<&'a CommentSnapshot>,
    /// Highest-priority flag; the comment's representative row.
    pub primary: &'a Flag,
    primary_score: f64,
    /// Earliest creation time among all flags.
    pub flagged_at: DateTime<Utc>,
    /// Latest creation or resolution time among all flags.
    pub last_action_at: DateTime<Utc>,
    pub reporter_emails: Vec<&'a str>,
    pub reporter_names: Vec<&'a str>,
    pub assigned_to: Option<LastWrite<'a>>,
    pub notes: Option<LastWrite<'a>>,
    pub last_touched_by: Option<LastWrite<'a>>,
    pub flags: Vec<&'a Flag>,
    /// Member rows in input order, with their own comment joins.
    pub rows: Vec<&'a FlagRow>,
}

impl<'a> CommentAggregate<'a> {
    fn new(row: &'a FlagRow) -> Self {
        let flag = &row.flag;
        Self {
            comment_id: &flag.comment_id,
            comment: row.comment.as_ref(),
            primary: flag,
            primary_score: f64::NEG_INFINITY,
            flagged_at: flag.created_at,
            last_action_at: flag.created_at,
            reporter_emails: Vec::new(),
            reporter_names: Vec::new(),
            assigned_to: None,
            notes: None,
            last_touched_by: None,
            flags: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn absorb(&mut self, row: &'a FlagRow) {
        let flag = &row.flag;

        if self.comment.is_none() {
            self.comment = row.comment.as_ref();
        }

        let score = flag.priority_score();
        if score > self.primary_score {
            self.primary_score = score;
            self.primary = flag;
        }

        self.flagged_at = self.flagged_at.min(flag.created_at);
        self.last_action_at = self.last_action_at.max(flag.created_at);
        if let Some(resolved_at) = flag.resolved_at {
            self.last_action_at = self.last_action_at.max(resolved_at);
        }

        keep_latest(&mut self.assigned_to, flag.assigned_to.as_deref(), flag.created_at);
        keep_latest(&mut self.notes, flag.notes.as_deref(), flag.created_at);
        keep_latest(
            &mut self.last_touched_by,
            flag.last_touched_by.as_deref(),
            flag.created_at,
        );

        if flag.flag_type == FlagType::ManualReport {
            if let Some(email) = string_in(&flag.trigger_details, "reporterEmail") {
                push_unique(&mut self.reporter_emails, email);
            }
            if let Some(name) = string_in(&flag.trigger_details, "reporterUsername") {
                push_unique(&mut self.reporter_names, name);
            }
        }

        self.flags.push(flag);
        self.rows.push(row);
    }

    /// Unique reporters across the comment's manual reports.
    pub fn manual_report_count(&self) -> usize {
        self.reporter_emails.len()
    }

    pub fn is_hidden(&self) -> bool {
        self.comment.map(CommentSnapshot::hidden).unwrap_or(false)
    }

    fn severity_inputs(&self, manual_report_count: usize) -> SeverityInputs {
        SeverityInputs {
            manual_report_count,
            moderation_status: self.comment.map(CommentSnapshot::status).unwrap_or_default(),
            is_hidden: self.is_hidden(),
        }
    }

    /// Queue severity: the primary flag's type against the comment's unique
    /// reporter count and visibility.
    pub fn severity(&self) -> Severity {
        compute_severity(
            &self.primary.flag_type,
            &self.severity_inputs(self.manual_report_count()),
        )
    }

    pub fn queue_status(&self) -> QueueStatus {
        derive_queue_status(&QueueStatusInputs {
            flag_status: self.primary.status,
            flag_type: self.primary.flag_type.clone(),
            moderation_status: self.comment.map(CommentSnapshot::status).unwrap_or_default(),
            auto_hidden: self.is_hidden(),
            manual_report_count: self.manual_report_count(),
        })
    }

    /// Metrics severity: the most severe classification of any single flag.
    /// Each manual report counts as one report; other flags use the
    /// `reportCount` they recorded, if any.
    pub fn max_flag_severity(&self) -> Severity {
        self.flags
            .iter()
            .map(|flag| {
                let report_count = match flag.flag_type {
                    FlagType::ManualReport => 1,
                    _ => count_field(&flag.trigger_details, "reportCount").unwrap_or(0) as usize,
                };
                compute_severity(&flag.flag_type, &self.severity_inputs(report_count))
            })
            .max()
            .unwrap_or(Severity::Low)
    }
}

fn keep_latest<'a>(slot: &mut Option<LastWrite<'a>>, value: Option<&'a str>, at: DateTime<Utc>) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    match slot {
        Some(current) if at <= current.at => {}
        _ => *slot = Some(LastWrite { value, at }),
    }
}

fn push_unique<'a>(values: &mut Vec<&'a str>, value: &'a str) {
    if !values.contains(&value) {
        values.push(value);
    }
}

// Borrowing counterpart of `trigger_details::string_field`.
fn string_in<'a>(details: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    details.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// Group flag rows by comment.
pub fn aggregate_flags_by_comment<'a, I>(rows: I) -> Vec<CommentAggregate<'a>>
where
    I: IntoIterator<Item = &'a FlagRow>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<CommentAggregate<'a>> = Vec::new();
    let mut seen = 0usize;

    for row in rows {
        seen += 1;
        let slot = *index.entry(row.flag.comment_id.as_str()).or_insert_with(|| {
            groups.push(CommentAggregate::new(row));
            groups.len() - 1
        });
        groups[slot].absorb(row);
    }

    log::debug!(
        "Aggregated {} flags into {} comments",
        seen,
        groups.len()
    );
    groups
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::flag::{FlagStatus, ModerationStatus, TriggerSource};
    use chrono::TimeZone;
    use serde_json::json;

    pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    pub fn comment(id: &str, hidden: bool, status: ModerationStatus) -> CommentSnapshot {
        CommentSnapshot {
            id: id.to_string(),
            article_slug: "dharma-modern-work".to_string(),
            username: "quiet-heron".to_string(),
            user_email: "author@example.com".to_string(),
            comment_text: Some("Check out   my site".to_string()),
            created_at: Some(ts(1, 0)),
            is_hidden: Some(hidden),
            hidden_reason: hidden.then(|| "auto".to_string()),
            hidden_at: None,
            moderation_status: Some(status),
        }
    }

    pub fn row(
        id: &str,
        comment: &CommentSnapshot,
        flag_type: FlagType,
        created_at: DateTime<Utc>,
    ) -> FlagRow {
        let trigger_source = match flag_type {
            FlagType::ManualReport => TriggerSource::User,
            FlagType::ManualHide => TriggerSource::Moderator,
            _ => TriggerSource::System,
        };
        FlagRow {
            flag: Flag {
                id: id.to_string(),
                comment_id: comment.id.clone(),
                flag_type,
                trigger_source,
                status: FlagStatus::Open,
                created_at,
                resolved_at: None,
                trigger_details: json!({}),
                assigned_to: None,
                notes: None,
                last_touched_by: None,
            },
            comment: Some(comment.clone()),
        }
    }

    pub fn report(
        id: &str,
        comment: &CommentSnapshot,
        reporter: &str,
        created_at: DateTime<Utc>,
    ) -> FlagRow {
        let mut row = row(id, comment, FlagType::ManualReport, created_at);
        row.flag.trigger_details = json!({
            "reporterEmail": format!("{reporter}@example.com"),
            "reporterUsername": reporter,
            "reason": "spam",
        });
        row
    }

    pub fn resolved(mut row: FlagRow, resolved_at: DateTime<Utc>) -> FlagRow {
        row.flag.status = FlagStatus::Resolved;
        row.flag.resolved_at = Some(resolved_at);
        row
    }
}
