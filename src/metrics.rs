//! Aggregate moderation metrics over one time window.

use crate::aggregate::aggregate_flags_by_comment;
use crate::flag::{FlagRow, FlagStatus, FlagType, ModerationStatus, Severity, TriggerSource};
use crate::query::MetricsQuery;
use crate::text::flag_type_label;
use crate::time_window::WindowBounds;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsCounts {
    pub open_flags: usize,
    /// Distinct comments hidden by a detector.
    pub auto_hidden: usize,
    pub manual_report_open: usize,
    /// Distinct comments hidden by a moderator.
    pub escalated: usize,
    pub median_response_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagTypeBreakdown {
    pub flag_type: FlagType,
    pub label: String,
    pub total: usize,
    pub open: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsTotals {
    pub unique_comments: usize,
    pub total_flags: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeverityBuckets {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityBuckets {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpenBySource {
    pub system: usize,
    pub user: usize,
    pub moderator: usize,
}

impl OpenBySource {
    fn record(&mut self, source: TriggerSource) {
        match source {
            TriggerSource::System => self.system += 1,
            TriggerSource::User => self.user += 1,
            TriggerSource::Moderator => self.moderator += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub window: WindowBounds,
    pub summary: MetricsCounts,
    pub breakdown: Vec<FlagTypeBreakdown>,
    pub totals: MetricsTotals,
    pub severity: SeverityBuckets,
    pub open_by_source: OpenBySource,
    pub last_updated: DateTime<Utc>,
}

/// Standard median, rounding the mean of the two middle values for even
/// counts. `None` for an empty slice.
pub fn median(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let mean = (sorted[middle - 1] as f64 + sorted[middle] as f64) / 2.0;
        Some(mean.round() as i64)
    } else {
        Some(sorted[middle])
    }
}

/// Minutes from creation to resolution, rounded. Resolutions recorded before
/// creation are discarded.
fn response_minutes(created_at: DateTime<Utc>, resolved_at: DateTime<Utc>) -> Option<i64> {
    let millis = (resolved_at - created_at).num_milliseconds();
    (millis >= 0).then(|| (millis as f64 / 60_000.0).round() as i64)
}

/// Compute the metrics summary for flags created inside the query window.
pub fn build_metrics(rows: &[FlagRow], query: &MetricsQuery, now: DateTime<Utc>) -> MetricsSummary {
    let window = query.window.bounds(now);
    let groups =
        aggregate_flags_by_comment(rows.iter().filter(|row| window.contains(row.flag.created_at)));
    let total_flags: usize = groups.iter().map(|group| group.flags.len()).sum();

    let mut summary = MetricsCounts::default();
    let mut breakdown: Vec<FlagTypeBreakdown> = Vec::new();
    let mut severity = SeverityBuckets::default();
    let mut open_by_source = OpenBySource::default();
    let mut durations = Vec::new();

    for group in &groups {
        let status = group.comment.map(|c| c.status()).unwrap_or_default();
        let hidden = group.is_hidden();

        if status == ModerationStatus::ManualHidden
            || group.flags.iter().any(|f| f.flag_type == FlagType::ManualHide)
        {
            summary.escalated += 1;
        }
        if status == ModerationStatus::AutoHidden
            || (hidden && group.flags.iter().any(|f| f.flag_type.is_automatic()))
        {
            summary.auto_hidden += 1;
        }
        severity.record(group.max_flag_severity());

        for flag in &group.flags {
            let position = breakdown.iter().position(|b| b.flag_type == flag.flag_type);
            let entry = match position {
                Some(index) => &mut breakdown[index],
                None => {
                    breakdown.push(FlagTypeBreakdown {
                        flag_type: flag.flag_type.clone(),
                        label: flag_type_label(&flag.flag_type).to_string(),
                        total: 0,
                        open: 0,
                        resolved: 0,
                    });
                    let last = breakdown.len() - 1;
                    &mut breakdown[last]
                }
            };
            entry.total += 1;

            match flag.status {
                FlagStatus::Open => {
                    entry.open += 1;
                    summary.open_flags += 1;
                    open_by_source.record(flag.trigger_source);
                    if flag.flag_type == FlagType::ManualReport {
                        summary.manual_report_open += 1;
                    }
                }
                FlagStatus::Resolved => entry.resolved += 1,
            }

            if let Some(minutes) = flag
                .resolved_at
                .and_then(|resolved_at| response_minutes(flag.created_at, resolved_at))
            {
                durations.push(minutes);
            }
        }
    }

    summary.median_response_minutes = median(&durations);
    breakdown.sort_by(|a, b| b.total.cmp(&a.total));

    log::debug!(
        "Metrics for {}: {} flags across {} comments",
        window.value,
        total_flags,
        groups.len()
    );

    MetricsSummary {
        window,
        summary,
        breakdown,
        totals: MetricsTotals {
            unique_comments: groups.len(),
            total_flags,
        },
        severity,
        open_by_source,
        last_updated: now,
    }
}
