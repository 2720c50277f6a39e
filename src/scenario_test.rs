//! End-to-end scenarios: raw rows in, views out.

use crate::aggregate::fixtures::*;
use crate::article_titles::ArticleTitles;
use crate::config::DetectionConfig;
use crate::detection::manual_report::ReportRequest;
use crate::detection::{run_submission_detectors, Detectors};
use crate::flag::{FlagRow, FlagType, ModerationStatus, QueueStatus, Severity};
use crate::metrics::{build_metrics, median};
use crate::query::{MetricsQuery, QueueQuery};
use crate::queue::build_queue;
use crate::time_window::TimeWindow;
use std::collections::HashMap;

fn week() -> QueueQuery {
    QueueQuery {
        window: Some(TimeWindow::Last7Days),
        ..Default::default()
    }
}

#[test]
fn test_hidden_link_spam_is_medium_triage() {
    let c = comment("c1", true, ModerationStatus::AutoHidden);
    let rows = vec![row("f1", &c, FlagType::AutoLinkSpam, ts(9, 0))];

    let page = build_queue(&rows, &HashMap::new(), &ArticleTitles::default(), &week(), ts(10, 0));
    let item = &page.items[0];
    assert_eq!(item.report_count, 0);
    assert_eq!(item.severity, Severity::Medium);
    assert_eq!(item.status, QueueStatus::Triage);
}

#[test]
fn test_three_reporters_escalate_visible_comment() {
    let c = comment("c1", false, ModerationStatus::Visible);
    let rows = vec![
        report("f1", &c, "wren", ts(9, 0)),
        report("f2", &c, "finch", ts(9, 1)),
        report("f3", &c, "heron", ts(9, 2)),
    ];

    let page = build_queue(&rows, &HashMap::new(), &ArticleTitles::default(), &week(), ts(10, 0));
    let item = &page.items[0];
    assert_eq!(item.report_count, 3);
    assert_eq!(item.severity, Severity::Medium);
    assert_eq!(item.status, QueueStatus::Escalated);
}

#[test]
fn test_repeat_reporter_counts_once() {
    let c = comment("c1", false, ModerationStatus::Visible);
    let rows = vec![
        report("f1", &c, "wren", ts(9, 0)),
        report("f2", &c, "wren", ts(9, 1)),
    ];

    let page = build_queue(&rows, &HashMap::new(), &ArticleTitles::default(), &week(), ts(10, 0));
    assert_eq!(page.items[0].report_count, 1);
    assert_eq!(page.items[0].status, QueueStatus::Open);
}

#[test]
fn test_queue_is_deterministic() {
    let a = comment("a", true, ModerationStatus::AutoHidden);
    let b = comment("b", false, ModerationStatus::Visible);
    let rows = vec![
        row("a1", &a, FlagType::AutoLinkSpam, ts(9, 0)),
        report("b1", &b, "wren", ts(9, 0)),
        row("a2", &a, FlagType::AutoDislikeThreshold, ts(9, 0)),
    ];
    let titles = ArticleTitles::default();

    let first = build_queue(&rows, &HashMap::new(), &titles, &week(), ts(10, 0));
    let second = build_queue(&rows, &HashMap::new(), &titles, &week(), ts(10, 0));
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_median_resolution_minutes() {
    assert_eq!(median(&[10, 20, 30, 40]), Some(25));
    assert_eq!(median(&[10, 20, 30]), Some(20));
}

/// Detector drafts, once stored by the caller, classify as expected.
#[test]
fn test_report_threshold_round_trip() {
    let detectors = Detectors::from_config(&DetectionConfig::default()).unwrap();
    let c = comment("c1", false, ModerationStatus::Visible);
    let mut rows: Vec<FlagRow> = vec![
        report("f1", &c, "wren", ts(9, 0)),
        report("f2", &c, "finch", ts(9, 1)),
    ];
    let existing: Vec<_> = rows.iter().map(|r| r.flag.clone()).collect();

    let outcome = detectors
        .reports
        .evaluate(
            &c,
            &existing,
            &ReportRequest {
                reporter_email: "heron@example.com".to_string(),
                reporter_username: Some("heron".to_string()),
                reason: Some("harassment".to_string()),
            },
        )
        .unwrap();
    let hide = outcome.threshold_hide.unwrap();
    let decision = hide.hide.clone().unwrap();

    // Apply what the caller would persist.
    let mut hidden = c.clone();
    hidden.is_hidden = Some(true);
    hidden.moderation_status = Some(decision.moderation_status);
    hidden.hidden_reason = Some(decision.hidden_reason);
    for row in rows.iter_mut() {
        row.comment = Some(hidden.clone());
    }
    let mut stored = report("f3", &hidden, "heron", ts(9, 2));
    stored.flag.trigger_details = outcome.report.trigger_details.to_value();
    rows.push(stored);
    let mut hide_row = row("f4", &hidden, FlagType::ManualHide, ts(9, 2));
    hide_row.flag.trigger_source = hide.trigger_source;
    hide_row.flag.trigger_details = hide.trigger_details.to_value();
    rows.push(hide_row);

    let page = build_queue(&rows, &HashMap::new(), &ArticleTitles::default(), &week(), ts(10, 0));
    let item = &page.items[0];
    assert_eq!(item.id, "f4");
    assert_eq!(item.report_count, 3);
    assert_eq!(item.severity, Severity::High);
    assert_eq!(item.status, QueueStatus::Escalated);
    assert_eq!(item.hidden_reason.as_deref(), Some("Hidden after 3 user reports"));

    let metrics = build_metrics(
        &rows,
        &MetricsQuery {
            window: TimeWindow::Last7Days,
        },
        ts(10, 0),
    );
    assert_eq!(metrics.summary.escalated, 1);
    assert_eq!(metrics.summary.manual_report_open, 3);
    assert_eq!(metrics.severity.high, 1);
}

#[test]
fn test_submission_draft_classifies_as_triage() {
    let detectors = Detectors::from_config(&DetectionConfig::default()).unwrap();
    let text = "deals at https://a.example https://b.example https://c.example";
    let draft = run_submission_detectors(&detectors, text).unwrap();
    let decision = draft.hide.clone().unwrap();

    let mut c = comment("c1", true, decision.moderation_status);
    c.comment_text = Some(text.to_string());
    let mut stored = row("f1", &c, draft.flag_type.clone(), ts(9, 0));
    stored.flag.trigger_details = draft.trigger_details.to_value();

    let page = build_queue(&[stored], &HashMap::new(), &ArticleTitles::default(), &week(), ts(10, 0));
    assert_eq!(page.items[0].severity, Severity::Medium);
    assert_eq!(page.items[0].status, QueueStatus::Triage);
}
