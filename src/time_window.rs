use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Look-back windows offered by the moderation surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time window `{0}` (expected 24h, 7d, 30d or 90d)")]
pub struct InvalidTimeWindow(pub String);

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::Last24Hours,
        TimeWindow::Last7Days,
        TimeWindow::Last30Days,
        TimeWindow::Last90Days,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Last24Hours => "24h",
            TimeWindow::Last7Days => "7d",
            TimeWindow::Last30Days => "30d",
            TimeWindow::Last90Days => "90d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::Last24Hours => "Last 24 hours",
            TimeWindow::Last7Days => "Last 7 days",
            TimeWindow::Last30Days => "Last 30 days",
            TimeWindow::Last90Days => "Last 90 days",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Last24Hours => Duration::hours(24),
            TimeWindow::Last7Days => Duration::days(7),
            TimeWindow::Last30Days => Duration::days(30),
            TimeWindow::Last90Days => Duration::days(90),
        }
    }

    /// Lenient parse: missing or unrecognised values fall back to `24h`.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }

    pub fn bounds(&self, now: DateTime<Utc>) -> WindowBounds {
        WindowBounds {
            value: *self,
            label: self.label().to_string(),
            start: self.start(now),
            end: now,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = InvalidTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| InvalidTimeWindow(s.to_string()))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved window: `[start, end]` with `end` being the evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowBounds {
    pub value: TimeWindow,
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WindowBounds {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_known_windows() {
        assert_eq!("7d".parse::<TimeWindow>(), Ok(TimeWindow::Last7Days));
        assert_eq!("90d".parse::<TimeWindow>(), Ok(TimeWindow::Last90Days));
        assert!("1y".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_invalid_window_defaults_to_24h() {
        assert_eq!(TimeWindow::parse_or_default(None), TimeWindow::Last24Hours);
        assert_eq!(TimeWindow::parse_or_default(Some("2w")), TimeWindow::Last24Hours);
        assert_eq!(TimeWindow::parse_or_default(Some("30d")), TimeWindow::Last30Days);
    }

    #[test]
    fn test_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let bounds = TimeWindow::Last30Days.bounds(now);
        assert_eq!(bounds.start, Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap());
        assert_eq!(bounds.end, now);
        assert_eq!(bounds.label, "Last 30 days");
        assert!(bounds.contains(bounds.start));
        assert!(!bounds.contains(bounds.start - Duration::milliseconds(1)));
    }

    #[test]
    fn test_serializes_as_wire_value() {
        assert_eq!(
            serde_json::to_string(&TimeWindow::Last7Days).unwrap(),
            "\"7d\""
        );
    }
}
