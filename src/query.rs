//! Validation of raw query parameters into typed view queries.
//!
//! The engine trusts the queries it receives; everything a caller can get
//! wrong is rejected here first.

use crate::flag::{FlagType, QueueStatus, TriggerSource};
use crate::time_window::TimeWindow;
use std::collections::HashMap;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;
const QUEUE_FETCH_HEADROOM: usize = 50;
const QUEUE_FETCH_CAP: usize = 500;
const ACTIVITY_FETCH_MULTIPLIER: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("`{param}` must be an integer between {min} and {max}, got `{value}`")]
    OutOfRange {
        param: &'static str,
        value: String,
        min: usize,
        max: usize,
    },
    #[error("`{param}` has unsupported value `{value}`")]
    InvalidValue { param: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueQuery {
    pub limit: usize,
    pub offset: usize,
    pub status: Option<QueueStatus>,
    pub flag_type: Option<FlagType>,
    pub trigger_source: Option<TriggerSource>,
    pub article_slug: Option<String>,
    pub window: Option<TimeWindow>,
    pub include_resolved: bool,
}

impl Default for QueueQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            status: None,
            flag_type: None,
            trigger_source: None,
            article_slug: None,
            window: None,
            include_resolved: false,
        }
    }
}

impl QueueQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        Ok(Self {
            limit: parse_limit(params)?,
            offset: parse_bounded(params, "offset", 0, usize::MAX)?.unwrap_or(0),
            status: parse_enum(params, "status", QueueStatus::from_known)?,
            flag_type: parse_enum(params, "flagType", FlagType::from_known)?,
            trigger_source: parse_enum(params, "triggerSource", TriggerSource::from_known)?,
            article_slug: parse_slug(params)?,
            window: parse_window(params)?,
            include_resolved: params
                .get("includeResolved")
                .map(|v| matches!(v.trim(), "true" | "1"))
                .unwrap_or(false),
        })
    }

    /// Newest rows the storage layer should return for this page. Extra rows
    /// give the grouping pass sibling flags beyond the page itself.
    pub fn fetch_limit(&self) -> usize {
        self.limit
            .saturating_add(self.offset)
            .saturating_add(QUEUE_FETCH_HEADROOM)
            .min(QUEUE_FETCH_CAP)
    }

    pub fn window_or_default(&self) -> TimeWindow {
        self.window.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityQuery {
    pub limit: usize,
    /// `None` means the whole history.
    pub window: Option<TimeWindow>,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: None,
        }
    }
}

impl ActivityQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        Ok(Self {
            limit: parse_limit(params)?,
            window: parse_window(params)?,
        })
    }

    pub fn fetch_limit(&self) -> usize {
        self.limit * ACTIVITY_FETCH_MULTIPLIER
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsQuery {
    pub window: TimeWindow,
}

impl MetricsQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        Ok(Self {
            window: parse_window(params)?.unwrap_or_default(),
        })
    }
}

fn present<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_limit(params: &HashMap<String, String>) -> Result<usize, QueryError> {
    Ok(parse_bounded(params, "limit", 1, MAX_LIMIT)?.unwrap_or(DEFAULT_LIMIT))
}

fn parse_bounded(
    params: &HashMap<String, String>,
    param: &'static str,
    min: usize,
    max: usize,
) -> Result<Option<usize>, QueryError> {
    let Some(raw) = present(params, param) else {
        return Ok(None);
    };
    raw.parse::<usize>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .map(Some)
        .ok_or_else(|| QueryError::OutOfRange {
            param,
            value: raw.to_string(),
            min,
            max,
        })
}

fn parse_enum<T>(
    params: &HashMap<String, String>,
    param: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, QueryError> {
    let Some(raw) = present(params, param) else {
        return Ok(None);
    };
    parse(raw).map(Some).ok_or_else(|| QueryError::InvalidValue {
        param,
        value: raw.to_string(),
    })
}

fn parse_window(params: &HashMap<String, String>) -> Result<Option<TimeWindow>, QueryError> {
    parse_enum(params, "window", |raw| raw.parse::<TimeWindow>().ok())
}

fn parse_slug(params: &HashMap<String, String>) -> Result<Option<String>, QueryError> {
    match params.get("articleSlug") {
        None => Ok(None),
        Some(slug) if slug.trim().is_empty() => Err(QueryError::InvalidValue {
            param: "articleSlug",
            value: slug.clone(),
        }),
        Some(slug) => Ok(Some(slug.trim().to_string())),
    }
}
