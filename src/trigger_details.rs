//! Typed view over the open `triggerDetails` payload.
//!
//! Storage treats the payload as an untyped JSON object. Readers go through
//! `TriggerDetails::parse`, which downcasts each known key and substitutes
//! `None` for anything missing or of the wrong JSON type.

use crate::flag::{Flag, FlagType};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerDetails {
    BannedPhrase {
        phrase: Option<String>,
    },
    LinkSpam {
        link_count: Option<u64>,
    },
    DislikeThreshold {
        like_count: Option<u64>,
        dislike_count: Option<u64>,
    },
    ManualReport {
        reporter_email: Option<String>,
        reporter_username: Option<String>,
        reason: Option<String>,
    },
    ManualHide {
        reason: Option<String>,
        report_count: Option<u64>,
        threshold: Option<u64>,
    },
    Other,
}

impl TriggerDetails {
    pub fn parse(flag_type: &FlagType, value: &Value) -> Self {
        match flag_type {
            FlagType::AutoBannedPhrase => TriggerDetails::BannedPhrase {
                phrase: string_field(value, "bannedPhrase"),
            },
            FlagType::AutoLinkSpam => TriggerDetails::LinkSpam {
                link_count: count_field(value, "linkCount"),
            },
            FlagType::AutoDislikeThreshold => TriggerDetails::DislikeThreshold {
                like_count: count_field(value, "likeCount"),
                dislike_count: count_field(value, "dislikeCount"),
            },
            FlagType::ManualReport => TriggerDetails::ManualReport {
                reporter_email: string_field(value, "reporterEmail"),
                reporter_username: string_field(value, "reporterUsername"),
                reason: string_field(value, "reason"),
            },
            FlagType::ManualHide => TriggerDetails::ManualHide {
                reason: string_field(value, "reason"),
                report_count: count_field(value, "reportCount"),
                threshold: count_field(value, "threshold"),
            },
            FlagType::Unknown(_) => TriggerDetails::Other,
        }
    }

    /// Typed details of a stored flag.
    pub fn of(flag: &Flag) -> Self {
        Self::parse(&flag.flag_type, &flag.trigger_details)
    }

    /// Render back to the wire object. `None` fields are omitted.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            TriggerDetails::BannedPhrase { phrase } => {
                insert_opt(&mut map, "bannedPhrase", phrase.clone().map(Value::from));
            }
            TriggerDetails::LinkSpam { link_count } => {
                insert_opt(&mut map, "linkCount", link_count.map(Value::from));
            }
            TriggerDetails::DislikeThreshold {
                like_count,
                dislike_count,
            } => {
                insert_opt(&mut map, "likeCount", like_count.map(Value::from));
                insert_opt(&mut map, "dislikeCount", dislike_count.map(Value::from));
            }
            TriggerDetails::ManualReport {
                reporter_email,
                reporter_username,
                reason,
            } => {
                insert_opt(&mut map, "reporterEmail", reporter_email.clone().map(Value::from));
                insert_opt(
                    &mut map,
                    "reporterUsername",
                    reporter_username.clone().map(Value::from),
                );
                insert_opt(&mut map, "reason", reason.clone().map(Value::from));
            }
            TriggerDetails::ManualHide {
                reason,
                report_count,
                threshold,
            } => {
                insert_opt(&mut map, "reason", reason.clone().map(Value::from));
                insert_opt(&mut map, "reportCount", report_count.map(Value::from));
                insert_opt(&mut map, "threshold", threshold.map(Value::from));
            }
            TriggerDetails::Other => {}
        }
        Value::Object(map)
    }
}

impl Serialize for TriggerDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

/// String value of `key`, or `None` when the payload is not an object or the
/// value is not a string.
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

/// Non-negative count stored under `key`. Floats are truncated; negative or
/// non-numeric values yield `None`.
pub fn count_field(value: &Value, key: &str) -> Option<u64> {
    let raw = value.get(key)?;
    if let Some(count) = raw.as_u64() {
        return Some(count);
    }
    raw.as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.trunc() as u64)
}

/// Who resolved the flag, when the resolving collaborator recorded it.
pub fn resolved_by(value: &Value) -> Option<String> {
    string_field(value, "resolvedBy")
}
