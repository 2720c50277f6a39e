//! Flag, comment and reaction records as supplied by the storage layer.
//!
//! Every type here mirrors a row shape of the collaborating backend. Enum
//! values keep their snake_case wire names so rows can be deserialized
//! straight from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of moderation signal a flag records.
///
/// Unrecognised wire values are preserved in `Unknown` so classification
/// stays total: they fall back to default severity and priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlagType {
    AutoDislikeThreshold,
    AutoBannedPhrase,
    AutoLinkSpam,
    ManualReport,
    ManualHide,
    Unknown(String),
}

impl FlagType {
    /// The five flag types the detectors and moderators emit.
    pub const KNOWN: [FlagType; 5] = [
        FlagType::AutoDislikeThreshold,
        FlagType::AutoBannedPhrase,
        FlagType::AutoLinkSpam,
        FlagType::ManualReport,
        FlagType::ManualHide,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FlagType::AutoDislikeThreshold => "auto_dislike_threshold",
            FlagType::AutoBannedPhrase => "auto_banned_phrase",
            FlagType::AutoLinkSpam => "auto_link_spam",
            FlagType::ManualReport => "manual_report",
            FlagType::ManualHide => "manual_hide",
            FlagType::Unknown(value) => value,
        }
    }

    /// Parse only the known wire values; used where input must be validated.
    pub fn from_known(value: &str) -> Option<Self> {
        Self::KNOWN.iter().find(|t| t.as_str() == value).cloned()
    }

    /// Raised by an automatic detector rather than a person.
    pub fn is_automatic(&self) -> bool {
        self.as_str().starts_with("auto_")
    }
}

impl From<String> for FlagType {
    fn from(value: String) -> Self {
        Self::from_known(&value).unwrap_or(FlagType::Unknown(value))
    }
}

impl From<FlagType> for String {
    fn from(value: FlagType) -> Self {
        match value {
            FlagType::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    System,
    User,
    Moderator,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::System => "system",
            TriggerSource::User => "user",
            TriggerSource::Moderator => "moderator",
        }
    }

    pub fn from_known(value: &str) -> Option<Self> {
        match value {
            "system" => Some(TriggerSource::System),
            "user" => Some(TriggerSource::User),
            "moderator" => Some(TriggerSource::Moderator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
    Open,
    Resolved,
}

/// Visibility state of a comment, owned by the comment store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModerationStatus {
    #[default]
    Visible,
    AutoHidden,
    ManualHidden,
    Resolved,
    Other(String),
}

impl ModerationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ModerationStatus::Visible => "visible",
            ModerationStatus::AutoHidden => "auto_hidden",
            ModerationStatus::ManualHidden => "manual_hidden",
            ModerationStatus::Resolved => "resolved",
            ModerationStatus::Other(value) => value,
        }
    }
}

impl From<String> for ModerationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "visible" => ModerationStatus::Visible,
            "auto_hidden" => ModerationStatus::AutoHidden,
            "manual_hidden" => ModerationStatus::ManualHidden,
            "resolved" => ModerationStatus::Resolved,
            _ => ModerationStatus::Other(value),
        }
    }
}

impl From<ModerationStatus> for String {
    fn from(value: ModerationStatus) -> Self {
        match value {
            ModerationStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Urgency tier. Ordered so the maximum of several severities is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Open,
    Triage,
    Escalated,
    Resolved,
}

impl QueueStatus {
    pub fn from_known(value: &str) -> Option<Self> {
        match value {
            "open" => Some(QueueStatus::Open),
            "triage" => Some(QueueStatus::Triage),
            "escalated" => Some(QueueStatus::Escalated),
            "resolved" => Some(QueueStatus::Resolved),
            _ => None,
        }
    }
}

/// An immutable moderation event against one comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub id: String,
    pub comment_id: String,
    pub flag_type: FlagType,
    pub trigger_source: TriggerSource,
    pub status: FlagStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Open payload whose shape depends on `flag_type`; see `TriggerDetails`.
    #[serde(default)]
    pub trigger_details: serde_json::Value,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub last_touched_by: Option<String>,
}

impl Flag {
    pub fn is_open(&self) -> bool {
        self.status == FlagStatus::Open
    }
}

/// The comment fields joined onto each flag row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnapshot {
    pub id: String,
    pub article_slug: String,
    pub username: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub comment_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default)]
    pub hidden_reason: Option<String>,
    #[serde(default)]
    pub hidden_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moderation_status: Option<ModerationStatus>,
}

impl CommentSnapshot {
    pub fn hidden(&self) -> bool {
        self.is_hidden.unwrap_or(false)
    }

    pub fn status(&self) -> ModerationStatus {
        self.moderation_status.clone().unwrap_or_default()
    }
}

/// A flag joined with its comment. The join may be missing when the comment
/// was deleted; such rows still count towards metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRow {
    #[serde(flatten)]
    pub flag: Flag,
    #[serde(default)]
    pub comment: Option<CommentSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRow {
    pub comment_id: String,
    pub reaction_type: ReactionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCounts {
    pub like_count: u32,
    pub dislike_count: u32,
}

/// Fold individual reactions into per-comment counts.
pub fn count_reactions(rows: &[ReactionRow]) -> HashMap<String, ReactionCounts> {
    let mut counts: HashMap<String, ReactionCounts> = HashMap::new();
    for row in rows {
        let entry = counts.entry(row.comment_id.clone()).or_default();
        match row.reaction_type {
            ReactionType::Like => entry.like_count += 1,
            ReactionType::Dislike => entry.dislike_count += 1,
        }
    }
    counts
}
