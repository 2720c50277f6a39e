//! Detectors that propose new flags. They never write anything: the caller
//! persists the draft and applies the visibility change it carries.

pub mod banned_phrase;
pub mod dislike_threshold;
pub mod link_spam;
pub mod manual_report;

use crate::config::DetectionConfig;
use crate::flag::{FlagType, ModerationStatus, TriggerSource};
use crate::trigger_details::TriggerDetails;
use serde::Serialize;

use banned_phrase::BannedPhraseDetector;
use dislike_threshold::DislikeThresholdDetector;
use link_spam::LinkSpamDetector;
use manual_report::ReportEvaluator;

pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("invalid banned phrase `{phrase}`: {source}")]
    InvalidPhrase {
        phrase: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid link pattern: {0}")]
    LinkPattern(#[from] regex::Error),
}

/// Visibility change the caller should apply together with the flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HideDecision {
    pub moderation_status: ModerationStatus,
    pub hidden_reason: String,
}

impl HideDecision {
    pub fn auto(reason: impl Into<String>) -> Self {
        Self {
            moderation_status: ModerationStatus::AutoHidden,
            hidden_reason: reason.into(),
        }
    }

    pub fn manual(reason: impl Into<String>) -> Self {
        Self {
            moderation_status: ModerationStatus::ManualHidden,
            hidden_reason: reason.into(),
        }
    }
}

/// A flag that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDraft {
    pub flag_type: FlagType,
    pub trigger_source: TriggerSource,
    pub trigger_details: TriggerDetails,
    pub last_touched_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide: Option<HideDecision>,
}

impl FlagDraft {
    /// Draft raised by an automatic detector.
    pub fn system(
        flag_type: FlagType,
        trigger_details: TriggerDetails,
        hide: Option<HideDecision>,
    ) -> Self {
        Self {
            flag_type,
            trigger_source: TriggerSource::System,
            trigger_details,
            last_touched_by: SYSTEM_ACTOR.to_string(),
            hide,
        }
    }
}

/// All detectors built from one `DetectionConfig`.
pub struct Detectors {
    pub banned_phrase: BannedPhraseDetector,
    pub link_spam: Option<LinkSpamDetector>,
    pub dislike_threshold: Option<DislikeThresholdDetector>,
    pub reports: ReportEvaluator,
}

impl Detectors {
    pub fn from_config(config: &DetectionConfig) -> Result<Self, DetectionError> {
        let link_spam = if config.link_spam.enabled {
            Some(LinkSpamDetector::new(&config.link_spam)?)
        } else {
            None
        };
        let dislike_threshold = config
            .dislike_threshold
            .enabled
            .then(|| DislikeThresholdDetector::new(&config.dislike_threshold));

        log::debug!(
            "Detectors ready: {} banned phrases, link spam {}, dislike threshold {}",
            config.banned_phrases.len(),
            if link_spam.is_some() { "on" } else { "off" },
            if dislike_threshold.is_some() { "on" } else { "off" },
        );

        Ok(Self {
            banned_phrase: BannedPhraseDetector::new(&config.banned_phrases)?,
            link_spam,
            dislike_threshold,
            reports: ReportEvaluator::new(config.report_threshold),
        })
    }
}

/// Run the detectors that apply when a comment is submitted, most severe
/// first, and return the first draft raised.
pub fn run_submission_detectors(detectors: &Detectors, comment_text: &str) -> Option<FlagDraft> {
    if let Some(draft) = detectors.banned_phrase.check(comment_text) {
        return Some(draft);
    }
    detectors
        .link_spam
        .as_ref()
        .and_then(|detector| detector.check(comment_text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detectors() -> Detectors {
        Detectors::from_config(&DetectionConfig::default()).unwrap()
    }

    #[test]
    fn test_banned_phrase_runs_before_link_spam() {
        let text = "crypto giveaway at https://a.example https://b.example https://c.example";
        let draft = run_submission_detectors(&detectors(), text).unwrap();
        assert_eq!(draft.flag_type, FlagType::AutoBannedPhrase);
        assert_eq!(draft.trigger_source, TriggerSource::System);
        assert_eq!(draft.last_touched_by, SYSTEM_ACTOR);
    }

    #[test]
    fn test_link_spam_when_no_phrase() {
        let text = "see https://a.example and https://b.example and www.c.example";
        let draft = run_submission_detectors(&detectors(), text).unwrap();
        assert_eq!(draft.flag_type, FlagType::AutoLinkSpam);
        assert_eq!(
            draft.trigger_details,
            TriggerDetails::LinkSpam {
                link_count: Some(3)
            }
        );
        assert_eq!(
            draft.hide.map(|h| h.moderation_status),
            Some(ModerationStatus::AutoHidden)
        );
    }

    #[test]
    fn test_clean_comment_passes() {
        assert!(run_submission_detectors(&detectors(), "A thoughtful reply.").is_none());
    }

    #[test]
    fn test_disabled_link_spam() {
        let mut config = DetectionConfig::default();
        config.link_spam.enabled = false;
        config.dislike_threshold.enabled = false;
        let detectors = Detectors::from_config(&config).unwrap();
        assert!(detectors.link_spam.is_none());
        assert!(detectors.dislike_threshold.is_none());

        let text = "https://a.example https://b.example https://c.example";
        assert!(run_submission_detectors(&detectors, text).is_none());
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let draft = FlagDraft::system(
            FlagType::AutoLinkSpam,
            TriggerDetails::LinkSpam {
                link_count: Some(4),
            },
            None,
        );
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["flagType"], "auto_link_spam");
        assert_eq!(value["triggerSource"], "system");
        assert_eq!(value["triggerDetails"]["linkCount"], 4);
        assert!(value.get("hide").is_none());
    }
}
