use super::{DetectionError, FlagDraft, HideDecision};
use crate::flag::FlagType;
use crate::trigger_details::TriggerDetails;
use regex::Regex;

/// `\b` only holds next to a word character, so symbol edges such as the
/// `+` in `18+` are left unanchored.
fn edge_boundary(edge: Option<char>) -> &'static str {
    match edge {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    }
}

pub struct BannedPhraseDetector {
    patterns: Vec<(String, Regex)>,
}

impl BannedPhraseDetector {
    /// Compile each phrase into a case-insensitive pattern, word-bounded on
    /// each side that starts or ends with a word character. Blank phrases
    /// are ignored.
    pub fn new(phrases: &[String]) -> Result<Self, DetectionError> {
        let mut patterns = Vec::with_capacity(phrases.len());
        for phrase in phrases.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let pattern = format!(
                r"(?i){}{}{}",
                edge_boundary(phrase.chars().next()),
                regex::escape(phrase),
                edge_boundary(phrase.chars().last())
            );
            let regex = Regex::new(&pattern).map_err(|source| DetectionError::InvalidPhrase {
                phrase: phrase.to_string(),
                source,
            })?;
            patterns.push((phrase.to_string(), regex));
        }
        Ok(Self { patterns })
    }

    /// First configured phrase found in `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(phrase, _)| phrase.as_str())
    }

    pub fn check(&self, text: &str) -> Option<FlagDraft> {
        let phrase = self.find(text)?;
        log::info!("Banned phrase matched: {phrase}");
        Some(FlagDraft::system(
            FlagType::AutoBannedPhrase,
            TriggerDetails::BannedPhrase {
                phrase: Some(phrase.to_string()),
            },
            Some(HideDecision::auto(format!("Banned phrase: {phrase}"))),
        ))
    }
}
