use super::{DetectionError, FlagDraft, HideDecision};
use crate::config::LinkSpamConfig;
use crate::flag::FlagType;
use crate::trigger_details::TriggerDetails;
use regex::Regex;
use url::Url;

pub struct LinkSpamDetector {
    max_links: usize,
    link_regex: Regex,
}

impl LinkSpamDetector {
    pub fn new(config: &LinkSpamConfig) -> Result<Self, DetectionError> {
        Ok(Self {
            max_links: config.max_links,
            link_regex: Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'()\[\]]+"#)?,
        })
    }

    /// Number of links in `text` that parse as URLs with a host.
    pub fn count_links(&self, text: &str) -> usize {
        self.link_regex
            .find_iter(text)
            .filter(|m| parse_link(m.as_str()).is_some())
            .count()
    }

    pub fn check(&self, text: &str) -> Option<FlagDraft> {
        let link_count = self.count_links(text);
        if link_count <= self.max_links {
            return None;
        }

        log::info!("Link spam: {} links (max {})", link_count, self.max_links);
        Some(FlagDraft::system(
            FlagType::AutoLinkSpam,
            TriggerDetails::LinkSpam {
                link_count: Some(link_count as u64),
            },
            Some(HideDecision::auto(format!("Contains {link_count} links"))),
        ))
    }
}

fn parse_link(candidate: &str) -> Option<Url> {
    let candidate = candidate.trim_end_matches(['.', ',', ';', ':', '!', '?']);
    let parsed = if candidate.to_ascii_lowercase().starts_with("www.") {
        Url::parse(&format!("http://{candidate}"))
    } else {
        Url::parse(candidate)
    };
    parsed.ok().filter(|url| url.host_str().is_some_and(|host| !host.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(max_links: usize) -> LinkSpamDetector {
        LinkSpamDetector::new(&LinkSpamConfig {
            enabled: true,
            max_links,
        })
        .unwrap()
    }

    #[test]
    fn test_count_links() {
        let text = "Read https://example.com/a, then WWW.example.org. Also http://x.test!";
        assert_eq!(detector(2).count_links(text), 3);
        assert_eq!(detector(2).count_links("no links, just www and http"), 0);
    }

    #[test]
    fn test_only_above_max_triggers() {
        let two = "https://a.example https://b.example";
        let three = "https://a.example https://b.example https://c.example";
        assert!(detector(2).check(two).is_none());

        let draft = detector(2).check(three).unwrap();
        assert_eq!(draft.flag_type, FlagType::AutoLinkSpam);
        assert_eq!(
            draft.trigger_details,
            TriggerDetails::LinkSpam {
                link_count: Some(3)
            }
        );
    }

    #[test]
    fn test_hostless_links_ignored() {
        assert_eq!(detector(0).count_links("http:// broken"), 0);
        assert!(detector(0).check("http:// broken").is_none());
    }
}
