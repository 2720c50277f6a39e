//! Article title lookup with a caller-owned read-through cache.

use crate::config::TitleCacheConfig;
use crate::text::humanize_slug;
use moka::sync::Cache;
use std::collections::HashMap;
use std::time::Duration;

pub const UNKNOWN_ARTICLE_TITLE: &str = "Unknown article";

/// Article store seam: resolves a slug to its title, if the article exists.
pub trait TitleLookup: Send + Sync {
    fn title_for(&self, slug: &str) -> Option<String>;
}

impl TitleLookup for HashMap<String, String> {
    fn title_for(&self, slug: &str) -> Option<String> {
        self.get(slug).cloned()
    }
}

/// Read-through cache in front of a `TitleLookup`. Bounded by entry count and
/// optionally by age, so titles edited upstream are eventually picked up.
pub struct ArticleTitles {
    lookup: Box<dyn TitleLookup>,
    cache: Cache<String, String>,
}

impl ArticleTitles {
    pub fn new(lookup: impl TitleLookup + 'static, config: &TitleCacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_entries);
        if let Some(ttl) = config.ttl_seconds {
            builder = builder.time_to_live(Duration::from_secs(ttl));
        }

        Self {
            lookup: Box::new(lookup),
            cache: builder.build(),
        }
    }

    pub fn from_map(titles: HashMap<String, String>) -> Self {
        Self::new(titles, &TitleCacheConfig::default())
    }

    /// Title for `slug`, falling back to the humanised slug when the article
    /// is unknown or has a blank title.
    pub fn title(&self, slug: Option<&str>) -> String {
        let slug = match slug {
            Some(slug) if !slug.is_empty() => slug,
            _ => return UNKNOWN_ARTICLE_TITLE.to_string(),
        };

        self.cache
            .get_with(slug.to_string(), || self.resolve(slug))
    }

    fn resolve(&self, slug: &str) -> String {
        match self.lookup.title_for(slug) {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => {
                log::debug!("No title for article {slug}, using slug");
                humanize_slug(slug)
            }
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for ArticleTitles {
    fn default() -> Self {
        Self::from_map(HashMap::new())
    }
}
