use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub title_cache: TitleCacheConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Matched case-insensitively on word boundaries.
    #[serde(default)]
    pub banned_phrases: Vec<String>,
    #[serde(default)]
    pub link_spam: LinkSpamConfig,
    #[serde(default)]
    pub dislike_threshold: DislikeThresholdConfig,
    /// Unique reporters needed to hide a comment pending review.
    #[serde(default = "default_report_threshold")]
    pub report_threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpamConfig {
    pub enabled: bool,
    /// Comments with more links than this are hidden.
    pub max_links: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DislikeThresholdConfig {
    pub enabled: bool,
    pub min_dislikes: u32,
    /// Dislikes must be at least `ratio` times the likes.
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCacheConfig {
    pub max_entries: u64,
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_report_threshold() -> usize {
    3
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            banned_phrases: vec![
                "buy followers".to_string(),
                "work from home and earn".to_string(),
                "crypto giveaway".to_string(),
            ],
            link_spam: LinkSpamConfig::default(),
            dislike_threshold: DislikeThresholdConfig::default(),
            report_threshold: default_report_threshold(),
        }
    }
}

impl Default for LinkSpamConfig {
    fn default() -> Self {
        LinkSpamConfig {
            enabled: true,
            max_links: 2,
        }
    }
}

impl Default for DislikeThresholdConfig {
    fn default() -> Self {
        DislikeThresholdConfig {
            enabled: true,
            min_dislikes: 5,
            ratio: 2.0,
        }
    }
}

impl Default for TitleCacheConfig {
    fn default() -> Self {
        TitleCacheConfig {
            max_entries: 1_000,
            ttl_seconds: Some(3_600),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            detection: DetectionConfig::default(),
            title_cache: TitleCacheConfig::default(),
            logging: Some(LoggingConfig {
                level: "info".to_string(),
            }),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: EngineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.detection.report_threshold > 0,
            "detection.report_threshold must be at least 1"
        );
        ensure!(
            self.detection.dislike_threshold.ratio.is_finite()
                && self.detection.dislike_threshold.ratio >= 0.0,
            "detection.dislike_threshold.ratio must be a non-negative number"
        );
        ensure!(
            self.title_cache.max_entries > 0,
            "title_cache.max_entries must be at least 1"
        );
        ensure!(
            self.detection
                .banned_phrases
                .iter()
                .all(|phrase| !phrase.trim().is_empty()),
            "detection.banned_phrases must not contain empty phrases"
        );
        Ok(())
    }
}
