use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::{canonicalizer, keywords, matcher, ranking, SimilarityWeights};
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub artifacts: ArtifactSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSettings {
    #[serde(default = "default_vocabulary_path")]
    pub vocabulary_path: PathBuf,
    #[serde(default = "default_price_model_path")]
    pub price_model_path: PathBuf,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            vocabulary_path: default_vocabulary_path(),
            price_model_path: default_price_model_path(),
        }
    }
}

fn default_vocabulary_path() -> PathBuf { PathBuf::from("data/category_vocab.json") }
fn default_price_model_path() -> PathBuf { PathBuf::from("data/price_model.json") }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    #[serde(default = "default_keyword_top_k")]
    pub keyword_top_k: usize,
    #[serde(default = "default_match_keyword_top_k")]
    pub match_keyword_top_k: usize,
    #[serde(default = "default_canonical_cutoff")]
    pub canonical_cutoff: f64,
    #[serde(default = "default_word_weight")]
    pub word_weight: f64,
    #[serde(default = "default_char_weight")]
    pub char_weight: f64,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            keyword_top_k: default_keyword_top_k(),
            match_keyword_top_k: default_match_keyword_top_k(),
            canonical_cutoff: default_canonical_cutoff(),
            word_weight: default_word_weight(),
            char_weight: default_char_weight(),
            max_features: default_max_features(),
        }
    }
}

impl MatchingSettings {
    pub fn similarity_weights(&self) -> SimilarityWeights {
        SimilarityWeights {
            word: self.word_weight,
            char: self.char_weight,
            max_features: self.max_features,
        }
    }
}

fn default_top_k() -> usize { ranking::DEFAULT_TOP_K }
fn default_max_top_k() -> usize { 100 }
fn default_keyword_top_k() -> usize { keywords::DEFAULT_TOP_K }
fn default_match_keyword_top_k() -> usize { matcher::MATCH_KEYWORDS }
fn default_canonical_cutoff() -> f64 { canonicalizer::DEFAULT_CUTOFF }
fn default_word_weight() -> f64 { 0.75 }
fn default_char_weight() -> f64 { 0.25 }
fn default_max_features() -> usize { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_category_boost")]
    pub category_boost: f64,
    #[serde(default = "default_keyword_boost")]
    pub keyword_boost: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            category_boost: default_category_boost(),
            keyword_boost: default_keyword_boost(),
        }
    }
}

impl From<&ScoringSettings> for ScoringWeights {
    fn from(s: &ScoringSettings) -> Self {
        ScoringWeights {
            category_boost: s.category_boost,
            keyword_boost: s.keyword_boost,
        }
    }
}

fn default_category_boost() -> f64 { 12.0 }
fn default_keyword_boost() -> f64 { 6.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matching() {
        let m = MatchingSettings::default();
        assert_eq!(m.top_k, 5);
        assert_eq!(m.keyword_top_k, 6);
        assert_eq!(m.match_keyword_top_k, 8);
        assert_eq!(m.canonical_cutoff, 0.62);
        let w = m.similarity_weights();
        assert_eq!(w.word, 0.75);
        assert_eq!(w.char, 0.25);
    }

    #[test]
    fn test_default_scoring() {
        let weights = ScoringWeights::from(&ScoringSettings::default());
        assert_eq!(weights.category_boost, 12.0);
        assert_eq!(weights.keyword_boost, 6.0);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"127.0.0.1\"\nport = 9000\n\n[scoring]\ncategory_boost = 20.0\n",
        )
        .unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.scoring.category_boost, 20.0);
        assert_eq!(settings.scoring.keyword_boost, 6.0);
        assert_eq!(settings.matching.top_k, 5);
    }
}
