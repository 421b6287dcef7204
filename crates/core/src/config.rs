use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TimeWindow;

/// Immutable configuration for one analysis run.
///
/// Always passed explicitly into component calls, never read from ambient
/// state, so two concurrent runs with different thresholds cannot interfere.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Window used when the caller does not request one.
    pub default_window: TimeWindow,
    /// Upper bound on each gateway fetch.
    pub gateway_timeout_secs: u64,
    pub rules: RuleThresholds,
    pub structure: StructureThresholds,
}

/// Thresholds for the usage-driven rule families.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleThresholds {
    /// Items whose order count ranks below this percentile of the active
    /// population are low-usage candidates.
    pub low_usage_percentile: f64,
    /// Abandonment rate at or above which the high-abandonment rule fires.
    pub abandonment_threshold: f64,
    /// Minimum cart activity (ordered + abandoned) before abandonment is a
    /// signal rather than noise.
    pub min_sample_size: u32,
    /// Multiple of the category median fulfillment time that counts as slow.
    pub slow_fulfillment_ratio: f64,
    /// Short descriptions below this length are flagged.
    pub min_description_chars: usize,
}

/// Thresholds for structural checks on the category tree.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureThresholds {
    pub min_items_per_category: usize,
    pub max_items_per_category: usize,
    /// Maximum tolerated distance from a root category.
    pub max_depth: u32,
    pub naming_style: NamingStyle,
    /// Trigram-similarity threshold above which two item descriptions are
    /// reported as possible duplicates.
    pub duplicate_similarity: f64,
}

/// Title convention the naming check measures against. Best-effort heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStyle {
    /// Significant words capitalized ("Hardware Requests").
    TitleCase,
    /// Leading capital only ("Hardware requests").
    SentenceCase,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_window: TimeWindow::Last90Days,
            gateway_timeout_secs: 30,
            rules: RuleThresholds::default(),
            structure: StructureThresholds::default(),
        }
    }
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            low_usage_percentile: 0.10,
            abandonment_threshold: 0.5,
            min_sample_size: 5,
            slow_fulfillment_ratio: 1.5,
            min_description_chars: 30,
        }
    }
}

impl Default for StructureThresholds {
    fn default() -> Self {
        Self {
            min_items_per_category: 1,
            max_items_per_category: 50,
            max_depth: 4,
            naming_style: NamingStyle::TitleCase,
            duplicate_similarity: 0.8,
        }
    }
}

impl std::str::FromStr for NamingStyle {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title_case" => Ok(Self::TitleCase),
            "sentence_case" => Ok(Self::SentenceCase),
            other => Err(ConfigError::Validation(format!(
                "unsupported naming style `{other}` (expected title_case|sentence_case)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Load configuration: typed defaults, then an optional TOML patch file,
    /// then `CATALENS_*` environment overrides, then fail-fast validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(analysis) = patch.analysis {
            if let Some(default_window) = analysis.default_window {
                self.default_window = default_window;
            }
            if let Some(gateway_timeout_secs) = analysis.gateway_timeout_secs {
                self.gateway_timeout_secs = gateway_timeout_secs;
            }
        }

        if let Some(rules) = patch.rules {
            if let Some(value) = rules.low_usage_percentile {
                self.rules.low_usage_percentile = value;
            }
            if let Some(value) = rules.abandonment_threshold {
                self.rules.abandonment_threshold = value;
            }
            if let Some(value) = rules.min_sample_size {
                self.rules.min_sample_size = value;
            }
            if let Some(value) = rules.slow_fulfillment_ratio {
                self.rules.slow_fulfillment_ratio = value;
            }
            if let Some(value) = rules.min_description_chars {
                self.rules.min_description_chars = value;
            }
        }

        if let Some(structure) = patch.structure {
            if let Some(value) = structure.min_items_per_category {
                self.structure.min_items_per_category = value;
            }
            if let Some(value) = structure.max_items_per_category {
                self.structure.max_items_per_category = value;
            }
            if let Some(value) = structure.max_depth {
                self.structure.max_depth = value;
            }
            if let Some(value) = structure.naming_style {
                self.structure.naming_style = value;
            }
            if let Some(value) = structure.duplicate_similarity {
                self.structure.duplicate_similarity = value;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CATALENS_DEFAULT_WINDOW") {
            self.default_window = value.parse()?;
        }
        if let Some(value) = read_env("CATALENS_GATEWAY_TIMEOUT_SECS") {
            self.gateway_timeout_secs = parse_u64("CATALENS_GATEWAY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CATALENS_LOW_USAGE_PERCENTILE") {
            self.rules.low_usage_percentile = parse_f64("CATALENS_LOW_USAGE_PERCENTILE", &value)?;
        }
        if let Some(value) = read_env("CATALENS_ABANDONMENT_THRESHOLD") {
            self.rules.abandonment_threshold = parse_f64("CATALENS_ABANDONMENT_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("CATALENS_MIN_SAMPLE_SIZE") {
            self.rules.min_sample_size = parse_u32("CATALENS_MIN_SAMPLE_SIZE", &value)?;
        }
        if let Some(value) = read_env("CATALENS_SLOW_FULFILLMENT_RATIO") {
            self.rules.slow_fulfillment_ratio =
                parse_f64("CATALENS_SLOW_FULFILLMENT_RATIO", &value)?;
        }
        if let Some(value) = read_env("CATALENS_MIN_DESCRIPTION_CHARS") {
            self.rules.min_description_chars =
                parse_usize("CATALENS_MIN_DESCRIPTION_CHARS", &value)?;
        }
        if let Some(value) = read_env("CATALENS_MAX_DEPTH") {
            self.structure.max_depth = parse_u32("CATALENS_MAX_DEPTH", &value)?;
        }
        if let Some(value) = read_env("CATALENS_DUPLICATE_SIMILARITY") {
            self.structure.duplicate_similarity =
                parse_f64("CATALENS_DUPLICATE_SIMILARITY", &value)?;
        }
        if let Some(value) = read_env("CATALENS_NAMING_STYLE") {
            self.structure.naming_style = value.parse()?;
        }
        Ok(())
    }

    /// Fail-fast validation. Runs before any computation; every message names
    /// the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway_timeout_secs == 0 || self.gateway_timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "gateway_timeout_secs must be in range 1..=300".to_string(),
            ));
        }

        let rules = &self.rules;
        if !(rules.low_usage_percentile > 0.0 && rules.low_usage_percentile < 1.0) {
            return Err(ConfigError::Validation(
                "rules.low_usage_percentile must be strictly between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&rules.abandonment_threshold) {
            return Err(ConfigError::Validation(
                "rules.abandonment_threshold must be in range 0..=1".to_string(),
            ));
        }
        if rules.min_sample_size == 0 {
            return Err(ConfigError::Validation(
                "rules.min_sample_size must be greater than zero".to_string(),
            ));
        }
        if rules.slow_fulfillment_ratio <= 0.0 || !rules.slow_fulfillment_ratio.is_finite() {
            return Err(ConfigError::Validation(
                "rules.slow_fulfillment_ratio must be a positive finite number".to_string(),
            ));
        }
        if rules.min_description_chars == 0 {
            return Err(ConfigError::Validation(
                "rules.min_description_chars must be greater than zero".to_string(),
            ));
        }

        let structure = &self.structure;
        if structure.min_items_per_category > structure.max_items_per_category {
            return Err(ConfigError::Validation(format!(
                "structure.min_items_per_category ({}) must not exceed structure.max_items_per_category ({})",
                structure.min_items_per_category, structure.max_items_per_category
            )));
        }
        if structure.max_depth == 0 {
            return Err(ConfigError::Validation(
                "structure.max_depth must be greater than zero".to_string(),
            ));
        }
        if !(structure.duplicate_similarity > 0.0 && structure.duplicate_similarity <= 1.0) {
            return Err(ConfigError::Validation(
                "structure.duplicate_similarity must be in range (0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("catalens.toml"), PathBuf::from("config/catalens.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    analysis: Option<AnalysisPatch>,
    rules: Option<RulesPatch>,
    structure: Option<StructurePatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    default_window: Option<TimeWindow>,
    gateway_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    low_usage_percentile: Option<f64>,
    abandonment_threshold: Option<f64>,
    min_sample_size: Option<u32>,
    slow_fulfillment_ratio: Option<f64>,
    min_description_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct StructurePatch {
    min_items_per_category: Option<usize>,
    max_items_per_category: Option<usize>,
    max_depth: Option<u32>,
    naming_style: Option<NamingStyle>,
    duplicate_similarity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_validate() {
        AnalysisConfig::default().validate().expect("defaults must be valid");
    }

    #[test]
    fn inverted_size_band_fails_fast_naming_the_fields() {
        let mut config = AnalysisConfig::default();
        config.structure.min_items_per_category = 60;
        config.structure.max_items_per_category = 50;

        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("min_items_per_category"));
        assert!(error.to_string().contains("max_items_per_category"));
    }

    #[test]
    fn out_of_range_percentile_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.rules.low_usage_percentile = 1.0;
        assert!(config.validate().is_err());

        config.rules.low_usage_percentile = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalens.toml");
        fs::write(
            &path,
            r#"
[analysis]
default_window = "last_30_days"

[rules]
abandonment_threshold = 0.7
min_sample_size = 10

[structure]
max_depth = 6
"#,
        )
        .expect("write config");

        let config = AnalysisConfig::load(LoadOptions { config_path: Some(path) })
            .expect("config should load");

        assert_eq!(config.default_window, TimeWindow::Last30Days);
        assert_eq!(config.rules.abandonment_threshold, 0.7);
        assert_eq!(config.rules.min_sample_size, 10);
        assert_eq!(config.structure.max_depth, 6);
        // Untouched fields keep their defaults.
        assert_eq!(config.structure.max_items_per_category, 50);
    }

    #[test]
    fn naming_style_parses_from_snake_case() {
        assert_eq!("title_case".parse::<NamingStyle>().unwrap(), NamingStyle::TitleCase);
        assert!("camel_case".parse::<NamingStyle>().is_err());
    }
}
