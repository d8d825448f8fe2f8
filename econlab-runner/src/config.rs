//! Serializable pipeline configuration.
//!
//! Loaded from TOML. Every section and field has a default, so an empty file
//! is a valid configuration for the standard six-country, three-indicator run.

use econlab_core::data::{Backoff, RetryPolicy, TransportConfig, DEFAULT_BASE_URL};
use econlab_core::domain::YearRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    pub dataset: DatasetConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

/// Indicator service connection and retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub per_page: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub backoff: BackoffKind,
    pub retry_statuses: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Exponential,
    Fixed,
}

/// What to fetch: countries, years and the named indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub countries: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    /// Display name → API code, in column order.
    pub indicators: Vec<IndicatorSpec>,
}

/// A configured indicator: the column name used everywhere downstream and
/// the code the API knows it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub name: String,
    pub code: String,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Empty means the first configured indicator.
    pub growth_indicator: String,
    pub rolling_window: usize,
    /// Empty means the first three configured indicators.
    pub correlation_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub charts: bool,
    pub parquet: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: 20_000,
            timeout_secs: 30,
            max_retries: retry.max_retries,
            backoff_ms: 500,
            backoff: BackoffKind::Exponential,
            retry_statuses: retry.retry_statuses,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            countries: ["US", "CN", "IN", "BR", "DE", "ZA"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            start_year: 2000,
            end_year: 2024,
            indicators: vec![
                IndicatorSpec::new("GDP_per_capita", "NY.GDP.PCAP.CD"),
                IndicatorSpec::new("Unemployment_%", "SL.UEM.TOTL.ZS"),
                IndicatorSpec::new("Internet_users_%", "IT.NET.USER.ZS"),
            ],
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            growth_indicator: String::new(),
            rolling_window: 3,
            correlation_indicators: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("wb_bi_output"),
            charts: true,
            parquet: true,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.dataset.indicators.is_empty() {
            return invalid("at least one indicator is required".into());
        }
        if self.dataset.countries.is_empty() {
            return invalid("at least one country is required".into());
        }
        if self.dataset.start_year > self.dataset.end_year {
            return invalid(format!(
                "start_year {} is after end_year {}",
                self.dataset.start_year, self.dataset.end_year
            ));
        }
        if self.api.per_page == 0 {
            return invalid("api.per_page must be positive".into());
        }
        if self.analysis.rolling_window == 0 {
            return invalid("analysis.rolling_window must be positive".into());
        }

        let names = self.indicator_names();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return invalid(format!("indicator name '{name}' is configured twice"));
            }
        }
        let growth = self.growth_indicator();
        if !names.contains(&growth) {
            return invalid(format!(
                "growth_indicator '{growth}' is not a configured indicator"
            ));
        }

        let correlated = self.correlation_indicators();
        if correlated.len() != 3 {
            return invalid(format!(
                "exactly three correlation indicators are required, got {}",
                correlated.len()
            ));
        }
        if let Some(unknown) = correlated.iter().find(|c| !names.contains(c)) {
            return invalid(format!(
                "correlation indicator '{unknown}' is not a configured indicator"
            ));
        }
        Ok(())
    }

    pub fn indicator_names(&self) -> Vec<String> {
        self.dataset.indicators.iter().map(|i| i.name.clone()).collect()
    }

    pub fn year_range(&self) -> YearRange {
        YearRange::new(self.dataset.start_year, self.dataset.end_year)
    }

    /// Indicator the growth rate and rolling average are computed on.
    pub fn growth_indicator(&self) -> String {
        if self.analysis.growth_indicator.is_empty() {
            self.indicator_names().into_iter().next().unwrap_or_default()
        } else {
            self.analysis.growth_indicator.clone()
        }
    }

    /// Indicators for the correlation engine; falls back to the first three
    /// configured indicators when none are named.
    pub fn correlation_indicators(&self) -> Vec<String> {
        if self.analysis.correlation_indicators.is_empty() {
            self.indicator_names().into_iter().take(3).collect()
        } else {
            self.analysis.correlation_indicators.clone()
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        let base = Duration::from_millis(self.api.backoff_ms);
        let backoff = match self.api.backoff {
            BackoffKind::Exponential => Backoff::Exponential { base },
            BackoffKind::Fixed => Backoff::Fixed(base),
        };
        TransportConfig {
            timeout: Duration::from_secs(self.api.timeout_secs),
            retry: RetryPolicy {
                max_retries: self.api.max_retries,
                retry_statuses: self.api.retry_statuses.clone(),
                backoff,
            },
            ..TransportConfig::default()
        }
    }

    /// Computes a deterministic hash of this configuration.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.dataset.countries.len(), 6);
        assert_eq!(config.api.per_page, 20_000);
        assert_eq!(config.year_range(), YearRange::new(2000, 2024));
    }

    #[test]
    fn empty_toml_is_the_default() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn toml_roundtrip_preserves_indicator_order() {
        let mut config = PipelineConfig::default();
        config.dataset.indicators.reverse();
        let toml = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(
            parsed.indicator_names(),
            vec!["Internet_users_%", "Unemployment_%", "GDP_per_capita"]
        );
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [dataset]
            countries = ["US", "DE"]
            start_year = 2010

            [output]
            charts = false
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset.countries, vec!["US", "DE"]);
        assert_eq!(config.dataset.start_year, 2010);
        assert_eq!(config.dataset.end_year, 2024);
        assert_eq!(config.dataset.indicators.len(), 3);
        assert!(!config.output.charts);
        assert!(config.output.parquet);
    }

    #[test]
    fn unknown_growth_indicator_is_rejected() {
        let mut config = PipelineConfig::default();
        config.analysis.growth_indicator = "GDP".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("growth_indicator"));
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let err = PipelineConfig::from_toml("[dataset]\nstart_year = 2020\nend_year = 2010\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn correlation_needs_exactly_three() {
        let mut config = PipelineConfig::default();
        config.analysis.correlation_indicators =
            vec!["GDP_per_capita".into(), "Unemployment_%".into()];
        assert!(config.validate().is_err());

        config.analysis.correlation_indicators.clear();
        config.validate().unwrap();
        assert_eq!(config.correlation_indicators().len(), 3);
    }

    #[test]
    fn analysis_defaults_follow_configured_indicators() {
        let config = PipelineConfig::from_toml(
            r#"
            [[dataset.indicators]]
            name = "Population"
            code = "SP.POP.TOTL"

            [[dataset.indicators]]
            name = "Life_expectancy"
            code = "SP.DYN.LE00.IN"

            [[dataset.indicators]]
            name = "CO2_per_capita"
            code = "EN.ATM.CO2E.PC"
            "#,
        )
        .unwrap();
        assert_eq!(config.growth_indicator(), "Population");
        assert_eq!(
            config.correlation_indicators(),
            vec!["Population", "Life_expectancy", "CO2_per_capita"]
        );
    }

    #[test]
    fn default_growth_indicator_is_first_indicator() {
        let config = PipelineConfig::default();
        assert!(config.analysis.growth_indicator.is_empty());
        assert_eq!(config.growth_indicator(), "GDP_per_capita");
    }

    #[test]
    fn transport_config_maps_backoff() {
        let mut config = PipelineConfig::default();
        config.api.backoff = BackoffKind::Fixed;
        config.api.backoff_ms = 250;
        config.api.max_retries = 2;
        let t = config.transport_config();
        assert_eq!(t.retry.backoff, Backoff::Fixed(Duration::from_millis(250)));
        assert_eq!(t.retry.max_attempts(), 3);
        assert_eq!(t.timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_hash_is_deterministic() {
        let a = PipelineConfig::default();
        let mut b = a.clone();
        assert_eq!(a.config_hash(), b.config_hash());
        b.dataset.end_year = 2020;
        assert_ne!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = PipelineConfig::from_toml("[dataset\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
