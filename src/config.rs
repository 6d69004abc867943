use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_output_dir() -> String {
    ".".into()
}

fn default_provider_name() -> String {
    "yahoo".into()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_window_size() -> usize {
    5
}

fn default_rsi_window() -> usize {
    14
}

fn default_macd_short() -> usize {
    12
}

fn default_macd_long() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_threshold_percent() -> f64 {
    5.0
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Accepted values: `"yahoo"` | `"csv"`
    #[serde(default = "default_provider_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    /// Input file for the `csv` provider.
    pub csv_path: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            requests_per_second: default_requests_per_second(),
            csv_path: None,
        }
    }
}

/// Indicator parameters and the fluctuation alert threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    #[serde(default = "default_macd_short")]
    pub macd_short: usize,
    #[serde(default = "default_macd_long")]
    pub macd_long: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_threshold_percent")]
    pub threshold_percent: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            rsi_window: default_rsi_window(),
            macd_short: default_macd_short(),
            macd_long: default_macd_long(),
            macd_signal: default_macd_signal(),
            threshold_percent: default_threshold_percent(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];
const VALID_PROVIDERS: &[&str] = &["yahoo", "csv"];

pub fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_provider(config)?;
    validate_analysis(config)?;
    Ok(())
}

fn validation_error(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&config.general.log_format.as_str()) {
        return Err(validation_error(format!(
            "general.log_format \"{}\" is not valid",
            config.general.log_format
        )));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let provider = &config.provider;
    if !VALID_PROVIDERS.contains(&provider.name.as_str()) {
        return Err(validation_error(format!(
            "provider.name \"{}\" is not valid",
            provider.name
        )));
    }

    if provider.name == "csv" && provider.csv_path.is_none() {
        return Err(validation_error(
            "provider.csv_path is required for provider \"csv\"".into(),
        ));
    }

    if provider.requests_per_second == 0 {
        return Err(validation_error(
            "provider.requests_per_second must be > 0".into(),
        ));
    }
    Ok(())
}

fn validate_analysis(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let analysis = &config.analysis;
    let spans = [
        ("macd_short", analysis.macd_short),
        ("macd_long", analysis.macd_long),
        ("macd_signal", analysis.macd_signal),
    ];
    for (name, span) in spans {
        if span == 0 {
            return Err(validation_error(format!("analysis.{name} must be > 0")));
        }
    }

    if !analysis.threshold_percent.is_finite() {
        return Err(validation_error(
            "analysis.threshold_percent must be a finite number".into(),
        ));
    }
    Ok(())
}
