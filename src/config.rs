use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Interval, Span};
use crate::runner::Universe;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_data_dir() -> String {
    "./data".into()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_universe_kind() -> String {
    "top_movers".into()
}

fn default_delay_ms() -> u64 {
    500
}

fn default_intraday_interval() -> String {
    "5minute".into()
}

fn default_intraday_span() -> String {
    "day".into()
}

fn default_trend_interval() -> String {
    "day".into()
}

fn default_trend_span() -> String {
    "year".into()
}

fn default_output_format() -> String {
    "table".into()
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub golden_cross: GoldenCrossConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Directory snapshot the file source reads from.
#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UniverseConfig {
    /// Accepted values: `"top_movers"` | `"watchlist"` | `"symbols"`
    #[serde(default = "default_universe_kind")]
    pub kind: String,
    /// Display name of the watchlist, required for `kind = "watchlist"`.
    pub watchlist: Option<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            kind: default_universe_kind(),
            watchlist: None,
            symbols: Vec::new(),
        }
    }
}

impl UniverseConfig {
    pub fn universe(&self) -> Result<Universe, Report<ConfigError>> {
        match self.kind.as_str() {
            "top_movers" => Ok(Universe::TopMovers),
            "watchlist" => match self.watchlist.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => Ok(Universe::Watchlist(name.to_owned())),
                _ => Err(Report::new(ConfigError::Validation {
                    field: "universe.watchlist is required for kind \"watchlist\"".into(),
                })),
            },
            "symbols" => {
                let symbols: Vec<String> = self
                    .symbols
                    .iter()
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                if symbols.is_empty() {
                    return Err(Report::new(ConfigError::Validation {
                        field: "universe.symbols must not be empty for kind \"symbols\"".into(),
                    }));
                }
                Ok(Universe::Symbols(symbols))
            }
            other => Err(Report::new(ConfigError::Validation {
                field: format!("universe.kind \"{other}\" is not valid"),
            })),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchConfig {
    /// Minimum delay between two symbols; 0 disables pacing.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_intraday_interval")]
    pub intraday_interval: String,
    #[serde(default = "default_intraday_span")]
    pub intraday_span: String,
    #[serde(default = "default_trend_interval")]
    pub trend_interval: String,
    #[serde(default = "default_trend_span")]
    pub trend_span: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            intraday_interval: default_intraday_interval(),
            intraday_span: default_intraday_span(),
            trend_interval: default_trend_interval(),
            trend_span: default_trend_span(),
        }
    }
}

impl BatchConfig {
    pub fn intraday(&self) -> Result<(Interval, Span), Report<ConfigError>> {
        Ok((
            parse_interval("batch.intraday_interval", &self.intraday_interval)?,
            parse_span("batch.intraday_span", &self.intraday_span)?,
        ))
    }

    pub fn trend(&self) -> Result<(Interval, Span), Report<ConfigError>> {
        Ok((
            parse_interval("batch.trend_interval", &self.trend_interval)?,
            parse_span("batch.trend_span", &self.trend_span)?,
        ))
    }
}

fn parse_interval(field: &str, value: &str) -> Result<Interval, Report<ConfigError>> {
    Interval::from_str(value).ok_or_else(|| {
        Report::new(ConfigError::Validation {
            field: format!("{field}: unknown interval \"{value}\""),
        })
    })
}

fn parse_span(field: &str, value: &str) -> Result<Span, Report<ConfigError>> {
    Span::from_str(value).ok_or_else(|| {
        Report::new(ConfigError::Validation {
            field: format!("{field}: unknown span \"{value}\""),
        })
    })
}

/// Parameters of the intraday signal pass. Out-of-range values are rejected
/// when the indicators are built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi_period: usize,
    pub rsi_ceiling: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub bounce_tolerance: f64,
    pub volume_period: usize,
    pub volume_multiplier: f64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            ma_short: 10,
            ma_long: 50,
            rsi_period: 14,
            rsi_ceiling: 70.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std: 2.0,
            bounce_tolerance: 0.01,
            volume_period: 20,
            volume_multiplier: 1.5,
        }
    }
}

/// Parameters of the long-horizon trend pass: golden-cross heuristic plus the
/// MA/RSI bias, which shares the moving-average periods.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoldenCrossConfig {
    pub short_period: usize,
    pub long_period: usize,
    pub lookback: usize,
    pub gap_threshold: f64,
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for GoldenCrossConfig {
    fn default() -> Self {
        Self {
            short_period: 50,
            long_period: 200,
            lookback: 5,
            gap_threshold: 0.02,
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Accepted values: `"table"` | `"json"`
    #[serde(default = "default_output_format")]
    pub format: String,
    /// Report columns to keep; all columns when absent.
    pub columns: Option<Vec<String>>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            columns: None,
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
const VALID_OUTPUT_FORMATS: &[&str] = &["table", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_formats(config)?;
    validate_source(config)?;
    config.universe.universe()?;
    config.batch.intraday()?;
    config.batch.trend()?;
    Ok(())
}

fn validate_formats(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&config.general.log_format.as_str()) {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "general.log_format \"{}\" is not valid",
                config.general.log_format
            ),
        }));
    }
    if !VALID_OUTPUT_FORMATS.contains(&config.output.format.as_str()) {
        return Err(Report::new(ConfigError::Validation {
            field: format!("output.format \"{}\" is not valid", config.output.format),
        }));
    }
    Ok(())
}

fn validate_source(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.source.data_dir.trim().is_empty() {
        return Err(Report::new(ConfigError::Validation {
            field: "source.data_dir must not be empty".into(),
        }));
    }
    if config.source.fetch_timeout_secs == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "source.fetch_timeout_secs must be > 0".into(),
        }));
    }
    Ok(())
}
