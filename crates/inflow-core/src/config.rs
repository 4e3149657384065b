use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InflowError;
use crate::types::MethodKind;

/// Top-level configuration loaded from `.inflow.toml`.
///
/// Resolution order: CLI flags > config file > defaults. The resolved value
/// is passed explicitly to whatever needs it; nothing reads it globally.
///
/// # Examples
///
/// ```
/// use inflow_core::InflowConfig;
///
/// let config = InflowConfig::default();
/// assert_eq!(config.forecast.horizon, 4);
/// assert_eq!(config.churn.top_n, 10);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InflowConfig {
    /// Input and output file locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Forecasting method and parameters.
    #[serde(default)]
    pub forecast: ForecastSettings,
    /// Churn measurement settings.
    #[serde(default)]
    pub churn: ChurnConfig,
}

impl InflowConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::FileNotFound`] if the file does not exist,
    /// [`InflowError::Io`] if it cannot be read, or [`InflowError::Toml`] if
    /// the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use inflow_core::InflowConfig;
    /// use std::path::Path;
    ///
    /// let config = InflowConfig::from_file(Path::new(".inflow.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, InflowError> {
        if !path.exists() {
            return Err(InflowError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use inflow_core::{InflowConfig, MethodKind};
    ///
    /// let toml = r#"
    /// [forecast]
    /// method = "ewma"
    /// window_size = 4
    /// alpha = 0.5
    /// "#;
    /// let config = InflowConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.forecast.method, MethodKind::Ewma);
    /// assert_eq!(config.forecast.alpha, Some(0.5));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, InflowError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Where weekly data is read from and forecasts are written to.
///
/// # Examples
///
/// ```
/// use inflow_core::DataConfig;
///
/// let config = DataConfig::default();
/// assert_eq!(config.input.to_str(), Some("defect_inflow_data.csv"));
/// assert_eq!(config.output.to_str(), Some("forecast_output.csv"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Weekly defect CSV (default: `defect_inflow_data.csv`).
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Forecast CSV destination (default: `forecast_output.csv`).
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("defect_inflow_data.csv")
}

fn default_output() -> PathBuf {
    PathBuf::from("forecast_output.csv")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

/// Forecasting method selection and its raw, unvalidated parameters.
///
/// `window_size` and `alpha` have no defaults: a method that needs one and
/// does not get it is rejected when the request is built.
///
/// # Examples
///
/// ```
/// use inflow_core::{ForecastSettings, MethodKind};
///
/// let settings = ForecastSettings::default();
/// assert_eq!(settings.method, MethodKind::Naive);
/// assert_eq!(settings.horizon, 4);
/// assert!(settings.window_size.is_none());
/// assert!(settings.alpha.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Forecasting method (default: `naive`).
    #[serde(default)]
    pub method: MethodKind,
    /// Weeks ahead to forecast, 1 through 6 (default: 4).
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Trailing window for `moving_average` and `ewma`.
    pub window_size: Option<usize>,
    /// Smoothing factor for `ewma`, in (0, 1].
    pub alpha: Option<f64>,
}

fn default_horizon() -> usize {
    4
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            method: MethodKind::default(),
            horizon: default_horizon(),
            window_size: None,
            alpha: None,
        }
    }
}

/// Churn measurement configuration.
///
/// # Examples
///
/// ```
/// use inflow_core::ChurnConfig;
///
/// let config = ChurnConfig::default();
/// assert_eq!(config.top_n, 10);
/// assert!(config.since_days.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// Files to list in the top-churn table (default: 10).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Only count commits from the last N days (default: all history).
    pub since_days: Option<u64>,
    /// Skip commits touching more files than this (default: no limit).
    pub max_files_per_commit: Option<usize>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
}

fn default_top_n() -> usize {
    10
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            since_days: None,
            max_files_per_commit: None,
            branch: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = InflowConfig::default();
        assert_eq!(config.data.input, PathBuf::from("defect_inflow_data.csv"));
        assert_eq!(config.data.output, PathBuf::from("forecast_output.csv"));
        assert_eq!(config.forecast.method, MethodKind::Naive);
        assert_eq!(config.forecast.horizon, 4);
        assert!(config.forecast.window_size.is_none());
        assert!(config.forecast.alpha.is_none());
        assert_eq!(config.churn.top_n, 10);
        assert!(config.churn.branch.is_none());
        assert!(config.churn.max_files_per_commit.is_none());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = InflowConfig::from_toml("").unwrap();
        assert_eq!(config.forecast.horizon, 4);
        assert_eq!(config.forecast.method, MethodKind::Naive);
        assert_eq!(config.churn.top_n, 10);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[data]
input = "data/weekly.csv"
output = "out/forecast.csv"

[forecast]
method = "moving_average"
horizon = 6
window_size = 5

[churn]
top_n = 20
since_days = 90
max_files_per_commit = 40
branch = "main"
"#;
        let config = InflowConfig::from_toml(toml).unwrap();
        assert_eq!(config.data.input, PathBuf::from("data/weekly.csv"));
        assert_eq!(config.data.output, PathBuf::from("out/forecast.csv"));
        assert_eq!(config.forecast.method, MethodKind::MovingAverage);
        assert_eq!(config.forecast.horizon, 6);
        assert_eq!(config.forecast.window_size, Some(5));
        assert!(config.forecast.alpha.is_none());
        assert_eq!(config.churn.top_n, 20);
        assert_eq!(config.churn.since_days, Some(90));
        assert_eq!(config.churn.max_files_per_commit, Some(40));
        assert_eq!(config.churn.branch.as_deref(), Some("main"));
    }

    #[test]
    fn dashboard_method_names_are_accepted() {
        let config = InflowConfig::from_toml("[forecast]\nmethod = \"linear\"\n").unwrap();
        assert_eq!(config.forecast.method, MethodKind::LinearRegression);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let result = InflowConfig::from_toml("[forecast]\nmethod = \"arima\"\n");
        assert!(matches!(result, Err(InflowError::Toml(_))));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = InflowConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_reported_by_path() {
        let result = InflowConfig::from_file(Path::new("/nonexistent/.inflow.toml"));
        assert!(matches!(result, Err(InflowError::FileNotFound(_))));
    }
}
