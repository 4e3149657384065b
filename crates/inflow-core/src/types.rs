use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Forecasting method selector, as named in config files and CLI flags.
///
/// This is the parameterless tag; the forecast engine pairs it with the
/// method's parameters before computing anything.
///
/// # Examples
///
/// ```
/// use inflow_core::MethodKind;
///
/// let kind: MethodKind = "moving-average".parse().unwrap();
/// assert_eq!(kind, MethodKind::MovingAverage);
/// assert_eq!(kind.to_string(), "moving_average");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Repeat the last observation.
    #[default]
    Naive,
    /// Mean of the trailing window.
    #[serde(alias = "moving-average", alias = "ma")]
    MovingAverage,
    /// Exponentially weighted moving average.
    Ewma,
    /// Ordinary least-squares trend line.
    #[serde(alias = "linear", alias = "linear-regression")]
    LinearRegression,
}

impl MethodKind {
    /// Whether the method reads `window_size`.
    pub fn needs_window(self) -> bool {
        matches!(self, MethodKind::MovingAverage | MethodKind::Ewma)
    }

    /// Whether the method reads `alpha`.
    pub fn needs_alpha(self) -> bool {
        matches!(self, MethodKind::Ewma)
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Naive => write!(f, "naive"),
            MethodKind::MovingAverage => write!(f, "moving_average"),
            MethodKind::Ewma => write!(f, "ewma"),
            MethodKind::LinearRegression => write!(f, "linear_regression"),
        }
    }
}

impl FromStr for MethodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naive" => Ok(MethodKind::Naive),
            "moving_average" | "moving-average" | "ma" => Ok(MethodKind::MovingAverage),
            "ewma" => Ok(MethodKind::Ewma),
            "linear" | "linear_regression" | "linear-regression" => {
                Ok(MethodKind::LinearRegression)
            }
            other => Err(format!(
                "unknown forecasting method: {other} (expected naive, moving_average, ewma, linear)"
            )),
        }
    }
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use inflow_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn method_kind_accepts_dashboard_names() {
        assert_eq!("naive".parse::<MethodKind>().unwrap(), MethodKind::Naive);
        assert_eq!(
            "moving_average".parse::<MethodKind>().unwrap(),
            MethodKind::MovingAverage
        );
        assert_eq!("EWMA".parse::<MethodKind>().unwrap(), MethodKind::Ewma);
        assert_eq!(
            "linear".parse::<MethodKind>().unwrap(),
            MethodKind::LinearRegression
        );
        assert!("arima".parse::<MethodKind>().is_err());
    }

    #[test]
    fn method_kind_display_roundtrips() {
        for kind in [
            MethodKind::Naive,
            MethodKind::MovingAverage,
            MethodKind::Ewma,
            MethodKind::LinearRegression,
        ] {
            assert_eq!(kind.to_string().parse::<MethodKind>().unwrap(), kind);
        }
    }

    #[test]
    fn method_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&MethodKind::MovingAverage).unwrap();
        assert_eq!(json, "\"moving_average\"");

        let parsed: MethodKind = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(parsed, MethodKind::LinearRegression);
    }

    #[test]
    fn parameter_requirements() {
        assert!(!MethodKind::Naive.needs_window());
        assert!(MethodKind::MovingAverage.needs_window());
        assert!(MethodKind::Ewma.needs_window());
        assert!(MethodKind::Ewma.needs_alpha());
        assert!(!MethodKind::MovingAverage.needs_alpha());
        assert!(!MethodKind::LinearRegression.needs_window());
    }
}
