//! Forecast engine.
//!
//! A pure function from a [`TimeSeries`] and a [`ForecastRequest`] to a
//! [`ForecastResult`]. Each method carries exactly the parameters it needs,
//! so method selection is an exhaustive `match` rather than a string switch.

use inflow_core::{ForecastSettings, InflowError, MethodKind, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::series::TimeSeries;

/// Longest horizon the engine will forecast.
pub const MAX_HORIZON: usize = 6;

/// A forecasting method together with its parameters.
///
/// # Examples
///
/// ```
/// use inflow_forecast::ForecastMethod;
/// use inflow_core::MethodKind;
///
/// let method = ForecastMethod::MovingAverage { window_size: 3 };
/// assert_eq!(method.kind(), MethodKind::MovingAverage);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Repeat the last observed value.
    Naive,
    /// Repeat the mean of the last `window_size` observations.
    MovingAverage {
        /// Trailing observations to average.
        window_size: usize,
    },
    /// Repeat the final exponentially weighted average of the full history.
    Ewma {
        /// Minimum history length.
        window_size: usize,
        /// Smoothing factor in (0, 1].
        alpha: f64,
    },
    /// Extend an ordinary least-squares line fitted to the full history.
    LinearRegression,
}

impl ForecastMethod {
    pub fn kind(&self) -> MethodKind {
        match self {
            ForecastMethod::Naive => MethodKind::Naive,
            ForecastMethod::MovingAverage { .. } => MethodKind::MovingAverage,
            ForecastMethod::Ewma { .. } => MethodKind::Ewma,
            ForecastMethod::LinearRegression => MethodKind::LinearRegression,
        }
    }

    /// Observations required before the method can run.
    fn min_history(&self) -> usize {
        match self {
            ForecastMethod::MovingAverage { window_size }
            | ForecastMethod::Ewma { window_size, .. } => *window_size,
            ForecastMethod::Naive | ForecastMethod::LinearRegression => 1,
        }
    }
}

/// A validated forecast request.
///
/// # Examples
///
/// ```
/// use inflow_forecast::{ForecastMethod, ForecastRequest};
///
/// let request = ForecastRequest::new(ForecastMethod::Naive, 3).unwrap();
/// assert_eq!(request.horizon, 3);
///
/// assert!(ForecastRequest::new(ForecastMethod::Naive, 7).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Method and its parameters.
    pub method: ForecastMethod,
    /// Periods to forecast, 1 through [`MAX_HORIZON`].
    pub horizon: usize,
}

impl ForecastRequest {
    /// Create a request, validating every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::InvalidParameter`] when the horizon, window
    /// size, or alpha is out of range.
    pub fn new(method: ForecastMethod, horizon: usize) -> Result<Self> {
        let request = Self { method, horizon };
        request.validate()?;
        Ok(request)
    }

    /// Build a request from config-level settings.
    ///
    /// Parameters the chosen method needs must be present; parameters it
    /// does not use are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::InvalidParameter`] if a required parameter is
    /// missing or any parameter is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use inflow_core::{ForecastSettings, MethodKind};
    /// use inflow_forecast::{ForecastMethod, ForecastRequest};
    ///
    /// let settings = ForecastSettings {
    ///     method: MethodKind::MovingAverage,
    ///     horizon: 2,
    ///     window_size: Some(3),
    ///     alpha: None,
    /// };
    /// let request = ForecastRequest::from_settings(&settings).unwrap();
    /// assert_eq!(request.method, ForecastMethod::MovingAverage { window_size: 3 });
    /// ```
    pub fn from_settings(settings: &ForecastSettings) -> Result<Self> {
        let kind = settings.method;
        let required = |name: &str| InflowError::invalid(name, format!("required for {kind}"));
        let window_size = match settings.window_size {
            Some(w) => w,
            None if kind.needs_window() => return Err(required("window_size")),
            None => 0,
        };
        let alpha = match settings.alpha {
            Some(a) => a,
            None if kind.needs_alpha() => return Err(required("alpha")),
            None => 0.0,
        };
        let method = match kind {
            MethodKind::Naive => ForecastMethod::Naive,
            MethodKind::MovingAverage => ForecastMethod::MovingAverage { window_size },
            MethodKind::Ewma => ForecastMethod::Ewma { window_size, alpha },
            MethodKind::LinearRegression => ForecastMethod::LinearRegression,
        };
        Self::new(method, settings.horizon)
    }

    /// Check the horizon and method parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::InvalidParameter`] naming the first bad
    /// parameter.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HORIZON).contains(&self.horizon) {
            return Err(InflowError::invalid(
                "horizon",
                format!("must be between 1 and {MAX_HORIZON}, got {}", self.horizon),
            ));
        }
        match self.method {
            ForecastMethod::MovingAverage { window_size } => check_window(window_size),
            ForecastMethod::Ewma { window_size, alpha } => {
                check_window(window_size)?;
                // NaN fails the range check too
                if !(alpha > 0.0 && alpha <= 1.0) {
                    return Err(InflowError::invalid(
                        "alpha",
                        format!("must be in (0, 1], got {alpha}"),
                    ));
                }
                Ok(())
            }
            ForecastMethod::Naive | ForecastMethod::LinearRegression => Ok(()),
        }
    }
}

fn check_window(window_size: usize) -> Result<()> {
    if window_size == 0 {
        return Err(InflowError::invalid("window_size", "must be at least 1"));
    }
    Ok(())
}

/// A single forecasted period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Period index, continuing after the last historical period.
    pub period: i64,
    /// Non-negative predicted value.
    pub value: f64,
}

/// Forecast output: exactly `horizon` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Method that produced the points.
    pub method: MethodKind,
    /// Forecasted periods in order.
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Predicted values in period order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Forecast `request.horizon` periods past the end of `series`.
///
/// # Errors
///
/// - [`InflowError::InvalidParameter`] if the request fails validation.
/// - [`InflowError::EmptySeries`] if `series` has no observations.
/// - [`InflowError::InsufficientHistory`] if the series is shorter than the
///   method's window.
///
/// # Examples
///
/// ```
/// use inflow_forecast::{forecast, ForecastMethod, ForecastRequest, TimeSeries};
///
/// let series = TimeSeries::from_values(&[10.0, 12.0, 8.0]).unwrap();
/// let request = ForecastRequest::new(ForecastMethod::Ewma { window_size: 1, alpha: 0.5 }, 1).unwrap();
/// let result = forecast(&series, &request).unwrap();
/// assert_eq!(result.values(), vec![9.5]);
/// ```
pub fn forecast(series: &TimeSeries, request: &ForecastRequest) -> Result<ForecastResult> {
    request.validate()?;

    let last = series.last().ok_or(InflowError::EmptySeries)?;
    let required = request.method.min_history();
    if series.len() < required {
        return Err(InflowError::InsufficientHistory {
            required,
            actual: series.len(),
        });
    }

    let first_period = last.period + 1;
    let periods = (0..request.horizon as i64).map(|step| first_period + step);

    let points: Vec<ForecastPoint> = match request.method {
        ForecastMethod::Naive => flat(periods, last.value),
        ForecastMethod::MovingAverage { window_size } => {
            let level = trailing_mean(series, window_size);
            debug!(window_size, level, "moving average level");
            flat(periods, level)
        }
        ForecastMethod::Ewma { alpha, .. } => {
            let level = ewma(series, alpha);
            debug!(alpha, level, "ewma level");
            flat(periods, level)
        }
        ForecastMethod::LinearRegression => {
            let (slope, intercept) = least_squares(series);
            debug!(slope, intercept, "least-squares fit");
            periods
                .map(|period| ForecastPoint {
                    period,
                    value: (slope * period as f64 + intercept).max(0.0),
                })
                .collect()
        }
    };

    Ok(ForecastResult {
        method: request.method.kind(),
        points,
    })
}

fn flat(periods: impl Iterator<Item = i64>, level: f64) -> Vec<ForecastPoint> {
    let value = level.max(0.0);
    periods.map(|period| ForecastPoint { period, value }).collect()
}

fn trailing_mean(series: &TimeSeries, window_size: usize) -> f64 {
    let tail = &series.observations()[series.len() - window_size..];
    tail.iter().map(|o| o.value).sum::<f64>() / window_size as f64
}

fn ewma(series: &TimeSeries, alpha: f64) -> f64 {
    let mut values = series.values();
    let first = values.next().unwrap_or(0.0);
    values.fold(first, |level, value| alpha * value + (1.0 - alpha) * level)
}

/// Closed-form OLS over `(period, value)`. A single point (or any series
/// with zero variance in x) yields a flat line through the mean.
fn least_squares(series: &TimeSeries) -> (f64, f64) {
    let n = series.len() as f64;
    let obs = series.observations();
    let mean_x = obs.iter().map(|o| o.period as f64).sum::<f64>() / n;
    let mean_y = obs.iter().map(|o| o.value).sum::<f64>() / n;

    let (sxy, sxx) = obs.iter().fold((0.0, 0.0), |(sxy, sxx), o| {
        let dx = o.period as f64 - mean_x;
        (sxy + dx * (o.value - mean_y), sxx + dx * dx)
    });

    if sxx == 0.0 {
        return (0.0, mean_y);
    }
    let slope = sxy / sxx;
    (slope, mean_y - slope * mean_x)
}
