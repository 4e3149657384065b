//! Historical indicators: total, weekly average, and peak.

use inflow_core::{InflowError, Result};
use serde::{Deserialize, Serialize};

use crate::series::TimeSeries;

/// Read-only indicators derived from a [`TimeSeries`].
///
/// # Examples
///
/// ```
/// use inflow_forecast::{summarize, TimeSeries};
///
/// let series = TimeSeries::from_values(&[4.0, 10.0, 7.0]).unwrap();
/// let summary = summarize(&series).unwrap();
/// assert_eq!(summary.total, 21.0);
/// assert_eq!(summary.average, 7.0);
/// assert_eq!(summary.peak, 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Sum of all observed values.
    #[serde(rename = "total_defects")]
    pub total: f64,
    /// `total / count`.
    #[serde(rename = "average_weekly_defects")]
    pub average: f64,
    /// Largest observed value.
    #[serde(rename = "peak_weekly_defects")]
    pub peak: f64,
}

/// Compute [`SummaryMetrics`] over every observation in `series`.
///
/// # Errors
///
/// Returns [`InflowError::EmptySeries`] if `series` has no observations.
pub fn summarize(series: &TimeSeries) -> Result<SummaryMetrics> {
    if series.is_empty() {
        return Err(InflowError::EmptySeries);
    }
    let total: f64 = series.values().sum();
    let peak = series.values().fold(f64::MIN, f64::max);
    Ok(SummaryMetrics {
        total,
        average: total / series.len() as f64,
        peak,
    })
}
