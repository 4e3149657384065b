//! Ordered, immutable defect-count series.

use inflow_core::{InflowError, Result};
use serde::{Deserialize, Serialize};

/// One period of history.
///
/// # Examples
///
/// ```
/// use inflow_forecast::Observation;
///
/// let obs = Observation { period: 3, value: 12.0 };
/// assert_eq!(obs.period, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Period index; strictly increasing within a series.
    pub period: i64,
    /// Non-negative observed value.
    pub value: f64,
}

/// An ordered sequence of observations with strictly increasing periods and
/// non-negative finite values.
///
/// Built once and never mutated; the forecast engine and the summarizer both
/// read it.
///
/// # Examples
///
/// ```
/// use inflow_forecast::TimeSeries;
///
/// let series = TimeSeries::from_values(&[10.0, 12.0, 8.0]).unwrap();
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.last().unwrap().period, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

/// Wire shape of [`TimeSeries`]; deserialized payloads go through
/// [`TimeSeries::new`].
#[derive(Deserialize)]
struct RawSeries {
    observations: Vec<Observation>,
}

impl TryFrom<RawSeries> for TimeSeries {
    type Error = InflowError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        TimeSeries::new(raw.observations)
    }
}

impl TimeSeries {
    /// Build a series from explicit observations.
    ///
    /// # Errors
    ///
    /// Returns [`InflowError::InvalidParameter`] if periods are not strictly
    /// increasing or a value is negative, NaN, or infinite.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for (i, obs) in observations.iter().enumerate() {
            if !obs.value.is_finite() || obs.value < 0.0 {
                return Err(InflowError::invalid(
                    "series",
                    format!(
                        "value at period {} must be a non-negative number, got {}",
                        obs.period, obs.value
                    ),
                ));
            }
            if i > 0 && observations[i - 1].period >= obs.period {
                return Err(InflowError::invalid(
                    "series",
                    format!(
                        "periods must be strictly increasing ({} follows {})",
                        obs.period,
                        observations[i - 1].period
                    ),
                ));
            }
        }
        Ok(Self { observations })
    }

    /// Build a series from plain values, numbering periods from zero.
    ///
    /// # Errors
    ///
    /// Same as [`TimeSeries::new`].
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                period: i as i64,
                value,
            })
            .collect();
        Self::new(observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Iterate over the values in period order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }
}
