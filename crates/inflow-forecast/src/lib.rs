//! Weekly defect-inflow forecasting.
//!
//! Loads a weekly defect series from CSV, forecasts the next few weeks with
//! one of four interchangeable methods, summarizes the history, and exports
//! the forecast with its week start dates.

pub mod engine;
pub mod export;
pub mod loader;
pub mod series;
pub mod summary;

pub use engine::{forecast, ForecastMethod, ForecastPoint, ForecastRequest, ForecastResult};
pub use series::{Observation, TimeSeries};
pub use summary::{summarize, SummaryMetrics};
