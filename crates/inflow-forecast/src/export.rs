//! Forecast export: attach week start dates and write CSV.

use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use inflow_core::{InflowError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::ForecastResult;
use crate::loader::WeeklySeries;

/// One exported forecast row.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use inflow_forecast::export::ForecastRow;
///
/// let row = ForecastRow {
///     period_start_date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
///     predicted_defects: 12,
/// };
/// assert_eq!(row.predicted_defects, 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Start date of the forecasted week.
    pub period_start_date: NaiveDate,
    /// Predicted defects, rounded to the nearest whole defect with ties to even.
    pub predicted_defects: u64,
}

/// Date each forecast point and round its value.
///
/// Period `p` lands `7 * (p - last_period)` days after the last observed
/// week.
///
/// # Errors
///
/// Returns [`InflowError::EmptySeries`] if `weekly` has no weeks.
pub fn forecast_rows(weekly: &WeeklySeries, result: &ForecastResult) -> Result<Vec<ForecastRow>> {
    let last_week = weekly.last_week().ok_or(InflowError::EmptySeries)?;
    let last_period = weekly
        .series
        .last()
        .map(|o| o.period)
        .ok_or(InflowError::EmptySeries)?;

    Ok(result
        .points
        .iter()
        .map(|point| ForecastRow {
            period_start_date: last_week + Duration::weeks(point.period - last_period),
            predicted_defects: point.value.max(0.0).round_ties_even() as u64,
        })
        .collect())
}

/// Write `rows` as CSV with a `period_start_date,predicted_defects` header.
///
/// # Errors
///
/// Returns [`InflowError::Io`] if writing fails.
pub fn write_forecast<W: Write>(writer: W, rows: &[ForecastRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `rows` to a CSV file at `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`InflowError::Config`] if `rows` is empty, or
/// [`InflowError::Io`] if the file cannot be written.
pub fn write_forecast_csv(path: &Path, rows: &[ForecastRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(InflowError::Config("refusing to write an empty forecast".into()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_forecast(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote forecast");
    Ok(())
}

fn csv_error(err: csv::Error) -> InflowError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => InflowError::Io(io),
            other => InflowError::Parse(format!("CSV write failed: {other:?}")),
        }
    } else {
        InflowError::Parse(format!("CSV write failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{forecast, ForecastMethod, ForecastRequest};
    use crate::loader::from_reader;

    fn weekly() -> WeeklySeries {
        from_reader(
            "week_start,defects\n\
             2024-01-01,10\n\
             2024-01-08,12\n\
             2024-01-15,8\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn dates_continue_weekly_after_last_week() {
        let weekly = weekly();
        let request = ForecastRequest::new(ForecastMethod::Naive, 3).unwrap();
        let result = forecast(&weekly.series, &request).unwrap();
        let rows = forecast_rows(&weekly, &result).unwrap();
        let dates: Vec<String> = rows.iter().map(|r| r.period_start_date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-22", "2024-01-29", "2024-02-05"]);
        assert!(rows.iter().all(|r| r.predicted_defects == 8));
    }

    #[test]
    fn values_are_rounded_to_nearest() {
        let weekly = weekly();
        let request = ForecastRequest::new(
            ForecastMethod::Ewma {
                window_size: 1,
                alpha: 0.5,
            },
            1,
        )
        .unwrap();
        let result = forecast(&weekly.series, &request).unwrap();
        let rows = forecast_rows(&weekly, &result).unwrap();
        // 9.5 ties to the even neighbour
        assert_eq!(rows[0].predicted_defects, 10);
    }

    #[test]
    fn half_values_round_to_even() {
        let weekly = from_reader("week_start,defects
2024-01-01,10
2024-01-08,11
".as_bytes())
            .unwrap();
        let request =
            ForecastRequest::new(ForecastMethod::MovingAverage { window_size: 2 }, 1).unwrap();
        let result = forecast(&weekly.series, &request).unwrap();
        let rows = forecast_rows(&weekly, &result).unwrap();
        // mean is 10.5
        assert_eq!(rows[0].predicted_defects, 10);
    }

    #[test]
    fn csv_has_expected_header_and_rows() {
        let rows = vec![
            ForecastRow {
                period_start_date: NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
                predicted_defects: 8,
            },
            ForecastRow {
                period_start_date: NaiveDate::from_ymd_opt(2024, 1, 29).unwrap(),
                predicted_defects: 9,
            },
        ];
        let mut buf = Vec::new();
        write_forecast(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "period_start_date,predicted_defects\n2024-01-22,8\n2024-01-29,9\n"
        );
    }

    #[test]
    fn writes_file_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("forecast.csv");
        let rows = vec![ForecastRow {
            period_start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            predicted_defects: 3,
        }];
        write_forecast_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("period_start_date,predicted_defects\n"));
        assert!(text.contains("2024-03-04,3"));
    }

    #[test]
    fn empty_forecast_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        assert!(write_forecast_csv(&path, &[]).is_err());
        assert!(!path.exists());
    }
}
