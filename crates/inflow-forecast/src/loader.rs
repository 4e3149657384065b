//! Weekly defect CSV ingestion.
//!
//! Detects the week and defect columns by header name, rejects malformed rows,
//! and hands back a date-ordered series so the engine never sees bad input.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use inflow_core::{InflowError, Result};
use tracing::{debug, info};

use crate::series::{Observation, TimeSeries};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A defect series paired with the start date of each week.
///
/// `weeks[i]` is the start date of period `i` in `series`.
///
/// # Examples
///
/// ```
/// use inflow_forecast::loader::from_reader;
///
/// let csv = "week_start,defects_reported\n2024-01-08,7\n2024-01-01,5\n";
/// let weekly = from_reader(csv.as_bytes()).unwrap();
/// assert_eq!(weekly.series.values().collect::<Vec<_>>(), vec![5.0, 7.0]);
/// assert_eq!(weekly.weeks[0].to_string(), "2024-01-01");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySeries {
    /// Week start dates, ascending.
    pub weeks: Vec<NaiveDate>,
    /// Defect counts, one per week, periods numbered from zero.
    pub series: TimeSeries,
}

impl WeeklySeries {
    /// Start date of the most recent week.
    pub fn last_week(&self) -> Option<NaiveDate> {
        self.weeks.last().copied()
    }
}

/// Load a weekly defect CSV from `path`.
///
/// # Errors
///
/// Returns [`InflowError::FileNotFound`] if `path` does not exist, and
/// [`InflowError::Parse`] for missing columns or malformed rows.
pub fn load_csv(path: &Path) -> Result<WeeklySeries> {
    if !path.exists() {
        return Err(InflowError::FileNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let weekly = from_reader(file)?;
    info!(path = %path.display(), weeks = weekly.weeks.len(), "loaded weekly defect data");
    Ok(weekly)
}

/// Parse weekly defect CSV from any reader.
///
/// The first header containing `defect` is the count column and the first
/// header containing `week` is the date column (both case-insensitive).
///
/// # Errors
///
/// Returns [`InflowError::Parse`] if a column is missing, a date is not
/// `YYYY-MM-DD`, a count is negative or not an integer, or a week repeats.
pub fn from_reader<R: Read>(reader: R) -> Result<WeeklySeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| InflowError::Parse(format!("failed to read CSV header: {e}")))?
        .clone();
    let defect_col = find_column(&headers, "defect")?;
    let week_col = find_column(&headers, "week")?;
    debug!(
        defect_column = &headers[defect_col],
        week_column = &headers[week_col],
        "detected columns"
    );

    let mut rows: Vec<(NaiveDate, u64)> = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let row = idx + 1;
        let record =
            record.map_err(|e| InflowError::Parse(format!("row {row}: unreadable record: {e}")))?;
        let raw_week = record.get(week_col).unwrap_or("");
        let raw_count = record.get(defect_col).unwrap_or("");

        let week = NaiveDate::parse_from_str(raw_week, DATE_FORMAT).map_err(|_| {
            InflowError::Parse(format!(
                "row {row}: invalid week start date '{raw_week}' (expected YYYY-MM-DD)"
            ))
        })?;
        let count = parse_count(raw_count)
            .map_err(|reason| InflowError::Parse(format!("row {row}: {reason}")))?;
        rows.push((week, count));
    }

    rows.sort_by_key(|(week, _)| *week);
    if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(InflowError::Parse(format!("duplicate week {}", pair[0].0)));
    }

    let observations = rows
        .iter()
        .enumerate()
        .map(|(i, (_, count))| Observation {
            period: i as i64,
            value: *count as f64,
        })
        .collect();

    Ok(WeeklySeries {
        weeks: rows.iter().map(|(week, _)| *week).collect(),
        series: TimeSeries::new(observations)?,
    })
}

fn find_column(headers: &csv::StringRecord, needle: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(needle))
        .ok_or_else(|| {
            InflowError::Parse(format!(
                "no column containing '{needle}' in header [{}]",
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })
}

fn parse_count(raw: &str) -> std::result::Result<u64, String> {
    if let Ok(count) = raw.parse::<u64>() {
        return Ok(count);
    }
    match raw.parse::<i64>() {
        Ok(negative) => Err(format!("defect count must be non-negative, got {negative}")),
        Err(_) => Err(format!("defect count '{raw}' is not an integer")),
    }
}
