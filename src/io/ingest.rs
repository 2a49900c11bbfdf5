//! CSV ingest for date-indexed series.
//!
//! Expected layout (FRED download style):
//!
//! ```text
//! DATE,VALUE
//! 1985-01-01,4.21
//! ```
//!
//! - a header row is required
//! - the date column is the one named `date` (any case), else the first column
//! - the value column is the first other column
//! - dates are `%Y-%m-%d`
//! - `.` and empty values are missing observations and are skipped
//!
//! Everything else that fails to parse is an error naming the line.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::TimeSeries;
use crate::error::{MidasError, MidasResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a two-column series from a CSV file.
pub fn read_series_csv(path: &Path, name: &str) -> MidasResult<TimeSeries> {
    let file = File::open(path).map_err(|e| MidasError::InvalidSeries {
        name: name.to_string(),
        reason: format!("failed to open '{}': {e}", path.display()),
    })?;
    let series = read_series(file, name)?;
    debug!(
        path = %path.display(),
        name,
        observations = series.len(),
        first = %series.first_date(),
        last = %series.last_date(),
        "loaded series"
    );
    Ok(series)
}

/// Load a series from any CSV reader.
pub fn read_series<R: Read>(reader: R, name: &str) -> MidasResult<TimeSeries> {
    let invalid = |reason: String| MidasError::InvalidSeries {
        name: name.to_string(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let (date_col, value_col) = resolve_columns(&headers).ok_or_else(|| {
        invalid("expected a header with a date column and a value column".to_string())
    })?;

    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut skipped = 0usize;

    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = record?;

        let raw_date = record.get(date_col).unwrap_or("");
        let raw_value = record.get(value_col).unwrap_or("");

        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| invalid(format!("line {line}: bad date '{raw_date}': {e}")))?;

        if raw_value.is_empty() || raw_value == "." {
            skipped += 1;
            continue;
        }
        let value: f64 = raw_value
            .parse()
            .map_err(|e| invalid(format!("line {line}: bad value '{raw_value}': {e}")))?;

        dates.push(date);
        values.push(value);
    }

    if skipped > 0 {
        warn!(name, skipped, "skipped missing observations");
    }
    TimeSeries::new(name, dates, values)
}

fn resolve_columns(headers: &StringRecord) -> Option<(usize, usize)> {
    if headers.len() < 2 {
        return None;
    }
    let date_col = headers
        .iter()
        .position(|h| normalize_header_name(h) == "date")
        .unwrap_or(0);
    let value_col = (0..headers.len()).find(|&i| i != date_col)?;
    Some((date_col, value_col))
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
