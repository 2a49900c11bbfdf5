//! Date-indexed numeric series.

use chrono::NaiveDate;

use crate::domain::frequency::FrequencyCode;
use crate::error::{MidasError, MidasResult};

/// An ordered sequence of `(date, value)` observations.
///
/// Invariants (checked on construction):
/// - at least one observation
/// - strictly increasing dates
/// - finite values
///
/// Files are read through `io::read_series`, which builds the series with
/// [`TimeSeries::new`]. There is no serde impl.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    /// Declared frequency metadata; takes precedence over inference.
    freq: Option<FrequencyCode>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> MidasResult<Self> {
        let name = name.into();
        let invalid = |reason: String| MidasError::InvalidSeries {
            name: name.clone(),
            reason,
        };

        if dates.len() != values.len() {
            return Err(invalid(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if dates.is_empty() {
            return Err(invalid("series has no observations".to_string()));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "dates must be strictly increasing ({} followed by {})",
                pair[0], pair[1]
            )));
        }
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("non-finite value {v} at {}", dates[i])));
        }

        Ok(Self {
            name,
            dates,
            values,
            freq: None,
        })
    }

    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> MidasResult<Self> {
        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = pairs.into_iter().unzip();
        Self::new(name, dates, values)
    }

    /// Attach declared frequency metadata.
    pub fn with_frequency(mut self, code: FrequencyCode) -> Self {
        self.freq = Some(code);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn declared_frequency(&self) -> Option<&FrequencyCode> {
        self.freq.as_ref()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date(&self, i: usize) -> Option<NaiveDate> {
        self.dates.get(i).copied()
    }

    pub fn value(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Position of an exact observation date.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Position of the first observation at or after `date` (backward fill).
    pub fn position_at_or_after(&self, date: NaiveDate) -> Option<usize> {
        let i = self.dates.partition_point(|d| *d < date);
        (i < self.dates.len()).then_some(i)
    }

    /// Position of the last observation at or before `date`.
    pub fn position_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        self.dates.partition_point(|d| *d <= date).checked_sub(1)
    }

    /// Observations `range.start .. range.end` as a new series.
    pub fn slice(&self, range: std::ops::Range<usize>) -> MidasResult<TimeSeries> {
        if range.start >= range.end || range.end > self.len() {
            return Err(MidasError::DateOutOfRange(format!(
                "slice {}..{} of series '{}' with {} observations",
                range.start,
                range.end,
                self.name,
                self.len()
            )));
        }
        let out = TimeSeries::new(
            self.name.clone(),
            self.dates[range.clone()].to_vec(),
            self.values[range].to_vec(),
        )?;
        Ok(match &self.freq {
            Some(code) => out.with_frequency(code.clone()),
            None => out,
        })
    }

    /// Percent log growth: `100 * (ln v_t - ln v_{t-1})`, dated at `t`.
    ///
    /// The first observation is dropped. Levels must be strictly positive.
    pub fn log_growth(&self) -> MidasResult<TimeSeries> {
        if self.len() < 2 {
            return Err(MidasError::InvalidSeries {
                name: self.name.clone(),
                reason: "log growth needs at least two observations".to_string(),
            });
        }
        if let Some((i, v)) = self.values.iter().enumerate().find(|(_, v)| **v <= 0.0) {
            return Err(MidasError::InvalidSeries {
                name: self.name.clone(),
                reason: format!("log growth needs positive levels, found {v} at {}", self.dates[i]),
            });
        }

        let values: Vec<f64> = self
            .values
            .windows(2)
            .map(|w| (w[1].ln() - w[0].ln()) * 100.0)
            .collect();
        let out = TimeSeries::new(self.name.clone(), self.dates[1..].to_vec(), values)?;
        Ok(match &self.freq {
            Some(code) => out.with_frequency(code.clone()),
            None => out,
        })
    }
}
