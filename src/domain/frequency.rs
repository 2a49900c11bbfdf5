//! Sampling frequency codes and inference from observation dates.
//!
//! Codes follow the familiar offset-alias shape: a base letter (`D`, `B`, `W`,
//! `M`, `Q`, `A`) optionally followed by an anchor (`W-FRI`, `Q-DEC`, `A-JUN`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::MidasError;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const WEEKDAYS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Base sampling frequency of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    BusinessDaily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    /// Base letter of the offset code.
    pub fn code(self) -> &'static str {
        match self {
            Frequency::Daily => "D",
            Frequency::BusinessDaily => "B",
            Frequency::Weekly => "W",
            Frequency::Monthly => "M",
            Frequency::Quarterly => "Q",
            Frequency::Annual => "A",
        }
    }

    /// Average calendar days per period. Used only to order frequencies.
    pub fn approx_days(self) -> f64 {
        match self {
            Frequency::Daily => 1.0,
            Frequency::BusinessDaily => 7.0 / 5.0,
            Frequency::Weekly => 7.0,
            Frequency::Monthly => 365.25 / 12.0,
            Frequency::Quarterly => 365.25 / 4.0,
            Frequency::Annual => 365.25,
        }
    }

    /// True when `self` samples strictly more often than `other`.
    pub fn is_finer_than(self, other: Frequency) -> bool {
        self.approx_days() < other.approx_days()
    }
}

/// A frequency plus an optional anchor (`Q-DEC`, `W-FRI`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrequencyCode {
    pub freq: Frequency,
    pub anchor: Option<String>,
}

impl FrequencyCode {
    pub fn new(freq: Frequency) -> Self {
        Self { freq, anchor: None }
    }

    pub fn anchored(freq: Frequency, anchor: impl Into<String>) -> Self {
        Self {
            freq,
            anchor: Some(anchor.into()),
        }
    }
}

impl From<Frequency> for FrequencyCode {
    fn from(freq: Frequency) -> Self {
        Self::new(freq)
    }
}

impl fmt::Display for FrequencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Some(anchor) => write!(f, "{}-{}", self.freq.code(), anchor),
            None => write!(f, "{}", self.freq.code()),
        }
    }
}

impl FromStr for FrequencyCode {
    type Err = MidasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let (base, anchor) = match upper.split_once('-') {
            Some((b, a)) => (b, Some(a)),
            None => (upper.as_str(), None),
        };

        let freq = match base {
            "D" => Frequency::Daily,
            "B" | "BD" => Frequency::BusinessDaily,
            "W" => Frequency::Weekly,
            "M" => Frequency::Monthly,
            "Q" => Frequency::Quarterly,
            "A" | "Y" => Frequency::Annual,
            _ => {
                return Err(MidasError::InvalidFrequency(format!(
                    "unknown frequency code '{s}'"
                )));
            }
        };

        let Some(anchor) = anchor else {
            return Ok(FrequencyCode::new(freq));
        };

        let valid = match freq {
            Frequency::Weekly => WEEKDAYS.contains(&anchor),
            Frequency::Quarterly | Frequency::Annual => MONTHS.contains(&anchor),
            _ => false,
        };
        if !valid {
            return Err(MidasError::InvalidFrequency(format!(
                "anchor '{anchor}' is not valid for frequency code '{s}'"
            )));
        }
        Ok(FrequencyCode::anchored(freq, anchor))
    }
}

/// Infer a frequency code from observation dates.
///
/// Classification uses the most common gap (in days) between consecutive
/// observations. On error, returns a human-readable reason.
pub fn infer_frequency(dates: &[NaiveDate]) -> Result<FrequencyCode, String> {
    if dates.len() < 2 {
        return Err("at least two observations are required".to_string());
    }

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for pair in dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        *counts.entry(gap).or_insert(0) += 1;
    }

    // Ties resolve to the shorter gap so the result does not depend on hash order.
    let Some((&gap, _)) = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    else {
        return Err("no gaps between observations".to_string());
    };

    match gap {
        1..=3 => {
            let has_weekend = dates
                .iter()
                .any(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
            if has_weekend {
                Ok(FrequencyCode::new(Frequency::Daily))
            } else {
                Ok(FrequencyCode::new(Frequency::BusinessDaily))
            }
        }
        7 => Ok(weekly_code(dates)),
        28..=31 => Ok(FrequencyCode::new(Frequency::Monthly)),
        89..=92 => Ok(quarterly_code(dates)),
        365..=366 => Ok(annual_code(dates)),
        other => Err(format!("modal gap of {other} days matches no known frequency")),
    }
}

fn weekly_code(dates: &[NaiveDate]) -> FrequencyCode {
    let first = dates[0].weekday();
    if dates.iter().all(|d| d.weekday() == first) {
        FrequencyCode::anchored(
            Frequency::Weekly,
            WEEKDAYS[first.num_days_from_monday() as usize],
        )
    } else {
        FrequencyCode::new(Frequency::Weekly)
    }
}

fn quarterly_code(dates: &[NaiveDate]) -> FrequencyCode {
    // Months in one quarterly cycle share `(month - 1) % 3`; the anchor names the
    // last month of that cycle within the calendar year (Mar/Jun/Sep/Dec -> DEC).
    let residue = dates[0].month0() % 3;
    if dates.iter().all(|d| d.month0() % 3 == residue) {
        FrequencyCode::anchored(Frequency::Quarterly, MONTHS[9 + residue as usize])
    } else {
        FrequencyCode::new(Frequency::Quarterly)
    }
}

fn annual_code(dates: &[NaiveDate]) -> FrequencyCode {
    let month = dates[0].month0();
    if dates.iter().all(|d| d.month0() == month) {
        FrequencyCode::anchored(Frequency::Annual, MONTHS[month as usize])
    } else {
        FrequencyCode::new(Frequency::Annual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn infers_monthly_and_quarterly() {
        let monthly: Vec<NaiveDate> = (0..24)
            .map(|i| ymd(2009, 1, 1).checked_add_months(Months::new(i)).unwrap())
            .collect();
        assert_eq!(infer_frequency(&monthly).unwrap().to_string(), "M");

        let quarterly: Vec<NaiveDate> = (0..8)
            .map(|i| ymd(2009, 3, 31).checked_add_months(Months::new(3 * i)).unwrap())
            .collect();
        assert_eq!(infer_frequency(&quarterly).unwrap().to_string(), "Q-DEC");

        let quarter_starts: Vec<NaiveDate> = (0..8)
            .map(|i| ymd(2009, 1, 1).checked_add_months(Months::new(3 * i)).unwrap())
            .collect();
        assert_eq!(infer_frequency(&quarter_starts).unwrap().to_string(), "Q-OCT");
    }

    #[test]
    fn distinguishes_business_daily_from_daily() {
        // 2024-01-01 is a Monday.
        let business: Vec<NaiveDate> = (0..30)
            .map(|i| ymd(2024, 1, 1) + chrono::Duration::days(i))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        assert_eq!(infer_frequency(&business).unwrap().freq, Frequency::BusinessDaily);

        let daily: Vec<NaiveDate> = (0..30).map(|i| ymd(2024, 1, 1) + chrono::Duration::days(i)).collect();
        assert_eq!(infer_frequency(&daily).unwrap().freq, Frequency::Daily);
    }

    #[test]
    fn weekly_and_annual_anchors() {
        let weekly: Vec<NaiveDate> = (0..10).map(|i| ymd(2024, 1, 5) + chrono::Duration::weeks(i)).collect();
        assert_eq!(infer_frequency(&weekly).unwrap().to_string(), "W-FRI");

        let annual: Vec<NaiveDate> = (0..5).map(|i| ymd(2000 + i, 12, 31)).collect();
        assert_eq!(infer_frequency(&annual).unwrap().to_string(), "A-DEC");
    }

    #[test]
    fn rejects_irregular_or_short_inputs() {
        assert!(infer_frequency(&[ymd(2020, 1, 1)]).is_err());
        let odd = vec![ymd(2020, 1, 1), ymd(2020, 1, 15), ymd(2020, 1, 29)];
        assert!(infer_frequency(&odd).is_err());
    }

    #[test]
    fn parses_codes_case_insensitively() {
        let q: FrequencyCode = "q-dec".parse().unwrap();
        assert_eq!(q, FrequencyCode::anchored(Frequency::Quarterly, "DEC"));
        assert_eq!("y".parse::<FrequencyCode>().unwrap().freq, Frequency::Annual);
        assert!("M-DEC".parse::<FrequencyCode>().is_err());
        assert!("X".parse::<FrequencyCode>().is_err());
    }

    #[test]
    fn frequency_ordering() {
        assert!(Frequency::Monthly.is_finer_than(Frequency::Quarterly));
        assert!(!Frequency::Annual.is_finer_than(Frequency::Quarterly));
        assert!(Frequency::Daily.is_finer_than(Frequency::BusinessDaily));
    }
}
