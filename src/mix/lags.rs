//! High-frequency lag specifications.
//!
//! A lag is either a plain count of high-frequency periods (`9`) or a calendar
//! span (`3M`, `1Q`, `66B`) that is converted into high-frequency periods once
//! the frequencies of both series are known.

use std::fmt;
use std::str::FromStr;

use crate::domain::Frequency;
use crate::error::{MidasError, MidasResult};

/// Number of high-frequency lags, as given by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagSpec {
    /// Count of high-frequency periods.
    Periods(usize),
    /// `count` units of a calendar frequency (`D`, `B`, `M`, `Q` or `A`).
    Span { count: usize, unit: Frequency },
}

impl LagSpec {
    /// Resolve to a count of periods of a series sampled at `hf`.
    pub fn resolve(self, hf: Frequency) -> MidasResult<usize> {
        let xlag = match self {
            LagSpec::Periods(n) => n,
            LagSpec::Span { count, unit } => {
                let per_unit = periods_per_unit(hf, unit).ok_or_else(|| MidasError::InvalidLagSpec {
                    spec: self.to_string(),
                    reason: format!(
                        "unit {} is finer than the high-frequency series ({})",
                        unit.code(),
                        hf.code()
                    ),
                })?;
                count * per_unit
            }
        };
        if xlag == 0 {
            return Err(MidasError::InvalidLagSpec {
                spec: self.to_string(),
                reason: "resolves to zero high-frequency lags".to_string(),
            });
        }
        Ok(xlag)
    }
}

/// High-frequency periods in one lag unit; `None` when the unit is finer than
/// the series.
fn periods_per_unit(hf: Frequency, unit: Frequency) -> Option<usize> {
    use Frequency::*;
    let n = match (hf, unit) {
        (Daily, Daily | BusinessDaily) => 1,
        (Daily, Monthly) => 30,
        (Daily, Quarterly) => 91,
        (Daily, Annual) => 365,

        (BusinessDaily, Daily | BusinessDaily) => 1,
        (BusinessDaily, Monthly) => 22,
        (BusinessDaily, Quarterly) => 66,
        (BusinessDaily, Annual) => 264,

        (Weekly, Monthly) => 4,
        (Weekly, Quarterly) => 13,
        (Weekly, Annual) => 52,

        (Monthly, Monthly) => 1,
        (Monthly, Quarterly) => 3,
        (Monthly, Annual) => 12,

        (Quarterly, Quarterly) => 1,
        (Quarterly, Annual) => 4,

        (Annual, Annual) => 1,

        _ => return None,
    };
    Some(n)
}

impl From<usize> for LagSpec {
    fn from(n: usize) -> Self {
        LagSpec::Periods(n)
    }
}

impl fmt::Display for LagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LagSpec::Periods(n) => write!(f, "{n}"),
            LagSpec::Span { count, unit } => write!(f, "{count}{}", unit.code()),
        }
    }
}

impl FromStr for LagSpec {
    type Err = MidasError;

    /// Accepts `^[0-9]+$` or `^[0-9]+[DdBbMmQqAa]$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| MidasError::InvalidLagSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let s_trim = s.trim();
        let split = s_trim
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s_trim.len());
        let (digits, suffix) = s_trim.split_at(split);
        if digits.is_empty() {
            return Err(invalid("expected a count such as 9 or 3M"));
        }
        let count: usize = digits.parse().map_err(|_| invalid("count does not fit"))?;

        let unit = match suffix {
            "" => return Ok(LagSpec::Periods(count)),
            "D" | "d" => Frequency::Daily,
            "B" | "b" => Frequency::BusinessDaily,
            "M" | "m" => Frequency::Monthly,
            "Q" | "q" => Frequency::Quarterly,
            "A" | "a" => Frequency::Annual,
            _ => return Err(invalid("unit must be one of D, B, M, Q, A")),
        };
        Ok(LagSpec::Span { count, unit })
    }
}
