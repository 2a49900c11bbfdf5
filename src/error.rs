//! Library-wide error type.
//!
//! Every fallible operation returns `Result<T, MidasError>`. The variants fall
//! into three groups that map onto process exit codes for the `midas` binary:
//!
//! - configuration / input problems (exit code 2)
//! - alignment problems and insufficient data (exit code 3)
//! - numerical and I/O failures (exit code 4)
//!
//! Solver non-convergence is *not* an error; it is reported through
//! `FitDiagnostics::converged`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MidasError {
    // ---- Configuration ----
    #[error("unknown weight family '{0}' (expected one of: beta, beta_nz, expalmon)")]
    UnknownWeightFamily(String),

    #[error("weight family {family} expects {expected} parameter(s), got {found}")]
    WeightParamCount {
        family: &'static str,
        expected: String,
        found: usize,
    },

    #[error("invalid lag specification '{spec}': {reason}")]
    InvalidLagSpec { spec: String, reason: String },

    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unknown backtest method '{0}' (expected one of: fixed, rolling, recursive)")]
    UnknownBacktestMethod(String),

    // ---- Data / alignment ----
    #[error("invalid series '{name}': {reason}")]
    InvalidSeries { name: String, reason: String },

    #[error("cannot determine frequency of series '{name}': {reason}")]
    FrequencyUndetermined { name: String, reason: String },

    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    #[error("date {date} is not an observation date of series '{series}'")]
    DateNotInIndex { series: String, date: NaiveDate },

    #[error("low-frequency date {date} has no high-frequency observation at or after it")]
    DateNotReachable { date: NaiveDate },

    #[error(
        "high-frequency window for {date} needs positions {first}..={last} but the series has {len} observations"
    )]
    WindowOutOfRange {
        date: NaiveDate,
        first: i64,
        last: i64,
        len: usize,
    },

    #[error("insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("empty {0} block")]
    EmptyBlock(&'static str),

    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    // ---- Numerical ----
    #[error("least-squares design matrix is too ill-conditioned to solve")]
    SingularDesign,

    #[error("non-finite value encountered in {0}")]
    NonFinite(&'static str),

    #[error("least-squares solver rejected the problem: {0}")]
    Solver(String),

    // ---- I/O ----
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MidasError {
    /// Process exit code for the `midas` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            MidasError::UnknownWeightFamily(_)
            | MidasError::WeightParamCount { .. }
            | MidasError::InvalidLagSpec { .. }
            | MidasError::InvalidFrequency(_)
            | MidasError::InvalidOption(_)
            | MidasError::UnknownBacktestMethod(_)
            | MidasError::InvalidSeries { .. }
            | MidasError::FrequencyUndetermined { .. } => 2,
            MidasError::DateOutOfRange(_)
            | MidasError::DateNotInIndex { .. }
            | MidasError::DateNotReachable { .. }
            | MidasError::WindowOutOfRange { .. }
            | MidasError::InsufficientHistory(_)
            | MidasError::EmptyBlock(_)
            | MidasError::DimensionMismatch { .. } => 3,
            MidasError::SingularDesign
            | MidasError::NonFinite(_)
            | MidasError::Solver(_)
            | MidasError::Io(_)
            | MidasError::Csv(_)
            | MidasError::Json(_) => 4,
        }
    }

    /// True for errors raised while validating configuration, before any data is touched.
    pub fn is_config(&self) -> bool {
        self.exit_code() == 2 && !matches!(self, MidasError::InvalidSeries { .. })
    }
}

pub type MidasResult<T> = Result<T, MidasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_groups() {
        assert_eq!(MidasError::UnknownWeightFamily("gamma".into()).exit_code(), 2);
        assert_eq!(MidasError::EmptyBlock("estimation").exit_code(), 3);
        assert_eq!(MidasError::SingularDesign.exit_code(), 4);
    }

    #[test]
    fn config_errors_are_flagged() {
        let err = MidasError::InvalidLagSpec {
            spec: "3X".into(),
            reason: "bad unit".into(),
        };
        assert!(err.is_config());
        assert!(!MidasError::DateOutOfRange("x".into()).is_config());
    }
}
