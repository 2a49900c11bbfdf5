//! Data mixing: align a low-frequency target with high-frequency lags.
//!
//! - `lags`: lag specifications (`9`, `3M`) and their resolution
//! - `mixer`: the windowing rule and the estimation/forecast split

pub mod lags;
pub mod mixer;

pub use lags::LagSpec;
pub use mixer::{mix, resolve_xlag};

use crate::domain::{infer_frequency, FrequencyCode, TimeSeries};
use crate::error::{MidasError, MidasResult};

/// Frequency of a series: declared metadata if present, otherwise inferred
/// from the most common gap between observations.
pub fn data_freq(series: &TimeSeries) -> MidasResult<FrequencyCode> {
    if let Some(code) = series.declared_frequency() {
        return Ok(code.clone());
    }
    infer_frequency(series.dates()).map_err(|reason| MidasError::FrequencyUndetermined {
        name: series.name().to_string(),
        reason,
    })
}
