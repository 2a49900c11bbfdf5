//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - date-indexed series and their frequency codes (`TimeSeries`, `FrequencyCode`)
//! - the weight family sum type and its parameters (`WeightFamily`, `WeightParams`)
//! - mixer output (`MixedDataset`, `MixedBlock`)
//! - fit and backtest outputs (`FitResult`, `BacktestReport`, etc.)

pub mod frequency;
pub mod series;
pub mod types;

pub use frequency::*;
pub use series::*;
pub use types::*;
