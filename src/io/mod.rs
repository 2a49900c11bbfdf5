//! Input/output helpers.
//!
//! - CSV series ingest (`ingest`)
//! - backtest CSV export (`export`)
//! - fit JSON read/write (`fit`)

pub mod export;
pub mod fit;
pub mod ingest;

pub use export::*;
pub use fit::*;
pub use ingest::*;
