//! Data sources that do not come from disk.

pub mod synthetic;

pub use synthetic::{simulate, SimulatedData, SimulationConfig};
