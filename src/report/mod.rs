//! Plain-text reports for the `midas` binary.

pub mod format;

pub use format::*;
