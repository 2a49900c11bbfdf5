//! Polynomial lag-weight functions.
//!
//! The family set is closed (`WeightFamily`), so dispatch is a `match` over the
//! variants rather than a trait object. Each family is a pure function of
//! `(n_lags, θ)`.

pub mod polynomial;

pub use polynomial::*;
