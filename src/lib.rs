//! Decimal digits of π by the Chudnovsky series, evaluated with binary
//! splitting over exact integers and finished with doubling-precision
//! Newton division and square root.

pub mod chudnovsky;
pub mod config;
pub mod error;
pub mod utils;

pub use chudnovsky::{Chudnovsky, Computation, Report};
pub use config::{Config, Invocation};
pub use error::{Error, Result};

/// The first `digit_count` decimal digits of π with no radix point,
/// starting "314159...".
pub fn compute_pi_digits(digit_count: u64) -> Result<String> {
    Chudnovsky::new(digit_count).run().map(|c| c.digits)
}
