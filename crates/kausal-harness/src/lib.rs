//! Test harness for the Kausal simulator.
//!
//! Provides the [`Scenario`] builder for running simulations from synchronous
//! tests, a seeded [`TestEnv`] environment for reproducible randomness, and
//! the ordering-property checks (`checks`) that the integration and property
//! test suites assert against event traces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod checks;
pub mod scenario;
pub mod test_env;

pub use scenario::Scenario;
pub use test_env::TestEnv;
