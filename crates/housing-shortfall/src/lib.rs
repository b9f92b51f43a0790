//! Housing shortfall estimation.
//!
//! Projects the physical dwelling stock forward from a census, estimates the
//! households the population would form, and compares the two after allowing
//! for unusable dwellings and healthy rental and sales vacancy.

pub mod config;
pub mod dataset;
pub mod error;
pub mod estimate;
pub mod telemetry;

pub use dataset::reference_2024;
pub use estimate::{Scenario, ShortfallReport, ShortfallResult};
