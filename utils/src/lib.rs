//! Shared utilities for the Estuary protocol.

pub mod logging;
pub mod math;

pub use logging::init_tracing;
pub use math::{mul_div_ceil, mul_div_floor};
