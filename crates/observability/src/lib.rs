//! Tracing setup shared by campusgate binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::{init, init_with_filter};
