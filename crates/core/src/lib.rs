//! `campusgate-core`: shared building blocks.
//!
//! Identifiers for bus messages, client configuration and its errors. No IO
//! beyond reading the environment.

pub mod config;
pub mod error;
pub mod id;

pub use config::{ApiEndpoints, ClientConfig, ServiceOrigin};
pub use error::ConfigError;
pub use id::{AlertId, ConfirmationId};
