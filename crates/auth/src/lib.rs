//! `campusgate-auth`: client-side route guarding (zero network).
//!
//! Token payloads are decoded, never verified: the backend stays the
//! authority for real authorization. This crate is decoupled from HTTP.

pub mod claims;
pub mod guard;
pub mod roles;
pub mod routes;
pub mod token_store;

pub use claims::{DecodeError, TokenPayload, decode_payload, extract_role};
pub use guard::{Decision, DecisionExplanation, DenialKind, decide, explain_decision};
pub use roles::{Role, UnknownRole, match_role};
pub use routes::{Route, RouteAccess, RouteTable};
pub use token_store::{FileStorage, InMemoryStorage, KeyValueStorage, StorageError, TokenStore};
