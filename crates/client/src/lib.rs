//! `campusgate-client`: HTTP-side session plumbing.
//!
//! Tower layers that attach the session token to outgoing requests and react
//! to 401/403 responses, plus the [`Session`] facade used by pages for
//! login, logout and guarded navigation.

pub mod authorize;
pub mod failure;
pub mod navigation;
pub mod session;

pub use authorize::{BearerAuth, BearerAuthLayer, attach_bearer, extract_bearer};
pub use failure::{FORBIDDEN_MESSAGE, FailureClass, FailureClassifier, SessionFailure, SessionFailureLayer};
pub use navigation::{Navigator, RecordingNavigator};
pub use session::{LoginError, LoginResponse, Session};
