//! Session facade: login outcome, logout and guarded navigation.
//!
//! Pages hold a [`Session`] instead of touching the token store directly.
//! Every decision re-reads the store, so a 401 handled by
//! [`SessionFailureLayer`] is visible to the next navigation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use campusgate_auth::{
    Decision, DecisionExplanation, Role, Route, RouteAccess, RouteTable, TokenStore,
    decode_payload, explain_decision, extract_role,
};
use campusgate_events::NotificationBus;

use crate::authorize::BearerAuthLayer;
use crate::failure::{FailureClassifier, SessionFailureLayer};
use crate::navigation::Navigator;

/// Body returned by the login service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("no access token received")]
    MissingToken,

    #[error("unrecognized role: {0}")]
    UnrecognizedRole(String),

    #[error("login succeeded but the account has no role assigned")]
    MissingRole,
}

pub struct Session {
    store: TokenStore,
    bus: NotificationBus,
    navigator: Arc<dyn Navigator>,
    routes: RouteTable,
}

impl Session {
    /// Session over the school dashboard route table.
    pub fn new(store: TokenStore, bus: NotificationBus, navigator: impl Navigator + 'static) -> Self {
        Self {
            store,
            bus,
            navigator: Arc::new(navigator),
            routes: RouteTable::school_default(),
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Outbound layer bound to this session's token.
    pub fn bearer_layer(&self) -> BearerAuthLayer {
        BearerAuthLayer::new(self.store.clone())
    }

    /// Inbound layer bound to this session's token, bus and navigator.
    pub fn failure_layer(&self) -> SessionFailureLayer {
        SessionFailureLayer::new(FailureClassifier::new(
            self.store.clone(),
            self.bus.clone(),
            self.navigator.clone(),
        ))
    }

    /// Store the token from a login response and open the role's dashboard.
    ///
    /// The token is stored even when the role turns out to be missing or
    /// unknown; only a missing token leaves the store untouched.
    pub fn complete_login(&self, response: LoginResponse) -> Result<Role, LoginError> {
        let token = response
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(LoginError::MissingToken)?;
        self.store.set_token(Some(token));

        let role_name = match response.role.as_deref().map(str::trim) {
            Some(role) if !role.is_empty() => role.to_string(),
            _ => role_in_token(token)
                .map(|role| role.as_str().to_string())
                .ok_or(LoginError::MissingRole)?,
        };

        let role = Role::from_alias(&role_name).ok_or(LoginError::UnrecognizedRole(role_name))?;

        tracing::info!(role = %role, "login complete");
        self.navigator.navigate(&Route::Dashboard(role));
        Ok(role)
    }

    /// Clear the session and go to login.
    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("logged out");
        self.navigator.navigate(&Route::Login);
    }

    /// Back to the dashboard of the stored token's role, or login.
    pub fn return_to_dashboard(&self) -> Route {
        let route = self
            .store
            .get_token()
            .and_then(|token| role_in_token(&token))
            .map(Route::Dashboard)
            .unwrap_or(Route::Login);

        self.navigator.navigate(&route);
        route
    }

    /// Guard decision for `path`, with its reasoning. Does not navigate.
    pub fn explain(&self, path: &str) -> DecisionExplanation {
        match self.routes.lookup(path) {
            None => DecisionExplanation {
                decision: Decision::RedirectLogin,
                actual_role: None,
                required_role: None,
                reason: format!("no route registered for '{path}'"),
                denial: None,
            },
            Some(RouteAccess::Public) => DecisionExplanation {
                decision: Decision::Allow,
                actual_role: None,
                required_role: None,
                reason: "public route".to_string(),
                denial: None,
            },
            Some(access) => {
                let token = self.store.get_token();
                explain_decision(token.as_deref(), access.required_role())
            }
        }
    }

    /// Navigate to `path` if the guard allows it, otherwise to the redirect.
    ///
    /// Returns where the user actually ended up.
    pub fn navigate(&self, path: &str) -> Route {
        let explanation = self.explain(path);

        let target = match explanation.decision.redirect() {
            None => Route::from_path(path),
            Some(redirect) => {
                tracing::warn!(
                    path,
                    redirect = %redirect,
                    actual_role = ?explanation.actual_role,
                    required_role = ?explanation.required_role,
                    reason = %explanation.reason,
                    "navigation denied"
                );
                redirect
            }
        };

        tracing::debug!(path, target = %target, "navigating");
        self.navigator.navigate(&target);
        target
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

fn role_in_token(token: &str) -> Option<Role> {
    let payload = decode_payload(token).ok()?;
    extract_role(&payload).and_then(Role::from_alias)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::navigation::RecordingNavigator;

    /// Unsigned token around `payload`; the guard never checks signatures.
    fn token(payload: serde_json::Value) -> String {
        use base64::Engine as _;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    fn session() -> (Session, RecordingNavigator) {
        let nav = RecordingNavigator::new();
        let session = Session::new(TokenStore::in_memory(), NotificationBus::new(), nav.clone());
        (session, nav)
    }

    #[test]
    fn login_routes_by_response_role() {
        let (session, nav) = session();
        let response = LoginResponse {
            access_token: Some(token(json!({ "sub": "u1" }))),
            role: Some("docente".to_string()),
        };

        assert_eq!(session.complete_login(response), Ok(Role::Teacher));
        assert!(session.store().has_token());
        assert_eq!(nav.last(), Some(Route::Dashboard(Role::Teacher)));
    }

    #[test]
    fn login_falls_back_to_token_role() {
        let (session, nav) = session();
        let response = LoginResponse {
            access_token: Some(token(json!({ "realm_access": { "roles": ["administrador"] } }))),
            role: None,
        };

        assert_eq!(session.complete_login(response), Ok(Role::Admin));
        assert_eq!(nav.last(), Some(Route::Dashboard(Role::Admin)));
    }

    #[test]
    fn login_without_token_stores_nothing() {
        let (session, nav) = session();
        let response = LoginResponse {
            access_token: None,
            role: Some("estudiante".to_string()),
        };

        assert_eq!(session.complete_login(response), Err(LoginError::MissingToken));
        assert!(!session.store().has_token());
        assert!(nav.history().is_empty());
    }

    #[test]
    fn login_with_unknown_or_missing_role_keeps_token() {
        let (session, nav) = session();

        let unknown = LoginResponse {
            access_token: Some(token(json!({}))),
            role: Some("janitor".to_string()),
        };
        assert_eq!(
            session.complete_login(unknown),
            Err(LoginError::UnrecognizedRole("janitor".to_string()))
        );
        assert!(session.store().has_token());

        let missing = LoginResponse {
            access_token: Some(token(json!({}))),
            role: Some("  ".to_string()),
        };
        assert_eq!(session.complete_login(missing), Err(LoginError::MissingRole));
        assert!(nav.history().is_empty());
    }

    #[test]
    fn login_response_deserializes_with_missing_fields() {
        let parsed: LoginResponse = serde_json::from_str(r#"{"access_token":"a.b.c"}"#).unwrap();
        assert_eq!(parsed.access_token.as_deref(), Some("a.b.c"));
        assert_eq!(parsed.role, None);
    }

    #[test]
    fn navigate_applies_route_requirements() {
        let (session, nav) = session();
        session.store().set_token(Some(token(json!({ "role": "estudiante" })).as_str()));

        assert_eq!(session.navigate("/dashboard/student/grades"), Route::Page("/dashboard/student/grades".to_string()));
        assert_eq!(session.navigate("/dashboard/student"), Route::Dashboard(Role::Student));
        assert_eq!(session.navigate("/dashboard/admin"), Route::Unauthorized);
        assert_eq!(session.navigate("/dashboard"), Route::Page("/dashboard".to_string()));
        assert_eq!(session.navigate("/nowhere"), Route::Login);
        assert_eq!(nav.history().len(), 5);
    }

    #[test]
    fn navigate_without_token_goes_to_login_but_public_routes_open() {
        let (session, _nav) = session();

        assert_eq!(session.navigate("/dashboard/teacher"), Route::Login);
        assert_eq!(session.navigate("/unauthorized"), Route::Unauthorized);
        assert_eq!(session.navigate("/login"), Route::Login);
        assert!(session.explain("/login").decision.is_allowed());
    }

    #[test]
    fn explain_reports_reasoning() {
        let (session, _nav) = session();
        session.store().set_token(Some(token(json!({ "role": "docente" })).as_str()));

        let explanation = session.explain("/dashboard/admin");
        assert_eq!(explanation.decision, Decision::RedirectUnauthorized);
        assert_eq!(explanation.actual_role.as_deref(), Some("docente"));
        assert_eq!(explanation.required_role.as_deref(), Some("admin"));
    }

    #[test]
    fn return_to_dashboard_uses_stored_role() {
        let (session, nav) = session();
        assert_eq!(session.return_to_dashboard(), Route::Login);

        session.store().set_token(Some(token(json!({ "role": "administrador" })).as_str()));
        assert_eq!(session.return_to_dashboard(), Route::Dashboard(Role::Admin));

        session.store().set_token(Some("not-a-token"));
        assert_eq!(session.return_to_dashboard(), Route::Login);
        assert_eq!(nav.history().len(), 3);
    }

    #[test]
    fn logout_clears_and_redirects() {
        let (session, nav) = session();
        session.store().set_token(Some("a.b.c"));

        session.logout();
        session.logout();

        assert!(!session.store().has_token());
        assert_eq!(nav.history(), vec![Route::Login, Route::Login]);
    }
}
