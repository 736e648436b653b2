//! Inbound failure classification.
//!
//! Responses are classified by status code only:
//!
//! - `401` the backend no longer accepts the session: the token is cleared
//!   and the user is sent to login.
//! - `403` the session is valid but the action is not allowed: one warning
//!   alert, the session is kept.
//! - anything else is left to the caller.
//!
//! The response always reaches the caller unchanged.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{Request, Response, StatusCode};
use tower::{Layer, Service};

use campusgate_auth::{Route, TokenStore};
use campusgate_events::NotificationBus;

use crate::navigation::Navigator;

/// Message of the warning published on `403 Forbidden`.
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to access this resource";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureClass {
    SessionExpired,
    Forbidden,
    Other,
}

impl FailureClass {
    pub fn classify(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => FailureClass::SessionExpired,
            StatusCode::FORBIDDEN => FailureClass::Forbidden,
            _ => FailureClass::Other,
        }
    }
}

/// Applies the side effects of a failed response.
pub struct FailureClassifier {
    store: TokenStore,
    bus: NotificationBus,
    navigator: Arc<dyn Navigator>,
}

impl FailureClassifier {
    pub fn new(store: TokenStore, bus: NotificationBus, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            bus,
            navigator,
        }
    }

    /// Handle one failed response. Call once per response.
    pub fn observe(&self, status: StatusCode) -> FailureClass {
        let class = FailureClass::classify(status);

        match class {
            FailureClass::SessionExpired => {
                tracing::warn!(status = status.as_u16(), "session rejected by backend; signing out");
                self.store.clear();
                self.navigator.navigate(&Route::Login);
            }
            FailureClass::Forbidden => {
                tracing::warn!(status = status.as_u16(), "action forbidden for current session");
                self.bus.warning(FORBIDDEN_MESSAGE, None, None);
            }
            FailureClass::Other => {
                tracing::debug!(status = status.as_u16(), "request failed");
            }
        }

        class
    }
}

impl core::fmt::Debug for FailureClassifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FailureClassifier")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Layer running a [`FailureClassifier`] over every 4xx/5xx response.
#[derive(Debug, Clone)]
pub struct SessionFailureLayer {
    classifier: Arc<FailureClassifier>,
}

impl SessionFailureLayer {
    pub fn new(classifier: FailureClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }
}

impl<S> Layer<S> for SessionFailureLayer {
    type Service = SessionFailure<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionFailure {
            inner,
            classifier: self.classifier.clone(),
        }
    }
}

/// Service produced by [`SessionFailureLayer`].
#[derive(Debug, Clone)]
pub struct SessionFailure<S> {
    inner: S,
    classifier: Arc<FailureClassifier>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SessionFailure<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let classifier = self.classifier.clone();
        let response = self.inner.call(request);

        Box::pin(async move {
            let response = response.await?;
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                classifier.observe(status);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::time::Duration;

    use tower::{ServiceExt, service_fn};

    use super::*;
    use crate::navigation::RecordingNavigator;

    fn classifier() -> (FailureClassifier, TokenStore, NotificationBus, RecordingNavigator) {
        let store = TokenStore::in_memory();
        let bus = NotificationBus::new();
        let nav = RecordingNavigator::new();
        let classifier = FailureClassifier::new(store.clone(), bus.clone(), Arc::new(nav.clone()));
        (classifier, store, bus, nav)
    }

    #[test]
    fn classify_by_status() {
        assert_eq!(FailureClass::classify(StatusCode::UNAUTHORIZED), FailureClass::SessionExpired);
        assert_eq!(FailureClass::classify(StatusCode::FORBIDDEN), FailureClass::Forbidden);
        assert_eq!(FailureClass::classify(StatusCode::NOT_FOUND), FailureClass::Other);
        assert_eq!(FailureClass::classify(StatusCode::INTERNAL_SERVER_ERROR), FailureClass::Other);
    }

    #[test]
    fn unauthorized_clears_token_and_goes_to_login() {
        let (classifier, store, bus, nav) = classifier();
        let alerts = bus.subscribe_alerts();
        store.set_token(Some("x.y.z"));

        classifier.observe(StatusCode::UNAUTHORIZED);

        assert_eq!(store.get_token(), None);
        assert_eq!(nav.history(), vec![Route::Login]);
        assert!(alerts.drain().is_empty());
    }

    #[test]
    fn forbidden_warns_once_and_keeps_session() {
        let (classifier, store, bus, nav) = classifier();
        let alerts = bus.subscribe_alerts();
        store.set_token(Some("x.y.z"));

        classifier.observe(StatusCode::FORBIDDEN);

        let received = alerts.drain();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind, campusgate_events::AlertKind::Warning);
        assert_eq!(received[0].message, FORBIDDEN_MESSAGE);
        assert_eq!(received[0].duration, Some(Duration::from_millis(3500)));
        assert_eq!(store.get_token().as_deref(), Some("x.y.z"));
        assert!(nav.history().is_empty());
    }

    #[test]
    fn other_failures_have_no_side_effects() {
        let (classifier, store, bus, nav) = classifier();
        let alerts = bus.subscribe_alerts();
        store.set_token(Some("x.y.z"));

        assert_eq!(classifier.observe(StatusCode::BAD_GATEWAY), FailureClass::Other);

        assert!(store.has_token());
        assert!(alerts.drain().is_empty());
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn layer_returns_the_original_response() {
        let (classifier, store, _bus, nav) = classifier();
        store.set_token(Some("x.y.z"));

        let backend = service_fn(|_req: Request<()>| async {
            let response = Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .body("token expired".to_string())
                .unwrap();
            Ok::<_, Infallible>(response)
        });
        let service = SessionFailureLayer::new(classifier).layer(backend);

        let response = service
            .oneshot(Request::get("http://localhost:5001/students").body(()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.body(), "token expired");
        assert!(!store.has_token());
        assert_eq!(nav.last(), Some(Route::Login));
    }

    #[tokio::test]
    async fn successful_responses_are_not_observed() {
        let (classifier, store, _bus, nav) = classifier();
        store.set_token(Some("x.y.z"));

        let backend = service_fn(|_req: Request<()>| async { Ok::<_, Infallible>(Response::new(())) });
        let service = SessionFailureLayer::new(classifier).layer(backend);

        let response = service.oneshot(Request::new(())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.has_token());
        assert!(nav.history().is_empty());
    }
}
