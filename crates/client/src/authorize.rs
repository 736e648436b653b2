//! Outbound request authorization.
//!
//! Every request bound for the backend carries `Authorization: Bearer <token>`
//! when a session token exists. The token is read from the [`TokenStore`] at
//! call time, so a login or logout takes effect on the very next request.

use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use http::Request;
use tower::{Layer, Service};

use campusgate_auth::TokenStore;
use campusgate_core::ApiEndpoints;

/// Copy `request`, adding a bearer header when `token` is present.
///
/// The input is never modified. Without a token (or with an empty one) the
/// copy is identical to the input.
pub fn attach_bearer<B: Clone>(request: &Request<B>, token: Option<&str>) -> Request<B> {
    let mut copy = Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    *copy.extensions_mut() = request.extensions().clone();

    authorize_in_place(&mut copy, token);
    copy
}

/// Set the bearer header on an owned request; no-op without a token.
fn authorize_in_place<B>(request: &mut Request<B>, token: Option<&str>) {
    if let Some(value) = token.and_then(bearer_value) {
        request.headers_mut().insert(AUTHORIZATION, value);
    }
}

/// The bearer token carried by `headers`, if any.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn bearer_value(token: &str) -> Option<HeaderValue> {
    if token.is_empty() {
        return None;
    }

    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            tracing::warn!("session token contains characters not allowed in a header; sending request without it");
            None
        }
    }
}

/// Layer that attaches the stored session token to each request.
#[derive(Debug, Clone)]
pub struct BearerAuthLayer {
    store: TokenStore,
    scope: Option<Arc<ApiEndpoints>>,
}

impl BearerAuthLayer {
    /// Attach the token to every request.
    pub fn new(store: TokenStore) -> Self {
        Self { store, scope: None }
    }

    /// Attach the token only to requests addressed to a configured backend.
    pub fn scoped(store: TokenStore, endpoints: ApiEndpoints) -> Self {
        Self {
            store,
            scope: Some(Arc::new(endpoints)),
        }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            store: self.store.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Service produced by [`BearerAuthLayer`].
#[derive(Debug, Clone)]
pub struct BearerAuth<S> {
    inner: S,
    store: TokenStore,
    scope: Option<Arc<ApiEndpoints>>,
}

impl<S> BearerAuth<S> {
    fn in_scope<B>(&self, request: &Request<B>) -> bool {
        match &self.scope {
            Some(endpoints) => endpoints.targets_backend(request.uri()),
            None => true,
        }
    }
}

impl<S, B> Service<Request<B>> for BearerAuth<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        if self.in_scope(&request) {
            let token = self.store.get_token();
            tracing::debug!(uri = %request.uri(), token_present = token.is_some(), "authorizing request");

            authorize_in_place(&mut request, token.as_deref());
        }

        self.inner.call(request)
    }
}
