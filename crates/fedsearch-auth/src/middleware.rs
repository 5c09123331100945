//! Tower credential-gate middleware.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with bearer
//! verification and administrative elevation. Generic over
//! `CredentialValidator`.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Method, Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, CredentialValidator};

/// Tower `Layer` that wraps services with the credential gate.
pub struct AuthLayer<V: CredentialValidator> {
    validator: Arc<V>,
    config: AuthConfig,
}

// Manual impl: `Arc<V>` is cloneable without `V: Clone`.
impl<V: CredentialValidator> Clone for AuthLayer<V> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<V: CredentialValidator> AuthLayer<V> {
    /// Create a new auth layer with the given validator and config.
    pub fn new(validator: Arc<V>, config: AuthConfig) -> Self {
        Self { validator, config }
    }
}

impl<V: CredentialValidator, S> Layer<S> for AuthLayer<V> {
    type Service = AuthService<V, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that gates requests on a bearer credential.
///
/// On success, inserts the resolved `ActingIdentity` into the request
/// extensions where it's available to downstream handlers. `OPTIONS`
/// requests pass through untouched.
pub struct AuthService<V: CredentialValidator, S> {
    inner: S,
    validator: Arc<V>,
    config: AuthConfig,
}

impl<V: CredentialValidator, S: Clone> Clone for AuthService<V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            validator: self.validator.clone(),
            config: self.config.clone(),
        }
    }
}

impl<V, S> Service<Request<Body>> for AuthService<V, S>
where
    V: CredentialValidator,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let validator = self.validator.clone();
        let config = self.config.clone();

        Box::pin(async move {
            // Preflight: no auth, no logic
            if req.method() == Method::OPTIONS {
                let resp = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(resp.into_response());
            }

            let outcome = if config.enabled {
                match extract_bearer_token(&req) {
                    Some(token) => {
                        let token = token.to_string();
                        validator.validate(&token, &config).await
                    }
                    None => Err(AuthError::MissingToken),
                }
            } else {
                validator.elevate(&config).await
            };

            match outcome {
                Ok(identity) => {
                    log::debug!("Request elevated to '{}'", identity.user_name);
                    req.extensions_mut().insert(identity);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(auth_err) => {
                    log::warn!("Authentication failed: {auth_err}");
                    Ok(rejection_response(&auth_err))
                }
            }
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Build the rejection response for a failed gate.
///
/// Client errors become 401 with a `WWW-Authenticate` challenge; a missing
/// admin user or an aborted verification is a 500.
fn rejection_response(err: &AuthError) -> axum::response::Response {
    let (status, category) = if err.is_client_error() {
        (StatusCode::UNAUTHORIZED, "authentication")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "configuration")
    };

    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": err.to_string(),
        }
    });

    let mut response = (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            http::header::WWW_AUTHENTICATE,
            http::HeaderValue::from_static("Bearer"),
        );
    }

    response
}
