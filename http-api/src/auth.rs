//! API key authentication
//!
//! Every `/api` route requires the `Authorization` header to equal the
//! configured key. An empty key turns the check off for local development.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;

/// Shared-secret check applied to the protected routes
#[derive(Clone, Default)]
pub struct ApiKeyAuth {
    key: Option<Arc<str>>,
}

impl ApiKeyAuth {
    /// Create the check; an empty or blank key disables it
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().is_empty() {
            Self { key: None }
        } else {
            Self {
                key: Some(Arc::from(key)),
            }
        }
    }

    /// Authentication switched off
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Whether the request headers carry the configured key
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.key else {
            return true;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|presented| presented == expected.as_ref())
    }
}

// Never Debug-print the key itself.
impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Middleware rejecting requests without the right key with 403
pub async fn require_api_key(
    State(auth): State<ApiKeyAuth>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth.authorize(request.headers()) {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request with missing or invalid API key"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
