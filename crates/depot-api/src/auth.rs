//! Bearer-token authentication.
//!
//! Admission control is a static allow-list of tokens from the config
//! file. The middleware rejects requests whose `Authorization` header is
//! missing, not `Bearer`-schemed, or carries an unknown token; nothing
//! downstream runs for a rejected request.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Token allow-list validator. Cheap to clone; injected via `Extension`.
#[derive(Debug, Clone)]
pub struct TokenAuth {
    tokens: Arc<HashSet<String>>,
}

impl TokenAuth {
    pub fn new<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            tokens: Arc::new(tokens.into_iter().collect()),
        }
    }

    /// True if the token is in the allow-list.
    pub fn validate(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Reject requests without a valid bearer token.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<TokenAuth>().cloned() else {
        // Misassembled router; fail closed.
        return AppError::Internal("authenticator not configured".to_string()).into_response();
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    let Some(token) = header.strip_prefix("Bearer ") else {
        return AppError::Unauthorized("missing or invalid authorization header".to_string())
            .into_response();
    };

    if !auth.validate(token.trim()) {
        return AppError::Unauthorized("invalid token".to_string()).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_token_validates() {
        let auth = TokenAuth::new(["alpha".to_string(), "beta".to_string()]);
        assert!(auth.validate("alpha"));
        assert!(auth.validate("beta"));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let auth = TokenAuth::new(["alpha".to_string()]);
        assert!(!auth.validate("gamma"));
        assert!(!auth.validate(""));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let auth = TokenAuth::new(Vec::new());
        assert!(!auth.validate("anything"));
    }
}
