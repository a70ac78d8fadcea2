//! HTTP Basic Authentication for the security report endpoint.
//!
//! With no credentials configured, the report stays reachable in
//! development and is refused outright in production.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response, StatusCode},
    middleware::Next,
};
use base64::Engine;
use std::sync::Arc;

use crate::config::Environment;

#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Username for the report endpoint (None = auth not configured)
    username: Option<String>,
    password: Option<String>,
    environment: Environment,
}

impl AdminAuth {
    /// Load credentials from ADMIN_USERNAME / ADMIN_PASSWORD. Both must
    /// be set to enable authentication.
    pub fn from_env(environment: Environment) -> Self {
        let username = std::env::var("ADMIN_USERNAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let password = std::env::var("ADMIN_PASSWORD")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if username.is_some() && password.is_some() {
            tracing::info!("Admin authentication enabled");
            Self {
                username,
                password,
                environment,
            }
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "ADMIN_USERNAME and ADMIN_PASSWORD must both be set to enable authentication"
                );
            }
            if !environment.is_development() {
                tracing::warn!(
                    "Admin authentication not configured; the security report is unavailable in production"
                );
            }
            Self {
                username: None,
                password: None,
                environment,
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Validate credentials. False when auth is not configured.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                // Constant-time comparison to prevent timing attacks
                constant_time_eq(u.as_bytes(), username.as_bytes())
                    && constant_time_eq(p.as_bytes(), password.as_bytes())
            }
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn decode_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    decoded
        .split_once(':')
        .map(|(u, p)| (u.to_string(), p.to_string()))
}

fn forbidden() -> Response<Body> {
    Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"error":"Access denied"}"#))
        .unwrap()
}

fn unauthorized() -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(
            header::WWW_AUTHENTICATE,
            "Basic realm=\"Spinwheel Admin\"",
        )
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"error":"Unauthorized"}"#))
        .unwrap()
}

/// Middleware guarding admin-only routes.
pub async fn admin_auth_middleware(
    State(auth): State<Arc<AdminAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !auth.is_enabled() {
        return if auth.environment.is_development() {
            next.run(request).await
        } else {
            forbidden()
        };
    }

    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(decode_basic_credentials);

    match credentials {
        Some((username, password)) if auth.validate(&username, &password) => {
            next.run(request).await
        }
        _ => unauthorized(),
    }
}
