//! Per-request auth context.
//!
//! Runs once per request, before the procedure logging layer: reads the
//! bearer token from the Authorization header, verifies it and installs
//! an immutable [`AuthContext`] into the request extensions. A missing or
//! failing token degrades to an anonymous context, never an error.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::jwt::{AuthIdentity, JwtKeys};
use crate::error::AppError;
use crate::state::AppState;

/// Request-scoped authentication state: either an authenticated identity
/// or nothing.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub identity: Option<AuthIdentity>,
}

pub async fn build_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let keys = JwtKeys::from_ref(&state);
    let identity = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| keys.verify(token));

    req.extensions_mut().insert(AuthContext { identity });
    next.run(req).await
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuthContext>().cloned().unwrap_or_default())
    }
}

/// Authorization gate for protected procedures: extracting this fails
/// fast with an unauthorized error when the context holds no identity.
pub struct CurrentUser(pub AuthIdentity);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .and_then(|ctx| ctx.identity.clone())
            .map(CurrentUser)
            .ok_or_else(|| {
                AppError::unauthorized("you must be logged in to access this resource")
            })
    }
}
