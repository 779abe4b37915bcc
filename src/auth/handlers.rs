use axum::extract::{FromRef, State};
use axum::routing::{get, post};
use axum::Router;
use tracing::{info, instrument, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;

    // Uniqueness is enforced here, before the insert.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::duplicate("user with this email already exists"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &hash).await?;

    let token = JwtKeys::from_ref(&state).issue(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;

    // Unknown email and wrong password produce the identical message so
    // that account existence does not leak.
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login with unknown email");
            return Err(AppError::unauthorized("invalid email or password"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(AppError::unauthorized("invalid email or password"));
    }

    let token = JwtKeys::from_ref(&state).issue(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    }))
}

/// Public procedure: anonymous callers get `null`, as does an identity
/// that no longer resolves to a stored user.
#[instrument(skip(state, ctx))]
pub async fn me(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<Json<Option<PublicUser>>> {
    let Some(identity) = ctx.identity else {
        return Ok(Json(None));
    };

    let user = User::find_by_id(&state.db, identity.user_id).await?;
    Ok(Json(user.map(|u| PublicUser {
        id: u.id,
        email: u.email,
    })))
}
