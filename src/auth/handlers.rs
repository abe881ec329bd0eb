use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password,
        services::{is_valid_email, issue_session, normalize_email, MIN_PASSWORD_LEN},
    },
    error::{internal, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    let existing = state
        .store
        .find_user_by_email(&email)
        .await
        .map_err(internal("Internal server error"))?;
    if existing.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = password::hash(payload.password)
        .await
        .map_err(internal("Internal server error"))?;

    // A concurrent registration can still win between the lookup and insert.
    let Some(user) = state
        .store
        .create_user(&email, &hash, state.config.signup_credits)
        .await
        .map_err(internal("Internal server error"))?
    else {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    };

    info!(user_id = %user.id, email = %user.email, credits = user.credits, "user registered");
    let keys = JwtKeys::from_ref(&state);
    let response = issue_session(&keys, user, "User registered successfully")
        .map_err(internal("Internal server error"))?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let email = normalize_email(&payload.email);

    let user = match state.store.find_user_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_user_by_email failed");
            return Err(ApiError::Internal("Internal server error".into()));
        }
    };

    let ok = password::verify(payload.password, user.password_hash.clone())
        .await
        .map_err(internal("Internal server error"))?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    let response = issue_session(&keys, user, "Login successful")
        .map_err(internal("Internal server error"))?;
    Ok(Json(response))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection, "invalid auth request body");
    ApiError::Validation("Email and password are required".into())
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user: PublicUser::from(user),
    })
}
