use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    accounts::normalize_email,
    auth::{
        dto::{DataResponse, LoginRequest, LoginResponse, SignupRequest},
        password::{hash_password_blocking, verify_password_blocking},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse>), ApiError> {
    let Json(payload) = payload?;

    let email = normalize_email(payload.email.as_deref());
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        warn!("signup missing email or password");
        return Err(ApiError::bad_request("Email and password required"));
    };

    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password_blocking(password).await?;
    let name = payload.name.unwrap_or_default();
    let user = state.store.insert(&email, &name, &hash).await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: user.into() }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;

    let email = normalize_email(payload.email.as_deref());
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        warn!("login missing email or password");
        return Err(ApiError::bad_request("Email and password required"));
    };

    let Some(user) = state.store.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !user.has_password() {
        warn!(user_id = user.id, "login for account without password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let hash = user.password_hash.clone().unwrap_or_default();
    if !verify_password_blocking(password, hash).await? {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.jwt.sign(user.id)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        data: user.into(),
        token,
    }))
}
