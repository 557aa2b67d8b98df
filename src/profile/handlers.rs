use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::put,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    accounts::{normalize_email, StoreError, User, UserId},
    auth::{jwt::AuthUser, password::hash_password_blocking},
    error::ApiError,
    state::AppState,
};

use super::dto::{MessageResponse, UpdateEmailRequest, UpdateNameRequest, UpdatePasswordRequest};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/:id", put(update_name))
        .route("/profile/:id/email", put(update_email))
        .route("/profile/:id/password", put(update_password))
}

/// The path id must be the caller's own.
fn owned_target(caller: &User, path: Result<Path<UserId>, PathRejection>) -> Result<UserId, ApiError> {
    let Path(id) = path?;
    if caller.id != id {
        warn!(caller = caller.id, target = id, "profile update for another user");
        return Err(ApiError::Forbidden("Cannot modify another user's profile".into()));
    }
    Ok(id)
}

#[instrument(skip_all, fields(caller = caller.id))]
pub async fn update_name(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<UpdateNameRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = owned_target(&caller, path)?;
    let Json(payload) = payload?;

    let name = payload.name.unwrap_or_default();
    state.store.update_name(id, &name).await?;

    info!(user_id = id, "profile updated");
    Ok(Json(MessageResponse::new("Profile updated")))
}

#[instrument(skip_all, fields(caller = caller.id))]
pub async fn update_email(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = owned_target(&caller, path)?;
    let Json(payload) = payload?;

    let Some(email) = normalize_email(payload.email.as_deref()) else {
        return Err(ApiError::bad_request("Email required"));
    };

    let in_use = || ApiError::Conflict("Email already in use".into());
    if let Some(holder) = state.store.find_by_email(&email).await? {
        if holder.id != id {
            warn!(user_id = id, email = %email, "email already in use");
            return Err(in_use());
        }
    }

    match state.store.update_email(id, &email).await {
        Ok(()) => {}
        Err(StoreError::EmailTaken) => return Err(in_use()),
        Err(e) => return Err(e.into()),
    }

    info!(user_id = id, email = %email, "email updated");
    Ok(Json(MessageResponse::new("Email updated")))
}

#[instrument(skip_all, fields(caller = caller.id))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    path: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = owned_target(&caller, path)?;
    let Json(payload) = payload?;

    let Some(password) = payload.password.filter(|p| !p.is_empty()) else {
        return Err(ApiError::bad_request("Password required"));
    };

    let hash = hash_password_blocking(password).await?;
    state.store.update_password(id, &hash).await?;

    info!(user_id = id, "password updated");
    Ok(Json(MessageResponse::new("Password updated")))
}
