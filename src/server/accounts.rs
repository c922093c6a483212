use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{CredentialHasher, RequireUser, SESSION_TTL_DAYS, generate_token};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, LoginResponse, RegisterRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{validate_password, validate_username};
use crate::types::Session;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let username = req.username.trim();
    let password = req.password.trim();
    validate_username(username)?;
    validate_password(password)?;

    let password_hash = CredentialHasher::new().hash(password)?;
    let user = state.store.create_user(username, &password_hash)?;

    tracing::info!("registered user '{}' ({})", user.username, user.id);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let username = req.username.trim();
    let password = req.password.trim();

    let user = state
        .store
        .get_user_by_username(username)?
        .ok_or(Error::InvalidCredentials)?;

    if !CredentialHasher::new().verify(password, &user.password_hash)? {
        return Err(Error::InvalidCredentials.into());
    }

    let (raw_token, lookup, hash) = generate_token()?;
    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        user_id: user.id,
        created_at: now,
        expires_at: Some(now + Duration::days(SESSION_TTL_DAYS)),
        last_used_at: None,
    };
    state.store.create_session(&session)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(LoginResponse {
        token: raw_token,
        user,
    })))
}

pub async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.delete_session(&auth.session.id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
