use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{PublicUser, User};
use crate::models::{from_document, to_document};
use crate::query::filter::FilterExpression;
use crate::state::AppState;
use crate::store::collections;

use super::{hash_password, issue_session, verify_password, AuthUser};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }

    let existing = state
        .store
        .find_one(collections::USERS, &FilterExpression::eq_str("email", &email))
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        name: req.name.trim().to_string(),
        password_hash: hash_password(&req.password)?,
        created_at: Utc::now(),
    };
    state
        .store
        .insert(collections::USERS, to_document(&user)?)
        .await?;
    tracing::info!("Registered user {}", user.id);

    let token = issue_session(state.store.as_ref(), user.id, state.config.session_ttl_hours).await?;
    Ok(Json(AuthResponse {
        user: PublicUser::from(&user),
        token,
    }))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    let user = state
        .store
        .find_one(collections::USERS, &FilterExpression::eq_str("email", &email))
        .await?
        .ok_or(AppError::Unauthorized)?;
    let user: User = from_document(user)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = issue_session(state.store.as_ref(), user.id, state.config.session_ttl_hours).await?;
    Ok(Json(AuthResponse {
        user: PublicUser::from(&user),
        token,
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .store
        .get(collections::USERS, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let user: User = from_document(user)?;
    Ok(Json(PublicUser::from(&user)))
}
