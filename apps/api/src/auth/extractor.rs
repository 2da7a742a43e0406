//! Bearer-token extractor. Handlers take an `AuthUser` argument to require
//! authentication.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;

use crate::errors::AppError;
use crate::models::from_document;
use crate::models::user::Session;
use crate::query::filter::FilterExpression;
use crate::state::AppState;
use crate::store::collections;

use super::token_digest;

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let session = state
            .store
            .find_one(
                collections::SESSIONS,
                &FilterExpression::eq_str("tokenDigest", token_digest(token)),
            )
            .await?
            .ok_or(AppError::Unauthorized)?;
        let session: Session = from_document(session)?;

        if session.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}
