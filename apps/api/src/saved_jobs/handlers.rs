use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cache::response::user_scope_key;
use crate::errors::AppError;
use crate::models::saved_job::SavedJob;
use crate::models::{from_document, to_document};
use crate::query::filter::{Condition, FieldSpec, FilterExpression, Scalar, ValueType};
use crate::query::listing::{run_listing, ListingConfig};
use crate::query::sort::SortDirection;
use crate::state::AppState;
use crate::store::collections;

const SAVED_JOB_LISTING: ListingConfig = ListingConfig {
    specs: &[
        (
            "jobId",
            FieldSpec {
                target: "jobId",
                value_type: ValueType::String,
            },
        ),
        (
            "createdAt",
            FieldSpec {
                target: "createdAt",
                value_type: ValueType::Date,
            },
        ),
    ],
    allowed_sort: &["createdAt"],
    default_sort: &[("createdAt", SortDirection::Desc)],
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobRequest {
    pub job_id: Uuid,
}

fn saved_by(user_id: Uuid, job_id: Option<Uuid>) -> FilterExpression {
    let mut filter = FilterExpression::eq_str("userId", user_id.to_string());
    if let Some(job_id) = job_id {
        filter.insert("jobId", Condition::Eq(Scalar::Str(job_id.to_string())));
    }
    filter
}

/// GET /api/saved-jobs
pub async fn handle_list_saved_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let listing = || async {
        run_listing(
            state.store.as_ref(),
            collections::SAVED_JOBS,
            &SAVED_JOB_LISTING,
            &params,
            saved_by(auth.user_id, None),
        )
        .await
        .map_err(AppError::from)
    };

    let payload = if params.is_empty() {
        let key = user_scope_key(auth.user_id, "saved-jobs");
        state
            .cache
            .get_or_store(&key, state.config.cache_ttl_secs, listing)
            .await?
    } else {
        listing().await?
    };
    Ok(Json(payload))
}

/// POST /api/saved-jobs
pub async fn handle_save_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SaveJobRequest>,
) -> Result<(StatusCode, Json<SavedJob>), AppError> {
    let job_id = req.job_id;
    state
        .store
        .get(collections::JOBS, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if state
        .store
        .find_one(collections::SAVED_JOBS, &saved_by(auth.user_id, Some(job_id)))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Job is already saved".into()));
    }

    let saved = SavedJob {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        job_id,
        created_at: Utc::now(),
    };
    state
        .store
        .insert(collections::SAVED_JOBS, to_document(&saved)?)
        .await?;

    state.invalidator.after_saved_job_write(auth.user_id).await;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// DELETE /api/saved-jobs/:jobId
pub async fn handle_unsave_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let existing = state
        .store
        .find_one(collections::SAVED_JOBS, &saved_by(auth.user_id, Some(job_id)))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} is not saved")))?;
    let saved: SavedJob = from_document(existing)?;

    state.store.delete(collections::SAVED_JOBS, saved.id).await?;
    state.invalidator.after_saved_job_write(auth.user_id).await;
    Ok(StatusCode::NO_CONTENT)
}
