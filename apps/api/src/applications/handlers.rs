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
use crate::models::application::{Application, ApplicationStatus};
use crate::models::job::Job;
use crate::models::{from_document, to_document};
use crate::query::filter::{Condition, FieldSpec, FilterExpression, Scalar, ValueType};
use crate::query::listing::{run_listing, ListingConfig};
use crate::query::sort::SortDirection;
use crate::state::AppState;
use crate::store::collections;

const APPLICATION_LISTING: ListingConfig = ListingConfig {
    specs: &[
        (
            "status",
            FieldSpec {
                target: "status",
                value_type: ValueType::String,
            },
        ),
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
    allowed_sort: &["createdAt", "status"],
    default_sort: &[("createdAt", SortDirection::Desc)],
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    #[serde(default)]
    pub cover_letter: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

fn owned_by(user_id: Uuid) -> FilterExpression {
    FilterExpression::eq_str("userId", user_id.to_string())
}

/// GET /api/applications
///
/// The logical cache key carries no query discriminator, so only
/// parameter-less requests are served from cache; filtered or paginated
/// requests always hit the store.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let listing = || async {
        run_listing(
            state.store.as_ref(),
            collections::APPLICATIONS,
            &APPLICATION_LISTING,
            &params,
            owned_by(auth.user_id),
        )
        .await
        .map_err(AppError::from)
    };

    let payload = if params.is_empty() {
        let key = user_scope_key(auth.user_id, "applications");
        state
            .cache
            .get_or_store(&key, state.config.cache_ttl_secs, listing)
            .await?
    } else {
        listing().await?
    };
    Ok(Json(payload))
}

/// POST /api/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let job_id = req.job_id;
    state
        .store
        .get(collections::JOBS, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut duplicate_check = owned_by(auth.user_id);
    duplicate_check.insert("jobId", Condition::Eq(Scalar::Str(job_id.to_string())));
    if state
        .store
        .find_one(collections::APPLICATIONS, &duplicate_check)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Already applied to this job".into()));
    }

    let now = Utc::now();
    let application = Application {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        job_id,
        status: ApplicationStatus::Pending,
        cover_letter: req.cover_letter,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .insert(collections::APPLICATIONS, to_document(&application)?)
        .await?;
    tracing::info!("User {} applied to job {job_id}", auth.user_id);

    state.invalidator.after_application_write(auth.user_id).await;
    Ok((StatusCode::CREATED, Json(application)))
}

/// PATCH /api/applications/:id
///
/// The applicant may only withdraw; the job's poster drives the
/// review/accept/reject side. Transitions outside the state machine are
/// rejected.
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Application>, AppError> {
    let existing = state
        .store
        .get(collections::APPLICATIONS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    let mut application: Application = from_document(existing)?;

    let job = state
        .store
        .get(collections::JOBS, application.job_id)
        .await?
        .map(from_document::<Job>)
        .transpose()?;

    let is_applicant = application.user_id == auth.user_id;
    let is_poster = job.as_ref().is_some_and(|j| j.posted_by == auth.user_id);
    let allowed = match req.status {
        ApplicationStatus::Withdrawn => is_applicant,
        _ => is_poster,
    };
    if !allowed {
        return Err(AppError::Forbidden);
    }

    if !application.status.can_transition_to(req.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move application from {:?} to {:?}",
            application.status, req.status
        )));
    }

    application.status = req.status;
    application.updated_at = Utc::now();
    state
        .store
        .update(collections::APPLICATIONS, id, to_document(&application)?)
        .await?;

    state
        .invalidator
        .after_application_write(application.user_id)
        .await;
    Ok(Json(application))
}

/// DELETE /api/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let existing = state
        .store
        .get(collections::APPLICATIONS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    let application: Application = from_document(existing)?;
    if application.user_id != auth.user_id {
        return Err(AppError::Forbidden);
    }

    state.store.delete(collections::APPLICATIONS, id).await?;
    state.invalidator.after_application_write(auth.user_id).await;
    Ok(StatusCode::NO_CONTENT)
}
