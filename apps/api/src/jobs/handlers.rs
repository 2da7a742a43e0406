use std::collections::HashMap;

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cache::response::request_key;
use crate::errors::AppError;
use crate::models::job::{Job, Salary};
use crate::models::{from_document, to_document};
use crate::query::filter::{FieldSpec, FilterExpression, ValueType};
use crate::query::listing::{run_listing, ListingConfig};
use crate::query::sort::SortDirection;
use crate::state::AppState;
use crate::store::collections;

/// Filterable and sortable surface of the jobs listing.
const JOB_LISTING: ListingConfig = ListingConfig {
    specs: &[
        (
            "title",
            FieldSpec {
                target: "title",
                value_type: ValueType::String,
            },
        ),
        (
            "company",
            FieldSpec {
                target: "company",
                value_type: ValueType::String,
            },
        ),
        (
            "location",
            FieldSpec {
                target: "location",
                value_type: ValueType::String,
            },
        ),
        (
            "jobType",
            FieldSpec {
                target: "jobType",
                value_type: ValueType::String,
            },
        ),
        (
            "skills",
            FieldSpec {
                target: "skills",
                value_type: ValueType::Array,
            },
        ),
        (
            "minSalary",
            FieldSpec {
                target: "salary.min",
                value_type: ValueType::Number,
            },
        ),
        (
            "maxSalary",
            FieldSpec {
                target: "salary.max",
                value_type: ValueType::Number,
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
    allowed_sort: &["createdAt", "title", "company", "salary.min"],
    default_sort: &[("createdAt", SortDirection::Desc)],
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub salary: Salary,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub salary: Option<Salary>,
}

fn validate_salary(salary: &Salary) -> Result<(), AppError> {
    if salary.min < 0 || salary.min > salary.max {
        return Err(AppError::Validation(
            "Salary range must satisfy 0 <= min <= max".into(),
        ));
    }
    Ok(())
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let key = request_key(&uri);
    let payload = state
        .cache
        .get_or_store(&key, state.config.cache_ttl_secs, || async {
            run_listing(
                state.store.as_ref(),
                collections::JOBS,
                &JOB_LISTING,
                &params,
                FilterExpression::new(),
            )
            .await
            .map_err(AppError::from)
        })
        .await?;
    Ok(Json(payload))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let key = request_key(&uri);
    let payload = state
        .cache
        .get_or_store(&key, state.config.cache_ttl_secs, || async {
            state
                .store
                .get(collections::JOBS, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
        })
        .await?;
    Ok(Json(payload))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    if req.title.trim().is_empty() || req.company.trim().is_empty() {
        return Err(AppError::Validation("Title and company are required".into()));
    }
    validate_salary(&req.salary)?;

    let now = Utc::now();
    let job = Job {
        id: Uuid::new_v4(),
        title: req.title,
        company: req.company,
        location: req.location,
        job_type: req.job_type,
        description: req.description,
        skills: req.skills,
        salary: req.salary,
        posted_by: auth.user_id,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .insert(collections::JOBS, to_document(&job)?)
        .await?;
    tracing::info!("Job {} created by {}", job.id, auth.user_id);

    state.invalidator.after_job_write().await;
    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<Job>, AppError> {
    let existing = state
        .store
        .get(collections::JOBS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    let mut job: Job = from_document(existing)?;
    if job.posted_by != auth.user_id {
        return Err(AppError::Forbidden);
    }

    if let Some(title) = req.title {
        job.title = title;
    }
    if let Some(company) = req.company {
        job.company = company;
    }
    if let Some(location) = req.location {
        job.location = location;
    }
    if let Some(job_type) = req.job_type {
        job.job_type = job_type;
    }
    if let Some(description) = req.description {
        job.description = description;
    }
    if let Some(skills) = req.skills {
        job.skills = skills;
    }
    if let Some(salary) = req.salary {
        validate_salary(&salary)?;
        job.salary = salary;
    }
    job.updated_at = Utc::now();

    state
        .store
        .update(collections::JOBS, id, to_document(&job)?)
        .await?;

    state.invalidator.after_job_write().await;
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let existing = state
        .store
        .get(collections::JOBS, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    let job: Job = from_document(existing)?;
    if job.posted_by != auth.user_id {
        return Err(AppError::Forbidden);
    }

    state.store.delete(collections::JOBS, id).await?;
    tracing::info!("Job {id} deleted by {}", auth.user_id);

    state.invalidator.after_job_write().await;
    Ok(StatusCode::NO_CONTENT)
}
