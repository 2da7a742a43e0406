use std::collections::HashMap;

use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cache::response::request_key;
use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::models::{from_document, to_document};
use crate::query::filter::{FieldSpec, FilterExpression, ValueType};
use crate::query::listing::{run_listing, ListingConfig};
use crate::query::sort::SortDirection;
use crate::state::AppState;
use crate::store::collections;

const PROFILE_LISTING: ListingConfig = ListingConfig {
    specs: &[
        (
            "name",
            FieldSpec {
                target: "name",
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
            "skills",
            FieldSpec {
                target: "skills",
                value_type: ValueType::Array,
            },
        ),
        (
            "minExperience",
            FieldSpec {
                target: "experienceYears",
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
    allowed_sort: &["createdAt", "name", "experienceYears"],
    default_sort: &[("createdAt", SortDirection::Desc)],
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    pub name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: i64,
    #[serde(default)]
    pub bio: Option<String>,
}

async fn find_profile(state: &AppState, user_id: Uuid) -> Result<Option<Value>, AppError> {
    Ok(state
        .store
        .find_one(
            collections::PROFILES,
            &FilterExpression::eq_str("userId", user_id.to_string()),
        )
        .await?)
}

/// GET /api/profile
///
/// Cached under the literal URL key `api:/api/profile` — one shared entry,
/// exactly as the contract has it. Every profile write deletes it.
pub async fn handle_get_my_profile(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let key = request_key(&uri);
    let payload = state
        .cache
        .get_or_store(&key, state.config.cache_ttl_secs, || async {
            find_profile(&state, auth.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Profile not found".into()))
        })
        .await?;
    Ok(Json(payload))
}

/// GET /api/profile/:userId
pub async fn handle_get_profile(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let key = request_key(&uri);
    let payload = state
        .cache
        .get_or_store(&key, state.config.cache_ttl_secs, || async {
            find_profile(&state, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
        })
        .await?;
    Ok(Json(payload))
}

/// PUT /api/profile
pub async fn handle_upsert_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if req.experience_years < 0 {
        return Err(AppError::Validation("Experience cannot be negative".into()));
    }

    let now = Utc::now();
    let profile = match find_profile(&state, auth.user_id).await? {
        Some(existing) => {
            let existing: Profile = from_document(existing)?;
            let updated = Profile {
                name: req.name,
                headline: req.headline,
                location: req.location,
                skills: req.skills,
                experience_years: req.experience_years,
                bio: req.bio,
                updated_at: now,
                ..existing
            };
            state
                .store
                .update(collections::PROFILES, updated.id, to_document(&updated)?)
                .await?;
            updated
        }
        None => {
            let created = Profile {
                id: Uuid::new_v4(),
                user_id: auth.user_id,
                name: req.name,
                headline: req.headline,
                location: req.location,
                skills: req.skills,
                experience_years: req.experience_years,
                bio: req.bio,
                created_at: now,
                updated_at: now,
            };
            state
                .store
                .insert(collections::PROFILES, to_document(&created)?)
                .await?;
            created
        }
    };

    state.invalidator.after_profile_write(auth.user_id).await;
    Ok(Json(profile))
}

/// GET /api/profiles
///
/// Uncached: the invalidation rules have no pattern for this listing.
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let payload = run_listing(
        state.store.as_ref(),
        collections::PROFILES,
        &PROFILE_LISTING,
        &params,
        FilterExpression::new(),
    )
    .await?;
    Ok(Json(payload))
}
