use axum::{extract::State, Json};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::cache::response::recommendation_key;
use crate::errors::AppError;
use crate::models::from_document;
use crate::models::job::Job;
use crate::models::profile::Profile;
use crate::query::filter::FilterExpression;
use crate::query::sort::SortKey;
use crate::state::AppState;
use crate::store::collections;

use super::RECENT_JOBS_WINDOW;

/// GET /api/recommendations
///
/// Cached per user and skill set; any change to either (profile or job
/// writes) invalidates through the `recommendation:` namespace.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let profile = state
        .store
        .find_one(
            collections::PROFILES,
            &FilterExpression::eq_str("userId", auth.user_id.to_string()),
        )
        .await?
        .ok_or_else(|| {
            AppError::UnprocessableEntity(
                "Create a profile with at least one skill to get recommendations".into(),
            )
        })?;
    let profile: Profile = from_document(profile)?;
    if profile.skills.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "Add at least one skill to your profile to get recommendations".into(),
        ));
    }

    let key = recommendation_key(auth.user_id, &profile.skills);
    let payload = state
        .cache
        .get_or_store(&key, state.config.recommendation_ttl_secs, || async {
            let jobs = state
                .store
                .find(
                    collections::JOBS,
                    &FilterExpression::new(),
                    &vec![SortKey::desc("createdAt")],
                    0,
                    Some(RECENT_JOBS_WINDOW),
                )
                .await?;
            let jobs: Vec<Job> = jobs
                .into_iter()
                .map(from_document)
                .collect::<Result<_, _>>()?;

            let recommendations = state.recommender.recommend(&profile, &jobs).await?;
            serde_json::to_value(&recommendations).map_err(|e| AppError::Internal(e.into()))
        })
        .await?;

    Ok(Json(payload))
}
