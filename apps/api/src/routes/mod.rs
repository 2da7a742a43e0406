pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::jobs::handlers as jobs;
use crate::profiles::handlers as profiles;
use crate::recommendations::handlers as recommendations;
use crate::saved_jobs::handlers as saved_jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Profiles
        .route(
            "/api/profile",
            get(profiles::handle_get_my_profile).put(profiles::handle_upsert_profile),
        )
        .route("/api/profile/:user_id", get(profiles::handle_get_profile))
        .route("/api/profiles", get(profiles::handle_list_profiles))
        // Applications
        .route(
            "/api/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/applications/:id",
            patch(applications::handle_update_application_status)
                .delete(applications::handle_delete_application),
        )
        // Saved jobs
        .route(
            "/api/saved-jobs",
            get(saved_jobs::handle_list_saved_jobs).post(saved_jobs::handle_save_job),
        )
        .route(
            "/api/saved-jobs/:job_id",
            delete(saved_jobs::handle_unsave_job),
        )
        // Recommendations
        .route(
            "/api/recommendations",
            get(recommendations::handle_recommendations),
        )
        .with_state(state)
}
