//! AI job recommendations — pluggable, trait-based.
//!
//! Default in production: `LlmRecommender` (Claude). `SkillOverlapRecommender`
//! is deterministic and serves both the test suite and API-key-less runs.
//!
//! `AppState` holds an `Arc<dyn Recommender>`, picked at startup.

pub mod handlers;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::job::Job;
use crate::models::profile::Profile;

/// How many of the newest postings are offered to the recommender.
pub const RECENT_JOBS_WINDOW: u64 = 50;

/// One recommended posting with the model's reasoning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub job: String,
    pub company: String,
    pub reason: String,
}

#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(
        &self,
        profile: &Profile,
        jobs: &[Job],
    ) -> Result<Vec<Recommendation>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmRecommender — Claude-backed production path
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmRecommender(pub LlmClient);

#[async_trait]
impl Recommender for LlmRecommender {
    async fn recommend(
        &self,
        profile: &Profile,
        jobs: &[Job],
    ) -> Result<Vec<Recommendation>, AppError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = prompts::build_recommendation_prompt(profile, jobs);
        self.0
            .complete_json::<Vec<Recommendation>>(prompts::RECOMMEND_SYSTEM, &prompt)
            .await
            .map_err(|e| AppError::Llm(e.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SkillOverlapRecommender — deterministic fallback
// ────────────────────────────────────────────────────────────────────────────

/// Ranks postings by case-insensitive skill overlap with the profile and
/// keeps the top five with at least one shared skill.
pub struct SkillOverlapRecommender;

const MAX_RESULTS: usize = 5;

#[async_trait]
impl Recommender for SkillOverlapRecommender {
    async fn recommend(
        &self,
        profile: &Profile,
        jobs: &[Job],
    ) -> Result<Vec<Recommendation>, AppError> {
        let wanted: Vec<String> = profile.skills.iter().map(|s| s.to_lowercase()).collect();

        let mut scored: Vec<(usize, Vec<&str>, &Job)> = jobs
            .iter()
            .map(|job| {
                let shared: Vec<&str> = job
                    .skills
                    .iter()
                    .filter(|skill| wanted.contains(&skill.to_lowercase()))
                    .map(String::as_str)
                    .collect();
                (shared.len(), shared, job)
            })
            .filter(|(count, _, _)| *count > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(_, shared, job)| Recommendation {
                job: job.title.clone(),
                company: job.company.clone(),
                reason: format!("Matches your skills: {}", shared.join(", ")),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(skills: &[&str]) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Dev".into(),
            headline: None,
            location: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: 3,
            bio: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn job(title: &str, company: &str, skills: &[&str]) -> Job {
        Job {
            id: Uuid::new_v4(),
            title: title.into(),
            company: company.into(),
            location: "Remote".into(),
            job_type: "full-time".into(),
            description: String::new(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            salary: crate::models::job::Salary {
                min: 50_000,
                max: 90_000,
            },
            posted_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_overlap_ranking_ignores_case_and_unrelated_jobs() {
        let recommender = SkillOverlapRecommender;
        let jobs = vec![
            job("Backend", "Acme", &["rust", "postgres"]),
            job("Frontend", "Initech", &["React"]),
            job("Gardener", "Lawn Co", &["pruning"]),
        ];
        let recs = recommender
            .recommend(&profile(&["Rust", "react", "Postgres"]), &jobs)
            .await
            .unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].job, "Backend");
        assert_eq!(recs[0].company, "Acme");
        assert!(recs[0].reason.contains("rust"));
        assert_eq!(recs[1].job, "Frontend");
    }

    #[tokio::test]
    async fn test_at_most_five_recommendations() {
        let recommender = SkillOverlapRecommender;
        let jobs: Vec<Job> = (0..8).map(|i| job(&format!("Role {i}"), "Acme", &["go"])).collect();
        let recs = recommender.recommend(&profile(&["Go"]), &jobs).await.unwrap();
        assert_eq!(recs.len(), 5);
    }

    #[tokio::test]
    async fn test_no_jobs_means_no_recommendations() {
        let recs = SkillOverlapRecommender
            .recommend(&profile(&["rust"]), &[])
            .await
            .unwrap();
        assert!(recs.is_empty());
    }
}
