//! Prompt construction for the recommendation flow.

use crate::models::job::Job;
use crate::models::profile::Profile;

/// System prompt — enforces JSON-only output.
pub const RECOMMEND_SYSTEM: &str =
    "You are a career advisor for a job-matching platform. \
    Given a candidate profile and a list of open positions, choose the \
    positions that fit the candidate best and explain why in one sentence each. \
    You MUST respond with a valid JSON array only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences.";

pub fn build_recommendation_prompt(profile: &Profile, jobs: &[Job]) -> String {
    let mut prompt = String::from(
        "Recommend up to 5 of the following positions for this candidate.\n\n\
         Return a JSON array with this EXACT schema:\n\
         [{\"job\": \"<job title>\", \"company\": \"<company>\", \"reason\": \"<one sentence>\"}]\n\n\
         Candidate:\n",
    );
    prompt.push_str(&format!(
        "- name: {}\n- skills: {}\n- experience_years: {}\n",
        profile.name,
        profile.skills.join(", "),
        profile.experience_years,
    ));
    if let Some(headline) = &profile.headline {
        prompt.push_str(&format!("- headline: {headline}\n"));
    }
    if let Some(location) = &profile.location {
        prompt.push_str(&format!("- location: {location}\n"));
    }

    prompt.push_str("\nOpen positions:\n");
    for job in jobs {
        prompt.push_str(&format!(
            "- {} at {} ({}, {}) — skills: {}; salary: {}-{}\n",
            job.title,
            job.company,
            job.location,
            job.job_type,
            job.skills.join(", "),
            job.salary.min,
            job.salary.max,
        ));
    }
    prompt
}
