//! Skill classification — merges job requirements, candidate skills, and
//! similarity-service matches into a single color class per skill node.
//!
//! Precedence is strict and first-match-wins: similarity matches, then
//! candidate-only skills, then progress tiers. When no similarity result
//! exists, naive set intersection stands in for the first two steps so the
//! overlay is never blank during degraded-service operation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Visual classification of a skill node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillClass {
    Matched,
    CandidateOnly,
    ProgressComplete,
    ProgressPartial,
    NotStarted,
}

/// One job-skill ↔ candidate-skill correspondence from the similarity
/// service. Name comparison is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatch {
    pub job_skill: String,
    pub candidate_skill: String,
    /// "exact" | "synonym" | "related" — informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<String>,
}

/// Externally computed correspondence between job and candidate skills.
/// Stored verbatim; never transformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarityResult {
    #[serde(default)]
    pub matches: Vec<SkillMatch>,
    #[serde(default)]
    pub candidate_only: Vec<String>,
    #[serde(default)]
    pub job_only: Vec<String>,
}

/// Classifies a single skill node. Pure: the result depends only on the
/// arguments, so recomputing the whole tree on any change is always safe.
pub fn classify(
    name: &str,
    job_skills: &HashSet<String>,
    candidate_skills: &HashSet<String>,
    similarity: Option<&SimilarityResult>,
    progress: u8,
) -> SkillClass {
    let lower = name.to_lowercase();

    match similarity {
        Some(sim) => {
            if sim
                .matches
                .iter()
                .any(|m| m.job_skill.to_lowercase() == lower)
            {
                return SkillClass::Matched;
            }
        }
        None => {
            if candidate_skills.contains(&lower) && job_skills.contains(&lower) {
                return SkillClass::Matched;
            }
        }
    }

    match similarity {
        Some(sim) => {
            if sim.candidate_only.iter().any(|s| s.to_lowercase() == lower) {
                return SkillClass::CandidateOnly;
            }
        }
        None => {
            if candidate_skills.contains(&lower) && !job_skills.contains(&lower) {
                return SkillClass::CandidateOnly;
            }
        }
    }

    match progress {
        0 => SkillClass::NotStarted,
        1..=99 => SkillClass::ProgressPartial,
        _ => SkillClass::ProgressComplete,
    }
}
