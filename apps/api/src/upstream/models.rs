//! Wire types for the talent API.

use serde::{Deserialize, Serialize};

use crate::overlay::classify::SimilarityResult;
use crate::overlay::tree::SkillNode;

#[derive(Debug, Clone, Deserialize)]
pub struct JobListing {
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: u64,
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A job's skill tree document: the nested tree plus posting metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillTreeDoc {
    #[serde(flatten)]
    pub tree: SkillNode,
    pub job_id: u64,
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionRequest {
    pub job_title: String,
    pub location: String,
    /// First ten skill names, comma-joined. Kept for the upstream fallback.
    pub skills: String,
    pub job_skill_tree: SkillTreeDoc,
    pub candidate_skill_tree: Option<SkillNode>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionResponse {
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeUploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub skill_tree: Option<SkillNode>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub similarity_data: Option<SimilarityResult>,
    #[serde(default)]
    pub error: Option<String>,
}
