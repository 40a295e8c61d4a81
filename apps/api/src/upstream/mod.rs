//! Talent API client — the single point of entry for all upstream calls
//! (job list, skill trees, question generation, resume processing).
//!
//! No other module may talk to the talent service directly.

pub mod models;

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use models::{
    JobListing, JobSummary, QuestionRequest, QuestionResponse, ResumeUploadResponse, SkillTreeDoc,
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed upstream response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("skill tree not found for job {0}")]
    TreeNotFound(u64),

    #[error("{0}")]
    ResumeRejected(String),
}

#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        UpstreamClient {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/api/v1/jobs", self.base_url))
            .send()
            .await?;
        let body = checked_body(response).await?;
        let listing: JobListing = serde_json::from_str(&body)?;
        debug!("upstream returned {} jobs", listing.jobs.len());
        Ok(listing.jobs)
    }

    pub async fn skill_tree(&self, job_id: u64) -> Result<SkillTreeDoc, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/api/v1/skill-trees/{job_id}", self.base_url))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Err(UpstreamError::TreeNotFound(job_id));
        }
        let body = checked_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        let response = self
            .client
            .post(format!(
                "{}/api/v1/generate-interview-questions",
                self.base_url
            ))
            .json(request)
            .send()
            .await?;
        let body = checked_body(response).await?;
        let parsed: QuestionResponse = serde_json::from_str(&body)?;
        Ok(parsed.questions)
    }

    /// Forwards a PDF resume for skill extraction. The endpoint reports
    /// processing failures inside the JSON body, so the body is decoded
    /// before the status is considered.
    pub async fn upload_resume(
        &self,
        file_name: String,
        bytes: Vec<u8>,
        job_id: Option<u64>,
    ) -> Result<ResumeUploadResponse, UpstreamError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let mut form = reqwest::multipart::Form::new().part("resume", part);
        if let Some(id) = job_id {
            form = form.text("job_id", id.to_string());
        }

        let response = self
            .client
            .post(format!("{}/api/v1/upload-resume", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ResumeUploadResponse>(&body) {
            Ok(parsed) if parsed.success && parsed.skill_tree.is_some() => Ok(parsed),
            Ok(parsed) => {
                let message = parsed
                    .error
                    .unwrap_or_else(|| "Failed to process resume".to_string());
                warn!("resume upload rejected: {message}");
                Err(UpstreamError::ResumeRejected(message))
            }
            Err(err) if status.is_success() => Err(UpstreamError::Parse(err)),
            Err(_) => Err(UpstreamError::Status {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

async fn checked_body(response: reqwest::Response) -> Result<String, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!("upstream returned {status}: {message}");
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.text().await?)
}
