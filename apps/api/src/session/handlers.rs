use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::overlay::engine::RenderFrame;
use crate::overlay::tree::skill_names;
use crate::overlay::viewport::Transform;
use crate::session::context::SessionSnapshot;
use crate::session::questions::{self, Question};
use crate::session::recording;
use crate::state::AppState;
use crate::upstream::models::{JobSummary, QuestionRequest};

#[derive(Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobSummary>,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<JobsResponse>, AppError> {
    let jobs = state.upstream.list_jobs().await?;
    Ok(Json(JobsResponse { jobs }))
}

#[derive(Deserialize)]
pub struct SelectJobRequest {
    pub job_id: u64,
}

/// POST /api/v1/session/job
///
/// Guarded by a generation counter: a skill-tree fetch that resolves after
/// a newer selection was issued is discarded without touching state.
pub async fn handle_select_job(
    State(state): State<AppState>,
    Json(request): Json<SelectJobRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let generation = state.selection.fetch_add(1, Ordering::SeqCst) + 1;
    let fetched = state.upstream.skill_tree(request.job_id).await;

    let mut session = state.session.lock().await;
    if state.selection.load(Ordering::SeqCst) != generation {
        return Err(AppError::Stale(
            "Job selection superseded by a newer request".to_string(),
        ));
    }
    match fetched {
        Ok(doc) => {
            info!("loaded skill tree for job {} ({})", doc.job_id, doc.job_title);
            session.install_job(Arc::clone(&state.layout), doc)?;
            Ok(Json(session.snapshot()))
        }
        Err(err) => {
            warn!("failed to load skill tree for job {}: {err}", request.job_id);
            session.clear_job();
            Err(err.into())
        }
    }
}

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

/// GET /api/v1/session/frame
pub async fn handle_get_frame(
    State(state): State<AppState>,
) -> Result<Json<RenderFrame>, AppError> {
    let session = state.session.lock().await;
    session
        .frame()
        .cloned()
        .map(Json)
        .ok_or(AppError::NothingToDisplay)
}

#[derive(Serialize)]
pub struct ResumeUploadAck {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// POST /api/v1/session/resume
///
/// The PDF gate runs before any network call; the busy flag is cleared
/// unconditionally once the upstream call finishes.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadAck>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(format!("Invalid upload: {err}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        if field.content_type() != Some("application/pdf") {
            return Err(AppError::Validation("Please upload a PDF file".to_string()));
        }
        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::Validation(format!("Failed to read upload: {err}")))?;
        file = Some((file_name, bytes.to_vec()));
    }
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    upload_resume_inner(&state, file_name, bytes).await
}

async fn upload_resume_inner(
    state: &AppState,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<Json<ResumeUploadAck>, AppError> {
    let job_id = {
        let mut session = state.session.lock().await;
        if session.resume_busy {
            return Err(AppError::Conflict(
                "A resume upload is already in progress".to_string(),
            ));
        }
        session.resume_busy = true;
        session.job.as_ref().map(|job| job.job_id)
    };

    let outcome = state.upstream.upload_resume(file_name, bytes, job_id).await;

    let mut session = state.session.lock().await;
    session.resume_busy = false;
    let response = outcome?;
    let tree = response.skill_tree.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("resume response missing skill tree"))
    })?;
    let file_id = response.file_id.clone();
    info!("resume processed (file id {:?})", file_id);
    session.install_candidate(tree, response.file_id, response.similarity_data);
    Ok(Json(ResumeUploadAck {
        message: "Resume processed successfully!".to_string(),
        file_id,
    }))
}

#[derive(Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

/// POST /api/v1/session/questions/generate
pub async fn handle_generate_questions(
    State(state): State<AppState>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let (request, skills) = {
        let mut session = state.session.lock().await;
        let Some(job) = session.job.clone() else {
            return Err(AppError::NothingToDisplay);
        };
        if session.questions.loading {
            return Err(AppError::Conflict(
                "Question generation is already in progress".to_string(),
            ));
        }
        session.questions.loading = true;
        session.questions.generated = true;
        let skills = skill_names(&job.tree);
        let request = QuestionRequest {
            job_title: job.job_title.clone(),
            location: job.location.clone().unwrap_or_default(),
            skills: skills
                .iter()
                .take(10)
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            job_skill_tree: job,
            candidate_skill_tree: session.candidate_tree.clone(),
        };
        (request, skills)
    };

    let outcome = state.questions.generate(&request).await;

    let mut session = state.session.lock().await;
    session.questions.loading = false;
    let texts = match outcome {
        Ok(texts) if !texts.is_empty() => texts,
        Ok(_) => {
            warn!("question generation returned an empty batch");
            let synthesized = questions::synthesized_from_skills(&skills);
            if synthesized.is_empty() {
                questions::generic_questions()
            } else {
                synthesized
            }
        }
        Err(err) => {
            warn!("question generation failed: {err}");
            questions::fallback_questions(&err, &skills)
        }
    };
    session.questions.replace(texts);
    Ok(Json(QuestionsResponse {
        questions: session.questions.pending(),
    }))
}

/// POST /api/v1/session/questions/:id/ask
pub async fn handle_ask_question(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut session = state.session.lock().await;
    if !session.questions.ask(id) {
        return Err(AppError::NotFound(format!("Question {id} not found")));
    }
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/session/questions/:id/skip
pub async fn handle_skip_question(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut session = state.session.lock().await;
    if !session.questions.skip(id) {
        return Err(AppError::NotFound(format!("Question {id} not found")));
    }
    Ok(Json(session.snapshot()))
}

#[derive(Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
}

/// POST /api/v1/session/transcript
pub async fn handle_append_transcript(
    State(state): State<AppState>,
    Json(request): Json<TranscriptRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.append_transcript(request.text);
    Json(session.snapshot())
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub skill: String,
    pub progress: i64,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub skill: String,
    pub progress: u8,
}

/// POST /api/v1/session/progress
pub async fn handle_set_progress(
    State(state): State<AppState>,
    Json(request): Json<ProgressRequest>,
) -> Json<ProgressResponse> {
    let mut session = state.session.lock().await;
    let stored = session.update_skill_progress(&request.skill, request.progress);
    Json(ProgressResponse {
        skill: request.skill,
        progress: stored,
    })
}

/// POST /api/v1/session/recording/start
pub async fn handle_start_recording(State(state): State<AppState>) -> Json<SessionSnapshot> {
    recording::start(&state.session).await;
    Json(state.session.lock().await.snapshot())
}

/// POST /api/v1/session/recording/stop
pub async fn handle_stop_recording(State(state): State<AppState>) -> Json<SessionSnapshot> {
    recording::stop(&state.session).await;
    Json(state.session.lock().await.snapshot())
}

/// POST /api/v1/session/mute
pub async fn handle_toggle_mute(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.recording.is_muted = !session.recording.is_muted;
    Json(session.snapshot())
}

#[derive(Serialize)]
pub struct ViewportResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

/// POST /api/v1/session/viewport/zoom-in
pub async fn handle_zoom_in(State(state): State<AppState>) -> Json<ViewportResponse> {
    let mut session = state.session.lock().await;
    Json(ViewportResponse {
        transform: session.zoom_in(),
    })
}

/// POST /api/v1/session/viewport/zoom-out
pub async fn handle_zoom_out(State(state): State<AppState>) -> Json<ViewportResponse> {
    let mut session = state.session.lock().await;
    Json(ViewportResponse {
        transform: session.zoom_out(),
    })
}

/// POST /api/v1/session/viewport/reset
pub async fn handle_reset_zoom(State(state): State<AppState>) -> Json<ViewportResponse> {
    let mut session = state.session.lock().await;
    Json(ViewportResponse {
        transform: session.reset_zoom(),
    })
}

#[derive(Deserialize)]
pub struct ResizeRequest {
    pub width: f32,
    pub height: f32,
}

/// POST /api/v1/session/viewport/resize
pub async fn handle_resize(
    State(state): State<AppState>,
    Json(request): Json<ResizeRequest>,
) -> Json<ViewportResponse> {
    let mut session = state.session.lock().await;
    session.resize(request.width, request.height);
    Json(ViewportResponse {
        transform: session.transform(),
    })
}

/// POST /api/v1/session/layout/reset
pub async fn handle_reset_layout(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.reset_layout();
    Json(session.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::layout::TidyTreeLayout;
    use crate::session::context::SessionContext;
    use crate::session::questions::{QuestionSource, UpstreamQuestionSource};
    use crate::session::transcript::default_rules;
    use crate::upstream::{UpstreamClient, UpstreamError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    fn make_state(server: &MockServer) -> AppState {
        let upstream = UpstreamClient::new(server.base_url(), Duration::from_secs(5));
        AppState {
            session: Arc::new(Mutex::new(SessionContext::new(default_rules()))),
            questions: Arc::new(UpstreamQuestionSource(upstream.clone())),
            upstream,
            layout: Arc::new(TidyTreeLayout),
            selection: Arc::new(AtomicU64::new(0)),
        }
    }

    fn tree_doc(job_id: u64, title: &str) -> serde_json::Value {
        json!({
            "name": "Skills",
            "children": [
                {"name": "React", "type": "skill"},
                {"name": "CSS3", "type": "skill"}
            ],
            "job_id": job_id,
            "job_title": title
        })
    }

    #[tokio::test]
    async fn test_select_job_installs_tree_and_snapshots() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/skill-trees/42");
                then.status(200).json_body(tree_doc(42, "Frontend Engineer"));
            })
            .await;

        let state = make_state(&server);
        let response = handle_select_job(
            State(state.clone()),
            Json(SelectJobRequest { job_id: 42 }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.job.unwrap().job_title, "Frontend Engineer");
        assert!(state.session.lock().await.frame().is_some());
    }

    #[tokio::test]
    async fn test_stale_selection_is_discarded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/skill-trees/1");
                then.status(200)
                    .delay(Duration::from_millis(250))
                    .json_body(tree_doc(1, "Old Job"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/skill-trees/2");
                then.status(200).json_body(tree_doc(2, "New Job"));
            })
            .await;

        let state = make_state(&server);
        let (first, second) = tokio::join!(
            handle_select_job(State(state.clone()), Json(SelectJobRequest { job_id: 1 })),
            handle_select_job(State(state.clone()), Json(SelectJobRequest { job_id: 2 })),
        );

        assert!(matches!(first, Err(AppError::Stale(_))));
        assert!(second.is_ok());
        let session = state.session.lock().await;
        assert_eq!(session.job.as_ref().unwrap().job_id, 2);
    }

    #[tokio::test]
    async fn test_select_job_not_found_clears_state() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/skill-trees/99");
                then.status(404).body("not found");
            })
            .await;

        let state = make_state(&server);
        let result = handle_select_job(
            State(state.clone()),
            Json(SelectJobRequest { job_id: 99 }),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(state.session.lock().await.job.is_none());
    }

    #[tokio::test]
    async fn test_resume_busy_flag_cleared_on_rejection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/upload-resume");
                then.status(500).json_body(json!({"error": "parser exploded"}));
            })
            .await;

        let state = make_state(&server);
        let result = upload_resume_inner(&state, "cv.pdf".to_string(), vec![1, 2, 3]).await;
        assert!(result.is_err());
        assert!(!state.session.lock().await.resume_busy);
    }

    #[tokio::test]
    async fn test_resume_success_installs_candidate() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/upload-resume");
                then.status(200).json_body(json!({
                    "success": true,
                    "skill_tree": {"name": "Skills", "children": [{"name": "React", "type": "skill"}]},
                    "file_id": "abcd1234",
                    "similarity_data": {"matches": [], "candidate_only": ["React"], "job_only": []}
                }));
            })
            .await;

        let state = make_state(&server);
        let ack = upload_resume_inner(&state, "cv.pdf".to_string(), vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(ack.0.file_id.as_deref(), Some("abcd1234"));
        let session = state.session.lock().await;
        assert!(session.candidate_tree.is_some());
        assert!(session.similarity.is_some());
        assert!(!session.resume_busy);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf_before_any_network_call() {
        let server = MockServer::start_async().await;
        let app = crate::routes::build_router(make_state(&server));

        let body = "--X\r\n\
            Content-Disposition: form-data; name=\"resume\"; filename=\"cv.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            hello\r\n\
            --X--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/session/resume")
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    struct FailingSource(fn() -> UpstreamError);

    #[async_trait]
    impl QuestionSource for FailingSource {
        async fn generate(&self, _request: &QuestionRequest) -> Result<Vec<String>, UpstreamError> {
            Err((self.0)())
        }
    }

    #[tokio::test]
    async fn test_generate_questions_falls_back_to_skill_synthesis() {
        let server = MockServer::start_async().await;
        let mut state = make_state(&server);
        state.questions = Arc::new(FailingSource(|| UpstreamError::Status {
            status: 500,
            message: "boom".to_string(),
        }));

        let doc = serde_json::from_value(tree_doc(42, "Frontend Engineer")).unwrap();
        state
            .session
            .lock()
            .await
            .install_job(Arc::new(TidyTreeLayout), doc)
            .unwrap();

        let response = handle_generate_questions(State(state.clone())).await.unwrap();
        let texts: Vec<&str> = response.0.questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("React"));
        assert!(texts[1].contains("CSS3"));

        let session = state.session.lock().await;
        assert!(session.questions.generated);
        assert!(!session.questions.loading);
    }

    #[tokio::test]
    async fn test_generate_questions_without_job_is_nothing_to_display() {
        let server = MockServer::start_async().await;
        let state = make_state(&server);
        let result = handle_generate_questions(State(state)).await;
        assert!(matches!(result, Err(AppError::NothingToDisplay)));
    }
}
