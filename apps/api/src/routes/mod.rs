pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", get(handlers::handle_list_jobs))
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/session/job", post(handlers::handle_select_job))
        .route("/api/v1/session/frame", get(handlers::handle_get_frame))
        .route("/api/v1/session/resume", post(handlers::handle_upload_resume))
        .route(
            "/api/v1/session/questions/generate",
            post(handlers::handle_generate_questions),
        )
        .route(
            "/api/v1/session/questions/:id/ask",
            post(handlers::handle_ask_question),
        )
        .route(
            "/api/v1/session/questions/:id/skip",
            post(handlers::handle_skip_question),
        )
        .route(
            "/api/v1/session/transcript",
            post(handlers::handle_append_transcript),
        )
        .route(
            "/api/v1/session/progress",
            post(handlers::handle_set_progress),
        )
        .route(
            "/api/v1/session/recording/start",
            post(handlers::handle_start_recording),
        )
        .route(
            "/api/v1/session/recording/stop",
            post(handlers::handle_stop_recording),
        )
        .route("/api/v1/session/mute", post(handlers::handle_toggle_mute))
        .route(
            "/api/v1/session/viewport/zoom-in",
            post(handlers::handle_zoom_in),
        )
        .route(
            "/api/v1/session/viewport/zoom-out",
            post(handlers::handle_zoom_out),
        )
        .route(
            "/api/v1/session/viewport/reset",
            post(handlers::handle_reset_zoom),
        )
        .route(
            "/api/v1/session/viewport/resize",
            post(handlers::handle_resize),
        )
        .route(
            "/api/v1/session/layout/reset",
            post(handlers::handle_reset_layout),
        )
        .with_state(state)
}
