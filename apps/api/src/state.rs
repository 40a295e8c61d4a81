use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::overlay::layout::LayoutProvider;
use crate::session::context::SharedSession;
use crate::session::questions::QuestionSource;
use crate::upstream::UpstreamClient;

/// Shared application state injected into all route handlers via Axum
/// extractors. Owns the single live session context — there is no ambient
/// module-level state anywhere else.
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub upstream: UpstreamClient,
    /// Pluggable question generator. Default: the upstream talent API.
    pub questions: Arc<dyn QuestionSource>,
    /// Injected tree layout capability used by every overlay instance.
    pub layout: Arc<dyn LayoutProvider>,
    /// Monotonic token for job selections; a skill-tree fetch that loses
    /// the race against a newer selection is discarded.
    pub selection: Arc<AtomicU64>,
}
