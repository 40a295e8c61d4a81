//! The session context — explicit owner of all per-interview state.
//!
//! One context is live per service instance. Selecting a job replaces the
//! overlay engine wholesale; the candidate tree and the transcript survive
//! job switches, derived overlay state does not.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::warn;

use crate::overlay::classify::{SimilarityResult, SkillClass};
use crate::overlay::engine::{OverlayError, RenderFrame, SkillOverlayEngine};
use crate::overlay::layout::LayoutProvider;
use crate::overlay::progress::SkillProgress;
use crate::overlay::tree::SkillNode;
use crate::overlay::viewport::Transform;
use crate::session::questions::{AskedQuestion, Question, QuestionBoard};
use crate::session::recording::{RecordingSnapshot, RecordingState};
use crate::session::transcript::{scan, KeywordRule, TranscriptEntry};
use crate::upstream::models::SkillTreeDoc;

pub type SharedSession = Arc<Mutex<SessionContext>>;

pub const DEFAULT_VIEWPORT: (f32, f32) = (1200.0, 800.0);

pub struct SessionContext {
    pub job: Option<SkillTreeDoc>,
    pub candidate_tree: Option<SkillNode>,
    pub candidate_file_id: Option<String>,
    pub similarity: Option<SimilarityResult>,
    pub progress: SkillProgress,
    pub transcript: Vec<TranscriptEntry>,
    pub last_processed_index: usize,
    pub questions: QuestionBoard,
    pub recording: RecordingState,
    pub resume_busy: bool,
    pub viewport_size: (f32, f32),
    pub started_at: DateTime<Utc>,
    rules: Vec<KeywordRule>,
    viz: Option<SkillOverlayEngine>,
}

impl SessionContext {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        SessionContext {
            job: None,
            candidate_tree: None,
            candidate_file_id: None,
            similarity: None,
            progress: SkillProgress::default(),
            transcript: Vec::new(),
            last_processed_index: 0,
            questions: QuestionBoard::default(),
            recording: RecordingState::default(),
            resume_busy: false,
            viewport_size: DEFAULT_VIEWPORT,
            started_at: Utc::now(),
            rules,
            viz: None,
        }
    }

    /// Installs a freshly fetched job tree. Progress reseeds to zero,
    /// similarity and the question batch clear, the candidate tree is
    /// kept, and the previous overlay instance is fully discarded.
    pub fn install_job(
        &mut self,
        layout: Arc<dyn LayoutProvider>,
        doc: SkillTreeDoc,
    ) -> Result<(), OverlayError> {
        let progress = SkillProgress::seeded_from(&doc.tree);
        let (width, height) = self.viewport_size;
        let engine = SkillOverlayEngine::new(
            layout,
            width,
            height,
            &doc.tree,
            self.candidate_tree.as_ref(),
            None,
            &progress,
        )?;
        self.progress = progress;
        self.similarity = None;
        self.questions.reset();
        self.viz = Some(engine);
        self.job = Some(doc);
        Ok(())
    }

    /// Clears all tree-derived state after a failed or abandoned selection.
    pub fn clear_job(&mut self) {
        self.job = None;
        self.viz = None;
        self.similarity = None;
        self.progress = SkillProgress::default();
        self.questions.reset();
    }

    /// Stores the processed resume and re-renders the overlay with the new
    /// candidate skills and similarity data.
    pub fn install_candidate(
        &mut self,
        tree: SkillNode,
        file_id: Option<String>,
        similarity: Option<SimilarityResult>,
    ) {
        self.candidate_tree = Some(tree);
        self.candidate_file_id = file_id;
        self.similarity = similarity;
        if let (Some(viz), Some(job)) = (self.viz.as_mut(), self.job.as_ref()) {
            if let Err(err) = viz.full_update(
                &job.tree,
                self.candidate_tree.as_ref(),
                self.similarity.as_ref(),
                &self.progress,
            ) {
                warn!("overlay refresh failed after resume upload: {err}");
            }
        }
    }

    /// Clamps and stores a progress value, then re-renders through the
    /// live engine. The render side is a silent no-op until a tree loads.
    pub fn update_skill_progress(&mut self, skill: &str, value: i64) -> u8 {
        let stored = self.progress.set(skill, value);
        self.refresh_overlay();
        stored
    }

    pub fn increment_skill_progress(&mut self, skill: &str, amount: i64) -> u8 {
        let stored = self.progress.increment(skill, amount);
        self.refresh_overlay();
        stored
    }

    fn refresh_overlay(&mut self) {
        if let Some(viz) = self.viz.as_mut() {
            viz.update_progress(
                self.candidate_tree.as_ref(),
                self.similarity.as_ref(),
                &self.progress,
            );
        }
    }

    pub fn append_transcript(&mut self, text: String) {
        self.transcript.push(TranscriptEntry::now(text));
    }

    /// Scans transcript entries appended since the last tick and applies
    /// keyword-triggered progress increments. Entries spoken while not
    /// recording stay queued until recording starts.
    pub fn process_transcript(&mut self) {
        if !self.recording.is_recording || self.transcript.len() <= self.last_processed_index {
            return;
        }
        let texts: Vec<String> = self.transcript[self.last_processed_index..]
            .iter()
            .map(|entry| entry.text.clone())
            .collect();
        self.last_processed_index = self.transcript.len();

        let mut updates = Vec::new();
        for text in &texts {
            updates.extend(scan(text, &self.rules));
        }
        for (skill, amount) in updates {
            self.increment_skill_progress(&skill, amount);
        }
    }

    /// Resets progress and zoom, then re-renders with the candidate and
    /// similarity overlays intact.
    pub fn reset_layout(&mut self) {
        let Some(job) = self.job.clone() else {
            return;
        };
        self.progress = SkillProgress::seeded_from(&job.tree);
        if let Some(viz) = self.viz.as_mut() {
            viz.reset_zoom();
            if let Err(err) = viz.full_update(
                &job.tree,
                self.candidate_tree.as_ref(),
                self.similarity.as_ref(),
                &self.progress,
            ) {
                warn!("overlay refresh failed during layout reset: {err}");
            }
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport_size = (width, height);
        if let Some(viz) = self.viz.as_mut() {
            viz.resize(
                width,
                height,
                self.candidate_tree.as_ref(),
                self.similarity.as_ref(),
                &self.progress,
            );
        }
    }

    pub fn zoom_in(&mut self) -> Option<Transform> {
        self.viz.as_mut().map(|viz| viz.zoom_in())
    }

    pub fn zoom_out(&mut self) -> Option<Transform> {
        self.viz.as_mut().map(|viz| viz.zoom_out())
    }

    pub fn reset_zoom(&mut self) -> Option<Transform> {
        self.viz.as_mut().map(|viz| viz.reset_zoom())
    }

    pub fn transform(&self) -> Option<Transform> {
        self.viz.as_ref().map(|viz| viz.transform())
    }

    pub fn frame(&self) -> Option<&RenderFrame> {
        self.viz.as_ref().map(|viz| viz.frame())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            started_at: self.started_at,
            job: self.job.as_ref().map(|job| JobHeader {
                job_id: job.job_id,
                job_title: job.job_title.clone(),
                location: job.location.clone(),
                application_url: job.application_url.clone(),
            }),
            recording: self.recording.snapshot(),
            transcript: self.transcript.clone(),
            questions: QuestionsSnapshot {
                generated: self.questions.generated,
                loading: self.questions.loading,
                pending: self.questions.pending(),
                history: self.questions.history.clone(),
            },
            progress: self.progress.as_map().clone(),
            classifications: self.viz.as_ref().map(|viz| viz.classifications()),
            candidate_file_id: self.candidate_file_id.clone(),
            has_candidate_tree: self.candidate_tree.is_some(),
            has_similarity: self.similarity.is_some(),
            resume_busy: self.resume_busy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobHeader {
    pub job_id: u64,
    pub job_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionsSnapshot {
    pub generated: bool,
    pub loading: bool,
    pub pending: Vec<Question>,
    pub history: Vec<AskedQuestion>,
}

#[derive(Serialize)]
pub struct SessionSnapshot {
    pub started_at: DateTime<Utc>,
    pub job: Option<JobHeader>,
    pub recording: RecordingSnapshot,
    pub transcript: Vec<TranscriptEntry>,
    pub questions: QuestionsSnapshot,
    pub progress: BTreeMap<String, u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifications: Option<BTreeMap<String, SkillClass>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_file_id: Option<String>,
    pub has_candidate_tree: bool,
    pub has_similarity: bool,
    pub resume_busy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::layout::TidyTreeLayout;
    use crate::session::transcript::default_rules;
    use serde_json::json;

    fn make_doc() -> SkillTreeDoc {
        serde_json::from_value(json!({
            "name": "Skills",
            "children": [
                {"name": "React", "type": "skill"},
                {"name": "CSS3", "type": "skill"}
            ],
            "job_id": 42,
            "job_title": "Frontend Engineer",
            "location": "Remote",
            "application_url": "https://example.com/apply"
        }))
        .unwrap()
    }

    fn make_session() -> SessionContext {
        SessionContext::new(default_rules())
    }

    fn layout() -> Arc<dyn LayoutProvider> {
        Arc::new(TidyTreeLayout)
    }

    #[test]
    fn test_install_job_seeds_progress_and_builds_overlay() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        assert_eq!(session.progress.get("React"), 0);
        assert_eq!(session.progress.get("CSS3"), 0);
        assert!(session.frame().is_some());
        assert!(session.job.is_some());
    }

    #[test]
    fn test_install_job_preserves_candidate_and_clears_similarity() {
        let mut session = make_session();
        session.candidate_tree = Some(serde_json::from_value(json!({
            "name": "Skills",
            "children": [{"name": "React", "type": "skill"}]
        })).unwrap());
        session.similarity = Some(SimilarityResult::default());

        session.install_job(layout(), make_doc()).unwrap();
        assert!(session.candidate_tree.is_some());
        assert!(session.similarity.is_none());
        // Naive fallback sees the preserved candidate tree immediately.
        let classes = session.snapshot().classifications.unwrap();
        assert_eq!(classes["React"], SkillClass::Matched);
    }

    #[test]
    fn test_progress_update_without_tree_is_stored_but_renders_nothing() {
        let mut session = make_session();
        let stored = session.update_skill_progress("React", 150);
        assert_eq!(stored, 100);
        assert_eq!(session.progress.get("React"), 100);
        assert!(session.frame().is_none());
    }

    #[test]
    fn test_progress_update_reclassifies_live_overlay() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        session.update_skill_progress("CSS3", 100);
        let classes = session.snapshot().classifications.unwrap();
        assert_eq!(classes["CSS3"], SkillClass::ProgressComplete);
    }

    #[test]
    fn test_process_transcript_applies_keyword_increments_once() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        session.recording.is_recording = true;
        session.append_transcript("I build React components".to_string());

        session.process_transcript();
        assert_eq!(session.progress.get("React"), 20);

        // Already-processed entries are not re-scanned.
        session.process_transcript();
        assert_eq!(session.progress.get("React"), 20);
    }

    #[test]
    fn test_process_transcript_waits_for_recording() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        session.append_transcript("typescript interfaces everywhere".to_string());

        session.process_transcript();
        assert_eq!(session.progress.get("TypeScript"), 0);

        session.recording.is_recording = true;
        session.process_transcript();
        assert_eq!(session.progress.get("TypeScript"), 20);
    }

    #[test]
    fn test_reset_layout_zeroes_progress_and_restores_default_zoom() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        session.update_skill_progress("React", 60);
        session.zoom_in();

        session.reset_layout();
        assert_eq!(session.progress.get("React"), 0);
        assert!((session.transform().unwrap().k - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_clear_job_discards_derived_state() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        session.clear_job();
        assert!(session.job.is_none());
        assert!(session.frame().is_none());
        assert!(session.progress.as_map().is_empty());
    }

    #[test]
    fn test_snapshot_carries_job_header() {
        let mut session = make_session();
        session.install_job(layout(), make_doc()).unwrap();
        let snapshot = session.snapshot();
        let job = snapshot.job.unwrap();
        assert_eq!(job.job_id, 42);
        assert_eq!(job.job_title, "Frontend Engineer");
        assert_eq!(job.application_url.as_deref(), Some("https://example.com/apply"));
    }
}
