//! Interview question lifecycle and the generation fallback ladder.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::upstream::models::QuestionRequest;
use crate::upstream::{UpstreamClient, UpstreamError};

pub const GENERIC_QUESTIONS: [&str; 3] = [
    "Can you walk me through your relevant experience?",
    "What technical challenges have you faced in your previous projects?",
    "How do you approach problem-solving in a technical context?",
];

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: usize,
    pub text: String,
    pub asked: bool,
    pub skipped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskedQuestion {
    pub id: Uuid,
    pub text: String,
    pub timestamp: String,
}

/// Question state for one session: the current batch plus the asked
/// history. The history survives job switches; the batch does not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuestionBoard {
    pub generated: bool,
    pub loading: bool,
    pub questions: Vec<Question>,
    pub history: Vec<AskedQuestion>,
}

impl QuestionBoard {
    pub fn pending(&self) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| !q.asked && !q.skipped)
            .cloned()
            .collect()
    }

    /// Installs a freshly generated batch, replacing any previous one.
    pub fn replace(&mut self, texts: Vec<String>) {
        self.questions = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Question {
                id: index + 1,
                text,
                asked: false,
                skipped: false,
            })
            .collect();
    }

    pub fn ask(&mut self, id: usize) -> bool {
        let text = match self.questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.asked = true;
                question.text.clone()
            }
            None => return false,
        };
        self.history.push(AskedQuestion {
            id: Uuid::new_v4(),
            text,
            timestamp: Utc::now().format("%H:%M:%S").to_string(),
        });
        true
    }

    pub fn skip(&mut self, id: usize) -> bool {
        match self.questions.iter_mut().find(|q| q.id == id) {
            Some(question) => {
                question.skipped = true;
                true
            }
            None => false,
        }
    }

    /// Clears the batch for a new job. The asked history is kept.
    pub fn reset(&mut self) {
        self.generated = false;
        self.loading = false;
        self.questions.clear();
    }
}

/// Question generation seam. Swap the source without touching the session
/// flow or the fallback ladder.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<String>, UpstreamError>;
}

/// Default source: the talent API's question generator.
pub struct UpstreamQuestionSource(pub UpstreamClient);

#[async_trait]
impl QuestionSource for UpstreamQuestionSource {
    async fn generate(&self, request: &QuestionRequest) -> Result<Vec<String>, UpstreamError> {
        self.0.generate_questions(request).await
    }
}

/// Five questions synthesized from the first five extracted skill names.
pub fn synthesized_from_skills(skills: &[String]) -> Vec<String> {
    skills
        .iter()
        .take(5)
        .map(|skill| format!("Can you explain your experience with {skill}?"))
        .collect()
}

pub fn generic_questions() -> Vec<String> {
    GENERIC_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// Fallback ladder: transport failure gets the three fixed generics;
/// a reachable-but-unusable upstream (bad status, malformed body) gets
/// skill-derived questions instead.
pub fn fallback_questions(error: &UpstreamError, skills: &[String]) -> Vec<String> {
    match error {
        UpstreamError::Http(_) => generic_questions(),
        _ => {
            let synthesized = synthesized_from_skills(skills);
            if synthesized.is_empty() {
                generic_questions()
            } else {
                synthesized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    async fn transport_error() -> UpstreamError {
        // Port 1 is never listening; gives a real connect error.
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        UpstreamError::Http(err)
    }

    #[test]
    fn test_replace_assigns_sequential_ids() {
        let mut board = QuestionBoard::default();
        board.replace(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(board.questions[0].id, 1);
        assert_eq!(board.questions[1].id, 2);
    }

    #[test]
    fn test_ask_moves_question_into_history() {
        let mut board = QuestionBoard::default();
        board.replace(vec!["one".to_string()]);
        assert!(board.ask(1));
        assert!(board.pending().is_empty());
        assert_eq!(board.history.len(), 1);
        assert_eq!(board.history[0].text, "one");
    }

    #[test]
    fn test_skip_hides_question_without_history_entry() {
        let mut board = QuestionBoard::default();
        board.replace(vec!["one".to_string()]);
        assert!(board.skip(1));
        assert!(board.pending().is_empty());
        assert!(board.history.is_empty());
    }

    #[test]
    fn test_ask_unknown_id_is_rejected() {
        let mut board = QuestionBoard::default();
        board.replace(vec!["one".to_string()]);
        assert!(!board.ask(99));
    }

    #[test]
    fn test_reset_clears_batch_but_keeps_history() {
        let mut board = QuestionBoard::default();
        board.replace(vec!["one".to_string()]);
        board.ask(1);
        board.generated = true;
        board.reset();
        assert!(!board.generated);
        assert!(board.questions.is_empty());
        assert_eq!(board.history.len(), 1);
    }

    #[test]
    fn test_synthesized_questions_take_first_five_skills() {
        let questions =
            synthesized_from_skills(&skills(&["React", "CSS3", "Rust", "Go", "SQL", "Kafka"]));
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0], "Can you explain your experience with React?");
        assert!(!questions.iter().any(|q| q.contains("Kafka")));
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_generics() {
        let err = transport_error().await;
        let questions = fallback_questions(&err, &skills(&["React"]));
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], GENERIC_QUESTIONS[0]);
    }

    #[test]
    fn test_bad_status_falls_back_to_skill_questions() {
        let err = UpstreamError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        let questions = fallback_questions(&err, &skills(&["React", "CSS3"]));
        assert_eq!(questions.len(), 2);
        assert!(questions[0].contains("React"));
    }

    #[test]
    fn test_malformed_body_with_no_skills_still_yields_generics() {
        let parse_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let questions = fallback_questions(&UpstreamError::Parse(parse_err), &[]);
        assert_eq!(questions.len(), 3);
    }
}
