//! Transcript entries and the keyword → skill progress rule table.
//!
//! The rule table is declarative data, not code: each rule names the
//! substrings that trigger it, the skill it credits, and the increment.
//! An override table can be loaded from JSON at startup.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: String,
    pub text: String,
}

impl TranscriptEntry {
    pub fn now(text: impl Into<String>) -> Self {
        TranscriptEntry {
            timestamp: Utc::now().format("%H:%M:%S").to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub skill: String,
    pub increment: i64,
}

pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        make_rule(&["react", "component"], "React", 20),
        make_rule(&["typescript", "interface"], "TypeScript", 20),
        make_rule(&["css", "flexbox", "styling"], "CSS3", 20),
        make_rule(&["javascript"], "JavaScript", 20),
    ]
}

fn make_rule(keywords: &[&str], skill: &str, increment: i64) -> KeywordRule {
    KeywordRule {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        skill: skill.to_string(),
        increment,
    }
}

/// Scans one utterance and returns the (skill, increment) updates it
/// triggers. Matching is case-insensitive substring search; a rule fires
/// at most once per utterance.
pub fn scan(text: &str, rules: &[KeywordRule]) -> Vec<(String, i64)> {
    let lower = text.to_lowercase();
    rules
        .iter()
        .filter(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| lower.contains(&keyword.to_lowercase()))
        })
        .map(|rule| (rule.skill.clone(), rule.increment))
        .collect()
}

pub fn load_rules(path: &str) -> Result<Vec<KeywordRule>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keyword rules from '{path}'"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid keyword rules in '{path}'"))
}
