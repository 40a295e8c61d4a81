//! Per-skill interview progress, keyed by exact (original-case) node name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::overlay::tree::SkillNode;

pub const MAX_PROGRESS: u8 = 100;

/// Map from skill name to 0–100 progress. Reset to all-zero whenever a new
/// job tree loads; writes clamp at both bounds; missing entries read as 0.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillProgress(BTreeMap<String, u8>);

impl SkillProgress {
    /// Seeds a zero entry for every typed node in the tree.
    pub fn seeded_from(tree: &SkillNode) -> Self {
        let mut progress = Self::default();
        seed(tree, &mut progress.0);
        progress
    }

    pub fn get(&self, name: &str) -> u8 {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Stores a clamped value and returns what was stored.
    pub fn set(&mut self, name: &str, value: i64) -> u8 {
        let clamped = value.clamp(0, i64::from(MAX_PROGRESS)) as u8;
        self.0.insert(name.to_string(), clamped);
        clamped
    }

    pub fn increment(&mut self, name: &str, amount: i64) -> u8 {
        self.set(name, i64::from(self.get(name)) + amount)
    }

    pub fn as_map(&self) -> &BTreeMap<String, u8> {
        &self.0
    }
}

fn seed(node: &SkillNode, map: &mut BTreeMap<String, u8>) {
    if node.kind.is_some() {
        map.insert(node.name.clone(), 0);
    }
    for child in &node.children {
        seed(child, map);
    }
}
