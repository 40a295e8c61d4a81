//! Skill tree data model — the nested hierarchy shared by job postings and
//! candidate resumes. Typed nodes (`skill` / `requirement`) are actual
//! skills; untyped nodes are organizational groups.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Skill,
    Requirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillNode {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SkillNode>,
}

impl SkillNode {
    /// A root with no children and no type carries nothing to render.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.children.is_empty()
    }
}

/// Collects the lowercased names of every typed node, descending into all
/// children regardless of node kind. Duplicates collapse; order is
/// irrelevant. Each tree gets its own independent set.
pub fn extract_skills(root: &SkillNode) -> HashSet<String> {
    let mut skills = HashSet::new();
    collect_skills(root, &mut skills);
    skills
}

fn collect_skills(node: &SkillNode, skills: &mut HashSet<String>) {
    if node.kind.is_some() {
        skills.insert(node.name.to_lowercase());
    }
    for child in &node.children {
        collect_skills(child, skills);
    }
}

/// Original-case names of every typed node in document order. Used for
/// question synthesis and progress seeding, where display casing matters.
pub fn skill_names(root: &SkillNode) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(root, &mut names);
    names
}

fn collect_names(node: &SkillNode, names: &mut Vec<String>) {
    if node.kind.is_some() {
        names.push(node.name.clone());
    }
    for child in &node.children {
        collect_names(child, names);
    }
}
