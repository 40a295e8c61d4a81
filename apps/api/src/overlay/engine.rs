//! Skill overlay engine — merges the job tree, an optional candidate tree,
//! an optional similarity result, and the progress map into a classified
//! render frame.
//!
//! Every update rebuilds the derived skill sets and reclassifies the whole
//! tree from scratch; classification is pure, so there is no partial-diff
//! path and no state survives a job-tree swap. The zoom transform is the
//! one piece that persists across re-renders.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::overlay::classify::{classify, SimilarityResult, SkillClass};
use crate::overlay::layout::{LayoutArea, LayoutProvider, TreeLayout};
use crate::overlay::progress::SkillProgress;
use crate::overlay::tree::{extract_skills, NodeKind, SkillNode};
use crate::overlay::viewport::{Transform, Viewport};

pub const SKILL_NODE_RADIUS: f32 = 8.0;
pub const GROUP_NODE_RADIUS: f32 = 6.0;
pub const LEAF_NODE_RADIUS: f32 = 4.0;
pub const PROGRESS_BAR_WIDTH: f32 = 40.0;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("nothing to display: the job skill tree is empty")]
    NothingToDisplay,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressBar {
    pub value: u8,
    pub fill_width: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<SkillClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_bar: Option<ProgressBar>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderEdge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub transform: Transform,
}

impl RenderFrame {
    /// Name → class for every typed node, in stable order.
    pub fn classifications(&self) -> BTreeMap<String, SkillClass> {
        self.nodes
            .iter()
            .filter(|n| n.kind.is_some())
            .filter_map(|n| n.class.map(|c| (n.name.clone(), c)))
            .collect()
    }
}

pub struct SkillOverlayEngine {
    layout: Arc<dyn LayoutProvider>,
    viewport: Viewport,
    job_tree: SkillNode,
    job_skills: HashSet<String>,
    candidate_skills: HashSet<String>,
    similarity: Option<SimilarityResult>,
    frame: RenderFrame,
}

impl SkillOverlayEngine {
    /// Builds a live overlay for a job tree. Refuses empty trees so the
    /// caller can show "nothing to display" instead of a blank render.
    /// A fresh engine starts at the default centered zoom.
    pub fn new(
        layout: Arc<dyn LayoutProvider>,
        width: f32,
        height: f32,
        job_tree: &SkillNode,
        candidate_tree: Option<&SkillNode>,
        similarity: Option<&SimilarityResult>,
        progress: &SkillProgress,
    ) -> Result<Self, OverlayError> {
        if job_tree.is_empty() {
            return Err(OverlayError::NothingToDisplay);
        }
        let viewport = Viewport::new(width, height);
        let mut engine = SkillOverlayEngine {
            layout,
            viewport,
            job_tree: job_tree.clone(),
            job_skills: HashSet::new(),
            candidate_skills: HashSet::new(),
            similarity: None,
            frame: RenderFrame {
                nodes: Vec::new(),
                edges: Vec::new(),
                transform: viewport.transform,
            },
        };
        engine.apply(candidate_tree, similarity, progress);
        Ok(engine)
    }

    /// Full update: replaces the job tree, rebuilds both skill sets from
    /// scratch, stores the similarity result verbatim, and re-renders. The
    /// only path that may change set membership or structural layout.
    pub fn full_update(
        &mut self,
        job_tree: &SkillNode,
        candidate_tree: Option<&SkillNode>,
        similarity: Option<&SimilarityResult>,
        progress: &SkillProgress,
    ) -> Result<(), OverlayError> {
        if job_tree.is_empty() {
            return Err(OverlayError::NothingToDisplay);
        }
        self.job_tree = job_tree.clone();
        self.apply(candidate_tree, similarity, progress);
        Ok(())
    }

    /// Incremental progress path: structure unchanged, so re-render against
    /// the existing job tree.
    pub fn update_progress(
        &mut self,
        candidate_tree: Option<&SkillNode>,
        similarity: Option<&SimilarityResult>,
        progress: &SkillProgress,
    ) {
        self.apply(candidate_tree, similarity, progress);
    }

    /// Viewport size change: re-layout with the full overlay state intact
    /// and the zoom reset to the default.
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        candidate_tree: Option<&SkillNode>,
        similarity: Option<&SimilarityResult>,
        progress: &SkillProgress,
    ) {
        self.viewport.resize(width, height);
        self.apply(candidate_tree, similarity, progress);
    }

    pub fn zoom_in(&mut self) -> Transform {
        self.viewport.zoom_in();
        self.frame.transform = self.viewport.transform;
        self.viewport.transform
    }

    pub fn zoom_out(&mut self) -> Transform {
        self.viewport.zoom_out();
        self.frame.transform = self.viewport.transform;
        self.viewport.transform
    }

    pub fn reset_zoom(&mut self) -> Transform {
        self.viewport.reset_zoom();
        self.frame.transform = self.viewport.transform;
        self.viewport.transform
    }

    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform
    }

    pub fn classifications(&self) -> BTreeMap<String, SkillClass> {
        self.frame.classifications()
    }

    fn apply(
        &mut self,
        candidate_tree: Option<&SkillNode>,
        similarity: Option<&SimilarityResult>,
        progress: &SkillProgress,
    ) {
        self.job_skills = extract_skills(&self.job_tree);
        self.candidate_skills = candidate_tree.map(extract_skills).unwrap_or_default();
        self.similarity = similarity.cloned();
        self.render(progress);
    }

    fn render(&mut self, progress: &SkillProgress) {
        let area = LayoutArea::from_viewport(self.viewport.width, self.viewport.height);
        let TreeLayout { nodes, edges } = self.layout.layout(&self.job_tree, area);

        let nodes = nodes
            .into_iter()
            .map(|placed| {
                let (radius, class, progress_bar) = if placed.kind.is_some() {
                    let value = progress.get(&placed.name);
                    let class = classify(
                        &placed.name,
                        &self.job_skills,
                        &self.candidate_skills,
                        self.similarity.as_ref(),
                        value,
                    );
                    let bar = (value > 0).then(|| ProgressBar {
                        value,
                        fill_width: PROGRESS_BAR_WIDTH * f32::from(value) / 100.0,
                    });
                    (SKILL_NODE_RADIUS, Some(class), bar)
                } else if placed.has_children {
                    (GROUP_NODE_RADIUS, None, None)
                } else {
                    (LEAF_NODE_RADIUS, None, None)
                };
                RenderNode {
                    name: placed.name,
                    kind: placed.kind,
                    depth: placed.depth,
                    x: placed.x,
                    y: placed.y,
                    radius,
                    class,
                    progress_bar,
                }
            })
            .collect();

        self.frame = RenderFrame {
            nodes,
            edges: edges
                .into_iter()
                .map(|(from, to)| RenderEdge { from, to })
                .collect(),
            transform: self.viewport.transform,
        };
    }
}
