// SPDX-License-Identifier: MIT

//! Roadmap reconciliation
//!
//! Turns the JSON emitted by an "extraction" node (MoSCoW buckets, feature
//! dependencies, risks) and a "planning" node (per-quarter workstream feature
//! lists, quarterly narratives) into a normalized RoadmapData graph.

mod matching;
mod reconciler;
mod types;

pub use matching::{
    extract_milestones, fuzzy_matches, resolve_dependencies, resolve_priority, DependencyEntry,
    MILESTONE_NAME_LIMIT,
};
pub use reconciler::reconcile;
pub use types::{Milestone, Priority, RoadmapData, RoadmapFeature, Workstream};
