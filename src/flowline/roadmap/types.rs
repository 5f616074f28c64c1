// SPDX-License-Identifier: MIT

//! Roadmap entity graph produced by the reconciler

use serde::{Deserialize, Serialize};
use std::fmt;

/// MoSCoW priority bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    MustHave,
    ShouldHave,
    CouldHave,
    WontHave,
}

impl Priority {
    /// Buckets in lookup order
    pub const ALL: [Priority; 4] = [
        Priority::MustHave,
        Priority::ShouldHave,
        Priority::CouldHave,
        Priority::WontHave,
    ];

    /// Key used in extraction payloads
    pub fn key(self) -> &'static str {
        match self {
            Priority::MustHave => "must_have",
            Priority::ShouldHave => "should_have",
            Priority::CouldHave => "could_have",
            Priority::WontHave => "wont_have",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapFeature {
    pub id: String,
    pub name: String,
    pub priority: Priority,
    /// Ascending, deduplicated quarter numbers in 1..=4
    pub quarters: Vec<u8>,
    /// Names of features this one depends on
    pub dependencies: Vec<String>,
    pub status: String,
    pub risk: String,
    /// Name of the first workstream that listed the feature
    pub workstream: String,
    /// Flagged by planning output as blocking downstream milestones
    #[serde(default)]
    pub critical_path: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workstream {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub feature_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub quarter: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapData {
    pub workstreams: Vec<Workstream>,
    pub features: Vec<RoadmapFeature>,
    pub milestones: Vec<Milestone>,
}

impl RoadmapData {
    pub fn feature(&self, name: &str) -> Option<&RoadmapFeature> {
        self.features.iter().find(|f| f.name == name)
    }
}
