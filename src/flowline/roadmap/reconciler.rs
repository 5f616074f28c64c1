// SPDX-License-Identifier: MIT

//! Reconcile extraction and planning outputs into a RoadmapData graph

use super::matching::{
    extract_milestones, resolve_dependencies, resolve_priority, resolve_risk, DependencyEntry,
};
use super::types::{Milestone, Priority, RoadmapData, RoadmapFeature, Workstream};
use crate::flowline::workflow::extract::extract_json;
use serde_json::{Map, Value};
use std::collections::HashMap;

const DEFAULT_STATUS: &str = "planned";
const DEFAULT_RISK: &str = "low";
const DEFAULT_WORKSTREAM: &str = "General";

/// Build a roadmap from the raw text of the extraction and planning nodes.
///
/// Returns `None` when either input carries no parseable JSON object.
pub fn reconcile(extraction_output: &str, planning_output: &str) -> Option<RoadmapData> {
    let extraction = extract_json(extraction_output)?;
    let planning = extract_json(planning_output)?;

    let signals = ExtractionSignals::from_payload(&extraction);
    let mut builder = RoadmapBuilder::default();

    for stream in planned_workstreams(&planning) {
        builder.add_workstream(&stream, &signals);
    }

    let mut roadmap = builder.finish();
    roadmap.milestones = milestones_from(&planning);

    log::info!(
        "Reconciled roadmap: {} workstreams, {} features, {} milestones",
        roadmap.workstreams.len(),
        roadmap.features.len(),
        roadmap.milestones.len()
    );
    Some(roadmap)
}

/// Priority, dependency and risk data from the extraction payload
#[derive(Debug, Default)]
struct ExtractionSignals {
    buckets: HashMap<Priority, Vec<String>>,
    dependencies: Vec<DependencyEntry>,
    risks: Vec<(String, String)>,
}

impl ExtractionSignals {
    fn from_payload(payload: &Map<String, Value>) -> Self {
        let bucket_source = payload
            .get("prioritization")
            .or_else(|| payload.get("moscow"))
            .and_then(Value::as_object)
            .unwrap_or(payload);

        let buckets = Priority::ALL
            .into_iter()
            .filter_map(|p| bucket_source.get(p.key()).map(|v| (p, names_in(v))))
            .collect();

        let dependencies = payload
            .get("feature_dependencies")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(dependency_entry).collect())
            .unwrap_or_default();

        let risks = match payload.get("risks") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|e| {
                    let feature = str_field(e, &["feature", "name"])?;
                    let level = str_field(e, &["level", "risk", "severity"])?;
                    Some((feature, level))
                })
                .collect(),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|level| (k.clone(), level.to_string())))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            buckets,
            dependencies,
            risks,
        }
    }
}

/// A workstream as listed in the planning payload
#[derive(Debug)]
struct PlannedWorkstream<'a> {
    name: String,
    description: String,
    source: &'a Map<String, Value>,
}

fn planned_workstreams(planning: &Map<String, Value>) -> Vec<PlannedWorkstream<'_>> {
    match planning.get("workstreams").and_then(Value::as_array) {
        Some(streams) => streams
            .iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(i, ws)| PlannedWorkstream {
                name: ws
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Workstream {}", i + 1)),
                description: ws
                    .get("description")
                    .or_else(|| ws.get("purpose"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                source: ws,
            })
            .collect(),
        None => vec![PlannedWorkstream {
            name: DEFAULT_WORKSTREAM.to_string(),
            description: String::new(),
            source: planning,
        }],
    }
}

#[derive(Debug, Default)]
struct RoadmapBuilder {
    workstreams: Vec<Workstream>,
    features: Vec<RoadmapFeature>,
    by_name: HashMap<String, usize>,
}

impl RoadmapBuilder {
    fn add_workstream(&mut self, stream: &PlannedWorkstream<'_>, signals: &ExtractionSignals) {
        let critical: Vec<String> = stream
            .source
            .get("critical_path")
            .map(names_in)
            .unwrap_or_default();

        let mut feature_ids: Vec<String> = Vec::new();

        for quarter in 1..=4u8 {
            let key = format!("q{}_features", quarter);
            let Some(entries) = stream.source.get(&key).and_then(Value::as_array) else {
                continue;
            };

            for entry in entries {
                let Some(name) = entry_name(entry) else {
                    continue;
                };
                let idx = self.feature_index(&name, &stream.name, entry, signals);
                let feature = &mut self.features[idx];

                if !feature.quarters.contains(&quarter) {
                    feature.quarters.push(quarter);
                    feature.quarters.sort_unstable();
                }
                if critical.iter().any(|c| c == &name) || entry_flag(entry, "critical_path") {
                    feature.critical_path = true;
                }
                if !feature_ids.contains(&feature.id) {
                    feature_ids.push(feature.id.clone());
                }
            }
        }

        self.workstreams.push(Workstream {
            id: format!("ws-{}", self.workstreams.len() + 1),
            name: stream.name.clone(),
            description: stream.description.clone(),
            feature_ids,
        });
    }

    /// Existing feature with exactly this name, or a new one
    fn feature_index(
        &mut self,
        name: &str,
        workstream: &str,
        entry: &Value,
        signals: &ExtractionSignals,
    ) -> usize {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }

        let risk = str_field(entry, &["risk"])
            .or_else(|| resolve_risk(name, &signals.risks).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_RISK.to_string());

        let feature = RoadmapFeature {
            id: format!("feat-{}", self.features.len() + 1),
            name: name.to_string(),
            priority: resolve_priority(name, &signals.buckets),
            quarters: Vec::new(),
            dependencies: resolve_dependencies(name, &signals.dependencies),
            status: str_field(entry, &["status"]).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            risk,
            workstream: workstream.to_string(),
            critical_path: false,
        };

        self.features.push(feature);
        let idx = self.features.len() - 1;
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    fn finish(self) -> RoadmapData {
        RoadmapData {
            workstreams: self.workstreams,
            features: self.features,
            milestones: Vec::new(),
        }
    }
}

fn milestones_from(planning: &Map<String, Value>) -> Vec<Milestone> {
    let nested = planning
        .get("quarterly_narratives")
        .and_then(Value::as_object);

    let mut milestones = Vec::new();
    for quarter in 1..=4u8 {
        let narrative = nested
            .and_then(|n| n.get(&format!("q{}", quarter)))
            .or_else(|| planning.get(&format!("q{}_narrative", quarter)))
            .and_then(Value::as_str);

        let Some(narrative) = narrative else { continue };
        for name in extract_milestones(narrative) {
            milestones.push(Milestone {
                id: format!("ms-{}", milestones.len() + 1),
                name,
                quarter,
            });
        }
    }
    milestones
}

/// Feature names from a list of strings or `{name}` objects
fn names_in(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(entry_name).collect())
        .unwrap_or_default()
}

fn entry_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(_) => str_field(entry, &["name", "feature", "title"]),
        _ => None,
    }
}

fn entry_flag(entry: &Value, key: &str) -> bool {
    entry.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn dependency_entry(value: &Value) -> Option<DependencyEntry> {
    let feature = str_field(value, &["feature", "name"])?;
    let depends_on = match value.get("depends_on").or_else(|| value.get("dependencies")) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(other) => names_in(other),
        None => Vec::new(),
    };
    Some(DependencyEntry {
        feature,
        depends_on,
    })
}

/// First non-empty string among `keys`
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
