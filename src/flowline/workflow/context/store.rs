// SPDX-License-Identifier: MIT

//! Run-scoped variable storage

use super::value::ContextValue;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Mapping from output-variable name to value, scoped to one run.
///
/// Writes are last-writer-wins; values are never removed during a run.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    values: HashMap<String, Value>,
    last_written: Option<String>,
}

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node output under `name`, replacing any previous value
    pub fn set(&mut self, name: &str, value: ContextValue) {
        self.set_raw(name, value.to_json());
    }

    /// Store an arbitrary JSON value under `name`
    pub fn set_raw(&mut self, name: &str, value: Value) {
        if self.values.contains_key(name) {
            log::debug!("Overwriting context variable '{}'", name);
        }
        self.values.insert(name.to_string(), value);
        self.last_written = Some(name.to_string());
    }

    /// Top-level value as a ContextValue, if it has that shape
    pub fn get(&self, name: &str) -> Option<ContextValue> {
        match self.values.get(name)? {
            Value::String(s) => Some(ContextValue::text(s.clone())),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }

    /// Resolve a dotted path such as `extraction.features.0.name`.
    ///
    /// Returns `None` when any segment is missing.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.').map(str::trim);
        let first = segments.next().filter(|s| !s.is_empty())?;
        let mut current = self.values.get(first)?;

        for segment in segments {
            current = match current {
                Value::Object(obj) => obj.get(segment)?,
                Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Name of the most recently written variable
    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert the context to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}
