// SPDX-License-Identifier: MIT

//! Context values: text plus optional media parts and extracted fields

use crate::adk::model::MediaPart;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A value cell written by a Trigger, Agent or Tool node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextValue {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MediaPart>,
    /// Structured fields extracted from the text, addressable by nested path
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ContextValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_parts(text: impl Into<String>, parts: Vec<MediaPart>) -> Self {
        Self {
            text: text.into(),
            parts,
            fields: Map::new(),
        }
    }

    /// Raw text plus the fields of an extracted JSON object.
    ///
    /// The raw `text` wins over an extracted field of the same name.
    pub fn structured(text: impl Into<String>, extracted: Map<String, Value>) -> Self {
        let mut fields = extracted;
        fields.remove("text");
        fields.remove("parts");
        Self {
            text: text.into(),
            parts: Vec::new(),
            fields,
        }
    }

    /// JSON view used for nested path resolution
    pub fn to_json(&self) -> Value {
        let mut obj = self.fields.clone();
        obj.insert("text".to_string(), Value::String(self.text.clone()));
        if !self.parts.is_empty() {
            let parts = self
                .parts
                .iter()
                .map(|p| json!({ "mimeType": p.mime_type, "data": p.data }))
                .collect();
            obj.insert("parts".to_string(), Value::Array(parts));
        }
        Value::Object(obj)
    }
}

/// Render a resolved value as prompt text.
///
/// Objects render their `text` field (compact JSON when they have none),
/// strings render as-is, null renders empty, everything else via `to_string`.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(obj) => match obj.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => value_to_text(other),
            None => value.to_string(),
        },
        Value::Array(_) | Value::Number(_) | Value::Bool(_) => value.to_string(),
    }
}

/// Media parts carried by a resolved value, if any
pub fn media_parts(value: &Value) -> Vec<MediaPart> {
    value
        .get("parts")
        .and_then(|p| p.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| serde_json::from_value::<MediaPart>(p.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_keeps_raw_text() {
        let extracted = json!({"text": "shadow", "score": 3})
            .as_object()
            .cloned()
            .unwrap();
        let value = ContextValue::structured("raw reply", extracted);
        assert_eq!(value.text, "raw reply");
        assert_eq!(value.fields["score"], 3);
        assert_eq!(value.to_json(), json!({"text": "raw reply", "score": 3}));
    }

    #[test]
    fn test_serde_flattens_fields() {
        let value: ContextValue =
            serde_json::from_value(json!({"text": "t", "features": ["a"]})).unwrap();
        assert_eq!(value.fields["features"], json!(["a"]));
        assert!(value.parts.is_empty());
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!({"text": "hi", "x": 1})), "hi");
        assert_eq!(value_to_text(&json!({"x": 1})), r#"{"x":1}"#);
        assert_eq!(value_to_text(&json!("plain")), "plain");
        assert_eq!(value_to_text(&json!(42)), "42");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&Value::Null), "");
    }

    #[test]
    fn test_media_parts_roundtrip_through_json() {
        let value = ContextValue::with_parts(
            "clip",
            vec![MediaPart {
                mime_type: "audio/webm".to_string(),
                data: "AAA=".to_string(),
            }],
        );
        let parts = media_parts(&value.to_json());
        assert_eq!(parts, value.parts);
    }
}
