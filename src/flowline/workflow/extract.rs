// SPDX-License-Identifier: MIT

//! Best-effort recovery of structured data from free-form model text
//!
//! Every function here returns `None` on failure; malformed output degrades a
//! node's contribution without failing the run.

use regex::Regex;
use serde_json::{Map, Value};

/// Extract the first `{` .. last `}` span as a JSON object.
///
/// Markdown code-fence markers are stripped first.
pub fn extract_json(raw: &str) -> Option<Map<String, Value>> {
    let cleaned = strip_fences(raw);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(Value::Object(obj)) => Some(obj),
        Ok(_) => None,
        Err(e) => {
            log::debug!("No JSON object recovered from model output: {}", e);
            None
        }
    }
}

/// Return the trimmed body of the first fenced block tagged exactly `language`.
///
/// Attributes after the tag are allowed when separated by whitespace.
pub fn extract_fenced_code(raw: &str, language: &str) -> Option<String> {
    let pattern = format!(
        r"(?s)```[ \t]*{}(?:[ \t][^\n]*)?\r?\n(.*?)```",
        regex::escape(language)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Remove ```` ```json ```` / ```` ``` ```` markers, keeping the enclosed text
fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}
