// SPDX-License-Identifier: MIT

//! `{{ path }}` template interpolation against a VariableContext

use super::store::VariableContext;
use super::value::{media_parts, value_to_text};
use crate::adk::model::Part;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("template token regex"));

impl VariableContext {
    /// Replace every `{{ path }}` token with the resolved value's text.
    ///
    /// Unresolved paths become the empty string. Objects without a `text`
    /// field and arrays render as compact JSON rather than vanishing, so a
    /// prompt can reference an extracted list or sub-object directly.
    pub fn interpolate(&self, template: &str) -> String {
        TOKEN
            .replace_all(template, |caps: &regex::Captures| {
                self.resolve(&caps[1]).map(value_to_text).unwrap_or_default()
            })
            .into_owned()
    }

    /// Interpolate `template` into request parts.
    ///
    /// Referenced values carrying media parts are spliced in after the text
    /// preceding (and including) their token; remaining text follows.
    pub fn construct_parts(&self, template: &str) -> Vec<Part> {
        let mut parts = Vec::new();
        let mut buffer = String::new();
        let mut last = 0;

        for caps in TOKEN.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            buffer.push_str(&template[last..whole.start()]);
            last = whole.end();

            let Some(value) = self.resolve(&caps[1]) else {
                continue;
            };
            buffer.push_str(&value_to_text(value));

            let media = media_parts(value);
            if !media.is_empty() {
                if !buffer.is_empty() {
                    parts.push(Part::Text(std::mem::take(&mut buffer)));
                }
                parts.extend(media.into_iter().map(Part::InlineData));
            }
        }
        buffer.push_str(&template[last..]);

        if !buffer.is_empty() || parts.is_empty() {
            parts.push(Part::Text(buffer));
        }
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::MediaPart;
    use crate::flowline::workflow::context::ContextValue;
    use serde_json::json;

    #[test]
    fn test_missing_variable_vanishes() {
        let ctx = VariableContext::new();
        assert_eq!(ctx.interpolate("Hello {{x}}"), "Hello ");
    }

    #[test]
    fn test_nested_object_renders_text() {
        let mut ctx = VariableContext::new();
        ctx.set_raw("a", json!({"b": {"text": "Z"}}));
        assert_eq!(ctx.interpolate("{{a.b}}"), "Z");
    }

    #[test]
    fn test_object_without_text_renders_json() {
        let mut ctx = VariableContext::new();
        ctx.set_raw("a", json!({"b": {"x": 1}, "list": ["p", "q"]}));
        assert_eq!(ctx.interpolate("{{a.b}}"), r#"{"x":1}"#);
        assert_eq!(ctx.interpolate("{{a.list}}"), r#"["p","q"]"#);
    }

    #[test]
    fn test_whitespace_tolerant_tokens() {
        let mut ctx = VariableContext::new();
        ctx.set("userInput", ContextValue::text("a todo app"));
        assert_eq!(
            ctx.interpolate("Idea: {{ userInput }} / {{userInput.text}}"),
            "Idea: a todo app / a todo app"
        );
    }

    #[test]
    fn test_primitives_render_as_strings() {
        let mut ctx = VariableContext::new();
        ctx.set_raw("n", json!(3));
        ctx.set_raw("flag", json!(false));
        assert_eq!(ctx.interpolate("{{n}}-{{flag}}"), "3-false");
    }

    #[test]
    fn test_text_without_tokens_unchanged() {
        let ctx = VariableContext::new();
        assert_eq!(ctx.interpolate("no tokens { here }"), "no tokens { here }");
    }

    #[test]
    fn test_construct_parts_text_only() {
        let mut ctx = VariableContext::new();
        ctx.set("userInput", ContextValue::text("hi"));
        assert_eq!(
            ctx.construct_parts("Say {{userInput}}"),
            vec![Part::text("Say hi")]
        );
    }

    #[test]
    fn test_construct_parts_splices_media() {
        let media = MediaPart {
            mime_type: "application/pdf".to_string(),
            data: "JVBE".to_string(),
        };
        let mut ctx = VariableContext::new();
        ctx.set("doc", ContextValue::with_parts("brief.pdf", vec![media.clone()]));

        let parts = ctx.construct_parts("Read {{doc}} and summarise.");
        assert_eq!(
            parts,
            vec![
                Part::text("Read brief.pdf"),
                Part::InlineData(media),
                Part::text(" and summarise."),
            ]
        );
    }

    #[test]
    fn test_construct_parts_empty_template() {
        let ctx = VariableContext::new();
        assert_eq!(ctx.construct_parts(""), vec![Part::text("")]);
    }
}
