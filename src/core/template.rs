//! Template rendering for provider definitions.
//!
//! Provider definitions reference a small flat variable set (`{{apiKey}}`,
//! `{{model}}`, `{{prompt}}`, `{{nowIso}}`) from path templates, header
//! values, query parameters, and body templates. Substitution is literal:
//! unknown variables render as the empty string, malformed placeholders
//! render as-is, and any downstream encoding (URL escaping) is the
//! caller's job.

use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder regex"));

/// The flat variable set available to every template in a call.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    pub now_iso: String,
}

impl TemplateVars {
    /// Build the variable set for one call, timestamping it now.
    #[must_use]
    pub fn new(api_key: &str, model: &str, prompt: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompt: prompt.to_string(),
            now_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "apiKey" => Some(&self.api_key),
            "model" => Some(&self.model),
            "prompt" => Some(&self.prompt),
            "nowIso" => Some(&self.now_iso),
            _ => None,
        }
    }
}

/// Replace every `{{name}}` placeholder in a string.
///
/// Unknown variable names render as the empty string; text without
/// placeholders passes through unchanged.
#[must_use]
pub fn render_str(template: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            vars.lookup(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Recursively render every string leaf of a JSON value.
///
/// Arrays and objects are walked; non-string leaves (numbers, booleans,
/// null) pass through unchanged.
#[must_use]
pub fn render_value(template: &Value, vars: &TemplateVars) -> Value {
    match template {
        Value::String(s) => Value::String(render_str(s, vars)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| render_value(item, vars)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}
