//! Diagnostic hints for common misconfigurations.
//!
//! After a failed test call the error body often reveals which dialect the
//! gateway actually speaks. These heuristics turn that into an actionable
//! suggestion; they are advisory only and never affect the probe outcome.

use serde_json::Value;

use crate::core::provider::{ProviderDefinition, TEST_CALL};
use crate::core::transport::RawResult;

/// Suggest a configuration fix for a failed test call, if one is apparent.
#[must_use]
pub fn diagnostic_hint(
    provider: &ProviderDefinition,
    raw: &RawResult,
    request_model: Option<&str>,
) -> Option<String> {
    if raw.ok {
        return None;
    }
    let test_path = provider
        .endpoints
        .get(TEST_CALL)
        .map_or("", |e| e.path.as_str());

    if raw.status == 404 && provider.is_anthropic_style() && test_path == "/messages" {
        return Some(
            "the gateway does not serve /messages at this base URL; Claude-style gateways \
             usually need a base URL ending in /v1"
                .to_string(),
        );
    }

    if raw.status == 400 && provider.is_anthropic_style() && has_openai_style_error(raw.json.as_ref())
    {
        return Some(
            "the error body is OpenAI-style, so this is probably not an Anthropic /messages \
             gateway; try Authorization: Bearer against /chat/completions"
                .to_string(),
        );
    }

    if raw.status == 400 && provider.is_bearer_style() && has_anthropic_style_error(raw.json.as_ref())
    {
        return Some(
            "the error body is Anthropic-style; try x-api-key plus anthropic-version against \
             /messages"
                .to_string(),
        );
    }

    if raw.status == 400 {
        if let Some(model) = request_model {
            return Some(format!(
                "the model '{model}' may not be enabled on this platform; list the available \
                 models first and pick one from the catalog"
            ));
        }
    }

    None
}

/// `{"error": {"message": "..."}}` with a string message.
fn has_openai_style_error(json: Option<&Value>) -> bool {
    json.and_then(|j| j.get("error"))
        .is_some_and(|e| e.is_object() && e.get("message").is_some_and(Value::is_string))
}

/// `{"type": "error", ...}` or `{"error": {"type": ...}}`.
fn has_anthropic_style_error(json: Option<&Value>) -> bool {
    let Some(json) = json else { return false };
    if json.get("type").and_then(Value::as_str) == Some("error") {
        return true;
    }
    json.get("error")
        .is_some_and(|e| e.get("type").is_some())
}
