//! Single-shot fallback planning after a failed test call.
//!
//! Two recoverable misconfigurations are recognized:
//!
//! - **Missing version segment**: an Anthropic-style definition whose base
//!   URL lacks `/v1` gets a 404 from `/messages`. Retry against the same
//!   host with `/v1` appended.
//! - **Responses-only gateway**: a bearer-auth gateway that rejects
//!   `/chat/completions` outright (404, or a 400/405 whose error message
//!   says the endpoint is unsupported) may only speak the Responses API.
//!   Retry as a POST to `/responses` with the equivalent minimal body.
//!
//! Planning never mutates the caller's definition (each plan carries a
//! derived copy), and the pipeline applies at most one plan per probe. The
//! retry is the final attempt: its response is what gets recorded, whether
//! or not it succeeded.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::core::provider::{Endpoint, HttpMethod, ProviderDefinition, TEST_CALL};
use crate::core::transport::RawResult;
use crate::util::json::get_text;

/// Matches error messages that reject an endpoint rather than the request.
/// Gateways word this freely, so the match is best-effort.
static ENDPOINT_REJECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)not supported|unsupported|unknown endpoint").expect("rejection regex")
});

/// A derived retry plan for one failed test call.
#[derive(Debug, Clone)]
pub struct FallbackPlan {
    pub provider: ProviderDefinition,
    /// Short description for the summary note; the pipeline appends the URL.
    pub description: &'static str,
}

/// Decide whether a failed test call warrants one retry, and with what.
#[must_use]
pub fn plan_fallback(
    provider: &ProviderDefinition,
    endpoint_name: &str,
    raw: &RawResult,
    error_message: Option<&str>,
) -> Option<FallbackPlan> {
    if endpoint_name != TEST_CALL || raw.ok {
        return None;
    }
    let path = &provider.endpoints.get(TEST_CALL)?.path;

    if let Some(plan) = missing_v1_plan(provider, path, raw) {
        return Some(plan);
    }
    responses_api_plan(provider, path, raw, error_message)
}

fn missing_v1_plan(
    provider: &ProviderDefinition,
    path: &str,
    raw: &RawResult,
) -> Option<FallbackPlan> {
    if raw.status != 404 || !provider.is_anthropic_style() || path != "/messages" {
        return None;
    }
    let base = provider.base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        return None;
    }
    let mut derived = provider.clone();
    derived.base_url = format!("{base}/v1");
    Some(FallbackPlan {
        provider: derived,
        description: "retried with /v1 appended",
    })
}

fn responses_api_plan(
    provider: &ProviderDefinition,
    path: &str,
    raw: &RawResult,
    error_message: Option<&str>,
) -> Option<FallbackPlan> {
    if !provider.is_bearer_style() || path != "/chat/completions" {
        return None;
    }
    let base = &provider.base_url;
    if base.contains("/responses") || base.contains("/chat/completions") {
        return None;
    }
    // definitions without an error mapping still carry the rejection text
    // in the conventional error.message slot
    let message = error_message
        .map(str::to_string)
        .or_else(|| raw.json.as_ref().and_then(|json| get_text(json, "error.message")));
    let rejected = match raw.status {
        404 => true,
        400 | 405 => message.is_some_and(|msg| ENDPOINT_REJECTED.is_match(&msg)),
        _ => false,
    };
    if !rejected {
        return None;
    }

    let endpoint = Endpoint::new(HttpMethod::Post, "/responses").with_body(json!({
        "model": "{{model}}",
        "input": "{{prompt}}",
        "max_output_tokens": 128,
    }));
    Some(FallbackPlan {
        provider: provider.with_endpoint(TEST_CALL, endpoint),
        description: "retried via the Responses API",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;

    fn failed(status: u16) -> RawResult {
        RawResult {
            ok: false,
            status,
            status_text: String::new(),
            latency_ms: 1,
            content_type: None,
            raw_text: String::new(),
            json: None,
        }
    }

    #[test]
    fn anthropic_404_without_v1_appends_v1() {
        let mut provider = catalog::find("custom-claude").unwrap();
        provider.base_url = "https://gw.example.com".to_string();
        let plan = plan_fallback(&provider, TEST_CALL, &failed(404), None).unwrap();
        assert_eq!(plan.provider.base_url, "https://gw.example.com/v1");
        // the original definition is untouched
        assert_eq!(provider.base_url, "https://gw.example.com");
    }

    #[test]
    fn anthropic_404_with_v1_base_does_not_retry() {
        let provider = catalog::find("claude").unwrap();
        assert!(plan_fallback(&provider, TEST_CALL, &failed(404), None).is_none());
    }

    #[test]
    fn bearer_404_switches_to_responses() {
        let provider = catalog::find("custom").unwrap();
        let plan = plan_fallback(&provider, TEST_CALL, &failed(404), None).unwrap();
        let endpoint = &plan.provider.endpoints[TEST_CALL];
        assert_eq!(endpoint.path, "/responses");
        let body = endpoint.body_template.as_ref().unwrap();
        assert_eq!(body["max_output_tokens"], 128);
        assert_eq!(body["input"], "{{prompt}}");
    }

    #[test]
    fn bearer_400_needs_a_rejection_message() {
        let provider = catalog::find("custom").unwrap();
        assert!(plan_fallback(&provider, TEST_CALL, &failed(400), None).is_none());
        assert!(plan_fallback(
            &provider,
            TEST_CALL,
            &failed(400),
            Some("this endpoint is not supported")
        )
        .is_some());
        assert!(plan_fallback(
            &provider,
            TEST_CALL,
            &failed(405),
            Some("Unknown endpoint for this gateway")
        )
        .is_some());
        assert!(plan_fallback(
            &provider,
            TEST_CALL,
            &failed(400),
            Some("invalid model name")
        )
        .is_none());
    }

    #[test]
    fn bearer_400_reads_error_message_from_the_body_when_unmapped() {
        let mut provider = catalog::find("custom").unwrap();
        provider.mapping.error = None;
        let mut raw = failed(400);
        raw.json = Some(serde_json::json!({
            "error": {"message": "this endpoint is not supported"}
        }));
        let plan = plan_fallback(&provider, TEST_CALL, &raw, None).unwrap();
        assert_eq!(plan.provider.endpoints[TEST_CALL].path, "/responses");

        // an unrelated body message still does not trigger a retry
        raw.json = Some(serde_json::json!({"error": {"message": "invalid model name"}}));
        assert!(plan_fallback(&provider, TEST_CALL, &raw, None).is_none());
    }

    #[test]
    fn successful_or_foreign_calls_never_fall_back() {
        let provider = catalog::find("custom").unwrap();
        let mut ok = failed(200);
        ok.ok = true;
        assert!(plan_fallback(&provider, TEST_CALL, &ok, None).is_none());
        assert!(plan_fallback(&provider, "list_models", &failed(404), None).is_none());
    }

    #[test]
    fn responses_base_urls_are_left_alone() {
        let mut provider = catalog::find("custom").unwrap();
        provider.base_url = "https://gw.example.com/responses".to_string();
        assert!(plan_fallback(&provider, TEST_CALL, &failed(404), None).is_none());
    }

    #[test]
    fn gemini_style_never_falls_back() {
        let provider = catalog::find("gemini").unwrap();
        assert!(plan_fallback(&provider, TEST_CALL, &failed(404), None).is_none());
    }
}
