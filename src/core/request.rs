//! Outbound request construction.
//!
//! Turns a provider definition plus per-call variables into a fully rendered
//! [`OutboundRequest`]: final URL (base joined with a normalized endpoint
//! path, query parameters and query-auth applied), merged headers with the
//! credential injected, and a JSON body (explicit template, or a
//! family-default test body when the definition carries none).
//!
//! Header precedence is fixed: static provider headers first, then
//! endpoint headers, then auth — later layers override earlier ones. Keys
//! are lowercased so the layers collide predictably.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use url::Url;

use crate::core::provider::{
    AuthKind, Endpoint, HttpMethod, ProviderDefinition, ProviderFamily, TEST_CALL,
};
use crate::core::template::{render_str, render_value, TemplateVars};
use crate::error::{ProbeError, Result};

/// Replacement value for sensitive header values in logs and records.
pub const REDACTED_MASK: &str = "***";

// substring match on purpose: catches x-api-key, proxy-authorization, etc.
static SENSITIVE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)authorization|api-key|apikey|token").expect("header regex")
});

/// A fully rendered request, ready for the transport.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Final headers, lowercase keys, credentials included.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout_ms: u64,
}

impl OutboundRequest {
    /// Headers safe to log or persist: sensitive values masked.
    #[must_use]
    pub fn redacted_headers(&self) -> BTreeMap<String, String> {
        redact_headers(&self.headers)
    }
}

/// Mask credential-bearing header values.
#[must_use]
pub fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            let value = if SENSITIVE_HEADER.is_match(k) {
                REDACTED_MASK.to_string()
            } else {
                v.clone()
            };
            (k.clone(), value)
        })
        .collect()
}

/// Strip a duplicated version segment where base and path both carry `/v1`.
///
/// `https://host/v1` + `/v1/chat/completions` would otherwise produce
/// `/v1/v1/...`; a path of exactly `/v1` collapses to nothing.
#[must_use]
pub fn normalize_endpoint_path(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        if let Some(rest) = path.strip_prefix("/v1/") {
            return format!("/{rest}");
        }
        if path == "/v1" {
            return String::new();
        }
    }
    path.to_string()
}

/// Build the request for one named endpoint of a provider.
///
/// # Errors
///
/// Returns a CONFIG error when the endpoint is not declared or the final
/// URL does not parse.
pub fn build_request(
    provider: &ProviderDefinition,
    endpoint_name: &str,
    vars: &TemplateVars,
    timeout_ms: u64,
) -> Result<OutboundRequest> {
    let endpoint = provider.endpoint(endpoint_name)?;

    let url = build_url(provider, endpoint, vars)?;
    let headers = build_headers(provider, endpoint, vars);
    let body = build_body(provider, endpoint, endpoint_name, vars);

    let mut headers = headers;
    if body.is_some() && !headers.contains_key("content-type") {
        headers.insert("content-type".to_string(), "application/json".to_string());
    }

    Ok(OutboundRequest {
        method: endpoint.method,
        url,
        headers,
        body,
        timeout_ms,
    })
}

fn build_url(
    provider: &ProviderDefinition,
    endpoint: &Endpoint,
    vars: &TemplateVars,
) -> Result<String> {
    let path = render_str(&endpoint.path, vars);
    let path = normalize_endpoint_path(&provider.base_url, &path);
    let joined = format!("{}{path}", provider.base_url.trim_end_matches('/'));

    let mut url = Url::parse(&joined).map_err(|e| ProbeError::InvalidUrl {
        url: joined.clone(),
        message: e.to_string(),
    })?;

    {
        let mut pairs = url.query_pairs_mut();
        for (name, template) in &endpoint.query {
            pairs.append_pair(name, &render_str(template, vars));
        }
        if let Some(auth) = &provider.auth {
            if auth.kind == AuthKind::Query {
                pairs.append_pair(&auth.field, &render_str(&auth.value_template, vars));
            }
        }
    }
    // query_pairs_mut leaves a dangling '?' when nothing was appended
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.to_string())
}

fn build_headers(
    provider: &ProviderDefinition,
    endpoint: &Endpoint,
    vars: &TemplateVars,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for (name, value) in &provider.static_headers {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    for (name, template) in &endpoint.headers {
        headers.insert(name.to_ascii_lowercase(), render_str(template, vars));
    }
    if let Some(auth) = &provider.auth {
        if auth.kind == AuthKind::Header {
            headers.insert(
                auth.field.to_ascii_lowercase(),
                render_str(&auth.value_template, vars),
            );
        }
    }
    headers
}

fn build_body(
    provider: &ProviderDefinition,
    endpoint: &Endpoint,
    endpoint_name: &str,
    vars: &TemplateVars,
) -> Option<Value> {
    if let Some(template) = &endpoint.body_template {
        return Some(render_value(template, vars));
    }
    if endpoint_name == TEST_CALL && !endpoint.method.is_get() {
        return Some(default_test_body(provider.family(), vars));
    }
    None
}

/// Minimal single-turn request body for a provider family.
#[must_use]
pub fn default_test_body(family: ProviderFamily, vars: &TemplateVars) -> Value {
    match family {
        ProviderFamily::OpenAiCompatible => json!({
            "model": vars.model,
            "messages": [{"role": "user", "content": vars.prompt}],
            "stream": false,
        }),
        ProviderFamily::Anthropic => json!({
            "model": vars.model,
            "max_tokens": 64,
            "messages": [{"role": "user", "content": vars.prompt}],
        }),
        ProviderFamily::Gemini => json!({
            "contents": [{"parts": [{"text": vars.prompt}]}],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog;
    use crate::core::provider::LIST_MODELS;

    fn vars() -> TemplateVars {
        TemplateVars {
            api_key: "sk-secret".to_string(),
            model: "gpt-4o-mini".to_string(),
            prompt: "ping".to_string(),
            now_iso: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn openai_chat_request() {
        let provider = catalog::find("openai").unwrap();
        let req = build_request(&provider, TEST_CALL, &vars(), 15_000).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(
            req.headers.get("authorization").map(String::as_str),
            Some("Bearer sk-secret")
        );
        assert_eq!(
            req.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        let body = req.body.unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], "ping");
    }

    #[test]
    fn get_endpoints_carry_no_body() {
        let provider = catalog::find("openai").unwrap();
        let req = build_request(&provider, LIST_MODELS, &vars(), 15_000).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.openai.com/v1/models");
        assert!(req.body.is_none());
        assert!(!req.headers.contains_key("content-type"));
    }

    #[test]
    fn duplicate_v1_segment_is_collapsed() {
        assert_eq!(
            normalize_endpoint_path("https://host/v1", "/v1/chat/completions"),
            "/chat/completions"
        );
        assert_eq!(normalize_endpoint_path("https://host/v1", "/v1"), "");
        assert_eq!(
            normalize_endpoint_path("https://host", "/v1/chat/completions"),
            "/v1/chat/completions"
        );
        assert_eq!(
            normalize_endpoint_path("https://host/v1", "/chat/completions"),
            "/chat/completions"
        );
    }

    #[test]
    fn gemini_query_auth_and_model_path() {
        let provider = catalog::find("gemini").unwrap();
        let req = build_request(&provider, TEST_CALL, &vars(), 20_000).unwrap();
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gpt-4o-mini:generateContent?key=sk-secret"
        );
        assert!(!req.headers.contains_key("authorization"));
        let body = req.body.unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "ping");
    }

    #[test]
    fn anthropic_default_body_includes_max_tokens() {
        let provider = catalog::find("claude").unwrap();
        let req = build_request(&provider, TEST_CALL, &vars(), 20_000).unwrap();
        assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(
            req.headers.get("x-api-key").map(String::as_str),
            Some("sk-secret")
        );
        assert_eq!(
            req.headers.get("anthropic-version").map(String::as_str),
            Some("2023-06-01")
        );
        let body = req.body.unwrap();
        assert_eq!(body["max_tokens"], 64);
    }

    #[test]
    fn explicit_body_template_wins_over_family_default() {
        let provider = catalog::find("qwen-native").unwrap();
        let req = build_request(&provider, TEST_CALL, &vars(), 20_000).unwrap();
        let body = req.body.unwrap();
        assert_eq!(body["input"]["prompt"], "ping");
        assert_eq!(body["parameters"]["result_format"], "message");
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn redaction_masks_credential_headers_only() {
        let mut headers = BTreeMap::new();
        headers.insert("authorization".to_string(), "Bearer sk-secret".to_string());
        headers.insert("x-api-key".to_string(), "sk-secret".to_string());
        headers.insert("api-key".to_string(), "sk-secret".to_string());
        headers.insert("token".to_string(), "sk-secret".to_string());
        headers.insert("x-auth-token".to_string(), "sk-secret".to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());

        let redacted = redact_headers(&headers);
        assert_eq!(redacted["authorization"], REDACTED_MASK);
        assert_eq!(redacted["x-api-key"], REDACTED_MASK);
        assert_eq!(redacted["api-key"], REDACTED_MASK);
        assert_eq!(redacted["token"], REDACTED_MASK);
        assert_eq!(redacted["x-auth-token"], REDACTED_MASK);
        assert_eq!(redacted["content-type"], "application/json");
    }

    #[test]
    fn unparsable_url_is_a_config_error() {
        let mut provider = catalog::find("custom").unwrap();
        provider.base_url = "not a url".to_string();
        let err = build_request(&provider, TEST_CALL, &vars(), 15_000).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn undeclared_endpoint_is_rejected() {
        let provider = catalog::find("claude").unwrap();
        assert!(build_request(&provider, LIST_MODELS, &vars(), 15_000).is_err());
    }
}
