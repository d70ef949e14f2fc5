//! Provider definitions: the declarative description of one API.
//!
//! A [`ProviderDefinition`] captures everything needed to build a request
//! against an arbitrary HTTP text-generation API: base URL, authentication,
//! static headers, named endpoints, response-extraction paths, and pricing.
//! Definitions are data — they serialize to/from JSON so operators can keep
//! local override files — and are never mutated by the core: fallback
//! attempts work on derived copies (see [`ProviderDefinition::with_endpoint`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProbeError, Result};

/// Endpoint name for the minimal test call every definition must declare.
pub const TEST_CALL: &str = "test_call";
/// Endpoint name for the model catalog listing.
pub const LIST_MODELS: &str = "list_models";
/// Endpoint name used for ad-hoc connectivity pings.
pub const PING: &str = "ping";

// =============================================================================
// Provider Definition
// =============================================================================

/// Declarative description of one API provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDefinition {
    /// Stable identifier (`openai`, `custom`, ...).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Default base URL; the operator may override it per call.
    pub base_url: String,
    /// How to attach the credential, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSpec>,
    /// Headers attached to every request, verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub static_headers: BTreeMap<String, String>,
    /// Named endpoints (`test_call`, `list_models`, ...).
    pub endpoints: BTreeMap<String, Endpoint>,
    /// Default model/prompt/timeout for the operator UI and CLI.
    #[serde(default)]
    pub defaults: CallDefaults,
    /// Optional explicit extraction paths; absent fields fall back to
    /// shape auto-detection.
    #[serde(default)]
    pub mapping: ExtractionMapping,
    /// Pricing defaults applied when no rule matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingDefaults>,
    /// Ordered static pricing rule table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pricing_table: Vec<PricingRule>,
}

impl ProviderDefinition {
    /// Look up a declared endpoint by name.
    ///
    /// # Errors
    ///
    /// Returns a CONFIG error if the endpoint is not declared.
    pub fn endpoint(&self, name: &str) -> Result<&Endpoint> {
        self.endpoints
            .get(name)
            .ok_or_else(|| ProbeError::EndpointNotDeclared {
                provider: self.id.clone(),
                endpoint: name.to_string(),
            })
    }

    /// Minimal required-field checks.
    ///
    /// # Errors
    ///
    /// Returns a CONFIG error when the id or base URL is empty, or when no
    /// `test_call` endpoint is declared.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(ProbeError::InvalidDefinition {
                provider: self.id.clone(),
                message: message.to_string(),
            })
        };
        if self.id.trim().is_empty() {
            return fail("id must not be empty");
        }
        if self.base_url.trim().is_empty() {
            return fail("base_url must not be empty");
        }
        if !self.endpoints.contains_key(TEST_CALL) {
            return fail("a 'test_call' endpoint is required");
        }
        Ok(())
    }

    /// Derived copy with one endpoint replaced (or added).
    ///
    /// The receiver is untouched; fallback attempts are built this way so
    /// the caller's definition is never mutated.
    #[must_use]
    pub fn with_endpoint(&self, name: &str, endpoint: Endpoint) -> Self {
        let mut derived = self.clone();
        derived.endpoints.insert(name.to_string(), endpoint);
        derived
    }

    /// Whether the provider authenticates Anthropic-style: `x-api-key`
    /// header auth or an `anthropic-version` static header.
    #[must_use]
    pub fn is_anthropic_style(&self) -> bool {
        if self
            .auth
            .as_ref()
            .is_some_and(|a| a.kind == AuthKind::Header && a.field.eq_ignore_ascii_case("x-api-key"))
        {
            return true;
        }
        self.static_headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("anthropic-version"))
    }

    /// Whether the provider authenticates with a bearer-style
    /// `Authorization` header.
    #[must_use]
    pub fn is_bearer_style(&self) -> bool {
        self.auth.as_ref().is_some_and(|a| {
            a.kind == AuthKind::Header && a.field.eq_ignore_ascii_case("authorization")
        })
    }

    /// Detect the provider family used for default test-call bodies.
    #[must_use]
    pub fn family(&self) -> ProviderFamily {
        if self
            .auth
            .as_ref()
            .is_some_and(|a| a.kind == AuthKind::Query)
        {
            return ProviderFamily::Gemini;
        }
        if self.is_anthropic_style() {
            return ProviderFamily::Anthropic;
        }
        ProviderFamily::OpenAiCompatible
    }
}

/// Broad request/response dialect of a provider, detected from its auth
/// shape rather than its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Chat-completions dialect (`messages` array). The safe default.
    OpenAiCompatible,
    /// Anthropic `/messages` dialect (`messages` + required `max_tokens`).
    Anthropic,
    /// Gemini `generateContent` dialect (`contents`/`parts`).
    Gemini,
}

// =============================================================================
// Authentication
// =============================================================================

/// How the credential is attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSpec {
    /// Header vs. query-parameter injection.
    pub kind: AuthKind,
    /// Header name or query parameter name.
    pub field: String,
    /// Template for the value, typically `Bearer {{apiKey}}` or `{{apiKey}}`.
    pub value_template: String,
}

/// Credential injection point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    Header,
    Query,
}

// =============================================================================
// Endpoints
// =============================================================================

/// One declared HTTP operation on a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// Path template appended to the base URL; may reference `{{model}}` etc.
    pub path: String,
    /// Endpoint-specific headers (values are templates).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Endpoint-specific query parameters (values are templates).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    /// Optional JSON body template, deep-rendered per call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<Value>,
}

impl Endpoint {
    /// Bare endpoint with no extra headers, query, or body.
    #[must_use]
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body_template: None,
        }
    }

    /// Attach a body template.
    #[must_use]
    pub fn with_body(mut self, body_template: Value) -> Self {
        self.body_template = Some(body_template);
        self
    }
}

/// HTTP method for a declared endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Canonical uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    #[must_use]
    pub const fn is_get(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

// =============================================================================
// Call defaults
// =============================================================================

/// Default call parameters carried by the definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDefaults {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CallDefaults {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

const fn default_timeout_ms() -> u64 {
    15_000
}

// =============================================================================
// Extraction mapping
// =============================================================================

/// Optional explicit JSON paths for response extraction.
///
/// Any absent field falls back to shape auto-detection in the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelsMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<PathMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PathMapping>,
}

/// Path to the model array plus an optional sub-path to each item's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsMapping {
    pub path: String,
    /// Sub-path into each array item; absent means the item itself is the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

/// A single dotted JSON path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathMapping {
    pub path: String,
}

/// Explicit paths for the three usage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMapping {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub total: String,
}

// =============================================================================
// Pricing
// =============================================================================

/// Provider-level default price rate, used when no rule matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingDefaults {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub unit: PriceUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
    /// Whether an all-zero rate counts as configured rather than unknown.
    #[serde(default)]
    pub allow_zero: bool,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            unit: PriceUnit::default(),
            input: None,
            output: None,
            allow_zero: false,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Price denomination.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceUnit {
    #[serde(rename = "per_1k_tokens")]
    Per1kTokens,
    #[default]
    #[serde(rename = "per_1m_tokens")]
    Per1mTokens,
}

impl PriceUnit {
    /// Token count the price is denominated in.
    #[must_use]
    pub const fn scale(self) -> f64 {
        match self {
            Self::Per1kTokens => 1_000.0,
            Self::Per1mTokens => 1_000_000.0,
        }
    }

    /// Short label for summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Per1kTokens => "/1K tok",
            Self::Per1mTokens => "/1M tok",
        }
    }
}

/// How a pricing rule's pattern is compared to the model identifier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Exact,
    Prefix,
}

/// One row of a pricing rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRule {
    /// Exact vs. prefix comparison.
    #[serde(rename = "match", default)]
    pub match_kind: MatchKind,
    /// Model identifier pattern.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<PriceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
    #[serde(default)]
    pub allow_zero: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_provider() -> ProviderDefinition {
        let mut endpoints = BTreeMap::new();
        endpoints.insert(
            TEST_CALL.to_string(),
            Endpoint::new(HttpMethod::Post, "/chat/completions"),
        );
        ProviderDefinition {
            id: "custom".to_string(),
            name: "Custom".to_string(),
            base_url: "https://example.com/v1".to_string(),
            auth: Some(AuthSpec {
                kind: AuthKind::Header,
                field: "Authorization".to_string(),
                value_template: "Bearer {{apiKey}}".to_string(),
            }),
            static_headers: BTreeMap::new(),
            endpoints,
            defaults: CallDefaults::default(),
            mapping: ExtractionMapping::default(),
            pricing: None,
            pricing_table: Vec::new(),
        }
    }

    #[test]
    fn validate_accepts_minimal_definition() {
        assert!(minimal_provider().validate().is_ok());
    }

    #[test]
    fn validate_requires_test_call_endpoint() {
        let mut provider = minimal_provider();
        provider.endpoints.clear();
        assert!(provider.validate().is_err());
    }

    #[test]
    fn validate_requires_id_and_base_url() {
        let mut provider = minimal_provider();
        provider.id = " ".to_string();
        assert!(provider.validate().is_err());

        let mut provider = minimal_provider();
        provider.base_url = String::new();
        assert!(provider.validate().is_err());
    }

    #[test]
    fn endpoint_lookup_fails_with_config_error() {
        let provider = minimal_provider();
        let err = provider.endpoint("nonexistent").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn with_endpoint_leaves_original_untouched() {
        let provider = minimal_provider();
        let derived = provider.with_endpoint(
            TEST_CALL,
            Endpoint::new(HttpMethod::Post, "/responses"),
        );
        assert_eq!(provider.endpoints[TEST_CALL].path, "/chat/completions");
        assert_eq!(derived.endpoints[TEST_CALL].path, "/responses");
    }

    #[test]
    fn bearer_auth_is_openai_family() {
        let provider = minimal_provider();
        assert!(provider.is_bearer_style());
        assert!(!provider.is_anthropic_style());
        assert_eq!(provider.family(), ProviderFamily::OpenAiCompatible);
    }

    #[test]
    fn x_api_key_or_version_header_is_anthropic_family() {
        let mut provider = minimal_provider();
        provider.auth = Some(AuthSpec {
            kind: AuthKind::Header,
            field: "x-api-key".to_string(),
            value_template: "{{apiKey}}".to_string(),
        });
        assert!(provider.is_anthropic_style());
        assert_eq!(provider.family(), ProviderFamily::Anthropic);

        let mut provider = minimal_provider();
        provider
            .static_headers
            .insert("anthropic-version".to_string(), "2023-06-01".to_string());
        assert!(provider.is_anthropic_style());
    }

    #[test]
    fn query_auth_is_gemini_family() {
        let mut provider = minimal_provider();
        provider.auth = Some(AuthSpec {
            kind: AuthKind::Query,
            field: "key".to_string(),
            value_template: "{{apiKey}}".to_string(),
        });
        assert_eq!(provider.family(), ProviderFamily::Gemini);
    }

    #[test]
    fn definition_round_trips_through_json() {
        let provider = minimal_provider();
        let json = serde_json::to_string(&provider).unwrap();
        let back: ProviderDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, provider.id);
        assert_eq!(back.endpoints[TEST_CALL].method, HttpMethod::Post);
    }

    #[test]
    fn price_unit_serde_names() {
        assert_eq!(
            serde_json::to_string(&PriceUnit::Per1kTokens).unwrap(),
            "\"per_1k_tokens\""
        );
        assert_eq!(
            serde_json::from_str::<PriceUnit>("\"per_1m_tokens\"").unwrap(),
            PriceUnit::Per1mTokens
        );
    }
}
