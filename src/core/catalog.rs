//! Built-in provider catalog.
//!
//! Data only: each entry is a [`ProviderDefinition`] describing one known
//! platform (or a customizable template). Operators can shadow any entry by
//! id with a local override file (see `storage::providers`).

use std::collections::BTreeMap;

use serde_json::json;

use crate::core::provider::{
    AuthKind, AuthSpec, CallDefaults, Endpoint, ExtractionMapping, HttpMethod, ModelsMapping,
    PathMapping, PriceUnit, PricingDefaults, ProviderDefinition, UsageMapping, LIST_MODELS,
    TEST_CALL,
};
use crate::error::{ProbeError, Result};

const DEFAULT_PROMPT: &str = "Hello, please reply 'pong'.";

/// All built-in provider definitions, in display order.
#[must_use]
pub fn builtin_providers() -> Vec<ProviderDefinition> {
    vec![
        openai_compatible(
            "openai",
            "OpenAI (ChatGPT)",
            "https://api.openai.com/v1",
            "gpt-4o-mini",
            "USD",
            15_000,
        ),
        openai_compatible(
            "deepseek",
            "DeepSeek (OpenAI-compatible)",
            "https://api.deepseek.com/v1",
            "deepseek-chat",
            "USD",
            15_000,
        ),
        openai_compatible(
            "kimi",
            "Kimi (Moonshot, OpenAI-compatible)",
            "https://api.moonshot.cn/v1",
            "moonshot-v1-8k",
            "CNY",
            15_000,
        ),
        openai_compatible(
            "openrouter",
            "OpenRouter (OpenAI-compatible relay)",
            "https://openrouter.ai/api/v1",
            "openai/gpt-4o-mini",
            "USD",
            20_000,
        ),
        openai_compatible(
            "qwen-compatible",
            "Alibaba Qwen (compatible mode)",
            "https://dashscope.aliyuncs.com/compatible-mode/v1",
            "qwen-turbo",
            "CNY",
            20_000,
        ),
        qwen_native(),
        chat_only(
            "zhipu",
            "Zhipu GLM",
            "https://open.bigmodel.cn/api/paas/v4",
            "glm-4",
            "CNY",
        ),
        chat_only(
            "doubao-ark",
            "Doubao / Volc Ark",
            "https://ark.cn-beijing.volces.com/api/v3",
            "doubao-lite-4k",
            "CNY",
        ),
        gemini(),
        claude("claude", "Claude (Anthropic native)", "https://api.anthropic.com/v1"),
        claude(
            "custom-claude",
            "Custom (Claude/Anthropic template)",
            "https://example.com/v1",
        ),
        custom_template(),
    ]
}

/// Find a built-in provider by id.
///
/// # Errors
///
/// Returns a CONFIG error when the id is unknown.
pub fn find(id: &str) -> Result<ProviderDefinition> {
    builtin_providers()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ProbeError::UnknownProvider(id.to_string()))
}

// =============================================================================
// Entry constructors
// =============================================================================

fn bearer_auth() -> AuthSpec {
    AuthSpec {
        kind: AuthKind::Header,
        field: "Authorization".to_string(),
        value_template: "Bearer {{apiKey}}".to_string(),
    }
}

fn openai_mapping() -> ExtractionMapping {
    ExtractionMapping {
        models: Some(ModelsMapping {
            path: "data".to_string(),
            item: Some("id".to_string()),
        }),
        text: Some(PathMapping {
            path: "choices.0.message.content".to_string(),
        }),
        usage: Some(UsageMapping {
            input: "usage.prompt_tokens".to_string(),
            output: "usage.completion_tokens".to_string(),
            total: "usage.total_tokens".to_string(),
        }),
        error: Some(PathMapping {
            path: "error.message".to_string(),
        }),
    }
}

fn pricing(currency: &str) -> PricingDefaults {
    PricingDefaults {
        currency: currency.to_string(),
        unit: PriceUnit::Per1mTokens,
        input: None,
        output: None,
        allow_zero: false,
    }
}

fn defaults(model: &str, timeout_ms: u64) -> CallDefaults {
    CallDefaults {
        model: model.to_string(),
        prompt: DEFAULT_PROMPT.to_string(),
        timeout_ms,
    }
}

fn openai_compatible(
    id: &str,
    name: &str,
    base_url: &str,
    model: &str,
    currency: &str,
    timeout_ms: u64,
) -> ProviderDefinition {
    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        LIST_MODELS.to_string(),
        Endpoint::new(HttpMethod::Get, "/models"),
    );
    endpoints.insert(
        TEST_CALL.to_string(),
        Endpoint::new(HttpMethod::Post, "/chat/completions"),
    );
    ProviderDefinition {
        id: id.to_string(),
        name: name.to_string(),
        base_url: base_url.to_string(),
        auth: Some(bearer_auth()),
        static_headers: BTreeMap::new(),
        endpoints,
        defaults: defaults(model, timeout_ms),
        mapping: openai_mapping(),
        pricing: Some(pricing(currency)),
        pricing_table: Vec::new(),
    }
}

/// OpenAI-compatible chat endpoint without a model listing.
fn chat_only(id: &str, name: &str, base_url: &str, model: &str, currency: &str) -> ProviderDefinition {
    let mut provider = openai_compatible(id, name, base_url, model, currency, 20_000);
    provider.endpoints.remove(LIST_MODELS);
    provider.mapping.models = None;
    provider
}

fn qwen_native() -> ProviderDefinition {
    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        TEST_CALL.to_string(),
        Endpoint::new(
            HttpMethod::Post,
            "/services/aigc/text-generation/generation",
        )
        .with_body(json!({
            "model": "{{model}}",
            "input": {"prompt": "{{prompt}}"},
            "parameters": {"result_format": "message"},
        })),
    );
    ProviderDefinition {
        id: "qwen-native".to_string(),
        name: "Alibaba Qwen (native DashScope)".to_string(),
        base_url: "https://dashscope.aliyuncs.com/api/v1".to_string(),
        auth: Some(bearer_auth()),
        static_headers: BTreeMap::new(),
        endpoints,
        defaults: defaults("qwen-turbo", 20_000),
        mapping: ExtractionMapping {
            models: None,
            text: Some(PathMapping {
                path: "output.choices.0.message.content".to_string(),
            }),
            usage: Some(UsageMapping {
                input: "usage.input_tokens".to_string(),
                output: "usage.output_tokens".to_string(),
                total: "usage.total_tokens".to_string(),
            }),
            error: Some(PathMapping {
                path: "message".to_string(),
            }),
        },
        pricing: Some(pricing("CNY")),
        pricing_table: Vec::new(),
    }
}

fn gemini() -> ProviderDefinition {
    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        LIST_MODELS.to_string(),
        Endpoint::new(HttpMethod::Get, "/models"),
    );
    endpoints.insert(
        TEST_CALL.to_string(),
        Endpoint::new(HttpMethod::Post, "/models/{{model}}:generateContent"),
    );
    ProviderDefinition {
        id: "gemini".to_string(),
        name: "Gemini (native)".to_string(),
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        auth: Some(AuthSpec {
            kind: AuthKind::Query,
            field: "key".to_string(),
            value_template: "{{apiKey}}".to_string(),
        }),
        static_headers: BTreeMap::new(),
        endpoints,
        defaults: defaults("gemini-1.5-flash", 20_000),
        mapping: ExtractionMapping {
            models: Some(ModelsMapping {
                path: "models".to_string(),
                item: Some("name".to_string()),
            }),
            text: Some(PathMapping {
                path: "candidates.0.content.parts.0.text".to_string(),
            }),
            usage: None,
            error: Some(PathMapping {
                path: "error.message".to_string(),
            }),
        },
        pricing: Some(pricing("USD")),
        pricing_table: Vec::new(),
    }
}

fn claude(id: &str, name: &str, base_url: &str) -> ProviderDefinition {
    let mut static_headers = BTreeMap::new();
    static_headers.insert("anthropic-version".to_string(), "2023-06-01".to_string());
    static_headers.insert("content-type".to_string(), "application/json".to_string());

    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        TEST_CALL.to_string(),
        Endpoint::new(HttpMethod::Post, "/messages"),
    );

    ProviderDefinition {
        id: id.to_string(),
        name: name.to_string(),
        base_url: base_url.to_string(),
        auth: Some(AuthSpec {
            kind: AuthKind::Header,
            field: "x-api-key".to_string(),
            value_template: "{{apiKey}}".to_string(),
        }),
        static_headers,
        endpoints,
        defaults: defaults("claude-3-5-sonnet-20241022", 20_000),
        mapping: ExtractionMapping {
            models: None,
            text: Some(PathMapping {
                path: "content.0.text".to_string(),
            }),
            usage: Some(UsageMapping {
                input: "usage.input_tokens".to_string(),
                output: "usage.output_tokens".to_string(),
                total: "usage.total_tokens".to_string(),
            }),
            error: Some(PathMapping {
                path: "error.message".to_string(),
            }),
        },
        pricing: Some(pricing("USD")),
        pricing_table: Vec::new(),
    }
}

fn custom_template() -> ProviderDefinition {
    let mut provider = openai_compatible(
        "custom",
        "Custom (OpenAI-style template)",
        "https://example.com/v1",
        "",
        "USD",
        15_000,
    );
    // Unknown gateways: keep only the error mapping and let shape
    // auto-detection handle the rest.
    provider.mapping = ExtractionMapping {
        error: Some(PathMapping {
            path: "error.message".to_string(),
        }),
        ..ExtractionMapping::default()
    };
    provider
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::ProviderFamily;

    #[test]
    fn every_builtin_validates() {
        for provider in builtin_providers() {
            provider
                .validate()
                .unwrap_or_else(|e| panic!("{} failed validation: {e}", provider.id));
        }
    }

    #[test]
    fn ids_are_unique() {
        let providers = builtin_providers();
        let mut ids: Vec<_> = providers.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), providers.len());
    }

    #[test]
    fn find_known_and_unknown() {
        assert!(find("openai").is_ok());
        assert!(find("does-not-exist").is_err());
    }

    #[test]
    fn families_match_auth_shapes() {
        assert_eq!(find("openai").unwrap().family(), ProviderFamily::OpenAiCompatible);
        assert_eq!(find("claude").unwrap().family(), ProviderFamily::Anthropic);
        assert_eq!(find("gemini").unwrap().family(), ProviderFamily::Gemini);
    }

    #[test]
    fn gemini_test_path_references_model() {
        let provider = find("gemini").unwrap();
        assert!(provider.endpoints[TEST_CALL].path.contains("{{model}}"));
    }

    #[test]
    fn qwen_native_carries_a_body_template() {
        let provider = find("qwen-native").unwrap();
        assert!(provider.endpoints[TEST_CALL].body_template.is_some());
    }
}
