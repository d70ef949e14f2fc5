//! Shared fixtures for integration tests.

#![allow(dead_code)]

use llmprobe::core::catalog;
use llmprobe::core::pipeline::CallOptions;
use llmprobe::core::provider::ProviderDefinition;

/// An OpenAI-style bearer-auth definition pointed at a mock server.
pub fn bearer_provider(base_url: &str) -> ProviderDefinition {
    let mut provider = catalog::find("custom").expect("custom template");
    provider.base_url = base_url.to_string();
    provider
}

/// An Anthropic-style definition pointed at a mock server.
pub fn anthropic_provider(base_url: &str) -> ProviderDefinition {
    let mut provider = catalog::find("custom-claude").expect("custom-claude template");
    provider.base_url = base_url.to_string();
    provider
}

/// Call options every test uses: fixed key, model, prompt, short timeout.
pub fn options() -> CallOptions {
    CallOptions {
        api_key: "sk-test".to_string(),
        model: Some("test-model".to_string()),
        prompt: Some("ping".to_string()),
        timeout_ms: Some(5_000),
    }
}
