//! Probe orchestration: the operations the CLI exposes.
//!
//! Four operations share one shape: build a request from the definition,
//! execute it, normalize the response, and fold everything into a
//! [`RunRecord`]. `test_call` additionally applies the one-shot fallback
//! policy, fetches runtime pricing when the gateway is allow-listed, and
//! estimates cost. `full_probe` chains ping, model listing, and the test
//! call into one report.
//!
//! Only transport and configuration failures propagate as errors; an
//! upstream HTTP error is a finding, recorded and summarized like any
//! other response.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::fallback::plan_fallback;
use crate::core::hints::diagnostic_hint;
use crate::core::normalize::{
    build_summary, infer_request_model, normalize, snippet, NormalizedResult, SummaryParts,
};
use crate::core::pricing::{self, estimate_cost, resolve_rate, CostEstimate, ResolvedRate};
use crate::core::provider::{
    Endpoint, HttpMethod, PriceUnit, PricingRule, ProviderDefinition, LIST_MODELS, PING, TEST_CALL,
};
use crate::core::request::{build_request, OutboundRequest};
use crate::core::template::TemplateVars;
use crate::core::transport::{self, RawResult, TransportSettings};
use crate::error::Result;

/// Response body cap in persisted records.
pub const BODY_SNIPPET_CHARS: usize = 2_000;

/// Summary cap in persisted records.
pub const SUMMARY_CHARS: usize = 1_200;

/// Paths probed when a definition declares no `list_models` endpoint.
const LIST_CANDIDATES: &[&str] = &["/models", "/v1/models"];

// =============================================================================
// Options and records
// =============================================================================

/// Per-call parameters; anything unset falls back to the definition's
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub api_key: String,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl CallOptions {
    fn vars(&self, provider: &ProviderDefinition) -> TemplateVars {
        TemplateVars::new(
            &self.api_key,
            self.model.as_deref().unwrap_or(&provider.defaults.model),
            self.prompt.as_deref().unwrap_or(&provider.defaults.prompt),
        )
    }

    fn timeout_ms(&self, provider: &ProviderDefinition) -> u64 {
        self.timeout_ms.unwrap_or(provider.defaults.timeout_ms)
    }
}

/// The complete, serializable outcome of one operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub provider_id: String,
    pub operation: String,
    pub created_at: String,
    pub request: RequestRecord,
    pub response: ResponseRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<RateRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<CostRecord>,
    pub summary: String,
}

/// What was sent, credentials masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub method: &'static str,
    pub url: String,
    pub headers_redacted: std::collections::BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// What came back, body capped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub body_snippet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateRecord {
    pub currency: String,
    pub unit: PriceUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostRecord {
    pub currency: String,
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

// =============================================================================
// The probe
// =============================================================================

/// One configured probing session.
pub struct Probe {
    client: reqwest::Client,
    transport: TransportSettings,
}

impl Probe {
    /// Build a probe over the given transport.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(transport: TransportSettings) -> Result<Self> {
        Ok(Self {
            client: transport::build_client()?,
            transport,
        })
    }

    async fn run_once(
        &self,
        provider: &ProviderDefinition,
        endpoint_name: &str,
        vars: &TemplateVars,
        timeout_ms: u64,
    ) -> Result<(OutboundRequest, RawResult)> {
        let request = build_request(provider, endpoint_name, vars, timeout_ms)?;
        debug!(method = request.method.as_str(), url = %request.url, "executing request");
        let raw = transport::execute(&self.client, &request, &self.transport).await?;
        info!(
            url = %request.url,
            status = raw.status,
            latency_ms = raw.latency_ms,
            "response received"
        );
        Ok((request, raw))
    }

    /// Connectivity check: hit the declared `ping` endpoint, or the base
    /// URL itself when none is declared.
    ///
    /// # Errors
    ///
    /// Returns error on configuration or transport failure.
    pub async fn ping(&self, provider: &ProviderDefinition, opts: &CallOptions) -> Result<RunRecord> {
        provider.validate()?;
        let derived;
        let effective = if provider.endpoints.contains_key(PING) {
            provider
        } else {
            derived = provider.with_endpoint(PING, Endpoint::new(HttpMethod::Get, ""));
            &derived
        };

        let vars = opts.vars(effective);
        let (request, raw) = self
            .run_once(effective, PING, &vars, opts.timeout_ms(effective))
            .await?;
        let normalized = normalize(&raw, &effective.mapping);
        let summary = build_summary(&raw, &request.url, &normalized, &SummaryParts::default());
        Ok(make_record(provider, PING, request, raw, normalized, summary, None, None))
    }

    /// Fetch the model catalog. When the definition declares no
    /// `list_models` endpoint, well-known paths are probed until one
    /// answers with something other than 404.
    ///
    /// # Errors
    ///
    /// Returns error on configuration or transport failure.
    pub async fn list_models(
        &self,
        provider: &ProviderDefinition,
        opts: &CallOptions,
    ) -> Result<RunRecord> {
        provider.validate()?;
        let vars = opts.vars(provider);
        let timeout_ms = opts.timeout_ms(provider);

        if provider.endpoints.contains_key(LIST_MODELS) {
            let (request, raw) = self.run_once(provider, LIST_MODELS, &vars, timeout_ms).await?;
            let normalized = normalize(&raw, &provider.mapping);
            let summary = build_summary(&raw, &request.url, &normalized, &SummaryParts::default());
            return Ok(make_record(
                provider, LIST_MODELS, request, raw, normalized, summary, None, None,
            ));
        }

        let mut outcome: Option<(OutboundRequest, RawResult, NormalizedResult, String)> = None;
        for path in LIST_CANDIDATES {
            let derived =
                provider.with_endpoint(LIST_MODELS, Endpoint::new(HttpMethod::Get, path));
            let (request, raw) = self.run_once(&derived, LIST_MODELS, &vars, timeout_ms).await?;
            let normalized = normalize(&raw, &derived.mapping);
            let done = (raw.ok && normalized.models.is_some()) || raw.status != 404;
            let note = format!("no model listing declared; probed {path}");
            outcome = Some((request, raw, normalized, note));
            if done {
                break;
            }
        }
        // LIST_CANDIDATES is non-empty, so an outcome always exists
        let (request, raw, normalized, note) =
            outcome.expect("at least one candidate path was probed");
        let notes = vec![note];
        let parts = SummaryParts {
            notes: &notes,
            ..SummaryParts::default()
        };
        let summary = build_summary(&raw, &request.url, &normalized, &parts);
        Ok(make_record(
            provider, LIST_MODELS, request, raw, normalized, summary, None, None,
        ))
    }

    /// Run the minimal generation test, with fallback, hints, and cost
    /// estimation.
    ///
    /// # Errors
    ///
    /// Returns error on configuration or transport failure.
    pub async fn test_call(
        &self,
        provider: &ProviderDefinition,
        opts: &CallOptions,
    ) -> Result<RunRecord> {
        provider.validate()?;
        let vars = opts.vars(provider);
        let timeout_ms = opts.timeout_ms(provider);
        let mut notes: Vec<String> = Vec::new();

        let (mut request, mut raw) = self.run_once(provider, TEST_CALL, &vars, timeout_ms).await?;
        let mut normalized = normalize(&raw, &provider.mapping);
        let mut effective = provider.clone();

        if !raw.ok {
            if let Some(plan) =
                plan_fallback(provider, TEST_CALL, &raw, normalized.error_message.as_deref())
            {
                let (retry_request, retry_raw) = self
                    .run_once(&plan.provider, TEST_CALL, &vars, timeout_ms)
                    .await?;
                if retry_raw.ok {
                    notes.push(format!("{}: {}", plan.description, retry_request.url));
                } else {
                    notes.push(format!(
                        "{}: {} (still {})",
                        plan.description, retry_request.url, retry_raw.status
                    ));
                }
                // the retry is the final attempt either way; its response
                // is the one recorded and summarized
                normalized = normalize(&retry_raw, &plan.provider.mapping);
                effective = plan.provider;
                request = retry_request;
                raw = retry_raw;
            }
        }

        let request_model = infer_request_model(request.body.as_ref(), &request.url);
        let hint = diagnostic_hint(&effective, &raw, request_model.as_deref());

        let runtime_rules = self.runtime_pricing(&effective, opts).await;
        let rate = request_model
            .as_deref()
            .and_then(|model| resolve_rate(&effective, &runtime_rules, model));
        let cost = rate
            .as_ref()
            .and_then(|rate| estimate_cost(rate, &normalized.usage));

        let parts = SummaryParts {
            hint: hint.as_deref(),
            rate: rate.as_ref(),
            cost: cost.as_ref(),
            notes: &notes,
        };
        let summary = build_summary(&raw, &request.url, &normalized, &parts);
        Ok(make_record(
            provider, TEST_CALL, request, raw, normalized, summary, rate, cost,
        ))
    }

    /// Full probe: connectivity, catalog, then the generation test.
    ///
    /// # Errors
    ///
    /// Returns error on configuration or transport failure.
    pub async fn full_probe(
        &self,
        provider: &ProviderDefinition,
        opts: &CallOptions,
    ) -> Result<Vec<RunRecord>> {
        let mut records = Vec::with_capacity(3);
        records.push(self.ping(provider, opts).await?);
        records.push(self.list_models(provider, opts).await?);
        records.push(self.test_call(provider, opts).await?);
        Ok(records)
    }

    async fn runtime_pricing(
        &self,
        provider: &ProviderDefinition,
        opts: &CallOptions,
    ) -> Vec<PricingRule> {
        match pricing::fetch_runtime_pricing(&self.client, provider, &opts.api_key, &self.transport)
            .await
        {
            Ok(rules) => rules,
            Err(e) => {
                debug!(error = %e, "runtime pricing unavailable");
                Vec::new()
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn make_record(
    provider: &ProviderDefinition,
    operation: &str,
    request: OutboundRequest,
    raw: RawResult,
    normalized: NormalizedResult,
    summary: String,
    rate: Option<ResolvedRate>,
    cost: Option<CostEstimate>,
) -> RunRecord {
    RunRecord {
        provider_id: provider.id.clone(),
        operation: operation.to_string(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        request: RequestRecord {
            method: request.method.as_str(),
            url: request.url.clone(),
            headers_redacted: request.redacted_headers(),
            body: request.body,
        },
        response: ResponseRecord {
            ok: raw.ok,
            status: raw.status,
            status_text: raw.status_text,
            latency_ms: raw.latency_ms,
            content_type: raw.content_type,
            body_snippet: snippet(&raw.raw_text, BODY_SNIPPET_CHARS),
        },
        text: normalized.text,
        models: normalized.models.map(|models| {
            models
                .into_iter()
                .map(|m| ModelRecord {
                    meta: m.limits.meta(),
                    id: m.id,
                })
                .collect()
        }),
        usage: (!normalized.usage.is_empty()).then(|| UsageRecord {
            input_tokens: normalized.usage.input_tokens,
            output_tokens: normalized.usage.output_tokens,
            total_tokens: normalized.usage.total_tokens,
        }),
        error_message: normalized.error_message,
        rate: rate.map(|r| RateRecord {
            currency: r.currency,
            unit: r.unit,
            input: r.input,
            output: r.output,
        }),
        cost_estimate: cost.map(|c| CostRecord {
            currency: c.currency,
            input: c.input,
            output: c.output,
            total: c.total,
        }),
        summary: snippet(&summary, SUMMARY_CHARS),
    }
}
