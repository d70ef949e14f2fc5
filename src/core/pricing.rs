//! Rate resolution and cost estimation.
//!
//! A rate comes from three layers, most specific first: runtime pricing
//! rows fetched from an allow-listed gateway, the definition's static rule
//! table, then the provider-level defaults. Rule matching is scored so an
//! exact model match always beats a prefix match, a longer prefix beats a
//! shorter one, and earlier rows win ties.
//!
//! An all-zero rate is treated as "not configured" unless the rule opts in
//! with `allow_zero` (free tiers do exist). Cost is only estimated when
//! both rates and both token counts are known; a partial estimate would be
//! worse than none.

use serde_json::Value;
use tracing::debug;

use crate::core::normalize::TokenUsage;
use crate::core::provider::{HttpMethod, MatchKind, PriceUnit, PricingRule, ProviderDefinition};
use crate::core::request::OutboundRequest;
use crate::core::transport::{self, RawResult, TransportSettings};
use crate::error::Result;
use crate::util::format::trim_money;
use crate::util::json::{as_number, get_text, json_get};

// =============================================================================
// Rate resolution
// =============================================================================

/// A resolved price rate for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub currency: String,
    pub unit: PriceUnit,
    pub input: Option<f64>,
    pub output: Option<f64>,
}

impl ResolvedRate {
    /// One-line rendering for summaries, e.g. `in 0.15 / out 0.6 USD/1M tok`.
    #[must_use]
    pub fn display(&self) -> String {
        let part = |v: Option<f64>| v.map_or_else(|| "-".to_string(), trim_money);
        format!(
            "in {} / out {} {}{}",
            part(self.input),
            part(self.output),
            self.currency,
            self.unit.label()
        )
    }
}

/// Resolve the rate for a model: runtime rows, then the static table, then
/// provider defaults. Returns `None` when nothing is configured.
#[must_use]
pub fn resolve_rate(
    provider: &ProviderDefinition,
    runtime_rules: &[PricingRule],
    model: &str,
) -> Option<ResolvedRate> {
    let defaults = provider.pricing.clone().unwrap_or_default();

    let mut best: Option<(&PricingRule, i64)> = None;
    for rule in runtime_rules.iter().chain(&provider.pricing_table) {
        let Some(score) = match_score(rule, model) else {
            continue;
        };
        // strict '>' keeps the earlier rule on equal scores
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((rule, score));
        }
    }

    if let Some((rule, _)) = best {
        let rate = ResolvedRate {
            currency: rule.currency.clone().unwrap_or_else(|| defaults.currency.clone()),
            unit: rule.unit.unwrap_or(defaults.unit),
            input: rule.input,
            output: rule.output,
        };
        if usable(&rate, rule.allow_zero) {
            return Some(rate);
        }
    }

    let fallback = ResolvedRate {
        currency: defaults.currency.clone(),
        unit: defaults.unit,
        input: defaults.input,
        output: defaults.output,
    };
    usable(&fallback, defaults.allow_zero).then_some(fallback)
}

fn match_score(rule: &PricingRule, model: &str) -> Option<i64> {
    let len = i64::try_from(rule.model.len()).ok()?;
    match rule.match_kind {
        MatchKind::Exact if rule.model == model => Some(10_000 + len),
        MatchKind::Prefix if model.starts_with(&rule.model) => Some(len),
        _ => None,
    }
}

fn usable(rate: &ResolvedRate, allow_zero: bool) -> bool {
    if rate.input.is_none() && rate.output.is_none() {
        return false;
    }
    if allow_zero {
        return true;
    }
    rate.input.unwrap_or(0.0) != 0.0 || rate.output.unwrap_or(0.0) != 0.0
}

// =============================================================================
// Cost estimation
// =============================================================================

/// An estimated cost for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    pub currency: String,
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

impl CostEstimate {
    /// One-line rendering for summaries.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} {} (in {} + out {})",
            trim_money(self.total),
            self.currency,
            trim_money(self.input),
            trim_money(self.output)
        )
    }
}

/// Estimate the cost of a call. Requires both rates and both token counts;
/// anything less yields `None`.
#[must_use]
pub fn estimate_cost(rate: &ResolvedRate, usage: &TokenUsage) -> Option<CostEstimate> {
    let input_rate = rate.input?;
    let output_rate = rate.output?;
    let input_tokens = usage.input_tokens?;
    let output_tokens = usage.output_tokens?;

    let scale = rate.unit.scale();
    let input = input_tokens / scale * input_rate;
    let output = output_tokens / scale * output_rate;
    Some(CostEstimate {
        currency: rate.currency.clone(),
        input,
        output,
        total: input + output,
    })
}

// =============================================================================
// Runtime pricing feed
// =============================================================================

/// One allow-listed gateway that publishes a live pricing feed.
#[derive(Debug, Clone, Copy)]
pub struct PricingSource {
    /// Exact origin the provider's base URL must match.
    pub origin: &'static str,
}

/// Gateways whose pricing feeds we trust enough to fetch at probe time.
pub const PRICING_SOURCES: &[PricingSource] = &[PricingSource {
    origin: "https://api.vectorengine.ai",
}];

fn matching_source(base_url: &str) -> Option<&'static PricingSource> {
    let origin = url::Url::parse(base_url).ok().and_then(|u| {
        let scheme = u.scheme().to_string();
        let host = u.host_str()?.to_string();
        Some(match u.port() {
            Some(p) => format!("{scheme}://{host}:{p}"),
            None => format!("{scheme}://{host}"),
        })
    })?;
    PRICING_SOURCES.iter().find(|s| s.origin == origin)
}

/// Fetch runtime pricing rows for a provider, if its base URL belongs to an
/// allow-listed gateway. Returns an empty table otherwise, and swallows
/// fetch failures — a missing feed never fails the probe.
pub async fn fetch_runtime_pricing(
    client: &reqwest::Client,
    provider: &ProviderDefinition,
    api_key: &str,
    transport: &TransportSettings,
) -> Result<Vec<PricingRule>> {
    let Some(source) = matching_source(&provider.base_url) else {
        return Ok(Vec::new());
    };

    let candidates = [
        format!("{}/models/pricing", provider.base_url.trim_end_matches('/')),
        format!("{}/v1/models/pricing", source.origin),
    ];

    for url in candidates {
        let request = pricing_request(&url, api_key, provider.defaults.timeout_ms);
        match transport::execute(client, &request, transport).await {
            Ok(RawResult { ok: true, json: Some(body), .. }) => {
                let rules = parse_pricing_table(&body);
                if !rules.is_empty() {
                    return Ok(rules);
                }
            }
            Ok(_) => {}
            Err(e) => debug!(url, error = %e, "pricing feed fetch failed"),
        }
    }
    Ok(Vec::new())
}

fn pricing_request(url: &str, api_key: &str, timeout_ms: u64) -> OutboundRequest {
    let mut headers = std::collections::BTreeMap::new();
    headers.insert("authorization".to_string(), format!("Bearer {api_key}"));
    OutboundRequest {
        method: HttpMethod::Get,
        url: url.to_string(),
        headers,
        body: None,
        timeout_ms,
    }
}

/// Parse a pricing feed body into exact-match rules.
///
/// Accepts two shapes: an array of row objects (model name in `model`,
/// `id`, or `name`) or an object mapping model name to a row. Rows use any
/// of the common field spellings for the two rates.
#[must_use]
pub fn parse_pricing_table(body: &Value) -> Vec<PricingRule> {
    let data = json_get(body, "data").unwrap_or(body);
    let mut rules = Vec::new();

    match data {
        Value::Array(rows) => {
            for row in rows {
                let Some(model) = get_text(row, "model")
                    .or_else(|| get_text(row, "id"))
                    .or_else(|| get_text(row, "name"))
                else {
                    continue;
                };
                if let Some(rule) = parse_row(&model, row) {
                    rules.push(rule);
                }
            }
        }
        Value::Object(map) => {
            for (model, row) in map {
                if let Some(rule) = parse_row(model, row) {
                    rules.push(rule);
                }
            }
        }
        _ => {}
    }
    rules
}

fn parse_row(model: &str, row: &Value) -> Option<PricingRule> {
    let input = first_number(row, &["input", "prompt", "in", "input_price", "prompt_price", "inputPrice"]);
    let output = first_number(
        row,
        &["output", "completion", "out", "output_price", "completion_price", "outputPrice"],
    );
    if input.is_none() && output.is_none() {
        return None;
    }

    let currency = get_text(row, "currency").map(|c| {
        if c.eq_ignore_ascii_case("RMB") {
            "CNY".to_string()
        } else {
            c.to_ascii_uppercase()
        }
    });
    let unit = json_get(row, "unit")
        .and_then(|v| serde_json::from_value::<PriceUnit>(v.clone()).ok());

    Some(PricingRule {
        match_kind: MatchKind::Exact,
        model: model.to_string(),
        currency,
        unit,
        input,
        output,
        // a live feed quoting zero means free, not unconfigured
        allow_zero: true,
    })
}

fn first_number(row: &Value, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .find_map(|field| json_get(row, field).and_then(as_number))
}
