//! Response normalization: from raw bytes to text, models, and usage.
//!
//! Extraction never dispatches on a provider id. Explicit mapping paths from
//! the definition are tried first; everything else falls back to ordered
//! shape strategies that recognize the common response dialects
//! (chat-completions, Responses API, Anthropic messages, Gemini
//! `generateContent`) and, last, a reassembled SSE stream. A strategy that
//! finds nothing simply yields to the next one — extraction is best-effort
//! and a response nobody recognizes still produces a raw snippet in the
//! summary instead of an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::pricing::{CostEstimate, ResolvedRate};
use crate::core::provider::ExtractionMapping;
use crate::core::sse;
use crate::core::transport::RawResult;
use crate::util::format::{format_token_count, format_token_usage};
use crate::util::json::{as_number, get_number, get_text, json_get};

/// How many characters of an unrecognized body the summary shows.
pub const RAW_SNIPPET_CHARS: usize = 1_200;

/// How many models the summary lists before eliding the rest.
pub const MODELS_SHOWN: usize = 30;

static MODEL_IN_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/models/([^/:?]+)([:?]|$)").expect("model path regex"));

// =============================================================================
// Normalized shapes
// =============================================================================

/// Token counters for one call. Any counter may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: Option<f64>,
    pub output_tokens: Option<f64>,
    pub total_tokens: Option<f64>,
}

impl TokenUsage {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.input_tokens.is_none() && self.output_tokens.is_none() && self.total_tokens.is_none()
    }

    /// One-line rendering, e.g. `in 12 / out 30 / total 42`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "in {} / out {} / total {}",
            format_token_usage(self.input_tokens),
            format_token_usage(self.output_tokens),
            format_token_usage(self.total_tokens)
        )
    }
}

/// Token limits advertised on a model catalog entry, under whichever of the
/// common field spellings the provider chose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenLimits {
    pub context: Option<f64>,
    pub input: Option<f64>,
    pub output: Option<f64>,
}

const CONTEXT_FIELDS: &[&str] = &[
    "context_length",
    "contextLength",
    "max_context_tokens",
    "maxContextTokens",
    "context_window",
    "contextWindow",
    "max_tokens",
    "maxTokens",
];
const INPUT_LIMIT_FIELDS: &[&str] = &[
    "max_input_tokens",
    "maxInputTokens",
    "input_token_limit",
    "inputTokenLimit",
    "prompt_token_limit",
    "promptTokenLimit",
];
const OUTPUT_LIMIT_FIELDS: &[&str] = &[
    "max_output_tokens",
    "maxOutputTokens",
    "output_token_limit",
    "outputTokenLimit",
    "completion_token_limit",
    "completionTokenLimit",
];

impl TokenLimits {
    /// Read limits off a catalog item.
    #[must_use]
    pub fn from_value(item: &Value) -> Self {
        let first = |fields: &[&str]| {
            fields
                .iter()
                .find_map(|f| json_get(item, f).and_then(as_number))
        };
        Self {
            context: first(CONTEXT_FIELDS),
            input: first(INPUT_LIMIT_FIELDS),
            output: first(OUTPUT_LIMIT_FIELDS),
        }
    }

    /// Compact annotation: `in 128k / out 8k`, `in 128k`, `out 8k`, or
    /// `ctx 32k`. `None` when nothing is advertised.
    #[must_use]
    pub fn meta(&self) -> Option<String> {
        match (self.input, self.output) {
            (Some(i), Some(o)) => Some(format!(
                "in {} / out {}",
                format_token_count(i),
                format_token_count(o)
            )),
            (Some(i), None) => Some(format!("in {}", format_token_count(i))),
            (None, Some(o)) => Some(format!("out {}", format_token_count(o))),
            (None, None) => self.context.map(|c| format!("ctx {}", format_token_count(c))),
        }
    }
}

/// One model from a catalog listing.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub id: String,
    pub limits: TokenLimits,
    /// The catalog item as received, for JSON output.
    pub raw: Value,
}

impl ModelEntry {
    fn from_item(id: &str, item: &Value) -> Self {
        Self {
            id: normalize_model_id(id),
            limits: TokenLimits::from_value(item),
            raw: item.clone(),
        }
    }

    /// `id` or `id (meta)`.
    #[must_use]
    pub fn display(&self) -> String {
        match self.limits.meta() {
            Some(meta) => format!("{} ({meta})", self.id),
            None => self.id.clone(),
        }
    }
}

/// Everything extraction recovered from one response.
#[derive(Debug, Clone, Default)]
pub struct NormalizedResult {
    pub text: Option<String>,
    pub models: Option<Vec<ModelEntry>>,
    pub usage: TokenUsage,
    pub error_message: Option<String>,
}

impl NormalizedResult {
    #[must_use]
    pub fn extracted_anything(&self) -> bool {
        self.text.is_some()
            || self.models.is_some()
            || !self.usage.is_empty()
            || self.error_message.is_some()
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Strip the Gemini-style `models/` prefix from a model identifier.
#[must_use]
pub fn normalize_model_id(id: &str) -> String {
    id.strip_prefix("models/").unwrap_or(id).to_string()
}

/// Infer which model a request targeted: the body's `model` field, or a
/// `/models/{id}` segment in the URL.
#[must_use]
pub fn infer_request_model(body: Option<&Value>, url: &str) -> Option<String> {
    if let Some(model) = body.and_then(|b| get_text(b, "model")) {
        return Some(model);
    }
    MODEL_IN_PATH
        .captures(url)
        .map(|caps| normalize_model_id(&caps[1]))
}

/// Normalize a raw response using the definition's mapping, falling back to
/// shape strategies and SSE reassembly.
#[must_use]
pub fn normalize(raw: &RawResult, mapping: &ExtractionMapping) -> NormalizedResult {
    let stream = if raw.json.is_none() && sse::looks_like_sse(&raw.raw_text) {
        sse::reassemble(&raw.raw_text)
    } else {
        None
    };

    let mut out = NormalizedResult::default();
    if let Some(json) = &raw.json {
        out.error_message = extract_error(json, mapping);
        out.text = extract_text(json, mapping);
        out.usage = extract_usage(json, mapping);
        out.models = extract_models(json, mapping);
    }
    if let Some(stream) = stream {
        if out.text.is_none() {
            out.text = stream.text;
        }
        if out.usage.is_empty() {
            if let Some(frame) = &stream.usage_frame {
                out.usage = extract_usage(frame, &ExtractionMapping::default());
            }
        }
    }
    out
}

// Deliberately mapped-path only: an unmapped error shape surfaces as the
// raw-body snippet instead of a guessed message.
fn extract_error(json: &Value, mapping: &ExtractionMapping) -> Option<String> {
    let path = mapping.error.as_ref()?;
    get_text(json, &path.path)
}

const TEXT_STRATEGIES: &[fn(&Value) -> Option<String>] = &[
    |v| get_text(v, "choices.0.message.content"),
    |v| get_text(v, "output_text"),
    |v| get_text(v, "output.0.content.0.text"),
    |v| get_text(v, "content.0.text"),
    |v| get_text(v, "candidates.0.content.parts.0.text"),
];

fn extract_text(json: &Value, mapping: &ExtractionMapping) -> Option<String> {
    if let Some(path) = &mapping.text {
        if let Some(text) = get_text(json, &path.path) {
            return Some(text);
        }
    }
    TEXT_STRATEGIES.iter().find_map(|strategy| strategy(json))
}

const USAGE_STRATEGIES: &[fn(&Value) -> Option<TokenUsage>] = &[
    |v| {
        finish_usage(TokenUsage {
            input_tokens: get_number(v, "usage.prompt_tokens"),
            output_tokens: get_number(v, "usage.completion_tokens"),
            total_tokens: get_number(v, "usage.total_tokens"),
        })
    },
    |v| {
        finish_usage(TokenUsage {
            input_tokens: get_number(v, "usage.input_tokens"),
            output_tokens: get_number(v, "usage.output_tokens"),
            total_tokens: None,
        })
    },
    |v| {
        finish_usage(TokenUsage {
            input_tokens: get_number(v, "usageMetadata.promptTokenCount"),
            output_tokens: get_number(v, "usageMetadata.candidatesTokenCount"),
            total_tokens: get_number(v, "usageMetadata.totalTokenCount"),
        })
    },
];

/// Fill a missing total when both sides are known; reject empty usage.
fn finish_usage(mut usage: TokenUsage) -> Option<TokenUsage> {
    if usage.is_empty() {
        return None;
    }
    if usage.total_tokens.is_none() {
        if let (Some(i), Some(o)) = (usage.input_tokens, usage.output_tokens) {
            usage.total_tokens = Some(i + o);
        }
    }
    Some(usage)
}

fn extract_usage(json: &Value, mapping: &ExtractionMapping) -> TokenUsage {
    if let Some(paths) = &mapping.usage {
        let mapped = TokenUsage {
            input_tokens: get_number(json, &paths.input),
            output_tokens: get_number(json, &paths.output),
            total_tokens: get_number(json, &paths.total),
        };
        if let Some(usage) = finish_usage(mapped) {
            return usage;
        }
    }
    USAGE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(json))
        .unwrap_or_default()
}

const MODEL_STRATEGIES: &[fn(&Value) -> Option<Vec<ModelEntry>>] = &[
    |v| entries_from_array(json_get(v, "data")?, Some("id")),
    |v| entries_from_array(json_get(v, "models")?, Some("name")),
    |v| entries_from_array(v, None),
    |v| entries_from_array(json_get(v, "data")?, None),
    |v| entries_from_array(json_get(v, "models")?, None),
];

/// Build entries from an array of catalog items.
///
/// With an `item` sub-path, items are objects and the path yields the id;
/// without one, items must be bare strings.
fn entries_from_array(value: &Value, item_path: Option<&str>) -> Option<Vec<ModelEntry>> {
    let items = value.as_array()?;
    let entries: Vec<ModelEntry> = match item_path {
        Some(path) => items
            .iter()
            .filter_map(|item| Some(ModelEntry::from_item(&get_text(item, path)?, item)))
            .collect(),
        None => items
            .iter()
            .filter_map(|item| Some(ModelEntry::from_item(item.as_str()?, item)))
            .collect(),
    };
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

fn extract_models(json: &Value, mapping: &ExtractionMapping) -> Option<Vec<ModelEntry>> {
    if let Some(paths) = &mapping.models {
        if let Some(array) = json_get(json, &paths.path) {
            if let Some(entries) = entries_from_array(array, paths.item.as_deref())
                .or_else(|| entries_from_array(array, None))
            {
                return Some(entries);
            }
        }
    }
    MODEL_STRATEGIES.iter().find_map(|strategy| strategy(json))
}

// =============================================================================
// Summary
// =============================================================================

/// Everything the summary renders from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryParts<'a> {
    pub hint: Option<&'a str>,
    pub rate: Option<&'a ResolvedRate>,
    pub cost: Option<&'a CostEstimate>,
    pub notes: &'a [String],
}

/// Render the human-readable probe summary.
#[must_use]
pub fn build_summary(
    raw: &RawResult,
    url: &str,
    normalized: &NormalizedResult,
    parts: &SummaryParts<'_>,
) -> String {
    let mut lines = Vec::new();

    let status_text = if raw.status_text.is_empty() {
        String::new()
    } else {
        format!(" {}", raw.status_text)
    };
    lines.push(format!(
        "[HTTP] {}{status_text} · {}ms",
        raw.status, raw.latency_ms
    ));
    lines.push(format!("[URL] {url}"));
    for note in parts.notes {
        lines.push(format!("[Note] {note}"));
    }

    if let Some(error) = &normalized.error_message {
        lines.push(format!("[Error] {error}"));
    }
    if let Some(hint) = parts.hint {
        lines.push(format!("[Hint] {hint}"));
    }

    if let Some(models) = &normalized.models {
        lines.push(format!("[Models] {} available", models.len()));
        for model in models.iter().take(MODELS_SHOWN) {
            lines.push(format!("  - {}", model.display()));
        }
        if models.len() > MODELS_SHOWN {
            lines.push(format!("  ... and {} more", models.len() - MODELS_SHOWN));
        }
    }
    if let Some(text) = &normalized.text {
        lines.push(format!("[Text] {text}"));
    }
    if !normalized.usage.is_empty() {
        lines.push(format!("[Usage] {}", normalized.usage.display()));
    }
    if let Some(rate) = parts.rate {
        lines.push(format!("[Rate] {}", rate.display()));
    }
    if let Some(cost) = parts.cost {
        lines.push(format!("[Cost] {}", cost.display()));
    }

    if !normalized.extracted_anything() && !raw.raw_text.trim().is_empty() {
        lines.push(format!("[Raw] {}", snippet(&raw.raw_text, RAW_SNIPPET_CHARS)));
    }

    lines.join("\n")
}

/// Char-boundary-safe prefix with an ellipsis when truncated.
#[must_use]
pub fn snippet(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}
