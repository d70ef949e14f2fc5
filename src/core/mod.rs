//! Core probing engine: definitions, request building, transport, and
//! response normalization.

pub mod catalog;
pub mod fallback;
pub mod hints;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod pricing;
pub mod provider;
pub mod request;
pub mod sse;
pub mod template;
pub mod transport;

pub use catalog::builtin_providers;
pub use fallback::{FallbackPlan, plan_fallback};
pub use hints::diagnostic_hint;
pub use normalize::{
    ModelEntry, NormalizedResult, TokenLimits, TokenUsage, build_summary, infer_request_model,
    normalize, normalize_model_id,
};
pub use pipeline::{CallOptions, Probe, RunRecord};
pub use pricing::{CostEstimate, ResolvedRate, estimate_cost, parse_pricing_table, resolve_rate};
pub use provider::{
    AuthKind, AuthSpec, CallDefaults, Endpoint, ExtractionMapping, HttpMethod, MatchKind,
    PriceUnit, PricingDefaults, PricingRule, ProviderDefinition, ProviderFamily,
};
pub use request::{OutboundRequest, build_request, redact_headers};
pub use template::{TemplateVars, render_str, render_value};
pub use transport::{RawResult, TransportSettings, build_client, execute};
