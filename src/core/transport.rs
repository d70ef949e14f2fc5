//! Request execution: direct HTTP or via a relay.
//!
//! Both paths produce the same [`RawResult`]. A non-2xx upstream status is
//! NOT an error here — it comes back as `ok: false` with the body attached
//! so the fallback policy and the normalizer can inspect it. Only transport
//! failures (timeout, connection refused, DNS) surface as errors.
//!
//! The relay path POSTs an envelope to `{proxy}/proxy` and unwraps the
//! mirrored response envelope; it exists for deployments where the probing
//! host cannot reach the upstream directly (browser-origin relays,
//! egress-restricted networks).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::request::OutboundRequest;
use crate::error::{ProbeError, Result};

/// Where requests are sent: straight to the upstream or through a relay.
#[derive(Debug, Clone, Default)]
pub struct TransportSettings {
    pub use_proxy: bool,
    pub proxy_base_url: String,
}

/// The raw outcome of one executed request.
#[derive(Debug, Clone)]
pub struct RawResult {
    /// Whether the upstream answered with a 2xx status.
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub latency_ms: u64,
    pub content_type: Option<String>,
    /// Response body as received.
    pub raw_text: String,
    /// Parsed body, only when the content type declares JSON.
    pub json: Option<Value>,
}

impl RawResult {
    /// Parse `raw_text` when the content type says JSON; invalid JSON under
    /// a JSON content type is left unparsed rather than failing the probe.
    fn finish(mut self) -> Self {
        let is_json = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
        if is_json {
            self.json = serde_json::from_str(&self.raw_text).ok();
        }
        self
    }
}

/// Build a configured HTTP client.
///
/// Per-request deadlines come from the request itself; the client carries
/// only the identifying user agent.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client() -> Result<Client> {
    ClientBuilder::new()
        .user_agent(format!("llmprobe/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProbeError::Network(e.to_string()))
}

/// Execute a request over the configured transport.
///
/// # Errors
///
/// Returns `Timeout` when the deadline elapses and `Network` for other
/// transport failures. Upstream HTTP errors are not errors here.
pub async fn execute(
    client: &Client,
    request: &OutboundRequest,
    transport: &TransportSettings,
) -> Result<RawResult> {
    if transport.use_proxy {
        execute_via_proxy(client, request, &transport.proxy_base_url).await
    } else {
        execute_direct(client, request).await
    }
}

async fn execute_direct(client: &Client, request: &OutboundRequest) -> Result<RawResult> {
    let mut builder = client
        .request(request.method.into(), &request.url)
        .timeout(Duration::from_millis(request.timeout_ms));
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let started = Instant::now();
    let response = builder
        .send()
        .await
        .map_err(|e| classify(&e, request.timeout_ms))?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let raw_text = response
        .text()
        .await
        .map_err(|e| classify(&e, request.timeout_ms))?;
    let latency_ms = duration_ms(started.elapsed());

    Ok(RawResult {
        ok: status.is_success(),
        status: status.as_u16(),
        status_text: status
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
        latency_ms,
        content_type,
        raw_text,
        json: None,
    }
    .finish())
}

fn classify(error: &reqwest::Error, timeout_ms: u64) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout(timeout_ms)
    } else {
        ProbeError::Network(error.to_string())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(elapsed: Duration) -> u64 {
    elapsed.as_millis() as u64
}

// =============================================================================
// Relay envelope
// =============================================================================

/// Request envelope the relay expects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    url: &'a str,
    method: &'a str,
    headers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a Value>,
    timeout_ms: u64,
}

/// Response envelope the relay mirrors back.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    latency_ms: u64,
    #[serde(default)]
    body: String,
}

async fn execute_via_proxy(
    client: &Client,
    request: &OutboundRequest,
    proxy_base_url: &str,
) -> Result<RawResult> {
    let proxy_url = format!("{}/proxy", proxy_base_url.trim_end_matches('/'));
    let envelope = ProxyRequest {
        url: &request.url,
        method: request.method.as_str(),
        headers: &request.headers,
        body: request.body.as_ref(),
        timeout_ms: request.timeout_ms,
    };

    // The relay applies the deadline upstream; give it headroom here.
    let outer_timeout = Duration::from_millis(request.timeout_ms.saturating_add(5_000));
    let response = client
        .post(&proxy_url)
        .timeout(outer_timeout)
        .json(&envelope)
        .send()
        .await
        .map_err(|e| classify(&e, request.timeout_ms))?;

    let raw = response
        .text()
        .await
        .map_err(|e| classify(&e, request.timeout_ms))?;

    let Ok(envelope) = serde_json::from_str::<ProxyResponse>(&raw) else {
        // A relay that answers with something other than the envelope still
        // yields a result the caller can display.
        return Ok(RawResult {
            ok: false,
            status: 0,
            status_text: "invalid relay response".to_string(),
            latency_ms: 0,
            content_type: None,
            raw_text: raw,
            json: None,
        });
    };

    Ok(RawResult {
        ok: envelope.ok,
        status: envelope.status,
        status_text: envelope.status_text,
        latency_ms: envelope.latency_ms,
        content_type: envelope.content_type,
        raw_text: envelope.body,
        json: None,
    }
    .finish())
}
