//! Server-sent-event stream reassembly.
//!
//! Some gateways answer a non-streaming request with an SSE body anyway.
//! Rather than failing extraction, the normalizer detects the framing and
//! reassembles the stream: delta fragments concatenated in order, and the
//! last frame that carried a `usage` object kept for the usage extractors.

use serde_json::Value;

use crate::util::json::{get_text, json_get};

/// Reassembled stream content.
#[derive(Debug, Clone)]
pub struct SseExtract {
    /// Concatenated text fragments, in frame order.
    pub text: Option<String>,
    /// The last whole frame that carried a non-null `usage` object.
    pub usage_frame: Option<Value>,
}

/// Whether a body looks like an SSE stream rather than a single JSON value.
#[must_use]
pub fn looks_like_sse(body: &str) -> bool {
    body.trim_start().starts_with("data:") || body.contains("\ndata:")
}

/// Reassemble an SSE body into text and a usage frame.
///
/// Frames that are empty, `[DONE]`, or not valid JSON are skipped. Returns
/// `None` when no frame parsed or nothing useful was found.
#[must_use]
pub fn reassemble(body: &str) -> Option<SseExtract> {
    let mut text = String::new();
    let mut saw_text = false;
    let mut usage_frame: Option<Value> = None;

    for line in body.lines() {
        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim();
        if payload.is_empty() || payload == "[DONE]" {
            continue;
        }
        let Ok(frame) = serde_json::from_str::<Value>(payload) else {
            continue;
        };

        if let Some(fragment) = get_text(&frame, "choices.0.delta.content")
            .or_else(|| get_text(&frame, "choices.0.message.content"))
        {
            text.push_str(&fragment);
            saw_text = true;
        }
        if json_get(&frame, "usage").is_some_and(|u| !u.is_null()) {
            usage_frame = Some(frame);
        }
    }

    if !saw_text && usage_frame.is_none() {
        return None;
    }
    Some(SseExtract {
        text: saw_text.then_some(text),
        usage_frame,
    })
}
