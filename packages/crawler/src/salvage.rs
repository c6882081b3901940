//! Best-effort parser for near-JSON LLM output.
//!
//! Fallback order is fixed: strict parse, then a fenced ```json block, then
//! any fenced ``` block, then failure. Kept apart from the gateway's retry
//! loop so it is testable without any network behavior.

use serde_json::Value;

/// Parse model output that should be JSON but may be wrapped in markdown.
pub fn parse_loose_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(inner) = fenced_block(trimmed, "```json") {
        if let Ok(value) = serde_json::from_str::<Value>(inner.trim()) {
            return Some(value);
        }
    }

    if let Some(inner) = fenced_block(trimmed, "```") {
        if let Ok(value) = serde_json::from_str::<Value>(inner.trim()) {
            return Some(value);
        }
    }

    None
}

/// Contents of the first fenced block opened by `fence`.
fn fenced_block<'a>(content: &'a str, fence: &str) -> Option<&'a str> {
    let after_open = content.split_once(fence)?.1;
    let inner = match after_open.split_once("```") {
        Some((inner, _)) => inner,
        // Unclosed fence: take the rest, models routinely drop the closer
        None => after_open,
    };
    Some(inner)
}
