//! Recovery of a JSON payload from free-form agent output.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

/// Matches the first markdown code fence, optionally tagged `json`.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)```").expect("code fence pattern is valid")
});

/// No recovery strategy produced valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not extract valid JSON from AI response")]
pub struct ExtractError;

/// Extract and parse a JSON value from an AI response that may contain
/// markdown code fences, JSON Lines, or surrounding prose.
///
/// Strategies are tried in order and the first candidate that deserializes
/// as `T` wins:
///
/// 1. the whole text as one document;
/// 2. for multi-line text, the longest line starting with `{` (earliest on
///    ties);
/// 3. the contents of the first markdown code fence;
/// 4. the span from the first `{` to the last `}`.
///
/// # Errors
///
/// Returns `ExtractError` if every strategy fails.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Ok(value);
    }

    if raw.contains('\n') {
        if let Some(value) = longest_json_line(raw) {
            return Ok(value);
        }
    }

    if let Some(value) = fenced_json(raw) {
        return Ok(value);
    }

    if let Some(value) = brace_span(raw) {
        return Ok(value);
    }

    Err(ExtractError)
}

fn longest_json_line<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let mut longest: Option<(usize, T)> = None;
    for line in raw.split('\n') {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            continue;
        }
        let len = trimmed.chars().count();
        if longest.as_ref().is_some_and(|(best, _)| len <= *best) {
            continue;
        }
        if let Ok(value) = serde_json::from_str(trimmed) {
            longest = Some((len, value));
        }
    }
    longest.map(|(_, value)| value)
}

fn fenced_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let body = CODE_FENCE.captures(raw)?.get(1)?.as_str().trim();
    serde_json::from_str(body).ok()
}

fn brace_span<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}
