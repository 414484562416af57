use serde_json::Value;

use super::GatewayError;
use crate::models::analytics::AnalyticsPayload;

/// Byte range of the balanced `{...}` block opening at `start`, skipping
/// braces inside string literals.
fn balanced_block(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First substring of `text` that is a complete JSON object. Models often
/// wrap their answer in prose or markdown fences.
pub fn first_json_object(text: &str) -> Option<Value> {
    text.match_indices('{')
        .filter_map(|(start, _)| balanced_block(text, start))
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(value @ Value::Object(_)) => Some(value),
            _ => None,
        })
}

pub fn parse_payload(text: &str) -> Result<AnalyticsPayload, GatewayError> {
    let value = first_json_object(text).ok_or_else(|| GatewayError::MalformedResponse {
        detail: "no JSON object in model response".into(),
    })?;

    let payload: AnalyticsPayload =
        serde_json::from_value(value).map_err(|e| GatewayError::MalformedResponse {
            detail: format!("analytics schema mismatch: {e}"),
        })?;

    payload
        .validate_scores()
        .map_err(|e| GatewayError::MalformedResponse {
            detail: e.to_string(),
        })?;

    Ok(payload)
}
