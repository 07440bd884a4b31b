//! Request body decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hermes_core::EventError;
use serde_json::{Map, Value};

/// `Content-Type` of JSON payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// `Content-Type` of HTML form payloads.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Decodes the body of a raw gateway event.
///
/// - an absent or empty body decodes to `{}`
/// - the payload is base64-decoded first when `isBase64Encoded` is set
/// - form payloads decode to an object of strings (the last duplicate wins)
/// - JSON payloads are parsed; malformed JSON is returned as the raw string
/// - any other content type is returned as the raw string
///
/// # Errors
///
/// Returns a 400 [`EventError`] if the payload is not valid base64 or not a
/// valid form encoding.
pub fn get_body(event: &Value) -> anyhow::Result<Value> {
    let body = match event.get("body") {
        None | Some(Value::Null) => return Ok(Value::Object(Map::new())),
        Some(Value::String(body)) if body.is_empty() => return Ok(Value::Object(Map::new())),
        Some(Value::String(body)) => body,
        // Already decoded by an upstream layer.
        Some(other) => return Ok(other.clone()),
    };

    let payload = if is_base64_encoded(event) {
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| EventError::new(format!("Invalid base64 body: {e}")))?;
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        body.clone()
    };

    let content_type = content_type(event).unwrap_or_default();

    if content_type.contains(CONTENT_TYPE_FORM) {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&payload)
            .map_err(|e| EventError::new(format!("Invalid form body: {e}")))?;
        let fields: Map<String, Value> = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        return Ok(Value::Object(fields));
    }

    if content_type.contains(CONTENT_TYPE_JSON) {
        return Ok(serde_json::from_str(&payload).unwrap_or(Value::String(payload)));
    }

    Ok(Value::String(payload))
}

/// Returns the request's `Content-Type`, looked up case-insensitively.
pub fn content_type(event: &Value) -> Option<&str> {
    event
        .get("headers")?
        .as_object()?
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .and_then(|(_, value)| value.as_str())
}

fn is_base64_encoded(event: &Value) -> bool {
    event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
