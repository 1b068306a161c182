//! Response envelope shared by every backend endpoint
//!
//! A non-2xx status is a failure whose message comes from an optional `msg`
//! field. A 2xx JSON object with a numeric `code` is an application result:
//! `code != 0` fails with `msg`, `code == 0` carries the payload under `data`.
//! Any other 2xx body is the payload itself, and an unparseable 2xx body is a
//! success with a null payload.

use super::ChatError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Unwrap a raw HTTP response into its payload
pub fn decode_envelope(status: u16, body: &str) -> Result<Value, ChatError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| message_field(&v))
            .unwrap_or_else(|| format!("request failed ({status})"));
        return Err(ChatError::transport(message).with_status(status));
    }

    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return Ok(Value::Null);
    };

    let Some(code) = parsed.get("code").filter(|c| c.is_number()) else {
        return Ok(parsed);
    };

    if code.as_f64().is_some_and(|c| c.abs() < f64::EPSILON) {
        Ok(parsed.get("data").cloned().unwrap_or(Value::Null))
    } else {
        let message = message_field(&parsed).unwrap_or_else(|| "request failed".to_string());
        Err(ChatError::application(message))
    }
}

/// Decode a list payload; anything that is not an array is an empty list
pub fn decode_list<T: DeserializeOwned>(payload: Value) -> Result<Vec<T>, ChatError> {
    if !payload.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(payload)
        .map_err(|e| ChatError::decode(format!("Failed to decode list payload: {e}")))
}

/// Decode a single-object payload; a null payload is an error
pub fn decode_one<T: DeserializeOwned>(payload: Value) -> Result<T, ChatError> {
    if payload.is_null() {
        return Err(ChatError::decode("Response carried no payload"));
    }
    serde_json::from_value(payload)
        .map_err(|e| ChatError::decode(format!("Failed to decode payload: {e}")))
}

fn message_field(body: &Value) -> Option<String> {
    body.get("msg")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
