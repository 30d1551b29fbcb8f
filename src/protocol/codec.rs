//! JSON codec for the on-disk envelopes.
//!
//! Thin typed layer over serde_json. Output is pretty-printed because the
//! files double as a debugging surface for whoever is watching the folder.
//! Decoding never panics; malformed text surfaces as [`BridgeError::Parse`]
//! and is handled at the poll-loop boundary.

use serde_json::Value;

use crate::error::BridgeError;
use crate::protocol::{Request, Response};

/// Serialize any JSON-compatible value to text.
pub fn encode(value: &Value) -> Result<String, BridgeError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Parse text into a JSON value.
pub fn decode(text: &str) -> Result<Value, BridgeError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_request(request: &Request) -> Result<String, BridgeError> {
    Ok(serde_json::to_string_pretty(request)?)
}

pub fn decode_request(text: &str) -> Result<Request, BridgeError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_response(response: &Response) -> Result<String, BridgeError> {
    Ok(serde_json::to_string_pretty(response)?)
}

pub fn decode_response(text: &str) -> Result<Response, BridgeError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResponseStatus;
    use serde_json::json;

    #[test]
    fn value_round_trip_is_deep_equal() {
        let value = json!({
            "nested": {"key": "va\"lue\n", "flag": true, "none": null},
            "list": [1, 2.5, -3, "four", [], {}],
            "empty": "",
        });
        let text = encode(&value).unwrap();
        assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn decode_rejects_truncated_json() {
        let err = decode(r#"{"id": "t4", "command"#).unwrap_err();
        assert!(matches!(err, BridgeError::Parse(_)));
    }

    #[test]
    fn decode_request_requires_a_command() {
        let err = decode_request(r#"{"id": "t1"}"#).unwrap_err();
        assert!(matches!(err, BridgeError::Parse(_)));
    }

    #[test]
    fn request_round_trip() {
        let text = r#"{"id":"t2","command":"execute","script":"echo hi","timestamp":1700000000000}"#;
        let req = decode_request(text).unwrap();
        assert_eq!(req.id.as_deref(), Some("t2"));
        assert_eq!(req.script.as_deref(), Some("echo hi"));

        let encoded = encode_request(&req).unwrap();
        let again = decode_request(&encoded).unwrap();
        assert_eq!(again.command, "execute");
        assert_eq!(again.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn response_round_trip_preserves_status() {
        let resp = Response::error(Some("t3".into()), "boom");
        let text = encode_response(&resp).unwrap();
        let again = decode_response(&text).unwrap();
        assert_eq!(again.status, ResponseStatus::Error);
        assert_eq!(again.message.as_deref(), Some("boom"));
    }
}
