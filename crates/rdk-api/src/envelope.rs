//! Success-body decoding.
//!
//! Backend handlers answer either with the payload object itself or with a
//! `{status, message?, data}` envelope. One `data` layer is stripped; empty
//! bodies decode as an empty object so acknowledgement types still parse.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use rdk_schemas::Flat;

use crate::ApiError;

/// Keys that may sit next to `data` in an envelope.
const ENVELOPE_KEYS: &[&str] = &["status", "message", "success"];

/// Strip one `data` envelope layer when the object is only an envelope.
///
/// An object that carries `data` alongside payload keys (e.g. the admin
/// export's `summary`) is returned unchanged.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map)
            if map.contains_key("data")
                && map
                    .keys()
                    .all(|k| k == "data" || ENVELOPE_KEYS.contains(&k.as_str())) =>
        {
            match map.remove("data") {
                Some(Value::Null) | None => Value::Object(map),
                Some(inner) => inner,
            }
        }
        other => other,
    }
}

/// Parse raw response bytes. Empty or whitespace-only bodies become `{}`.
pub(crate) fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

pub(crate) fn decode<T: DeserializeOwned>(body: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

/// Decode the list under `key`. A bare array is accepted as the list itself.
pub(crate) fn decode_list<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Null) | None => {
                return Err(ApiError::Decode(format!("response has no `{key}` list")))
            }
            Some(v) => v,
        },
        other => {
            return Err(ApiError::Decode(format!(
                "expected object with `{key}`, got {other}"
            )))
        }
    };
    decode(list, key)
}

/// Decode the object under `key`, or the body itself when the key is absent.
pub(crate) fn decode_field_or_self<T: DeserializeOwned>(
    mut body: Value,
    key: &str,
) -> Result<T, ApiError> {
    if body.get(key).is_some_and(Value::is_object) {
        if let Some(inner) = body.get_mut(key).map(Value::take) {
            return decode(inner, key);
        }
    }
    decode(body, key)
}

/// Acknowledgement for mutations whose body carries nothing the client needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of a mutation that may echo the updated flat.
///
/// Callers refetch lists regardless; `flat` is informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatUpdate {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub flat: Option<Flat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_stripped_once() {
        let body = json!({"status": "success", "data": {"data": 1}});
        assert_eq!(unwrap_envelope(body), json!({"data": 1}));
    }

    #[test]
    fn data_next_to_payload_keys_is_kept() {
        let body = json!({"data": {"users": []}, "summary": {"total": 0}});
        assert_eq!(unwrap_envelope(body.clone()), body);
    }

    #[test]
    fn empty_body_decodes_as_ack() {
        let v = parse_body(b"  \n").unwrap();
        let ack: Ack = decode(v, "ack").unwrap();
        assert_eq!(ack, Ack::default());
    }

    #[test]
    fn missing_list_is_a_decode_error() {
        let err = decode_list::<Flat>(json!({"status": "success"}), "flats").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn field_or_self_accepts_both_shapes() {
        #[derive(Deserialize)]
        struct U {
            username: String,
        }
        let nested: U =
            decode_field_or_self(json!({"user": {"username": "asha"}}), "user").unwrap();
        let flat: U = decode_field_or_self(json!({"username": "ravi"}), "user").unwrap();
        assert_eq!(nested.username, "asha");
        assert_eq!(flat.username, "ravi");
    }
}
