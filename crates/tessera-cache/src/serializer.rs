//! Pluggable value serialization.
//!
//! Serialization is orthogonal to the engine: the facade converts values to
//! `serde_json::Value` and hands them to whichever serializer it was built
//! with. [`JsonSerializer`] is the default text round-trip;
//! [`MsgPackSerializer`] packs arbitrary value graphs through MessagePack
//! wrapped in base64 so the result stays binary-safe for engines that store
//! strings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;

use crate::error::{CacheError, CacheResult};

/// Capability contract for cache value serializers.
pub trait CacheSerializer: Send + Sync {
    /// Serializes a value to its stored string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded.
    fn serialize_value(&self, value: &Value) -> CacheResult<String>;

    /// Deserializes a stored string back into a value.
    ///
    /// Implementations may be error-tolerant and return the raw input as a
    /// string value instead of failing; typed callers treat such a return
    /// as a terminal miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer is strict and the input does not
    /// decode.
    fn deserialize_value(&self, raw: &str) -> CacheResult<Value>;
}

/// Default serializer: round-trips values through JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl CacheSerializer for JsonSerializer {
    fn serialize_value(&self, value: &Value) -> CacheResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize_value(&self, raw: &str) -> CacheResult<Value> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Binary-safe serializer: MessagePack wrapped in base64.
///
/// Decoding is error-tolerant: input that is not valid base64-wrapped
/// MessagePack is returned verbatim as a string value rather than raised as
/// an error. Callers that expect a typed value will observe a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackSerializer;

impl CacheSerializer for MsgPackSerializer {
    fn serialize_value(&self, value: &Value) -> CacheResult<String> {
        let packed =
            rmp_serde::to_vec(value).map_err(|err| CacheError::serialization(err.to_string()))?;
        Ok(BASE64.encode(packed))
    }

    fn deserialize_value(&self, raw: &str) -> CacheResult<Value> {
        let Ok(bytes) = BASE64.decode(raw) else {
            return Ok(Value::String(raw.to_string()));
        };
        match rmp_serde::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let serializer = JsonSerializer;
        let value = json!({"id": 42, "name": "ada"});

        let raw = serializer.serialize_value(&value).unwrap();
        assert_eq!(serializer.deserialize_value(&raw).unwrap(), value);
    }

    #[test]
    fn test_json_rejects_malformed_input() {
        let serializer = JsonSerializer;
        assert!(serializer.deserialize_value("{not json").is_err());
    }

    #[test]
    fn test_msgpack_round_trip() {
        let serializer = MsgPackSerializer;
        let value = json!({"nested": {"flag": true, "items": [1, 2, 3]}});

        let raw = serializer.serialize_value(&value).unwrap();
        assert_eq!(serializer.deserialize_value(&raw).unwrap(), value);
    }

    #[test]
    fn test_msgpack_returns_raw_value_on_failed_decode() {
        let serializer = MsgPackSerializer;

        let decoded = serializer.deserialize_value("definitely-not-msgpack!").unwrap();
        assert_eq!(decoded, Value::String("definitely-not-msgpack!".to_string()));
    }
}
