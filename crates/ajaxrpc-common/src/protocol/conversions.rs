//! Plain JSON <-> Value Conversions
//!
//! The wire format tags every value (see [`Value`]). Humans and shell tools
//! prefer untagged JSON, so these conversions map between the two for the
//! command line and for logging.
//!
//! # Type Mapping
//!
//! | JSON | Value |
//! |------|-------|
//! | null | `Nil` |
//! | boolean | `Bool` |
//! | number (integral, fits i64) | `Int` |
//! | number (other) | `Double` |
//! | string | `String` |
//! | array | `Array` |
//! | object | `Struct` (document order) |
//!
//! # Limitations
//!
//! - `DateTime` renders as RFC 3339 text and `Binary` as base64 text, so
//!   they come back as `String` when converted in the other direction
//! - Non-finite doubles have no JSON form and cause an error

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value as JsonValue;

use super::error::{AjaxrpcError, Result};
use super::{StructFields, Value};

/// Convert untagged JSON into a [`Value`].
///
/// # Errors
///
/// Returns `AjaxrpcError::InvalidRequest` if a number fits neither `i64`
/// nor `f64`.
pub fn json_to_value(json: JsonValue) -> Result<Value> {
    match json {
        JsonValue::Null => Ok(Value::Nil),
        JsonValue::Bool(b) => Ok(Value::Bool(b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Double))
            .ok_or_else(|| AjaxrpcError::InvalidRequest(format!("Number out of range: {}", n))),
        JsonValue::String(s) => Ok(Value::String(s)),
        JsonValue::Array(items) => items
            .into_iter()
            .map(json_to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        JsonValue::Object(obj) => {
            let mut fields = StructFields::with_capacity(obj.len());
            for (key, value) in obj {
                fields.insert(key, json_to_value(value)?);
            }
            Ok(Value::Struct(fields))
        }
    }
}

/// Convert a [`Value`] into untagged JSON.
///
/// # Errors
///
/// Returns `AjaxrpcError::InvalidResponse` for NaN or infinite doubles.
pub fn value_to_json(value: &Value) -> Result<JsonValue> {
    match value {
        Value::Nil => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Int(i) => Ok(JsonValue::Number((*i).into())),
        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .ok_or_else(|| AjaxrpcError::InvalidResponse(format!("Invalid float: {}", d))),
        Value::String(s) => Ok(JsonValue::String(s.clone())),
        Value::DateTime(dt) => Ok(JsonValue::String(dt.to_rfc3339())),
        Value::Binary(bytes) => Ok(JsonValue::String(STANDARD.encode(bytes))),
        Value::Array(items) => items
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        Value::Struct(fields) => {
            let mut obj = serde_json::Map::new();
            for (key, field) in fields {
                obj.insert(key.clone(), value_to_json(field)?);
            }
            Ok(JsonValue::Object(obj))
        }
    }
}
