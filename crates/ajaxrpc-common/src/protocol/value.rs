//! Wire Value Model
//!
//! [`Value`] is the typed union that crosses the client/server boundary.
//! Every argument and every result is carried as one of its variants, and
//! the variant tag alone decides both how the value is encoded and how it is
//! checked against a declared [`TypeTag`](super::TypeTag).
//!
//! # Wire Format
//!
//! Values serialize as externally tagged JSON, one key per value:
//!
//! | Variant | JSON |
//! |---------|------|
//! | `Int(5)` | `{"int":5}` |
//! | `Bool(true)` | `{"boolean":true}` |
//! | `Double(1.5)` | `{"double":1.5}` |
//! | `String("x")` | `{"string":"x"}` |
//! | `DateTime(..)` | `{"datetime":"2024-01-01T00:00:00Z"}` |
//! | `Binary(..)` | `{"base64":"AAE="}` |
//! | `Array(..)` | `{"array":[...]}` |
//! | `Struct(..)` | `{"struct":{...}}` |
//! | `Nil` | `"nil"` |
//!
//! JSON has no spelling for NaN or the infinities, so a `Double` holding one
//! fails to serialize instead of being written as `null`.
//!
//! Struct fields keep their insertion order in both directions, so a value
//! re-serializes byte-for-byte the same way it arrived.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::TypeTag;

/// Ordered field map carried by [`Value::Struct`].
pub type StructFields = IndexMap<String, Value>;

/// A typed value as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "int")]
    Int(i64),
    #[serde(rename = "boolean")]
    Bool(bool),
    #[serde(rename = "double")]
    Double(#[serde(serialize_with = "finite_double")] f64),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "datetime")]
    DateTime(DateTime<Utc>),
    #[serde(rename = "base64")]
    Binary(#[serde(with = "base64_bytes")] Bytes),
    #[serde(rename = "array")]
    Array(Vec<Value>),
    #[serde(rename = "struct")]
    Struct(StructFields),
    #[serde(rename = "nil")]
    Nil,
}

impl Value {
    /// Returns the concrete type tag of this value.
    ///
    /// The result is never [`TypeTag::Scalar`] or [`TypeTag::Any`]; those
    /// only appear in declarations.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int(_) => TypeTag::Int,
            Value::Bool(_) => TypeTag::Bool,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) => TypeTag::String,
            Value::DateTime(_) => TypeTag::DateTime,
            Value::Binary(_) => TypeTag::Binary,
            Value::Array(_) => TypeTag::Array,
            Value::Struct(_) => TypeTag::Struct,
            Value::Nil => TypeTag::Nil,
        }
    }

    /// Returns `true` for every variant except `Array` and `Struct`.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Struct(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the field map if this is a struct.
    pub fn as_struct(&self) -> Option<&StructFields> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Number of elements of an array, `None` for any other variant.
    pub fn array_len(&self) -> Option<usize> {
        self.as_array().map(<[Value]>::len)
    }

    /// Element at a 0-based position of an array.
    pub fn array_get(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Looks up a struct field by name.
    ///
    /// An absent field yields `None`; a field explicitly holding nil yields
    /// `Some(&Value::Nil)`. Non-struct values always yield `None`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|fields| fields.get(name))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Nil => write!(f, "nil"),
        }
    }
}

fn finite_double<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "double {} has no JSON representation",
            value
        )));
    }
    serializer.serialize_f64(*value)
}

/// Base64 text representation for binary payloads.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
