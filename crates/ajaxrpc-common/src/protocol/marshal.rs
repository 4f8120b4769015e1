//! Native <-> Value Marshalling
//!
//! [`IntoValue`] encodes a native Rust value into a [`Value`]; [`FromValue`]
//! decodes it back and fails with [`MarshalError::TypeMismatch`] whenever the
//! value's tag disagrees with what the call site expects. The two are
//! structural inverses: for every supported native `v`,
//! `T::from_value(&v.into_value()) == Ok(v)`.
//!
//! # Type Mapping
//!
//! | Native | Value |
//! |--------|-------|
//! | `i64`, `i32`, `u32` | `Int` |
//! | `f64`, `f32` | `Double` |
//! | `bool` | `Bool` |
//! | `String`, `&str` | `String` |
//! | `DateTime<Utc>` | `DateTime` |
//! | `Bytes` | `Binary` |
//! | `Vec<T>`, `&[T]` | `Array` |
//! | `IndexMap<String, T>`, `BTreeMap<String, T>` | `Struct` |
//! | `Option<T>` | the inner value, or `Nil` |
//! | `()` | `Nil` |
//!
//! Integers and doubles never convert into each other implicitly. A handler
//! that wants to accept both declares `scalar` or `any` and coerces itself.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use thiserror::Error;

use super::{TypeTag, Value};

/// Failure to decode a [`Value`] into a native type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: TypeTag, found: TypeTag },

    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("missing parameter at position {index}")]
    MissingParameter { index: usize },

    #[error("parameter {index}: {source}")]
    Parameter {
        index: usize,
        #[source]
        source: Box<MarshalError>,
    },
}

impl MarshalError {
    fn mismatch(expected: TypeTag, found: &Value) -> Self {
        MarshalError::TypeMismatch {
            expected,
            found: found.type_tag(),
        }
    }
}

/// Encodes a native value into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Decodes a [`Value`] into a native value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, MarshalError>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        Ok(value.clone())
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Int(i) => Ok(*i),
            other => Err(MarshalError::mismatch(TypeTag::Int, other)),
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self.into())
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| MarshalError::OutOfRange {
            value: wide.to_string(),
            target: "i32",
        })
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(self.into())
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        let wide = i64::from_value(value)?;
        u32::try_from(wide).map_err(|_| MarshalError::OutOfRange {
            value: wide.to_string(),
            target: "u32",
        })
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Double(d) => Ok(*d),
            other => Err(MarshalError::mismatch(TypeTag::Double, other)),
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Double(self.into())
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        if narrow.is_infinite() && wide.is_finite() {
            return Err(MarshalError::OutOfRange {
                value: wide.to_string(),
                target: "f32",
            });
        }
        Ok(narrow)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(MarshalError::mismatch(TypeTag::Bool, other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(MarshalError::mismatch(TypeTag::String, other)),
        }
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::DateTime(self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            other => Err(MarshalError::mismatch(TypeTag::DateTime, other)),
        }
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> Value {
        Value::Binary(self)
    }
}

impl FromValue for Bytes {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Binary(b) => Ok(b.clone()),
            other => Err(MarshalError::mismatch(TypeTag::Binary, other)),
        }
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Nil
    }
}

impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Nil => Ok(()),
            other => Err(MarshalError::mismatch(TypeTag::Nil, other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Nil, IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue + Clone> IntoValue for &[T] {
    fn into_value(self) -> Value {
        Value::Array(self.iter().cloned().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            other => Err(MarshalError::mismatch(TypeTag::Array, other)),
        }
    }
}

impl<T: IntoValue> IntoValue for IndexMap<String, T> {
    fn into_value(self) -> Value {
        Value::Struct(
            self.into_iter()
                .map(|(name, field)| (name, field.into_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Struct(fields) => fields
                .iter()
                .map(|(name, field)| T::from_value(field).map(|decoded| (name.clone(), decoded)))
                .collect(),
            other => Err(MarshalError::mismatch(TypeTag::Struct, other)),
        }
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Struct(
            self.into_iter()
                .map(|(name, field)| (name, field.into_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, MarshalError> {
        match value {
            Value::Struct(fields) => fields
                .iter()
                .map(|(name, field)| T::from_value(field).map(|decoded| (name.clone(), decoded)))
                .collect(),
            other => Err(MarshalError::mismatch(TypeTag::Struct, other)),
        }
    }
}

/// Ordered argument list of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Value>);

impl Params {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Decodes the argument at `index` into `T`.
    ///
    /// # Errors
    ///
    /// `MissingParameter` if there is no argument at `index`, otherwise a
    /// `Parameter` error wrapping the decode failure.
    pub fn decode<T: FromValue>(&self, index: usize) -> Result<T, MarshalError> {
        let value = self
            .0
            .get(index)
            .ok_or(MarshalError::MissingParameter { index })?;
        T::from_value(value).map_err(|source| MarshalError::Parameter {
            index,
            source: Box::new(source),
        })
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds a [`Params`] list from native arguments.
///
/// Implemented for tuples of up to six [`IntoValue`] items, for
/// `Vec<Value>` and for `Params` itself.
pub trait IntoParams {
    fn into_params(self) -> Params;
}

impl IntoParams for Params {
    fn into_params(self) -> Params {
        self
    }
}

impl IntoParams for Vec<Value> {
    fn into_params(self) -> Params {
        Params(self)
    }
}

macro_rules! impl_into_params {
    ($($name:ident),*) => {
        impl<$($name: IntoValue),*> IntoParams for ($($name,)*) {
            #[allow(non_snake_case)]
            fn into_params(self) -> Params {
                let ($($name,)*) = self;
                Params(vec![$($name.into_value()),*])
            }
        }
    };
}

impl_into_params!();
impl_into_params!(A);
impl_into_params!(A, B);
impl_into_params!(A, B, C);
impl_into_params!(A, B, C, D);
impl_into_params!(A, B, C, D, E);
impl_into_params!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_numeric_coercion() {
        assert_eq!(
            i64::from_value(&Value::Double(1.0)),
            Err(MarshalError::TypeMismatch {
                expected: TypeTag::Int,
                found: TypeTag::Double
            })
        );
        assert!(f64::from_value(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_narrowing_out_of_range() {
        let big = Value::Int(i64::from(i32::MAX) + 1);
        assert!(matches!(
            i32::from_value(&big),
            Err(MarshalError::OutOfRange { target: "i32", .. })
        ));
        assert!(u32::from_value(&Value::Int(-1)).is_err());
        assert_eq!(i32::from_value(&Value::Int(-7)), Ok(-7));
    }

    #[test]
    fn test_f32_both_ways() {
        assert_eq!(f32::from_value(&1.5f32.into_value()), Ok(1.5));
        assert_eq!(f32::from_value(&Value::Double(0.1)), Ok(0.1f32));
        assert!(matches!(
            f32::from_value(&Value::Double(1.0e300)),
            Err(MarshalError::OutOfRange { target: "f32", .. })
        ));
        assert!(f32::from_value(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_vec_reports_element_mismatch() {
        let value = Value::Array(vec![Value::Int(1), Value::String("x".into())]);
        assert!(matches!(
            Vec::<i64>::from_value(&value),
            Err(MarshalError::TypeMismatch {
                expected: TypeTag::Int,
                found: TypeTag::String
            })
        ));
    }

    #[test]
    fn test_array_declared_but_string_given() {
        let err = Vec::<i64>::from_value(&Value::String("x".into())).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected array, found string");
    }

    #[test]
    fn test_option_maps_nil() {
        assert_eq!(Option::<i64>::from_value(&Value::Nil), Ok(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(4)), Ok(Some(4)));
        assert_eq!(None::<i64>.into_value(), Value::Nil);
    }

    #[test]
    fn test_struct_keeps_insertion_order() {
        let mut native = IndexMap::new();
        native.insert("b".to_string(), 2i64);
        native.insert("a".to_string(), 1i64);
        let value = native.clone().into_value();
        let keys: Vec<_> = value.as_struct().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(IndexMap::<String, i64>::from_value(&value), Ok(native));
    }

    #[test]
    fn test_params_decode() {
        let params = (vec![10i64, 11, 12], "label").into_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params.decode::<Vec<i64>>(0), Ok(vec![10, 11, 12]));
        assert_eq!(params.decode::<String>(1), Ok("label".to_string()));
        assert_eq!(
            params.decode::<i64>(2),
            Err(MarshalError::MissingParameter { index: 2 })
        );
        let err = params.decode::<i64>(1).unwrap_err();
        assert_eq!(err.to_string(), "parameter 1: type mismatch: expected int, found string");
    }

    #[test]
    fn test_empty_tuple_params() {
        assert!(().into_params().is_empty());
    }
}
