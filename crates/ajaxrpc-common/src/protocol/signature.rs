//! Type Tags, Signatures and Method Descriptors
//!
//! A method declares one or more [`Signature`]s: a return [`TypeTag`] plus an
//! ordered list of parameter tags. The textual form follows the XML-RPC
//! introspection names, e.g. `int(array)` or `string(string, int)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{AjaxrpcError, Result};
use super::Value;

/// Character reserved for builtin namespaces such as `system.listMethods`.
///
/// User method names must not contain it, which keeps them usable as flat
/// identifiers in a generated client namespace.
pub const METHOD_SEPARATOR: char = '.';

/// Declared type of a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    #[serde(rename = "int", alias = "i4", alias = "integer")]
    Int,
    #[serde(rename = "boolean", alias = "bool")]
    Bool,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "dateTime.iso8601", alias = "datetime")]
    DateTime,
    #[serde(rename = "base64", alias = "binary")]
    Binary,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "struct")]
    Struct,
    #[serde(rename = "nil")]
    Nil,
    /// Accepts any non-container value.
    #[serde(rename = "scalar")]
    Scalar,
    /// Accepts every value.
    #[serde(rename = "any", alias = "mixed")]
    Any,
}

impl TypeTag {
    /// Canonical textual name.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Bool => "boolean",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::DateTime => "dateTime.iso8601",
            TypeTag::Binary => "base64",
            TypeTag::Array => "array",
            TypeTag::Struct => "struct",
            TypeTag::Nil => "nil",
            TypeTag::Scalar => "scalar",
            TypeTag::Any => "any",
        }
    }

    /// Checks whether a value may be passed where this tag is declared.
    ///
    /// Concrete tags require an exact tag match. There is no numeric
    /// coercion: an `Int` is not accepted for `double` and vice versa.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            TypeTag::Any => true,
            TypeTag::Scalar => value.is_scalar(),
            concrete => value.type_tag() == concrete,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = AjaxrpcError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = match s.trim() {
            "int" | "i4" | "integer" => TypeTag::Int,
            "boolean" | "bool" => TypeTag::Bool,
            "double" => TypeTag::Double,
            "string" => TypeTag::String,
            "dateTime.iso8601" | "datetime" => TypeTag::DateTime,
            "base64" | "binary" => TypeTag::Binary,
            "array" => TypeTag::Array,
            "struct" => TypeTag::Struct,
            "nil" => TypeTag::Nil,
            "scalar" => TypeTag::Scalar,
            "any" | "mixed" => TypeTag::Any,
            other => {
                return Err(AjaxrpcError::InvalidSignature(format!(
                    "unknown type '{}'",
                    other
                )))
            }
        };
        Ok(tag)
    }
}

/// One callable form of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub returns: TypeTag,
    pub params: Vec<TypeTag>,
}

impl Signature {
    pub fn new(returns: TypeTag, params: impl IntoIterator<Item = TypeTag>) -> Self {
        Self {
            returns,
            params: params.into_iter().collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` when the arity matches and every argument is accepted
    /// by the parameter tag at the same position.
    pub fn matches(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(tag, value)| tag.accepts(value))
    }

    /// Introspection form: the return tag followed by the parameter tags.
    pub fn to_names(&self) -> Vec<&'static str> {
        std::iter::once(self.returns)
            .chain(self.params.iter().copied())
            .map(TypeTag::name)
            .collect()
    }

    /// Inverse of [`to_names`](Self::to_names).
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let (returns, params) = names
            .split_first()
            .ok_or_else(|| AjaxrpcError::InvalidSignature("empty signature".into()))?;
        Ok(Self {
            returns: returns.as_ref().parse()?,
            params: params
                .iter()
                .map(|name| name.as_ref().parse())
                .collect::<Result<_>>()?,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.returns)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

impl FromStr for Signature {
    type Err = AjaxrpcError;

    /// Parses `returns(param, ...)`, e.g. `int(array)` or `nil()`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let open = s
            .find('(')
            .ok_or_else(|| AjaxrpcError::InvalidSignature(format!("missing '(' in '{}'", s)))?;
        let inner = s[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| AjaxrpcError::InvalidSignature(format!("missing ')' in '{}'", s)))?;

        let returns = s[..open].parse()?;
        let params = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::parse).collect::<Result<_>>()?
        };

        Ok(Self { returns, params })
    }
}

/// Wire-visible description of a registered method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub help: String,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, signatures: Vec<Signature>) -> Self {
        Self {
            name: name.into(),
            signatures,
            help: String::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// Validates a user method name.
///
/// # Errors
///
/// Returns `AjaxrpcError::InvalidMethodName` if the name is empty or contains
/// [`METHOD_SEPARATOR`].
pub fn validate_method_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AjaxrpcError::InvalidMethodName(
            "method name must not be empty".into(),
        ));
    }
    if name.contains(METHOD_SEPARATOR) {
        return Err(AjaxrpcError::InvalidMethodName(format!(
            "'{}' contains the reserved separator '{}'",
            name, METHOD_SEPARATOR
        )));
    }
    Ok(())
}
