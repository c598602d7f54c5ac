//! Primitive types and the text coercion table.
//!
//! [`PrimitiveType::coerce`] is the only place text becomes a typed [`Value`], and
//! [`Value::to_text_bytes`] the only place a typed value becomes text again. Both are
//! pure and exhaustive over the closed set of primitive types.

use crate::error::CoerceError;
use apache_avro::types::Value as AvroValue;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// The scalar types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Boolean,
    Bytes,
    Int,
    Long,
    Float,
    Double,
    Null,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        Self::String,
        Self::Boolean,
        Self::Bytes,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Null,
    ];

    /// Schema-language name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Bytes => "bytes",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Null => "null",
        }
    }

    /// Coerce one text cell into a value of this type.
    ///
    /// Numeric and boolean text is trimmed first; `string` and `bytes` keep the text
    /// exactly as given. Integers never saturate or wrap: out-of-range text is an error.
    ///
    /// # Errors
    /// Returns a [`CoerceError`] when `text` is not a valid literal for this type.
    pub fn coerce(self, text: &str) -> Result<Value, CoerceError> {
        match self {
            Self::String => Ok(Value::String(text.to_owned())),
            Self::Boolean => parse_bool(text)
                .map(Value::Boolean)
                .ok_or_else(|| CoerceError::new(self, text, "not a boolean literal")),
            Self::Bytes => Ok(Value::Bytes(text.as_bytes().to_vec())),
            Self::Int => text
                .trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|e| CoerceError::new(self, text, e)),
            Self::Long => text
                .trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|e| CoerceError::new(self, text, e)),
            Self::Float => {
                let v = text
                    .trim()
                    .parse::<f32>()
                    .map_err(|e| CoerceError::new(self, text, e))?;
                reject_overflow(self, text, v.is_infinite())?;
                Ok(Value::Float(v))
            }
            Self::Double => {
                let v = text
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| CoerceError::new(self, text, e))?;
                reject_overflow(self, text, v.is_infinite())?;
                Ok(Value::Double(v))
            }
            Self::Null => Ok(Value::Null),
        }
    }

    /// Whether a value written as `self` can be read back as `reader`.
    #[must_use]
    pub fn promotes_to(self, reader: Self) -> bool {
        use PrimitiveType::*;
        self == reader
            || matches!(
                (self, reader),
                (Int, Long | Float | Double)
                    | (Long, Float | Double)
                    | (Float, Double)
                    | (String, Bytes)
                    | (Bytes, String)
            )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown primitive type {s:?}"))
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

// A finite literal such as `1e400` parses to infinity; only spelled-out infinities pass.
fn reject_overflow(ty: PrimitiveType, text: &str, infinite: bool) -> Result<(), CoerceError> {
    let literal = text.trim().trim_start_matches(['+', '-']).to_ascii_lowercase();
    if infinite && literal != "inf" && literal != "infinity" {
        return Err(CoerceError::new(ty, text, "out of range"));
    }
    Ok(())
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Bytes(Vec<u8>),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl Value {
    /// Text cell for this value. `bytes` are emitted raw.
    #[must_use]
    pub fn to_text_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Null => Cow::Borrowed(b""),
            Self::Boolean(true) => Cow::Borrowed(b"true"),
            Self::Boolean(false) => Cow::Borrowed(b"false"),
            Self::Bytes(b) => Cow::Borrowed(b),
            Self::Int(i) => Cow::Owned(i.to_string().into_bytes()),
            Self::Long(i) => Cow::Owned(i.to_string().into_bytes()),
            Self::Float(f) => Cow::Owned(f.to_string().into_bytes()),
            Self::Double(f) => Cow::Owned(f.to_string().into_bytes()),
            Self::String(s) => Cow::Borrowed(s.as_bytes()),
        }
    }

    /// Lossy text form, for display.
    #[must_use]
    pub fn to_text(&self) -> Cow<'_, str> {
        match self.to_text_bytes() {
            Cow::Borrowed(b) => String::from_utf8_lossy(b),
            Cow::Owned(b) => Cow::Owned(String::from_utf8_lossy(&b).into_owned()),
        }
    }

    /// Convert a decoded container value. Single-branch unions are unwrapped;
    /// anything outside the primitive set yields `None`.
    #[must_use]
    pub fn from_avro(value: AvroValue) -> Option<Self> {
        Some(match value {
            AvroValue::Null => Self::Null,
            AvroValue::Boolean(b) => Self::Boolean(b),
            AvroValue::Bytes(b) => Self::Bytes(b),
            AvroValue::Int(i) => Self::Int(i),
            AvroValue::Long(i) => Self::Long(i),
            AvroValue::Float(f) => Self::Float(f),
            AvroValue::Double(f) => Self::Double(f),
            AvroValue::String(s) => Self::String(s),
            AvroValue::Union(_, inner) => return Self::from_avro(*inner),
            _ => return None,
        })
    }
}

impl From<Value> for AvroValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AvroValue::Null,
            Value::Boolean(b) => AvroValue::Boolean(b),
            Value::Bytes(b) => AvroValue::Bytes(b),
            Value::Int(i) => AvroValue::Int(i),
            Value::Long(i) => AvroValue::Long(i),
            Value::Float(f) => AvroValue::Float(f),
            Value::Double(f) => AvroValue::Double(f),
            Value::String(s) => AvroValue::String(s),
        }
    }
}
