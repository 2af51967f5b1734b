// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Values flowing through rule evaluation
//!
//! A [`Value`] is either borrowed from the request being validated (field
//! values, nested records) or owned (literals, context variables).

use super::record::Record;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// A field value, literal or context variable
#[derive(Clone)]
pub enum Value<'a> {
    /// Absent value: `null`, or an empty pointer/`Option`
    Null,

    /// Boolean value
    Bool(bool),

    /// Integer value (64-bit signed)
    Int(i64),

    /// Floating point value; numeric literals always take this form
    Number(f64),

    /// String value
    Str(Cow<'a, str>),

    /// Raw, undecoded bytes
    Bytes(Cow<'a, [u8]>),

    /// Nested struct
    Record(&'a dyn Record),
}

/// Failure converting a [`Value`] into a concrete Rust type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert {actual} to {expected}")]
pub struct ConversionError {
    /// Target type
    pub expected: &'static str,
    /// Type name of the value that was supplied
    pub actual: &'static str,
}

impl<'a> Value<'a> {
    /// Create a string value
    pub fn string(s: impl Into<Cow<'a, str>>) -> Self {
        Self::Str(s.into())
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Record(r) => r.schema().name,
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get any numeric payload as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get an integral payload as `i64`; fractional numbers yield `None`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            Self::Number(n)
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 =>
            {
                Some(*n as i64)
            }
            _ => None,
        }
    }

    /// Get the raw bytes payload
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the nested record
    pub fn as_record(&self) -> Option<&'a dyn Record> {
        match self {
            Self::Record(r) => Some(*r),
            _ => None,
        }
    }

    /// Downcast a nested record to its concrete type
    pub fn downcast_record<T: Record>(&self) -> Option<&'a T> {
        self.as_record()?.as_any().downcast_ref::<T>()
    }

    /// Length of a string (in chars) or byte payload
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }

    /// `true` for null, empty strings and empty byte payloads
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }

    /// Borrow this value without cloning string or byte payloads
    pub fn reborrow(&self) -> Value<'_> {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Number(n) => Value::Number(*n),
            Self::Str(s) => Value::Str(Cow::Borrowed(s.as_ref())),
            Self::Bytes(b) => Value::Bytes(Cow::Borrowed(b.as_ref())),
            Self::Record(r) => Value::Record(*r),
        }
    }

    /// Detach from the borrowed request; records cannot be detached
    pub fn to_static(&self) -> Option<Value<'static>> {
        Some(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Number(n) => Value::Number(*n),
            Self::Str(s) => Value::Str(Cow::Owned(s.to_string())),
            Self::Bytes(b) => Value::Bytes(Cow::Owned(b.to_vec())),
            Self::Record(_) => return None,
        })
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Int(a), Self::Number(b)) | (Self::Number(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => std::ptr::addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Record(r) => write!(f, "Record({})", r.schema().name),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Record(r) => write!(f, "<{}>", r.schema().name),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<Vec<u8>> for Value<'_> {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Cow::Owned(value))
    }
}

impl<'a, T> From<Option<T>> for Value<'a>
where
    T: Into<Value<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<&serde_json::Value> for Value<'static> {
    type Error = ConversionError;

    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => Ok(Self::Number(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Ok(Self::Str(Cow::Owned(s.clone()))),
            serde_json::Value::Array(_) => Err(ConversionError {
                expected: "scalar",
                actual: "array",
            }),
            serde_json::Value::Object(_) => Err(ConversionError {
                expected: "scalar",
                actual: "object",
            }),
        }
    }
}

/// Conversion from a resolved [`Value`] into a typed rule parameter
pub trait FromValue: Sized {
    /// Name used in conversion errors
    const TYPE_NAME: &'static str;

    /// Convert, failing when the value has the wrong shape
    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError>;
}

fn mismatch<T: FromValue>(value: &Value<'_>) -> ConversionError {
    ConversionError {
        expected: T::TYPE_NAME,
        actual: value.type_name(),
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value.as_bool().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value.as_f64().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value.as_i64().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for usize {
    const TYPE_NAME: &'static str = "non-negative int";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch::<Self>(value))
    }
}

impl FromValue for Value<'static> {
    const TYPE_NAME: &'static str = "detached value";

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        value.to_static().ok_or_else(|| mismatch::<Self>(value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: &Value<'_>) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_numeric_equality_across_variants() {
        assert_eq!(Value::Int(3), Value::Number(3.0));
        assert_ne!(Value::Int(3), Value::Number(3.5));
        assert_ne!(Value::from("3"), Value::Int(3));
    }

    #[rstest]
    #[case(Value::Number(4.0), Some(4))]
    #[case(Value::Number(4.5), None)]
    #[case(Value::Number(9_223_372_036_854_775_808.0), None)]
    #[case(Value::Number(-9_223_372_036_854_775_808.0), Some(i64::MIN))]
    #[case(Value::Int(-2), Some(-2))]
    #[case(Value::from("4"), None)]
    fn test_as_i64(#[case] value: Value<'static>, #[case] expected: Option<i64>) {
        assert_eq!(value.as_i64(), expected);
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(String::from_value(&Value::from("u1")).unwrap(), "u1");
        assert_eq!(usize::from_value(&Value::Number(2.0)).unwrap(), 2);
        assert_eq!(Option::<String>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(
            bool::from_value(&Value::from("yes")).unwrap_err(),
            ConversionError {
                expected: "bool",
                actual: "string"
            }
        );
        assert!(usize::from_value(&Value::Int(-1)).is_err());
        assert!(usize::from_value(&Value::Number(9_223_372_036_854_775_808.0)).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"id": 7, "name": "x", "ratio": 0.5, "tags": []});
        assert_eq!(Value::try_from(&json["id"]).unwrap(), Value::Int(7));
        assert_eq!(Value::try_from(&json["name"]).unwrap(), Value::from("x"));
        assert_eq!(Value::try_from(&json["ratio"]).unwrap(), Value::Number(0.5));
        assert!(Value::try_from(&json["tags"]).is_err());
    }

    #[test]
    fn test_empty_and_len() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert_eq!(Value::from("héllo").len(), Some(5));
        assert_eq!(Value::Bool(true).len(), None);
    }
}
