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

//! Static type descriptors for request structs
//!
//! Field paths in rule tags are resolved against a [`Schema`] rather than by
//! runtime introspection. Every struct taking part in validation implements
//! [`Record`], usually through the [`record!`](crate::record) macro.

use super::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Static shape of a field type
#[derive(Clone, Copy)]
pub enum Shape {
    /// Terminal value: strings, numbers, booleans
    Scalar,
    /// Raw byte payload; paths may end on it but never traverse into it
    Blob,
    /// Nested struct that paths may traverse into
    Record(&'static Schema),
}

impl Shape {
    /// Short description used in resolution errors
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Blob => "bytes",
            Shape::Record(_) => "struct",
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => f.write_str("Scalar"),
            Shape::Blob => f.write_str("Blob"),
            Shape::Record(schema) => write!(f, "Record({})", schema.name),
        }
    }
}

/// One field of a [`Schema`]
#[derive(Clone, Copy)]
pub struct FieldDef {
    /// Name used in `$.A.B` paths (case-sensitive)
    pub name: &'static str,
    /// Rule expression attached to this field, if any
    pub rule: Option<&'static str>,
    /// Static shape of the field's type; a function so recursive types work
    pub shape: fn() -> Shape,
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}

/// Type descriptor: a struct name and its fields in declaration order
pub struct Schema {
    /// Struct name
    pub name: &'static str,
    /// Fields in declaration order; indices match [`Record::field`]
    pub fields: &'static [FieldDef],
}

impl Schema {
    /// Position of the field named `name`
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field definition at `index`
    pub fn field(&self, index: usize) -> Option<&'static FieldDef> {
        self.fields.get(index)
    }

    /// Identity of this schema, stable for the process lifetime
    #[inline]
    pub fn id(&'static self) -> usize {
        self as *const Schema as usize
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// A struct whose fields can be addressed by rule tags
pub trait Record: Any + Send + Sync {
    /// Schema of the implementing type
    fn describe() -> &'static Schema
    where
        Self: Sized;

    /// Schema of this instance
    fn schema(&self) -> &'static Schema;

    /// Value of the field at `index`; out-of-range indices yield `Value::Null`
    fn field(&self, index: usize) -> Value<'_>;

    /// Upcast for downcasting in rule implementations
    fn as_any(&self) -> &dyn Any;
}

/// A type that can appear as a field of a [`Record`]
pub trait AsField {
    /// Static shape of this type
    fn shape() -> Shape
    where
        Self: Sized;

    /// Borrow as a [`Value`]
    fn as_field(&self) -> Value<'_>;
}

impl AsField for String {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn as_field(&self) -> Value<'_> {
        Value::from(self.as_str())
    }
}

impl AsField for &'static str {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn as_field(&self) -> Value<'_> {
        Value::from(*self)
    }
}

impl AsField for bool {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn as_field(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

macro_rules! impl_as_field_int {
    ($($t:ty),*) => {
        $(
            impl AsField for $t {
                fn shape() -> Shape {
                    Shape::Scalar
                }

                fn as_field(&self) -> Value<'_> {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

impl_as_field_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_as_field_wide {
    ($($t:ty),*) => {
        $(
            impl AsField for $t {
                fn shape() -> Shape {
                    Shape::Scalar
                }

                fn as_field(&self) -> Value<'_> {
                    i64::try_from(*self).map_or(Value::Number(*self as f64), Value::Int)
                }
            }
        )*
    };
}

impl_as_field_wide!(u64, usize, isize);

impl AsField for f32 {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn as_field(&self) -> Value<'_> {
        Value::Number(f64::from(*self))
    }
}

impl AsField for f64 {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn as_field(&self) -> Value<'_> {
        Value::Number(*self)
    }
}

impl AsField for Vec<u8> {
    fn shape() -> Shape {
        Shape::Blob
    }

    fn as_field(&self) -> Value<'_> {
        Value::Bytes(self.as_slice().into())
    }
}

impl<T: AsField> AsField for Option<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn as_field(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.as_field(),
            None => Value::Null,
        }
    }
}

impl<T: AsField> AsField for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn as_field(&self) -> Value<'_> {
        (**self).as_field()
    }
}

impl<T: AsField> AsField for Arc<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn as_field(&self) -> Value<'_> {
        (**self).as_field()
    }
}

impl AsField for Value<'static> {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn as_field(&self) -> Value<'_> {
        self.reborrow()
    }
}
