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

//! Typed call arguments

use smallvec::SmallVec;
use std::fmt;

/// Dotted path to a field, resolved from the request root or the enclosing struct
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// `true` for `$.a.b` (root), `false` for `.a.b` (enclosing struct)
    pub absolute: bool,
    /// Path segments in order
    pub segments: SmallVec<[String; 4]>,
}

impl FieldPath {
    /// Create a field path
    pub fn new(absolute: bool, segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            absolute,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Segments joined with `.`, without the leading `$.` or `.`
    pub fn joined(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.absolute { "$." } else { "." };
        write!(f, "{prefix}{}", self.joined())
    }
}

/// A classified call argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentToken {
    /// Field reference (`$.a.b` or `.a.b`)
    FieldRef(FieldPath),
    /// Context variable (`$name`), stored without the `$`
    ContextVar(String),
    /// Quoted string literal, stored without quotes
    String(String),
    /// Numeric literal
    Number(f64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

impl ArgumentToken {
    /// Check whether the token is a literal that needs no resolution
    pub fn is_literal(&self) -> bool {
        !matches!(self, ArgumentToken::FieldRef(_) | ArgumentToken::ContextVar(_))
    }
}

impl fmt::Display for ArgumentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentToken::FieldRef(path) => write!(f, "{path}"),
            ArgumentToken::ContextVar(name) => write!(f, "${name}"),
            ArgumentToken::String(s) if s.contains('\'') => write!(f, "\"{s}\""),
            ArgumentToken::String(s) => write!(f, "'{s}'"),
            ArgumentToken::Number(n) => write!(f, "{n}"),
            ArgumentToken::Bool(b) => write!(f, "{b}"),
            ArgumentToken::Null => f.write_str("null"),
        }
    }
}
