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

//! Rule signatures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared shape of a registered rule
///
/// The context and entity parameters every rule takes are not counted in
/// `arity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSignature {
    /// Rule name as used in expressions
    pub name: String,
    /// Number of fixed extra parameters
    pub arity: usize,
    /// Whether the rule accepts any number of extra arguments
    pub variadic: bool,
}

impl RuleSignature {
    /// Signature with exactly `arity` extra parameters
    pub fn fixed(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            variadic: false,
        }
    }

    /// Signature accepting any number of extra arguments
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity: 0,
            variadic: true,
        }
    }

    /// Check if a call with `count` extra arguments is acceptable
    pub fn accepts(&self, count: usize) -> bool {
        self.variadic || count == self.arity
    }
}

impl fmt::Display for RuleSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.variadic {
            f.write_str("...")?;
        } else {
            for i in 0..self.arity {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str("_")?;
            }
        }
        f.write_str(")")
    }
}
