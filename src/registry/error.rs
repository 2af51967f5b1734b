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

//! Registry and dispatch errors

use crate::model::ConversionError;
use thiserror::Error;

/// Failure registering a rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A rule with this name already exists
    #[error("rule '{name}' is already registered")]
    Duplicate {
        /// Rule name
        name: String,
    },

    /// The name cannot be called from an expression
    #[error("invalid rule name '{name}': {reason}")]
    InvalidName {
        /// Rule name
        name: String,
        /// Why the name was rejected
        reason: &'static str,
    },
}

/// Failure routing a call to a registered rule
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// No rule with this name
    #[error("rule '{name}' is not registered")]
    UnknownRule {
        /// Rule name
        name: String,
    },

    /// Wrong number of arguments for a fixed-arity rule
    #[error("rule '{name}' expects {expected} args, got {actual}")]
    ArgumentCount {
        /// Rule name
        name: String,
        /// Declared arity
        expected: usize,
        /// Arguments supplied
        actual: usize,
    },

    /// An argument could not be converted to the parameter type
    #[error("rule '{name}' argument {position}: {source}")]
    ArgumentType {
        /// Rule name
        name: String,
        /// One-based argument position
        position: usize,
        /// Conversion failure
        #[source]
        source: ConversionError,
    },
}
