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

//! Errors returned from rule evaluation
//!
//! Evaluation yields two kinds of errors. A [`ValidationError`] means a rule
//! ran and returned `false`; callers typically map it to a client error. A
//! [`SystemError`] means the expression could not be evaluated at all:
//! malformed tag text, a bad field path, a dispatch failure, or an error
//! returned by the rule itself.

use crate::evaluator::ResolveError;
use crate::parser::ParseError;
use crate::registry::DispatchError;
use thiserror::Error;

/// A rule returned `false`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: rule '{rule}' returned false")]
pub struct ValidationError {
    /// Name of the failing rule
    pub rule: String,
}

impl ValidationError {
    /// Create a validation error for `rule`
    pub fn new(rule: impl Into<String>) -> Self {
        Self { rule: rule.into() }
    }
}

/// An expression could not be evaluated
#[derive(Error, Debug)]
pub enum SystemError {
    /// The tag text failed to tokenize or parse
    #[error("{phase} error: {0}", phase = .0.phase())]
    Parse(#[from] ParseError),

    /// A field reference or context variable could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The call could not be routed to a rule
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Error returned by the rule, passed through untouched
    #[error(transparent)]
    Rule(anyhow::Error),
}

impl SystemError {
    /// The rule's own error, if this came from a rule
    pub fn rule_error(&self) -> Option<&anyhow::Error> {
        match self {
            SystemError::Rule(err) => Some(err),
            _ => None,
        }
    }
}

/// Any error produced by evaluating a field's expression
#[derive(Error, Debug)]
pub enum Error {
    /// Business rule failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Infrastructure or programming failure
    #[error(transparent)]
    System(#[from] SystemError),
}

impl Error {
    /// Whether this is a business rule failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether this is a system failure
    pub fn is_system(&self) -> bool {
        matches!(self, Error::System(_))
    }

    /// The validation error, if any
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            Error::System(_) => None,
        }
    }

    /// The system error, if any
    pub fn as_system(&self) -> Option<&SystemError> {
        match self {
            Error::System(err) => Some(err),
            Error::Validation(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::System(err.into())
    }
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;
