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

//! Errors resolving call arguments

use thiserror::Error;

/// Failure turning an argument token into a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A path segment names no field of the current struct
    #[error("field '{field}' does not exist on {record} (resolving '{path}')")]
    UnknownField {
        /// Full path as written
        path: String,
        /// Offending segment
        field: String,
        /// Struct being searched
        record: &'static str,
    },

    /// An intermediate field is empty
    #[error("nil pointer at '{field}' while resolving '{path}'")]
    NilPointer {
        /// Full path as written
        path: String,
        /// The empty field
        field: String,
    },

    /// A path continues past a raw bytes field
    #[error("cannot traverse into raw bytes field '{field}' (resolving '{path}')")]
    BlobTraversal {
        /// Full path as written
        path: String,
        /// The bytes field
        field: String,
    },

    /// A path continues past a scalar field
    #[error("cannot traverse into {kind} field '{field}' (resolving '{path}')")]
    ScalarTraversal {
        /// Full path as written
        path: String,
        /// The scalar field
        field: String,
        /// What the field actually holds
        kind: &'static str,
    },

    /// No struct to resolve a path against
    #[error("no {base} struct to resolve '{path}' against")]
    MissingBase {
        /// Full path as written
        path: String,
        /// `root` or `parent`
        base: &'static str,
    },

    /// `$name` with no such variable in the context
    #[error("context variable '${name}' is not set")]
    MissingContextVar {
        /// Variable name without `$`
        name: String,
    },

    /// `$name` bound to null
    #[error("context variable '${name}' is null")]
    NullContextVar {
        /// Variable name without `$`
        name: String,
    },
}
