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

//! Declarative rule expressions attached to request fields
//!
//! Fields of a request struct carry boolean expressions such as
//! `owned_by($.Path.UserID) and not system_readonly()`. [`apply`] walks the
//! request, evaluates every expression with short-circuit semantics and
//! returns the resulting errors, separating business rule failures
//! ([`ValidationError`]) from evaluation failures ([`SystemError`]).
//!
//! ```
//! use fieldrule::{Context, Engine, Value, record};
//!
//! record! {
//!     #[derive(Default)]
//!     pub struct PathParams {
//!         pub user_id: String => "UserID",
//!     }
//! }
//!
//! record! {
//!     #[derive(Default)]
//!     pub struct Item {
//!         #[rule = "owned_by($.Path.UserID)"]
//!         pub owner: String => "Owner",
//!     }
//! }
//!
//! record! {
//!     #[derive(Default)]
//!     pub struct Request {
//!         pub path: PathParams => "Path",
//!         pub item: Item => "Item",
//!     }
//! }
//!
//! fn owned_by(_: &Context, owner: &Value<'_>, user: String) -> anyhow::Result<bool> {
//!     Ok(owner.as_str() == Some(user.as_str()))
//! }
//!
//! let engine = Engine::new();
//! engine.register("owned_by", owned_by);
//!
//! let request = Request {
//!     path: PathParams { user_id: "u1".into() },
//!     item: Item { owner: "u1".into() },
//! };
//! assert!(engine.apply(&Context::background(), &request).is_empty());
//! ```

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
mod macros;
pub mod model;
pub mod parser;
pub mod registry;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{
    Engine, ExpressionCache, FieldViolation, apply, default_engine, evaluate_expression,
    register, try_register,
};
pub use error::{Error, SystemError, ValidationError};
pub use evaluator::{AccessorCache, CacheStats, EvaluationResult, Evaluator, ResolveError};
pub use model::{
    AsField, Context, ContextError, ContextVars, ConversionError, FieldDef, FromValue, Record,
    Schema, Shape, Value, context_vars, with_context_vars,
};
pub use parser::{ParseError, parse_expression as parse};
pub use registry::{DispatchError, RegistryError, RuleRegistry, RuleSignature};
