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

//! Rule registry
//!
//! Rules are registered once at startup and looked up by name on every
//! call. The map sits behind a read-write lock so lookups stay safe even if
//! registration races with traffic.

pub mod builtin;
pub mod error;
pub mod function;
pub mod signature;

pub use error::{DispatchError, RegistryError};
pub use function::{CallError, IntoRule, RuleDescriptor, RuleFn, Variadic};
pub use signature::RuleSignature;

use crate::error::SystemError;
use crate::model::{Context, Value};
use crate::parser::lexer::is_identifier;
use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

const RESERVED: [&str; 6] = ["and", "or", "not", "true", "false", "null"];

/// Named rule store
#[derive(Default)]
pub struct RuleRegistry {
    rules: RwLock<FxHashMap<String, Arc<RuleDescriptor>>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, panicking on an invalid or duplicate name
    ///
    /// Registration happens once at startup, where a bad rule set should stop
    /// the process. Use [`try_register`](Self::try_register) to handle the
    /// failure instead.
    #[track_caller]
    pub fn register<F, Args>(&self, name: &str, rule: F)
    where
        F: IntoRule<Args>,
    {
        if let Err(err) = self.try_register(name, rule) {
            panic!("{err}");
        }
    }

    /// Register a rule
    pub fn try_register<F, Args>(&self, name: &str, rule: F) -> Result<(), RegistryError>
    where
        F: IntoRule<Args>,
    {
        validate_name(name)?;

        let mut rules = self.rules.write();
        if rules.contains_key(name) {
            return Err(RegistryError::Duplicate {
                name: name.to_string(),
            });
        }
        let descriptor = RuleDescriptor::new(name, rule);
        debug!("registered rule {}", descriptor.signature());
        rules.insert(name.to_string(), Arc::new(descriptor));
        Ok(())
    }

    /// Look up a rule
    pub fn get(&self, name: &str) -> Option<Arc<RuleDescriptor>> {
        self.rules.read().get(name).cloned()
    }

    /// Check if a rule is registered
    pub fn contains(&self, name: &str) -> bool {
        self.rules.read().contains_key(name)
    }

    /// Signature of a registered rule
    pub fn signature(&self, name: &str) -> Option<RuleSignature> {
        self.rules.read().get(name).map(|r| r.signature().clone())
    }

    /// All registered names, sorted
    pub fn rule_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Whether no rules are registered
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Call rule `name` with `[ctx, entity, ...args]`
    pub fn dispatch(
        &self,
        name: &str,
        ctx: &Context,
        entity: &Value<'_>,
        args: &[Value<'_>],
    ) -> Result<bool, SystemError> {
        let rule = self.get(name).ok_or_else(|| DispatchError::UnknownRule {
            name: name.to_string(),
        })?;
        rule.invoke(ctx, entity, args)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rule_names())
            .finish()
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if !is_identifier(name) {
        "not an identifier"
    } else if RESERVED.iter().any(|kw| name.eq_ignore_ascii_case(kw)) {
        "reserved word"
    } else {
        return Ok(());
    };
    Err(RegistryError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
