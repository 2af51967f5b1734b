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

//! Per-call context: deadline, cancellation and context variables
//!
//! The engine only threads a [`Context`] through to rule implementations; it
//! never checks the deadline or cancellation flag itself.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Reason a context is no longer live
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// [`Context::cancel`] was called
    #[error("context cancelled")]
    Cancelled,
    /// The deadline has passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Named values referenced from expressions as `$name`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextVars {
    values: FxHashMap<String, Value<'static>>,
}

impl ContextVars {
    /// Create an empty variable map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, returning the previous value
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value<'static>>,
    ) -> Option<Value<'static>> {
        self.values.insert(name.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value<'static>>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&Value<'static>> {
        self.values.get(name)
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all variables in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<'static>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for ContextVars
where
    K: Into<String>,
    V: Into<Value<'static>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.insert(name, value);
        }
        vars
    }
}

/// Cancellation- and deadline-bearing context passed to every rule
///
/// Cloning is cheap. Contexts derived from one another share the same
/// cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
    vars: Option<Arc<ContextVars>>,
}

impl Context {
    /// A context with no deadline and no variables
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires at `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Derive a context that expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Deadline, if one was set
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every context sharing its flag
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) was called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the deadline has passed
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Ok` while the context is live
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_cancelled() {
            Err(ContextError::Cancelled)
        } else if self.deadline_exceeded() {
            Err(ContextError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

/// Derive a context carrying `vars` for `$name` references
pub fn with_context_vars(ctx: &Context, vars: impl Into<ContextVars>) -> Context {
    Context {
        vars: Some(Arc::new(vars.into())),
        ..ctx.clone()
    }
}

/// Context variables attached by [`with_context_vars`]
pub fn context_vars(ctx: &Context) -> Option<&ContextVars> {
    ctx.vars.as_deref()
}
