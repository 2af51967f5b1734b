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

//! Argument resolution

use super::cache::{Accessor, AccessorCache};
use super::error::ResolveError;
use crate::ast::{ArgumentToken, FieldPath};
use crate::model::{Context, Record, Value, context_vars};
use std::borrow::Cow;

/// Turns argument tokens into values for one evaluation
///
/// Absolute paths start at `root`, relative paths at `parent`.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    ctx: &'a Context,
    root: Option<&'a dyn Record>,
    parent: Option<&'a dyn Record>,
    cache: Option<&'a AccessorCache>,
}

impl<'a> Resolver<'a> {
    /// Resolver with no structs to resolve paths against
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            root: None,
            parent: None,
            cache: None,
        }
    }

    /// Set the request root for `$.` paths
    pub fn with_root(mut self, root: &'a dyn Record) -> Self {
        self.root = Some(root);
        self
    }

    /// Set the enclosing struct for `.` paths
    pub fn with_parent(mut self, parent: &'a dyn Record) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Memoise compiled accessors in `cache`
    pub fn with_cache(mut self, cache: &'a AccessorCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The context passed to rules
    pub fn context(&self) -> &'a Context {
        self.ctx
    }

    /// Resolve one argument token
    pub fn resolve<'v>(&'v self, token: &'v ArgumentToken) -> Result<Value<'v>, ResolveError> {
        match token {
            ArgumentToken::String(s) => Ok(Value::Str(Cow::Borrowed(s))),
            ArgumentToken::Number(n) => Ok(Value::Number(*n)),
            ArgumentToken::Bool(b) => Ok(Value::Bool(*b)),
            ArgumentToken::Null => Ok(Value::Null),
            ArgumentToken::ContextVar(name) => self.resolve_var(name),
            ArgumentToken::FieldRef(path) => self.resolve_path(path),
        }
    }

    fn resolve_var(&self, name: &str) -> Result<Value<'a>, ResolveError> {
        let value = context_vars(self.ctx)
            .and_then(|vars| vars.get(name))
            .ok_or_else(|| ResolveError::MissingContextVar {
                name: name.to_string(),
            })?;
        if value.is_null() {
            return Err(ResolveError::NullContextVar {
                name: name.to_string(),
            });
        }
        Ok(value.reborrow())
    }

    fn resolve_path(&self, path: &FieldPath) -> Result<Value<'a>, ResolveError> {
        let (base, label) = if path.absolute {
            (self.root, "root")
        } else {
            (self.parent, "parent")
        };
        let base = base.ok_or_else(|| ResolveError::MissingBase {
            path: path.to_string(),
            base: label,
        })?;

        match self.cache {
            Some(cache) => cache.get_or_compile(base.schema(), path)?.resolve(base),
            None => Accessor::compile(base.schema(), path)?.resolve(base),
        }
    }
}
