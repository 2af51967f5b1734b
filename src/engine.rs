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

//! Engine - the main entry point for applying field rules
//!
//! [`Engine::apply`] walks a request struct depth-first, evaluates every
//! field's rule tag and collects the errors. The free functions at the bottom
//! of this module operate on a process-wide default engine.

use crate::ast::ExpressionNode;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::evaluator::{AccessorCache, Evaluator};
use crate::model::{Context, Record, Value};
use crate::parser::{LexError, ParseError, ParseResult, parse_expression};
use crate::registry::{IntoRule, RegistryError, RuleRegistry};
use dashmap::DashMap;
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

/// Parsed expressions keyed by tag text
///
/// Bounded; when full the cache is cleared before the next insert. Parse
/// failures are never cached.
#[derive(Debug)]
pub struct ExpressionCache {
    entries: DashMap<String, Arc<ExpressionNode>>,
    max_size: usize,
}

impl ExpressionCache {
    /// Create a cache holding at most `max_size` expressions
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_size,
        }
    }

    /// Return the cached AST for `text`, parsing it on a miss
    pub fn get_or_parse(&self, text: &str) -> ParseResult<Arc<ExpressionNode>> {
        if let Some(ast) = self.entries.get(text) {
            return Ok(Arc::clone(ast.value()));
        }

        let ast = Arc::new(parse_expression(text)?);
        if self.max_size == 0 {
            return Ok(ast);
        }
        if self.entries.len() >= self.max_size {
            debug!("expression cache full ({} entries), clearing", self.max_size);
            self.entries.clear();
        }
        self.entries.insert(text.to_string(), Arc::clone(&ast));
        Ok(ast)
    }

    /// Number of cached expressions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached expressions
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// One error from [`Engine::apply_detailed`], with where it came from
#[derive(Debug)]
pub struct FieldViolation {
    /// Dotted field names from the root, e.g. `Body.Item.Owner`
    pub field_path: String,
    /// The field's rule tag
    pub expression: &'static str,
    /// What went wrong
    pub error: Error,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.error)
    }
}

/// Rule engine: registry, caches and configuration
///
/// `Send + Sync`; share one engine across request threads.
pub struct Engine {
    registry: Arc<RuleRegistry>,
    accessors: Arc<AccessorCache>,
    expressions: ExpressionCache,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with an empty registry and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with an empty registry
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_parts(
            Arc::new(RuleRegistry::new()),
            Arc::new(AccessorCache::new()),
            config,
        )
    }

    /// Create an engine sharing an existing registry and accessor cache
    pub fn with_parts(
        registry: Arc<RuleRegistry>,
        accessors: Arc<AccessorCache>,
        config: EngineConfig,
    ) -> Self {
        for warning in config.validate() {
            warn!("engine config: {warning}");
        }
        Self {
            registry,
            accessors,
            expressions: ExpressionCache::new(config.max_expression_cache_size),
            config,
        }
    }

    /// The rule registry
    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// The accessor cache
    pub fn accessor_cache(&self) -> &Arc<AccessorCache> {
        &self.accessors
    }

    /// The expression cache
    pub fn expression_cache(&self) -> &ExpressionCache {
        &self.expressions
    }

    /// Current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a rule; panics on an invalid or duplicate name
    #[track_caller]
    pub fn register<F, Args>(&self, name: &str, rule: F)
    where
        F: IntoRule<Args>,
    {
        self.registry.register(name, rule);
    }

    /// Register a rule
    pub fn try_register<F, Args>(&self, name: &str, rule: F) -> Result<(), RegistryError>
    where
        F: IntoRule<Args>,
    {
        self.registry.try_register(name, rule)
    }

    /// Parse `text`, going through the expression cache when enabled
    pub fn compile(&self, text: &str) -> ParseResult<Arc<ExpressionNode>> {
        if text.len() > self.config.max_expression_length {
            return Err(ParseError::Lex(LexError::InputTooLong {
                length: text.len(),
                max: self.config.max_expression_length,
            }));
        }
        if self.config.enable_expression_cache {
            self.expressions.get_or_parse(text)
        } else {
            parse_expression(text).map(Arc::new)
        }
    }

    fn evaluator<'a>(&'a self, ctx: &'a Context) -> Evaluator<'a> {
        let evaluator = Evaluator::new(&self.registry, ctx);
        if self.config.enable_accessor_cache {
            evaluator.with_cache(&self.accessors)
        } else {
            evaluator
        }
    }

    /// Evaluate `text` with no request struct and a null entity
    ///
    /// Field references fail to resolve; literals and context variables work.
    pub fn evaluate_expression(&self, ctx: &Context, text: &str) -> Vec<Error> {
        match self.compile(text) {
            Ok(ast) => self.evaluator(ctx).evaluate(&ast).into_errors(),
            Err(err) => vec![err.into()],
        }
    }

    /// Evaluate `text` as the rule of one field
    pub fn evaluate_field(
        &self,
        ctx: &Context,
        text: &str,
        root: &dyn Record,
        parent: &dyn Record,
        entity: Value<'_>,
    ) -> Vec<Error> {
        let ast = match self.compile(text) {
            Ok(ast) => ast,
            Err(err) => return vec![err.into()],
        };
        self.evaluator(ctx)
            .with_root(root)
            .with_parent(parent)
            .with_entity(entity)
            .evaluate(&ast)
            .into_errors()
    }

    /// Evaluate every rule tag reachable from `root`
    ///
    /// Fields are visited depth-first in declaration order. Errors from all
    /// fields are returned in visitation order; a system error in one field
    /// does not stop the others.
    pub fn apply(&self, ctx: &Context, root: &dyn Record) -> Vec<Error> {
        self.apply_detailed(ctx, root)
            .into_iter()
            .map(|violation| violation.error)
            .collect()
    }

    /// Like [`apply`](Self::apply), recording which field each error belongs to
    pub fn apply_detailed(&self, ctx: &Context, root: &dyn Record) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        self.walk(ctx, root, root, "", &mut violations);
        debug!(
            "applied rules to {}: {} violation(s)",
            root.schema().name,
            violations.len()
        );
        violations
    }

    fn walk(
        &self,
        ctx: &Context,
        root: &dyn Record,
        parent: &dyn Record,
        prefix: &str,
        out: &mut Vec<FieldViolation>,
    ) {
        for (index, def) in parent.schema().fields.iter().enumerate() {
            let value = parent.field(index);
            let path = if prefix.is_empty() {
                def.name.to_string()
            } else {
                format!("{prefix}.{}", def.name)
            };

            if let Some(expression) = def.rule {
                trace!("evaluating {path}: {expression}");
                for error in self.evaluate_field(ctx, expression, root, parent, value.reborrow()) {
                    if error.is_system() {
                        warn!("rule on {path} could not be evaluated: {error}");
                    }
                    out.push(FieldViolation {
                        field_path: path.clone(),
                        expression,
                        error,
                    });
                }
            }

            if let Value::Record(child) = value {
                self.walk(ctx, root, child, &path, out);
            }
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("accessors", &self.accessors.stats())
            .field("expressions", &self.expressions.len())
            .field("config", &self.config)
            .finish()
    }
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

/// The process-wide engine used by the free functions
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}

/// Register a rule on the default engine; panics on an invalid or duplicate name
#[track_caller]
pub fn register<F, Args>(name: &str, rule: F)
where
    F: IntoRule<Args>,
{
    DEFAULT_ENGINE.register(name, rule);
}

/// Register a rule on the default engine
pub fn try_register<F, Args>(name: &str, rule: F) -> Result<(), RegistryError>
where
    F: IntoRule<Args>,
{
    DEFAULT_ENGINE.try_register(name, rule)
}

/// Evaluate every rule tag reachable from `root` on the default engine
pub fn apply(ctx: &Context, root: &dyn Record) -> Vec<Error> {
    DEFAULT_ENGINE.apply(ctx, root)
}

/// Evaluate a standalone expression on the default engine
pub fn evaluate_expression(ctx: &Context, text: &str) -> Vec<Error> {
    DEFAULT_ENGINE.evaluate_expression(ctx, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SystemError;
    use crate::record;
    use pretty_assertions::assert_eq;

    fn non_empty(_: &Context, entity: &Value<'_>) -> anyhow::Result<bool> {
        Ok(!entity.is_empty())
    }

    record! {
        #[derive(Default)]
        struct Address {
            #[rule = "non_empty()"]
            city: String => "City",
        }
    }

    record! {
        #[derive(Default)]
        struct Body {
            #[rule = "non_empty()"]
            name: String => "Name",
            address: Option<Address> => "Address",
            #[rule = "non_empty() and $.Body.Missing"]
            broken: String => "Broken",
        }
    }

    record! {
        #[derive(Default)]
        struct Request {
            body: Body => "Body",
        }
    }

    fn engine(config: EngineConfig) -> Engine {
        let engine = Engine::with_config(config);
        engine.register("non_empty", non_empty);
        engine
    }

    #[test]
    fn test_apply_detailed_paths_in_order() {
        let engine = engine(EngineConfig::default());
        let request = Request {
            body: Body {
                name: String::new(),
                address: Some(Address::default()),
                broken: "x".to_string(),
            },
        };
        let violations = engine.apply_detailed(&Context::background(), &request);
        let paths: Vec<&str> = violations.iter().map(|v| v.field_path.as_str()).collect();
        assert_eq!(paths, vec!["Body.Name", "Body.Address.City", "Body.Broken"]);
        assert!(violations[0].error.is_validation());
        assert_eq!(violations[1].expression, "non_empty()");
        assert!(matches!(
            violations[2].error,
            Error::System(SystemError::Parse(_))
        ));
    }

    #[test]
    fn test_nil_nested_struct_is_skipped() {
        let engine = engine(EngineConfig::default());
        let request = Request {
            body: Body {
                name: "n".to_string(),
                address: None,
                broken: String::new(),
            },
        };
        // only the unparsable tag reports
        let errors = engine.apply(&Context::background(), &request);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_system());
    }

    #[test]
    fn test_expression_cache() {
        let engine = engine(EngineConfig::default().with_expression_cache_size(2));
        let ctx = Context::background();
        assert!(engine.evaluate_expression(&ctx, "true").is_empty());
        assert!(engine.evaluate_expression(&ctx, "true").is_empty());
        assert_eq!(engine.expression_cache().len(), 1);

        engine.evaluate_expression(&ctx, "false");
        assert_eq!(engine.expression_cache().len(), 2);
        engine.evaluate_expression(&ctx, "true or false");
        assert_eq!(engine.expression_cache().len(), 1);

        // parse failures are not cached
        assert_eq!(engine.evaluate_expression(&ctx, "(").len(), 1);
        assert_eq!(engine.expression_cache().len(), 1);
    }

    #[test]
    fn test_uncached_engine() {
        let engine = engine(EngineConfig::uncached());
        let request = Request::default();
        engine.apply(&Context::background(), &request);
        assert!(engine.expression_cache().is_empty());
        assert!(engine.accessor_cache().is_empty());
    }

    #[test]
    fn test_expression_length_limit() {
        let engine = engine(EngineConfig::default().with_max_expression_length(8));
        let errors = engine.evaluate_expression(&Context::background(), "non_empty()");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "tokenize error: lexical error: expression is 11 bytes long, maximum is 8"
        );
    }
}
