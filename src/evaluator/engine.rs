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

//! Tree-walking evaluator

use super::cache::AccessorCache;
use super::resolver::Resolver;
use super::result::EvaluationResult;
use crate::ast::{BinaryOperator, ExpressionNode, FunctionCallData, UnaryOperator};
use crate::error::{Error, ValidationError};
use crate::model::{Context, Record, Value};
use crate::parser::parse_expression;
use crate::registry::RuleRegistry;
use log::trace;
use smallvec::SmallVec;

/// Evaluates expressions for one tagged field
///
/// Operators short-circuit: the right operand of `and` is skipped once the
/// left fails, the right operand of `or` once the left passes, and any
/// system error stops evaluation immediately.
pub struct Evaluator<'a> {
    registry: &'a RuleRegistry,
    resolver: Resolver<'a>,
    entity: Value<'a>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator with a null entity and no structs for field paths
    pub fn new(registry: &'a RuleRegistry, ctx: &'a Context) -> Self {
        Self {
            registry,
            resolver: Resolver::new(ctx),
            entity: Value::Null,
        }
    }

    /// Set the request root for `$.` paths
    pub fn with_root(mut self, root: &'a dyn Record) -> Self {
        self.resolver = self.resolver.with_root(root);
        self
    }

    /// Set the enclosing struct for `.` paths
    pub fn with_parent(mut self, parent: &'a dyn Record) -> Self {
        self.resolver = self.resolver.with_parent(parent);
        self
    }

    /// Set the value passed to rules as their subject
    pub fn with_entity(mut self, entity: Value<'a>) -> Self {
        self.entity = entity;
        self
    }

    /// Memoise compiled field accessors in `cache`
    pub fn with_cache(mut self, cache: &'a AccessorCache) -> Self {
        self.resolver = self.resolver.with_cache(cache);
        self
    }

    /// Evaluate a parsed expression
    pub fn evaluate(&self, node: &ExpressionNode) -> EvaluationResult {
        match node {
            ExpressionNode::Literal(value) => {
                EvaluationResult::from_bool(*value, || value.to_string())
            }
            ExpressionNode::FunctionCall(call) => self.evaluate_call(call),
            ExpressionNode::UnaryOp { op, operand } => match op {
                UnaryOperator::Not => self.evaluate_not(operand),
            },
            ExpressionNode::BinaryOp(data) => match data.op {
                BinaryOperator::And => self.evaluate_and(&data.left, &data.right),
                BinaryOperator::Or => self.evaluate_or(&data.left, &data.right),
            },
        }
    }

    /// Parse and evaluate `text`
    ///
    /// A syntax error becomes a single system error.
    pub fn evaluate_expression(&self, text: &str) -> Vec<Error> {
        match parse_expression(text) {
            Ok(ast) => self.evaluate(&ast).into_errors(),
            Err(err) => vec![err.into()],
        }
    }

    fn evaluate_call(&self, call: &FunctionCallData) -> EvaluationResult {
        let args: Result<SmallVec<[Value<'_>; 4]>, _> = call
            .args
            .iter()
            .map(|token| self.resolver.resolve(token))
            .collect();
        let args = match args {
            Ok(args) => args,
            Err(err) => return EvaluationResult::system(err),
        };

        let outcome = self.registry.dispatch(
            &call.name,
            self.resolver.context(),
            &self.entity,
            &args,
        );
        trace!("{}({} args) -> {outcome:?}", call.name, args.len());

        match outcome {
            Ok(true) => EvaluationResult::passed(),
            Ok(false) => EvaluationResult::failed(vec![ValidationError::new(&call.name)]),
            Err(err) => EvaluationResult::system(err),
        }
    }

    fn evaluate_not(&self, operand: &ExpressionNode) -> EvaluationResult {
        let inner = self.evaluate(operand);
        if inner.is_system_error() {
            return inner;
        }
        // the operand's reasons do not explain why the negation failed
        EvaluationResult::from_bool(!inner.pass, || negation_label(operand))
    }

    fn evaluate_and(&self, left: &ExpressionNode, right: &ExpressionNode) -> EvaluationResult {
        let left = self.evaluate(left);
        if left.is_system_error() || !left.pass {
            return left;
        }
        self.evaluate(right)
    }

    fn evaluate_or(&self, left: &ExpressionNode, right: &ExpressionNode) -> EvaluationResult {
        let left = self.evaluate(left);
        if left.is_system_error() {
            return left;
        }
        if left.pass {
            return EvaluationResult::passed();
        }

        let right = self.evaluate(right);
        if right.is_system_error() {
            return right;
        }
        if right.pass {
            return EvaluationResult::passed();
        }

        let mut errors = left.validation_errors;
        errors.extend(right.validation_errors);
        EvaluationResult::failed(errors)
    }
}

/// `not name` for a negated call, `not <expr>` otherwise
fn negation_label(operand: &ExpressionNode) -> String {
    match operand {
        ExpressionNode::FunctionCall(call) => format!("not {}", call.name),
        other => format!("not {other}"),
    }
}
