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

//! Expression AST node definitions

use super::argument::ArgumentToken;
use super::operator::{BinaryOperator, UnaryOperator};
use std::fmt;

/// AST representation of a rule expression
///
/// Large variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// `true` / `false`
    Literal(bool),

    /// Rule invocation `name(args...)`
    FunctionCall(Box<FunctionCallData>),

    /// `not expr`
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// `left and right` / `left or right`
    BinaryOp(Box<BinaryOpData>),
}

/// Binary operation data
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// Rule call data
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallData {
    /// Registered rule name
    pub name: String,
    /// Arguments in call order
    pub args: Vec<ArgumentToken>,
}

impl ExpressionNode {
    /// Create a boolean literal
    pub fn literal(value: bool) -> Self {
        Self::Literal(value)
    }

    /// Create a rule call
    pub fn function_call(name: impl Into<String>, args: Vec<ArgumentToken>) -> Self {
        Self::FunctionCall(Box::new(FunctionCallData {
            name: name.into(),
            args,
        }))
    }

    /// Create a binary operation
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a negation
    pub fn not(operand: ExpressionNode) -> Self {
        Self::UnaryOp {
            op: UnaryOperator::Not,
            operand: Box::new(operand),
        }
    }

    /// Names of all rules referenced by this expression, in source order
    pub fn referenced_rules(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_rules(&mut names);
        names
    }

    fn collect_rules<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::FunctionCall(data) => names.push(&data.name),
            Self::UnaryOp { operand, .. } => operand.collect_rules(names),
            Self::BinaryOp(data) => {
                data.left.collect_rules(names);
                data.right.collect_rules(names);
            }
        }
    }

    /// Number of nodes in the tree
    pub fn complexity(&self) -> usize {
        match self {
            Self::Literal(_) | Self::FunctionCall(_) => 1,
            Self::UnaryOp { operand, .. } => 1 + operand.complexity(),
            Self::BinaryOp(data) => 1 + data.left.complexity() + data.right.complexity(),
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::FunctionCall(data) => {
                write!(f, "{}(", data.name)?;
                for (i, arg) in data.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::UnaryOp { op, operand } => write!(f, "{op} {operand}"),
            Self::BinaryOp(data) => write!(f, "({} {} {})", data.left, data.op, data.right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FieldPath;

    #[test]
    fn test_display_round_trips_structure() {
        let expr = ExpressionNode::binary_op(
            BinaryOperator::Or,
            ExpressionNode::binary_op(
                BinaryOperator::And,
                ExpressionNode::function_call(
                    "owned_by",
                    vec![ArgumentToken::FieldRef(FieldPath::new(true, ["Path", "UserID"]))],
                ),
                ExpressionNode::not(ExpressionNode::function_call("readonly", vec![])),
            ),
            ExpressionNode::literal(false),
        );
        assert_eq!(
            expr.to_string(),
            "((owned_by($.Path.UserID) and not readonly()) or false)"
        );
        assert_eq!(expr.referenced_rules(), vec!["owned_by", "readonly"]);
        assert_eq!(expr.complexity(), 6);
    }
}
