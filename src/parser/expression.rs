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

//! Recursive-descent parser for rule expressions
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := or
//! or      := and (OR and)*
//! and     := not (AND not)*
//! not     := NOT primary | primary
//! primary := '(' expr ')' | BOOLEAN | IDENT '(' args? ')'
//! ```
//!
//! Call arguments are handled in two passes: the raw tokens between the call's
//! parentheses are re-assembled into text, which is then split and classified
//! by [`parse_arguments`].

use super::arguments::parse_arguments;
use super::error::{ParseError, ParseResult};
use super::lexer::TokenStream;
use super::tokenizer::{TokenKind, tokenize};
use crate::ast::{BinaryOperator, ExpressionNode};

/// Recursive-descent parser over a token stream
#[derive(Debug)]
pub struct ExpressionParser<'input> {
    stream: TokenStream<'input>,
}

impl<'input> ExpressionParser<'input> {
    /// Tokenize `input` and prepare a parser over it
    pub fn new(input: &'input str) -> ParseResult<Self> {
        Ok(Self {
            stream: TokenStream::new(tokenize(input)?),
        })
    }

    /// Parse the complete input, rejecting trailing tokens
    pub fn parse(&mut self) -> ParseResult<ExpressionNode> {
        let expr = self.parse_or()?;
        if !self.stream.is_eof() {
            return Err(self.stream.unexpected("'and', 'or' or end of input"));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> ParseResult<ExpressionNode> {
        let mut left = self.parse_and()?;
        while self.stream.consume_if(TokenKind::Or).is_some() {
            let right = self.parse_and()?;
            left = ExpressionNode::binary_op(BinaryOperator::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<ExpressionNode> {
        let mut left = self.parse_not()?;
        while self.stream.consume_if(TokenKind::And).is_some() {
            let right = self.parse_not()?;
            left = ExpressionNode::binary_op(BinaryOperator::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<ExpressionNode> {
        if self.stream.consume_if(TokenKind::Not).is_some() {
            let operand = self.parse_primary()?;
            return Ok(ExpressionNode::not(operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<ExpressionNode> {
        match self.stream.peek_kind() {
            TokenKind::LeftParen => {
                self.stream.next();
                let expr = self.parse_or()?;
                self.stream.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::Boolean => {
                let token = self.stream.next();
                let value = token.and_then(|t| t.value.as_bool()).unwrap_or_default();
                Ok(ExpressionNode::literal(value))
            }
            TokenKind::Identifier => {
                let name = self.stream.expect(TokenKind::Identifier)?.value.text;
                self.parse_function_call(name)
            }
            _ => Err(self.stream.unexpected("'(', boolean or rule call")),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> ParseResult<ExpressionNode> {
        let open = self.stream.expect(TokenKind::LeftParen)?;
        let raw = self.collect_raw_arguments(name, open.start)?;
        let args = parse_arguments(&raw).map_err(|source| ParseError::Arguments {
            function: name.to_string(),
            source,
        })?;
        Ok(ExpressionNode::function_call(name, args))
    }

    /// Re-assemble the token text up to the matching `)`
    fn collect_raw_arguments(&mut self, name: &str, open_position: usize) -> ParseResult<String> {
        let mut pieces: Vec<String> = Vec::new();
        let mut depth = 1usize;

        loop {
            let Some(token) = self.stream.next() else {
                break;
            };
            let token = token.value;
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(pieces.join(" "));
                    }
                }
                _ => {}
            }
            pieces.push(match token.kind {
                TokenKind::String if token.text.contains('\'') => format!("\"{}\"", token.text),
                TokenKind::String => format!("'{}'", token.text),
                _ => token.text.to_string(),
            });
        }

        Err(ParseError::UnclosedArguments {
            function: name.to_string(),
            position: open_position,
        })
    }
}

/// Parse an expression string into an AST
pub fn parse_expression(input: &str) -> ParseResult<ExpressionNode> {
    ExpressionParser::new(input)?.parse()
}
