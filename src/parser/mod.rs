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

//! Rule expression parser
//!
//! Tokenizer, argument classifier and recursive-descent parser turning tag
//! text into an [`ExpressionNode`](crate::ast::ExpressionNode).

pub mod arguments;
pub mod error;
pub mod expression;
pub mod lexer;
pub mod span;
pub mod tokenizer;

pub use arguments::{classify_argument, parse_arguments, split_arguments};
pub use error::{ArgumentError, LexError, LexResult, ParseError, ParseResult};
pub use expression::{ExpressionParser, parse_expression};
pub use span::Spanned;
pub use tokenizer::{Token, TokenKind, Tokenizer, tokenize};

/// Parse an expression string into an AST
pub fn parse(input: &str) -> ParseResult<crate::ast::ExpressionNode> {
    parse_expression(input)
}
