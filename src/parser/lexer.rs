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

//! Lexical analysis utilities

use super::error::{ParseError, ParseResult};
use super::span::Spanned;
use super::tokenizer::{Token, TokenKind};

/// Check if a character can start an identifier
#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier
#[inline]
pub fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check if `s` is a non-empty identifier not starting with a digit
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_continue),
        _ => false,
    }
}

/// Token stream with lookahead capability
#[derive(Debug)]
pub struct TokenStream<'input> {
    tokens: Vec<Spanned<Token<'input>>>,
    position: usize,
}

impl<'input> TokenStream<'input> {
    /// Create a new token stream; `tokens` must end with [`TokenKind::Eof`]
    pub fn new(tokens: Vec<Spanned<Token<'input>>>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Peek at the current token without consuming
    pub fn peek(&self) -> Option<&Spanned<Token<'input>>> {
        self.tokens.get(self.position)
    }

    /// Kind of the current token, [`TokenKind::Eof`] past the end
    pub fn peek_kind(&self) -> TokenKind {
        self.peek().map_or(TokenKind::Eof, |t| t.value.kind)
    }

    /// Consume and return the current token
    pub fn next(&mut self) -> Option<Spanned<Token<'input>>> {
        let token = self.tokens.get(self.position).cloned()?;
        if !token.value.is_eof() {
            self.position += 1;
        }
        Some(token)
    }

    /// Check if we're at the end of the stream
    pub fn is_eof(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// Consume a token of the given kind if it is next
    pub fn consume_if(&mut self, kind: TokenKind) -> Option<Spanned<Token<'input>>> {
        if self.peek_kind() == kind {
            self.next()
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail naming it
    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Spanned<Token<'input>>> {
        if let Some(token) = self.consume_if(kind) {
            return Ok(token);
        }
        Err(self.unexpected(kind.describe()))
    }

    /// Build an error for the current token
    pub fn unexpected(&self, expected: &'static str) -> ParseError {
        let (found, position) = match self.peek() {
            Some(token) => (token.value.to_string(), token.start),
            None => ("end of input".to_string(), 0),
        };
        ParseError::UnexpectedToken {
            expected,
            found,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenizer::tokenize;

    #[test]
    fn test_identifier_chars() {
        assert!(is_identifier("UserID"));
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_stream_stops_at_eof() {
        let mut stream = TokenStream::new(tokenize("a(").unwrap());
        assert_eq!(stream.next().unwrap().value.text, "a");
        assert!(stream.expect(TokenKind::LeftParen).is_ok());
        assert!(stream.is_eof());
        assert!(stream.next().unwrap().value.is_eof());
        assert!(stream.next().unwrap().value.is_eof());
    }

    #[test]
    fn test_expect_names_kind() {
        let mut stream = TokenStream::new(tokenize("a b").unwrap());
        stream.next();
        let err = stream.expect(TokenKind::LeftParen).unwrap_err();
        assert_eq!(err.to_string(), "expected '(', found 'b' at position 2");
    }
}
