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

//! Tokenizer for rule expressions
//!
//! Scans an expression one character at a time and produces a flat token
//! stream terminated by [`TokenKind::Eof`]. Words are maximal runs of
//! identifier characters (letters, digits, `_`, `.`, `$`) and are classified
//! after the fact, so `$.Path.UserID`, `$current_user` and `owned_by` all
//! come out of the same scanning loop.

use super::error::{LexError, LexResult};
use super::span::Spanned;
use std::fmt;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Rule name or any other bare word
    Identifier,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `and` / `&&`
    And,
    /// `or` / `||`
    Or,
    /// `not` / `!`
    Not,
    /// Quoted string; the token text excludes the quotes
    String,
    /// `true` / `false`
    Boolean,
    /// `null`
    Null,
    /// `$.a.b` (absolute) or `.a.b` (relative)
    FieldRef,
    /// `$name`
    ContextVar,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Human-readable name used in parse errors
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::String => "string",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::FieldRef => "field reference",
            TokenKind::ContextVar => "context variable",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token borrowing its text from the expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'input> {
    /// Token kind
    pub kind: TokenKind,
    /// Source text; for strings, the content between the quotes
    pub text: &'input str,
}

impl<'input> Token<'input> {
    /// Create a token
    #[inline]
    pub fn new(kind: TokenKind, text: &'input str) -> Self {
        Self { kind, text }
    }

    /// Check whether this is the end-of-input marker
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Boolean value of a [`TokenKind::Boolean`] token
    pub fn as_bool(&self) -> Option<bool> {
        match (self.kind, self.text) {
            (TokenKind::Boolean, "true") => Some(true),
            (TokenKind::Boolean, "false") => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Characters allowed inside a word run
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '$'
}

/// Classify a completed word run
fn classify_word(text: &str) -> TokenKind {
    if text.eq_ignore_ascii_case("and") {
        return TokenKind::And;
    }
    if text.eq_ignore_ascii_case("or") {
        return TokenKind::Or;
    }
    if text.eq_ignore_ascii_case("not") {
        return TokenKind::Not;
    }

    match text {
        "true" | "false" => TokenKind::Boolean,
        "null" => TokenKind::Null,
        _ if text.starts_with("$.") || text.starts_with('.') => TokenKind::FieldRef,
        _ if text.starts_with('$') => TokenKind::ContextVar,
        _ => TokenKind::Identifier,
    }
}

/// Character-by-character tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer<'input> {
    input: &'input str,
    position: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer over `input`
    pub fn new(input: &'input str) -> Self {
        Self { input, position: 0 }
    }

    #[inline]
    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    #[inline]
    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.position..].chars();
        chars.next();
        chars.next()
    }

    #[inline]
    fn bump(&mut self, c: char) {
        self.position += c.len_utf8();
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.bump(c);
        }
    }

    fn emit(&self, kind: TokenKind, start: usize) -> Spanned<Token<'input>> {
        Spanned::new(
            Token::new(kind, &self.input[start..self.position]),
            start,
            self.position,
        )
    }

    /// Produce the next token; returns [`TokenKind::Eof`] once input is exhausted
    pub fn next_token(&mut self) -> LexResult<Spanned<Token<'input>>> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.peek_char() else {
            return Ok(Spanned::new(Token::new(TokenKind::Eof, ""), start, start));
        };

        match c {
            '(' | ')' | ',' | '!' => {
                self.bump(c);
                let kind = match c {
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    ',' => TokenKind::Comma,
                    _ => TokenKind::Not,
                };
                Ok(self.emit(kind, start))
            }
            '&' | '|' => {
                if self.peek_second() != Some(c) {
                    return Err(LexError::UnexpectedCharacter {
                        character: c,
                        position: start,
                    });
                }
                self.bump(c);
                self.bump(c);
                let kind = if c == '&' {
                    TokenKind::And
                } else {
                    TokenKind::Or
                };
                Ok(self.emit(kind, start))
            }
            '\'' | '"' => self.read_string(c, start),
            '+' | '-' if self
                .peek_second()
                .is_some_and(|next| next.is_ascii_digit() || next == '.') =>
            {
                // signed numeric literal, only meaningful inside call arguments
                self.bump(c);
                Ok(self.read_word(start))
            }
            c if is_word_char(c) => Ok(self.read_word(start)),
            other => Err(LexError::UnexpectedCharacter {
                character: other,
                position: start,
            }),
        }
    }

    fn read_string(&mut self, quote: char, start: usize) -> LexResult<Spanned<Token<'input>>> {
        let content_start = start + quote.len_utf8();
        match self.input[content_start..].find(quote) {
            Some(offset) => {
                let content_end = content_start + offset;
                self.position = content_end + quote.len_utf8();
                Ok(Spanned::new(
                    Token::new(TokenKind::String, &self.input[content_start..content_end]),
                    start,
                    self.position,
                ))
            }
            None => Err(LexError::UnterminatedString {
                quote,
                position: start,
            }),
        }
    }

    fn read_word(&mut self, start: usize) -> Spanned<Token<'input>> {
        while let Some(c) = self.peek_char() {
            if !is_word_char(c) {
                break;
            }
            self.bump(c);
        }
        let text = &self.input[start..self.position];
        self.emit(classify_word(text), start)
    }

    /// Tokenize the whole input; the last token is always [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> LexResult<Vec<Spanned<Token<'input>>>> {
        let mut tokens = Vec::with_capacity(self.input.len() / 4 + 1);
        loop {
            let token = self.next_token()?;
            let done = token.value.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Tokenize an expression string
pub fn tokenize(input: &str) -> LexResult<Vec<Spanned<Token<'_>>>> {
    Tokenizer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.value.kind)
            .collect()
    }

    #[test]
    fn test_call_with_references() {
        let tokens = tokenize("owned_by($.Path.UserID, .Owner, $current_user)").unwrap();
        let pairs: Vec<(TokenKind, &str)> =
            tokens.iter().map(|t| (t.value.kind, t.value.text)).collect();
        assert_eq!(
            pairs,
            vec![
                (TokenKind::Identifier, "owned_by"),
                (TokenKind::LeftParen, "("),
                (TokenKind::FieldRef, "$.Path.UserID"),
                (TokenKind::Comma, ","),
                (TokenKind::FieldRef, ".Owner"),
                (TokenKind::Comma, ","),
                (TokenKind::ContextVar, "$current_user"),
                (TokenKind::RightParen, ")"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[rstest]
    #[case("and", TokenKind::And)]
    #[case("AND", TokenKind::And)]
    #[case("&&", TokenKind::And)]
    #[case("or", TokenKind::Or)]
    #[case("Or", TokenKind::Or)]
    #[case("||", TokenKind::Or)]
    #[case("not", TokenKind::Not)]
    #[case("NOT", TokenKind::Not)]
    #[case("!", TokenKind::Not)]
    #[case("true", TokenKind::Boolean)]
    #[case("false", TokenKind::Boolean)]
    #[case("null", TokenKind::Null)]
    #[case("android", TokenKind::Identifier)]
    fn test_word_classification(#[case] input: &str, #[case] expected: TokenKind) {
        assert_eq!(kinds(input), vec![expected, TokenKind::Eof]);
    }

    #[test]
    fn test_strings_keep_content_only() {
        let tokens = tokenize(r#"'it' "say 'hi'""#).unwrap();
        assert_eq!(tokens[0].value, Token::new(TokenKind::String, "it"));
        assert_eq!(tokens[1].value, Token::new(TokenKind::String, "say 'hi'"));
        assert_eq!((tokens[1].start, tokens[1].end), (5, 15));
    }

    #[test]
    fn test_signed_numbers_are_words() {
        let tokens = tokenize("f(-1.5, +2)").unwrap();
        assert_eq!(tokens[2].value.text, "-1.5");
        assert_eq!(tokens[4].value.text, "+2");
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("f('abc)").unwrap_err(),
            LexError::UnterminatedString {
                quote: '\'',
                position: 2
            }
        );
    }

    #[rstest]
    #[case("a() & b()", '&', 4)]
    #[case("a() | b()", '|', 4)]
    #[case("a() == b()", '=', 4)]
    #[case("f(#)", '#', 2)]
    fn test_unexpected_character(
        #[case] input: &str,
        #[case] character: char,
        #[case] position: usize,
    ) {
        assert_eq!(
            tokenize(input).unwrap_err(),
            LexError::UnexpectedCharacter {
                character,
                position
            }
        );
    }

    #[test]
    fn test_empty_input_yields_eof() {
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }
}
