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

//! Error types for tokenizing and parsing rule expressions

use thiserror::Error;

/// Result type for tokenizer operations
pub type LexResult<T> = Result<T, LexError>;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Lexical errors raised while turning expression text into tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character that cannot start any token
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character
        character: char,
        /// Byte offset in the input
        position: usize,
    },

    /// A quoted string without its closing quote
    #[error("unterminated string starting with {quote} at position {position}")]
    UnterminatedString {
        /// The opening quote character
        quote: char,
        /// Byte offset of the opening quote
        position: usize,
    },

    /// Expression longer than the configured maximum
    #[error("expression is {length} bytes long, maximum is {max}")]
    InputTooLong {
        /// Input length in bytes
        length: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Errors raised while splitting and classifying call arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// A quote or parenthesis was left open
    #[error("unbalanced delimiters in argument list '{input}'")]
    UnbalancedDelimiters {
        /// The raw argument list
        input: String,
    },

    /// A closing parenthesis with no matching opener
    #[error("unmatched ')' at position {position} in argument list '{input}'")]
    UnmatchedClosingParen {
        /// The raw argument list
        input: String,
        /// Byte offset of the parenthesis
        position: usize,
    },

    /// A field reference with an empty or malformed segment
    #[error("invalid field reference '{reference}': segment '{segment}' is not an identifier")]
    InvalidFieldReference {
        /// The whole reference as written
        reference: String,
        /// The offending segment
        segment: String,
    },

    /// A context variable whose name is not an identifier
    #[error("invalid context variable '{name}'")]
    InvalidContextVariable {
        /// The variable as written, including `$`
        name: String,
    },

    /// Number-like text that still failed to parse
    #[error("invalid number '{text}'")]
    InvalidNumber {
        /// The literal text
        text: String,
    },

    /// Text matching none of the argument forms
    #[error("invalid argument '{argument}'")]
    InvalidArgument {
        /// The argument text
        argument: String,
    },
}

/// Syntax errors raised by the expression parser
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Tokenizing failed before parsing could start
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    /// A token other than the one the grammar requires
    #[error("expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        /// Human-readable name of the expected token kind
        expected: &'static str,
        /// Text of the token actually found
        found: String,
        /// Byte offset of the found token
        position: usize,
    },

    /// A call whose argument list never closes
    #[error("unclosed argument list for '{function}' starting at position {position}")]
    UnclosedArguments {
        /// The function being called
        function: String,
        /// Byte offset of the opening parenthesis
        position: usize,
    },

    /// The call arguments could not be classified
    #[error("invalid arguments for '{function}': {source}")]
    Arguments {
        /// The function being called
        function: String,
        /// The underlying argument error
        #[source]
        source: ArgumentError,
    },
}

impl ParseError {
    /// Name of the phase that produced this error
    pub fn phase(&self) -> &'static str {
        match self {
            ParseError::Lex(_) => "tokenize",
            ParseError::UnexpectedToken { .. } | ParseError::UnclosedArguments { .. } => "parse",
            ParseError::Arguments { .. } => "arguments",
        }
    }
}
