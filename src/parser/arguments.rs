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

//! Call argument parsing
//!
//! Arguments arrive as raw text (the parser re-assembles the tokens between a
//! call's parentheses) and are split on top-level commas before each entry is
//! classified into an [`ArgumentToken`].

use super::error::ArgumentError;
use super::lexer::is_identifier;
use crate::ast::{ArgumentToken, FieldPath};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("number pattern is valid")
});

/// Split `input` on commas that sit outside quotes and parentheses
///
/// Entries are trimmed; empty entries are dropped so trailing or doubled
/// commas are tolerated.
pub fn split_arguments(input: &str) -> Result<Vec<&str>, ArgumentError> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth: usize = 0;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(ArgumentError::UnmatchedClosingParen {
                        input: input.to_string(),
                        position: i,
                    });
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if quote.is_some() || depth != 0 {
        return Err(ArgumentError::UnbalancedDelimiters {
            input: input.to_string(),
        });
    }
    parts.push(&input[start..]);

    Ok(parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect())
}

/// Classify one argument
pub fn classify_argument(raw: &str) -> Result<ArgumentToken, ArgumentError> {
    let text = raw.trim();

    if let Some(rest) = text.strip_prefix("$.") {
        return parse_field_path(text, rest, true);
    }
    if let Some(rest) = text.strip_prefix('.') {
        return parse_field_path(text, rest, false);
    }
    if let Some(name) = text.strip_prefix('$') {
        if !is_identifier(name) {
            return Err(ArgumentError::InvalidContextVariable {
                name: text.to_string(),
            });
        }
        return Ok(ArgumentToken::ContextVar(name.to_string()));
    }
    if let Some(content) = strip_quotes(text) {
        return Ok(ArgumentToken::String(content.to_string()));
    }

    match text {
        "true" => return Ok(ArgumentToken::Bool(true)),
        "false" => return Ok(ArgumentToken::Bool(false)),
        "null" => return Ok(ArgumentToken::Null),
        _ => {}
    }

    if NUMBER_PATTERN.is_match(text) {
        return text
            .parse::<f64>()
            .map(ArgumentToken::Number)
            .map_err(|_| ArgumentError::InvalidNumber {
                text: text.to_string(),
            });
    }

    Err(ArgumentError::InvalidArgument {
        argument: text.to_string(),
    })
}

/// Split and classify a whole argument list
pub fn parse_arguments(input: &str) -> Result<Vec<ArgumentToken>, ArgumentError> {
    split_arguments(input)?
        .into_iter()
        .map(classify_argument)
        .collect()
}

fn parse_field_path(
    reference: &str,
    rest: &str,
    absolute: bool,
) -> Result<ArgumentToken, ArgumentError> {
    let mut segments = smallvec::SmallVec::new();
    for segment in rest.split('.') {
        if !is_identifier(segment) {
            return Err(ArgumentError::InvalidFieldReference {
                reference: reference.to_string(),
                segment: segment.to_string(),
            });
        }
        segments.push(segment.to_string());
    }
    Ok(ArgumentToken::FieldRef(FieldPath { absolute, segments }))
}

fn strip_quotes(text: &str) -> Option<&str> {
    let first = text.chars().next()?;
    if (first == '\'' || first == '"') && text.len() >= 2 && text.ends_with(first) {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}
