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

//! General-purpose rules
//!
//! Not registered by default; call [`register_builtin_rules`] to add them.

use super::RuleRegistry;
use crate::model::{Context, Value};
use anyhow::bail;

/// Register `required`, `equals`, `one_of`, `min_len` and `max_len`
pub fn register_builtin_rules(registry: &RuleRegistry) {
    registry.register("required", required);
    registry.register("equals", equals);
    registry.register("one_of", one_of);
    registry.register("min_len", min_len);
    registry.register("max_len", max_len);
}

/// Entity is present and not an empty string or byte payload
pub fn required(_ctx: &Context, entity: &Value<'_>) -> anyhow::Result<bool> {
    Ok(!entity.is_empty())
}

/// Entity equals the argument
pub fn equals(_ctx: &Context, entity: &Value<'_>, expected: Value<'static>) -> anyhow::Result<bool> {
    Ok(*entity == expected)
}

/// Entity equals one of the arguments
pub fn one_of(_ctx: &Context, entity: &Value<'_>, options: &[Value<'_>]) -> anyhow::Result<bool> {
    Ok(options.iter().any(|option| option == entity))
}

fn length(rule: &str, entity: &Value<'_>) -> anyhow::Result<Option<usize>> {
    match entity {
        Value::Null => Ok(None),
        other => match other.len() {
            Some(len) => Ok(Some(len)),
            None => bail!("{rule} applies to strings and bytes, got {}", other.type_name()),
        },
    }
}

/// Entity has at least `min` characters (or bytes); null passes
pub fn min_len(_ctx: &Context, entity: &Value<'_>, min: usize) -> anyhow::Result<bool> {
    Ok(length("min_len", entity)?.is_none_or(|len| len >= min))
}

/// Entity has at most `max` characters (or bytes); null passes
pub fn max_len(_ctx: &Context, entity: &Value<'_>, max: usize) -> anyhow::Result<bool> {
    Ok(length("max_len", entity)?.is_none_or(|len| len <= max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry() -> RuleRegistry {
        let registry = RuleRegistry::new();
        register_builtin_rules(&registry);
        registry
    }

    #[rstest]
    #[case("required", Value::from("x"), vec![], true)]
    #[case("required", Value::from(""), vec![], false)]
    #[case("required", Value::Null, vec![], false)]
    #[case("equals", Value::Int(3), vec![Value::Number(3.0)], true)]
    #[case("one_of", Value::from("b"), vec![Value::from("a"), Value::from("b")], true)]
    #[case("one_of", Value::from("c"), vec![Value::from("a")], false)]
    #[case("min_len", Value::from("abc"), vec![Value::Number(3.0)], true)]
    #[case("min_len", Value::from("ab"), vec![Value::Number(3.0)], false)]
    #[case("max_len", Value::from("abc"), vec![Value::Number(2.0)], false)]
    #[case("max_len", Value::Null, vec![Value::Number(2.0)], true)]
    fn test_builtin_rules(
        #[case] rule: &str,
        #[case] entity: Value<'static>,
        #[case] args: Vec<Value<'static>>,
        #[case] expected: bool,
    ) {
        let result = registry()
            .dispatch(rule, &Context::background(), &entity, &args)
            .unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_length_of_number_is_an_error() {
        let err = registry()
            .dispatch("min_len", &Context::background(), &Value::Int(5), &[Value::Int(1)])
            .unwrap_err();
        assert_eq!(err.to_string(), "min_len applies to strings and bytes, got int");
    }
}
