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

//! Typed rule callables and their type-erased wrappers
//!
//! A rule is any `Fn(&Context, &Value, A1, ..., An) -> anyhow::Result<bool>`
//! whose extra parameters implement [`FromValue`], or the variadic shape
//! `Fn(&Context, &Value, &[Value]) -> anyhow::Result<bool>`. Registration
//! converts it once into a [`RuleFn`] that takes resolved arguments as a
//! slice, so dispatch never inspects types at call time.

use super::error::DispatchError;
use super::signature::RuleSignature;
use crate::error::SystemError;
use crate::model::{Context, ConversionError, FromValue, Value};
use std::fmt;

/// Failure inside a type-erased rule call
#[derive(Debug)]
pub enum CallError {
    /// Argument at zero-based `index` has the wrong type
    Argument {
        /// Zero-based argument index
        index: usize,
        /// Conversion failure
        source: ConversionError,
    },
    /// The rule itself returned an error
    Rule(anyhow::Error),
}

/// Type-erased rule callable
pub type RuleFn =
    dyn Fn(&Context, &Value<'_>, &[Value<'_>]) -> Result<bool, CallError> + Send + Sync;

/// Marker for the variadic rule shape
#[derive(Debug, Clone, Copy)]
pub struct Variadic;

/// Conversion of a typed rule into a [`RuleFn`]
///
/// `Args` only disambiguates the implementations and is inferred.
pub trait IntoRule<Args>: Send + Sync + 'static {
    /// Number of fixed extra parameters
    const ARITY: usize;
    /// Whether extra arguments are passed through as a slice
    const VARIADIC: bool;

    /// Wrap into a type-erased callable
    fn into_rule(self) -> Box<RuleFn>;
}

fn argument<T: FromValue>(args: &[Value<'_>], index: usize) -> Result<T, CallError> {
    let null = Value::Null;
    let value = args.get(index).unwrap_or(&null);
    T::from_value(value).map_err(|source| CallError::Argument { index, source })
}

macro_rules! impl_into_rule {
    ($count:literal $(; $($arg:ident $index:literal),+)?) => {
        impl<F $($(, $arg)+)?> IntoRule<($($($arg,)+)?)> for F
        where
            F: Fn(&Context, &Value<'_> $($(, $arg)+)?) -> anyhow::Result<bool>
                + Send
                + Sync
                + 'static,
            $($($arg: FromValue,)+)?
        {
            const ARITY: usize = $count;
            const VARIADIC: bool = false;

            #[allow(non_snake_case, unused_variables)]
            fn into_rule(self) -> Box<RuleFn> {
                Box::new(
                    move |ctx: &Context, entity: &Value<'_>, args: &[Value<'_>]| {
                        $($(let $arg = argument::<$arg>(args, $index)?;)+)?
                        self(ctx, entity $($(, $arg)+)?).map_err(CallError::Rule)
                    },
                )
            }
        }
    };
}

impl_into_rule!(0);
impl_into_rule!(1; A1 0);
impl_into_rule!(2; A1 0, A2 1);
impl_into_rule!(3; A1 0, A2 1, A3 2);
impl_into_rule!(4; A1 0, A2 1, A3 2, A4 3);
impl_into_rule!(5; A1 0, A2 1, A3 2, A4 3, A5 4);
impl_into_rule!(6; A1 0, A2 1, A3 2, A4 3, A5 4, A6 5);

impl<F> IntoRule<Variadic> for F
where
    F: Fn(&Context, &Value<'_>, &[Value<'_>]) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    const ARITY: usize = 0;
    const VARIADIC: bool = true;

    fn into_rule(self) -> Box<RuleFn> {
        Box::new(
            move |ctx: &Context, entity: &Value<'_>, args: &[Value<'_>]| {
                self(ctx, entity, args).map_err(CallError::Rule)
            },
        )
    }
}

/// A registered rule: its signature and wrapped callable
pub struct RuleDescriptor {
    signature: RuleSignature,
    callable: Box<RuleFn>,
}

impl RuleDescriptor {
    /// Wrap a typed rule
    pub fn new<F, Args>(name: impl Into<String>, rule: F) -> Self
    where
        F: IntoRule<Args>,
    {
        let signature = if F::VARIADIC {
            RuleSignature::variadic(name)
        } else {
            RuleSignature::fixed(name, F::ARITY)
        };
        Self {
            signature,
            callable: rule.into_rule(),
        }
    }

    /// Declared signature
    pub fn signature(&self) -> &RuleSignature {
        &self.signature
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Invoke with `[ctx, entity, ...args]`
    ///
    /// Rule errors come back as [`SystemError::Rule`] with the original
    /// error untouched.
    pub fn invoke(
        &self,
        ctx: &Context,
        entity: &Value<'_>,
        args: &[Value<'_>],
    ) -> Result<bool, SystemError> {
        if !self.signature.accepts(args.len()) {
            return Err(DispatchError::ArgumentCount {
                name: self.signature.name.clone(),
                expected: self.signature.arity,
                actual: args.len(),
            }
            .into());
        }

        (self.callable)(ctx, entity, args).map_err(|err| match err {
            CallError::Argument { index, source } => DispatchError::ArgumentType {
                name: self.signature.name.clone(),
                position: index + 1,
                source,
            }
            .into(),
            CallError::Rule(err) => SystemError::Rule(err),
        })
    }
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn always(_: &Context, _: &Value<'_>) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn same(_: &Context, entity: &Value<'_>, other: String) -> anyhow::Result<bool> {
        Ok(entity.as_str() == Some(other.as_str()))
    }

    fn between(_: &Context, entity: &Value<'_>, lo: f64, hi: f64) -> anyhow::Result<bool> {
        Ok(entity.as_f64().is_some_and(|v| lo <= v && v <= hi))
    }

    fn any_of(_: &Context, entity: &Value<'_>, options: &[Value<'_>]) -> anyhow::Result<bool> {
        Ok(options.contains(entity))
    }

    #[test]
    fn test_signatures_from_types() {
        assert_eq!(
            RuleDescriptor::new("always", always).signature(),
            &RuleSignature::fixed("always", 0)
        );
        assert_eq!(RuleDescriptor::new("between", between).signature().arity, 2);
        assert!(RuleDescriptor::new("any_of", any_of).signature().variadic);
    }

    #[test]
    fn test_invoke_converts_arguments() {
        let ctx = Context::background();
        let rule = RuleDescriptor::new("same", same);
        assert!(rule.invoke(&ctx, &Value::from("u1"), &[Value::from("u1")]).unwrap());
        assert!(!rule.invoke(&ctx, &Value::from("u2"), &[Value::from("u1")]).unwrap());

        let err = rule.invoke(&ctx, &Value::from("u1"), &[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "rule 'same' argument 1: cannot convert int to string"
        );
    }

    #[test]
    fn test_invoke_checks_arity() {
        let ctx = Context::background();
        let rule = RuleDescriptor::new("between", between);
        let err = rule.invoke(&ctx, &Value::Int(1), &[Value::Int(0)]).unwrap_err();
        assert_eq!(err.to_string(), "rule 'between' expects 2 args, got 1");

        let variadic = RuleDescriptor::new("any_of", any_of);
        let args = [Value::from("a"), Value::from("b"), Value::from("c")];
        assert!(variadic.invoke(&ctx, &Value::from("c"), &args).unwrap());
        assert!(!variadic.invoke(&ctx, &Value::from("d"), &[]).unwrap());
    }

    #[test]
    fn test_rule_error_is_verbatim() {
        let rule = RuleDescriptor::new(
            "broken",
            |_: &Context, _: &Value<'_>| -> anyhow::Result<bool> {
                Err(anyhow::anyhow!("database unavailable"))
            },
        );
        let err = rule
            .invoke(&Context::background(), &Value::Null, &[])
            .unwrap_err();
        assert!(matches!(err, SystemError::Rule(_)));
        assert_eq!(err.to_string(), "database unavailable");
    }
}
