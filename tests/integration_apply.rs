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

//! Integration tests for applying field rules to whole requests

use fieldrule::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod utils;
use utils::{Meta, calls, counting_rule, engine, update_request};

#[test]
fn test_owned_by_absolute_reference() {
    let engine = engine();
    let ctx = Context::background();

    assert!(engine.apply(&ctx, &update_request("u1", "u1")).is_empty());

    let errors = engine.apply(&ctx, &update_request("u1", "u2"));
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].as_validation(),
        Some(&ValidationError::new("owned_by"))
    );
}

#[test]
fn test_detailed_violation_names_field() {
    let engine = engine();
    let violations = engine.apply_detailed(&Context::background(), &update_request("u1", "u2"));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field_path, "Body.Item.Owner");
    assert_eq!(violations[0].expression, "owned_by($.Path.UserID)");
    assert_eq!(
        violations[0].to_string(),
        "Body.Item.Owner: validation failed: rule 'owned_by' returned false"
    );
}

record! {
    #[derive(Default)]
    struct Profile {
        #[rule = "(owned_by($current_user) and not system_readonly()) or godmode_enabled()"]
        owner: String => "Owner",
    }
}

#[test]
fn test_context_variables_through_apply() {
    let engine = Engine::new();
    engine.register(
        "owned_by",
        |_: &Context, _: &Value<'_>, user: String| -> anyhow::Result<bool> { Ok(user == "u1") },
    );
    let readonly = counting_rule(&engine, "system_readonly", false);
    let godmode = counting_rule(&engine, "godmode_enabled", true);

    let vars = ContextVars::new().with("current_user", "u1");
    let ctx = with_context_vars(&Context::background(), vars);
    assert!(engine.apply(&ctx, &Profile::default()).is_empty());
    // left branch passed, so the right branch never ran
    assert_eq!((calls(&readonly), calls(&godmode)), (1, 0));

    let vars = ContextVars::new().with("current_user", "u2");
    let ctx = with_context_vars(&Context::background(), vars);
    assert!(engine.apply(&ctx, &Profile::default()).is_empty());
    assert_eq!((calls(&readonly), calls(&godmode)), (1, 1));
}

#[test]
fn test_missing_context_variable_is_system_error() {
    let engine = Engine::new();
    engine.register(
        "owned_by",
        |_: &Context, _: &Value<'_>, _: String| -> anyhow::Result<bool> { Ok(true) },
    );
    counting_rule(&engine, "system_readonly", false);
    counting_rule(&engine, "godmode_enabled", true);

    let errors = engine.apply(&Context::background(), &Profile::default());
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        Error::System(SystemError::Resolve(ResolveError::MissingContextVar { .. }))
    ));
}

record! {
    #[derive(Default)]
    struct Account {
        #[rule = "not is_banned()"]
        user: String => "User",
        #[rule = "false"]
        locked: bool => "Locked",
        #[rule = "is_banned() and not is_banned()"]
        contradiction: String => "Contradiction",
    }
}

#[test]
fn test_negation_and_false_literal_are_reported() {
    let engine = Engine::new();
    let banned = counting_rule(&engine, "is_banned", true);

    let violations = engine.apply_detailed(&Context::background(), &Account::default());
    let reported: Vec<(&str, String)> = violations
        .iter()
        .map(|v| (v.field_path.as_str(), v.error.to_string()))
        .collect();
    assert_eq!(
        reported,
        vec![
            (
                "User",
                "validation failed: rule 'not is_banned' returned false".to_string()
            ),
            (
                "Locked",
                "validation failed: rule 'false' returned false".to_string()
            ),
            (
                "Contradiction",
                "validation failed: rule 'not is_banned' returned false".to_string()
            ),
        ]
    );
    assert_eq!(calls(&banned), 3);

    let engine = Engine::new();
    counting_rule(&engine, "is_banned", false);
    let errors = engine.apply(&Context::background(), &Account::default());
    // only the literal and the left side of the conjunction fail now
    let rules: Vec<_> = errors
        .iter()
        .filter_map(|e| e.as_validation().map(|v| v.rule.as_str()))
        .collect();
    assert_eq!(rules, vec!["false", "is_banned"]);
}

record! {
    #[derive(Default)]
    struct Sibling {
        expected: String => "Expected",
        #[rule = "matches(.Expected)"]
        actual: String => "Actual",
    }
}

record! {
    #[derive(Default)]
    struct SiblingRequest {
        first: Sibling => "First",
        second: Option<Sibling> => "Second",
    }
}

#[test]
fn test_relative_reference_uses_enclosing_struct() {
    let engine = Engine::new();
    engine.register(
        "matches",
        |_: &Context, entity: &Value<'_>, expected: String| -> anyhow::Result<bool> {
            Ok(entity.as_str() == Some(expected.as_str()))
        },
    );

    let request = SiblingRequest {
        first: Sibling {
            expected: "a".to_string(),
            actual: "a".to_string(),
        },
        second: Some(Sibling {
            expected: "b".to_string(),
            actual: "c".to_string(),
        }),
    };
    let violations = engine.apply_detailed(&Context::background(), &request);
    let paths: Vec<&str> = violations.iter().map(|v| v.field_path.as_str()).collect();
    assert_eq!(paths, vec!["Second.Actual"]);
}

record! {
    #[derive(Default)]
    struct Broken {
        #[rule = "check($.NoSuchField)"]
        unknown: String => "Unknown",
        #[rule = "check($.Meta.Version)"]
        through_nil: String => "ThroughNil",
        #[rule = "check($.Meta.Payload.Size)"]
        into_bytes: String => "IntoBytes",
        #[rule = "check($.Meta.Payload)"]
        on_bytes: String => "OnBytes",
        meta: Option<Box<Meta>> => "Meta",
    }
}

#[test]
fn test_resolution_failures_are_system_errors() {
    let engine = Engine::new();
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&checks);
    engine.register(
        "check",
        move |_: &Context, _: &Value<'_>, _: Value<'static>| -> anyhow::Result<bool> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        },
    );

    let errors = engine.apply(&Context::background(), &Broken::default());
    assert_eq!(errors.len(), 4);
    let kinds: Vec<_> = errors
        .iter()
        .map(|e| match e.as_system() {
            Some(SystemError::Resolve(err)) => std::mem::discriminant(err),
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds[0],
        std::mem::discriminant(&ResolveError::UnknownField {
            path: String::new(),
            field: String::new(),
            record: "",
        })
    );
    assert!(errors[1].to_string().contains("nil pointer at 'Meta'"));
    assert!(errors[2].to_string().contains("raw bytes field 'Payload'"));
    // a null Meta makes $.Meta.Payload a nil dereference too
    assert!(errors[3].to_string().contains("nil pointer"));
    assert_eq!(calls(&checks), 0);

    // with Meta present, ending on the bytes field resolves
    let broken = Broken {
        meta: Some(Box::new(Meta {
            version: 1,
            payload: vec![0xff],
        })),
        ..Broken::default()
    };
    let errors = engine.apply(&Context::background(), &broken);
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert!(messages[0].contains("field 'NoSuchField' does not exist"));
    assert!(messages[1].contains("raw bytes"));
    assert_eq!(calls(&checks), 2);
}

record! {
    #[derive(Default)]
    struct Independent {
        #[rule = "unknown_rule()"]
        first: String => "First",
        #[rule = "needs_two('only_one_arg')"]
        second: String => "Second",
        #[rule = "fails()"]
        third: String => "Third",
        #[rule = "fails() or fails()"]
        fourth: String => "Fourth",
    }
}

#[test]
fn test_errors_collected_across_fields_in_order() {
    let engine = Engine::new();
    engine.register(
        "needs_two",
        |_: &Context, _: &Value<'_>, _: String, _: String| -> anyhow::Result<bool> { Ok(true) },
    );
    counting_rule(&engine, "fails", false);

    let errors = engine.apply(&Context::background(), &Independent::default());
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "rule 'unknown_rule' is not registered",
            "rule 'needs_two' expects 2 args, got 1",
            "validation failed: rule 'fails' returned false",
            "validation failed: rule 'fails' returned false",
            "validation failed: rule 'fails' returned false",
        ]
    );
    assert_eq!(
        errors.iter().map(Error::is_system).collect::<Vec<_>>(),
        vec![true, true, false, false, false]
    );
}

#[test]
fn test_rule_error_returned_verbatim() {
    #[derive(Debug, thiserror::Error)]
    #[error("lookup timed out")]
    struct Timeout;

    let engine = engine();
    engine.register("slow", |_: &Context, _: &Value<'_>| -> anyhow::Result<bool> {
        Err(Timeout.into())
    });

    let errors = engine.evaluate_expression(&Context::background(), "slow() and false");
    assert_eq!(errors.len(), 1);
    let rule_error = errors[0].as_system().and_then(SystemError::rule_error).unwrap();
    assert!(rule_error.downcast_ref::<Timeout>().is_some());
    assert_eq!(errors[0].to_string(), "lookup timed out");
}
