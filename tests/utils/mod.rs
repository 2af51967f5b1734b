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

//! Shared request fixtures for integration tests

#![allow(dead_code)]

use fieldrule::{Context, Engine, Value, record};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

record! {
    #[derive(Debug, Default, Clone)]
    pub struct PathParams {
        pub user_id: String => "UserID",
    }
}

record! {
    #[derive(Debug, Default, Clone)]
    pub struct Meta {
        pub version: i64 => "Version",
        pub payload: Vec<u8> => "Payload",
    }
}

record! {
    #[derive(Debug, Default, Clone)]
    pub struct Item {
        #[rule = "owned_by($.Path.UserID)"]
        pub owner: String => "Owner",
        pub meta: Option<Box<Meta>> => "Meta",
    }
}

record! {
    #[derive(Debug, Default, Clone)]
    pub struct Body {
        pub item: Item => "Item",
    }
}

record! {
    #[derive(Debug, Default, Clone)]
    pub struct UpdateItemRequest {
        pub path: PathParams => "Path",
        pub body: Body => "Body",
    }
}

/// Request where `user` asks to update an item owned by `owner`
pub fn update_request(user: &str, owner: &str) -> UpdateItemRequest {
    UpdateItemRequest {
        path: PathParams {
            user_id: user.to_string(),
        },
        body: Body {
            item: Item {
                owner: owner.to_string(),
                meta: None,
            },
        },
    }
}

pub fn owned_by(_ctx: &Context, owner: &Value<'_>, user: String) -> anyhow::Result<bool> {
    Ok(owner.as_str() == Some(user.as_str()))
}

/// Engine with `owned_by` registered
pub fn engine() -> Engine {
    let engine = Engine::new();
    engine.register("owned_by", owned_by);
    engine
}

/// Register a rule named `name` returning `outcome`, counting its calls
pub fn counting_rule(engine: &Engine, name: &str, outcome: bool) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    engine.register(
        name,
        move |_: &Context, _: &Value<'_>| -> anyhow::Result<bool> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(outcome)
        },
    );
    calls
}

/// Number of recorded calls
pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
