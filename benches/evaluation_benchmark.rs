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

use criterion::{Criterion, criterion_group, criterion_main};
use fieldrule::parser::tokenize;
use fieldrule::{Context, Engine, EngineConfig, Value, parse, record};
use std::hint::black_box;

record! {
    #[derive(Default)]
    struct PathParams {
        user_id: String => "UserID",
    }
}

record! {
    #[derive(Default)]
    struct Item {
        #[rule = "(owned_by($.Path.UserID) and not system_readonly()) or godmode_enabled()"]
        owner: String => "Owner",
        #[rule = "min_len(3) and max_len(64)"]
        title: String => "Title",
    }
}

record! {
    #[derive(Default)]
    struct Request {
        path: PathParams => "Path",
        item: Item => "Item",
    }
}

const EXPRESSIONS: [&str; 4] = [
    "required()",
    "owned_by($.Path.UserID)",
    "(owned_by($current_user) and not system_readonly()) or godmode_enabled()",
    "one_of('draft', 'published', \"archived\") && !locked(.Owner, 3, -1.5, null)",
];

fn owned_by(_: &Context, owner: &Value<'_>, user: String) -> anyhow::Result<bool> {
    Ok(owner.as_str() == Some(user.as_str()))
}

fn constant(
    value: bool,
) -> impl Fn(&Context, &Value<'_>) -> anyhow::Result<bool> + Send + Sync + 'static {
    move |_: &Context, _: &Value<'_>| Ok(value)
}

fn engine(config: EngineConfig) -> Engine {
    let engine = Engine::with_config(config);
    fieldrule::registry::builtin::register_builtin_rules(engine.registry());
    engine.register("owned_by", owned_by);
    engine.register("system_readonly", constant(false));
    engine.register("godmode_enabled", constant(true));
    engine
}

fn request() -> Request {
    Request {
        path: PathParams {
            user_id: "u1".to_string(),
        },
        item: Item {
            owner: "u1".to_string(),
            title: "quarterly report".to_string(),
        },
    }
}

fn benchmark_tokenizer(c: &mut Criterion) {
    for (i, expression) in EXPRESSIONS.iter().enumerate() {
        c.bench_function(&format!("expr_{i}_tokenizer"), |b| {
            b.iter(|| black_box(tokenize(black_box(expression))))
        });
    }
}

fn benchmark_parser(c: &mut Criterion) {
    for (i, expression) in EXPRESSIONS.iter().enumerate() {
        c.bench_function(&format!("expr_{i}_parser"), |b| {
            b.iter(|| black_box(parse(black_box(expression))))
        });
    }
}

fn benchmark_apply(c: &mut Criterion) {
    let ctx = Context::background();
    let req = request();

    let cached = engine(EngineConfig::default());
    c.bench_function("apply_cached", |b| {
        b.iter(|| black_box(cached.apply(&ctx, black_box(&req))))
    });

    let uncached = engine(EngineConfig::uncached());
    c.bench_function("apply_uncached", |b| {
        b.iter(|| black_box(uncached.apply(&ctx, black_box(&req))))
    });
}

criterion_group!(
    benches,
    benchmark_tokenizer,
    benchmark_parser,
    benchmark_apply
);
criterion_main!(benches);
