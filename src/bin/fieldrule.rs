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

//! Command-line tool for inspecting and trying out rule expressions

use clap::{Parser, Subcommand};
use fieldrule::parser::{ParseError, parse_arguments, tokenize};
use fieldrule::{Context, ContextVars, Engine, Value, parse, with_context_vars};
use log::debug;
use serde_json::{Value as JsonValue, from_str as parse_json};
use std::process;

#[derive(Parser)]
#[command(name = "fieldrule")]
#[command(about = "Inspect, check and evaluate field rule expressions")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of an expression
    Tokens {
        /// Expression to tokenize
        expression: String,
    },
    /// Parse an expression and print its syntax tree
    Parse {
        /// Expression to parse
        expression: String,
        /// Print the full debug representation
        #[arg(short, long)]
        verbose: bool,
    },
    /// Classify a comma-separated argument list
    Args {
        /// Raw argument text, e.g. "$.Path.UserID, 'x', 3"
        text: String,
    },
    /// Check expression syntax; exits non-zero on error
    Check {
        /// Expressions to check
        #[arg(required = true)]
        expressions: Vec<String>,
        /// Suppress output for valid expressions
        #[arg(short, long)]
        quiet: bool,
    },
    /// Evaluate an expression against stub rules
    Eval {
        /// Expression to evaluate
        expression: String,
        /// Rules that pass, comma separated
        #[arg(long, value_delimiter = ',')]
        pass: Vec<String>,
        /// Rules that fail, comma separated
        #[arg(long, value_delimiter = ',')]
        fail: Vec<String>,
        /// Context variables as a JSON object
        #[arg(long)]
        vars: Option<String>,
    },
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tokens { expression } => handle_tokens(&expression),
        Commands::Parse {
            expression,
            verbose,
        } => handle_parse(&expression, verbose),
        Commands::Args { text } => handle_args(&text),
        Commands::Check { expressions, quiet } => handle_check(&expressions, quiet),
        Commands::Eval {
            expression,
            pass,
            fail,
            vars,
        } => handle_eval(&expression, &pass, &fail, vars.as_deref()),
    }
}

fn fail_with(err: &ParseError) -> ! {
    eprintln!("{} error: {err}", err.phase());
    process::exit(1);
}

fn handle_tokens(expression: &str) {
    match tokenize(expression) {
        Ok(tokens) => {
            for token in tokens {
                println!(
                    "{:>4}..{:<4} {:<18} {}",
                    token.start,
                    token.end,
                    token.value.kind.describe(),
                    token.value
                );
            }
        }
        Err(e) => fail_with(&e.into()),
    }
}

fn handle_parse(expression: &str, verbose: bool) {
    match parse(expression) {
        Ok(ast) => {
            if verbose {
                println!("{ast:#?}");
            } else {
                println!("{ast}");
            }
            let rules = ast.referenced_rules();
            if !rules.is_empty() {
                println!("rules: {}", rules.join(", "));
            }
            println!("complexity: {}", ast.complexity());
        }
        Err(e) => fail_with(&e),
    }
}

fn handle_args(text: &str) {
    match parse_arguments(text) {
        Ok(args) => {
            for (i, arg) in args.iter().enumerate() {
                println!("{i}: {arg:?}");
            }
        }
        Err(e) => {
            eprintln!("arguments error: {e}");
            process::exit(1);
        }
    }
}

fn handle_check(expressions: &[String], quiet: bool) {
    let mut failed = 0;
    for expression in expressions {
        match parse(expression) {
            Ok(_) => {
                if !quiet {
                    println!("ok: {expression}");
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("error: {expression}: {} error: {e}", e.phase());
            }
        }
    }
    if failed > 0 {
        process::exit(1);
    }
}

fn parse_vars(json: &str) -> ContextVars {
    let object = match parse_json::<JsonValue>(json) {
        Ok(JsonValue::Object(object)) => object,
        Ok(_) => {
            eprintln!("--vars must be a JSON object");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error parsing --vars: {e}");
            process::exit(2);
        }
    };

    let mut vars = ContextVars::new();
    for (name, value) in &object {
        match Value::try_from(value) {
            Ok(value) => {
                vars.insert(name.clone(), value);
            }
            Err(e) => {
                eprintln!("Error in --vars '{name}': {e}");
                process::exit(2);
            }
        }
    }
    vars
}

fn handle_eval(expression: &str, pass: &[String], fail: &[String], vars: Option<&str>) {
    let engine = Engine::new();
    for (names, outcome) in [(pass, true), (fail, false)] {
        for name in names {
            let stub = move |_: &Context, _: &Value<'_>, _: &[Value<'_>]| -> anyhow::Result<bool> {
                Ok(outcome)
            };
            if let Err(e) = engine.try_register(name, stub) {
                eprintln!("{e}");
                process::exit(2);
            }
        }
    }
    debug!("stub rules: {:?}", engine.registry().rule_names());

    let ctx = match vars {
        Some(json) => with_context_vars(&Context::background(), parse_vars(json)),
        None => Context::background(),
    };

    let errors = engine.evaluate_expression(&ctx, expression);
    if errors.is_empty() {
        println!("pass");
        return;
    }
    for error in &errors {
        let kind = if error.is_validation() {
            "validation"
        } else {
            "system"
        };
        println!("{kind}: {error}");
    }
    process::exit(1);
}
