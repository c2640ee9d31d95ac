//! Command-line synthesis: (command definition, current values) -> string.
//!
//! Pure and deterministic. Arguments are emitted in declaration order no matter
//! in which order their values were edited.

use crate::catalog::{ArgType, ArgumentSpec, ArgumentValue, CommandSpec};
use crate::store::ValueStore;

/// Build the command line for `spec` from `values`.
///
/// An empty executable synthesizes to whatever the arguments produce; running
/// such a line is rejected by `Session::prepare_run`.
pub fn synthesize(spec: &CommandSpec, values: &ValueStore) -> String {
    let mut tokens: Vec<String> = Vec::with_capacity(spec.arguments.len() + 2);
    if values.sudo() {
        tokens.push("sudo".to_string());
    }
    let exe = spec.raw_executable.trim();
    if !exe.is_empty() {
        tokens.push(exe.to_string());
    }

    for arg in &spec.arguments {
        let Ok(value) = values.get(&arg.name) else {
            continue;
        };
        emit_argument(arg, value, values, &mut tokens);
    }

    tokens.join(" ")
}

fn emit_argument(
    arg: &ArgumentSpec,
    value: &ArgumentValue,
    values: &ValueStore,
    tokens: &mut Vec<String>,
) {
    match arg.arg_type {
        ArgType::Boolean => {
            let on = match arg.exclusive_group.as_deref() {
                Some(group) => values.selected(group) == Some(arg.name.as_str()),
                None => value.as_bool(),
            };
            if on && let Some(flag) = &arg.flag {
                tokens.push(flag.clone());
            }
        }
        ArgType::Files => {
            let ArgumentValue::List(paths) = value else {
                return;
            };
            let paths: Vec<&str> = paths
                .iter()
                .map(String::as_str)
                .filter(|p| !p.is_empty())
                .collect();
            if paths.is_empty() {
                return;
            }
            push_flag(arg, tokens);
            tokens.extend(paths.into_iter().map(str::to_string));
        }
        ArgType::RawString => {
            if value.is_empty() {
                return;
            }
            push_flag(arg, tokens);
            tokens.push(value.to_string());
        }
        _ => {
            if value.is_empty() {
                return;
            }
            push_flag(arg, tokens);
            tokens.push(quote_if_spaced(&value.to_string()));
        }
    }
}

fn push_flag(arg: &ArgumentSpec, tokens: &mut Vec<String>) {
    if let Some(flag) = &arg.flag {
        tokens.push(flag.clone());
    }
}

/// Wrap in double quotes iff the value contains whitespace.
pub fn quote_if_spaced(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
