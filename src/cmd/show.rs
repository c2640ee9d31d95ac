/*!
`show.rs`

Implements the `show` subcommand: one command's definition as stored in the
catalog, plus the line its defaults synthesize to.

Human output: boxed header, argument table
(NAME | TYPE | FLAG | GROUP | REQ | DEFAULT), default line, man page hint.

JSON Output Shape:
{
  "status": "ok",
  "topic": "Files",
  "name": "List",
  "executable": "ls",
  "sudo": false,
  "clear_output": false,
  "working_directory": "/home/u",
  "man": "ls",
  "line": "ls -l",
  "arguments": [
    {"name":"Long","type":"boolean","flag":"-l","group":null,"mandatory":false,"default":true}
  ]
}
*/

use anyhow::Result;
use clap::Args;
use std::path::Path;

use quish::catalog::{ArgumentSpec, CommandSpec};
use quish::store::ValueStore;
use quish::synth::synthesize;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::shared::load_catalog;

/// CLI arguments for `quish show <COMMAND>`
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Command name or topic/name
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_show(args: ShowArgs, catalog_path: &Path) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let (topic, spec) = catalog.resolve(&args.command)?;
    let line = synthesize(spec, &ValueStore::seed(spec));

    if args.json {
        println!("{}", describe_json(topic, spec, &line));
        return Ok(());
    }

    let style = StyleOptions::detect();
    println!(
        "{}",
        box_header(
            format!("{} {}", emoji("command", &style), spec.name),
            Some(format!("topic={topic} • exe={}", spec.raw_executable)),
            &style,
        )
    );

    if spec.raw_executable.trim().is_empty() {
        println!(
            "{} {}",
            emoji("warn", &style),
            color(Role::Warning, "no executable defined; this command cannot run", &style)
        );
    }

    if spec.arguments.is_empty() {
        println!("{}", color(Role::Dim, "(no arguments)", &style));
    } else {
        let rows: Vec<Vec<String>> = spec.arguments.iter().map(argument_row).collect();
        println!(
            "{}",
            table(
                &["NAME", "TYPE", "FLAG", "GROUP", "REQ", "DEFAULT"],
                &rows,
                &style
            )
        );
    }

    let mut flags = Vec::new();
    if spec.sudo_default {
        flags.push("sudo");
    }
    if spec.clear_output_default {
        flags.push("clear output");
    }
    if !flags.is_empty() {
        println!("\nDefaults: {}", flags.join(", "));
    }
    println!(
        "Working directory: {}",
        spec.working_directory_default().display()
    );
    println!("\n{} {}", color(Role::Bold, "Line:", &style), line);

    if let Some(page) = spec.man_page.as_deref().filter(|p| !p.trim().is_empty()) {
        println!(
            "\n{} {}",
            emoji("info", &style),
            color(Role::Dim, format!("See `man {page}` for details"), &style)
        );
    }
    Ok(())
}

fn argument_row(arg: &ArgumentSpec) -> Vec<String> {
    vec![
        arg.name.clone(),
        arg.arg_type.to_string(),
        arg.flag.clone().unwrap_or_else(|| "-".into()),
        arg.exclusive_group.clone().unwrap_or_else(|| "-".into()),
        if arg.mandatory { "yes" } else { "" }.to_string(),
        arg.default
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default(),
    ]
}

fn describe_json(topic: &str, spec: &CommandSpec, line: &str) -> serde_json::Value {
    let arguments: Vec<_> = spec
        .arguments
        .iter()
        .map(|a| {
            serde_json::json!({
                "name": a.name,
                "type": a.arg_type.as_str(),
                "flag": a.flag,
                "group": a.exclusive_group,
                "mandatory": a.mandatory,
                "default": a.default.as_ref().map(|v| v.to_json()),
            })
        })
        .collect();
    serde_json::json!({
        "status": "ok",
        "topic": topic,
        "name": spec.name,
        "executable": spec.raw_executable,
        "sudo": spec.sudo_default,
        "clear_output": spec.clear_output_default,
        "working_directory": spec.working_directory_default().display().to_string(),
        "man": spec.man_page,
        "line": line,
        "arguments": arguments,
    })
}
