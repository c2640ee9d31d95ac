/*!
`preset.rs`

Implements the `preset` subcommand: derive a new command from an existing one
whose defaults are the values given on the command line.

Carried into the preset:
  - every mandatory argument
  - arguments named with `--include NAME` (repeatable); the special names
    `sudo`, `clear_output` and `working_directory` carry the run context
  - of an exclusive group, only the selected member

Without `--save` the preset is printed. With `--save` it is appended to the
catalog under `--topic` (default: the source command's topic).
*/

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use quish::preset::{PresetSelection, append_to_document, build_preset, load_document, save_document};
use quish::synth::synthesize;
use quish::store::ValueStore;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use crate::cmd::shared::{ContextArgs, ValueArgs, open_session};

/// CLI arguments for `quish preset <COMMAND> --name <NAME>`
#[derive(Args, Debug)]
pub struct PresetArgs {
    /// Source command name or topic/name
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Name of the new command
    #[arg(long, value_name = "NAME")]
    pub name: String,

    /// Argument (or sudo / clear_output / working_directory) to carry, repeatable
    #[arg(long = "include", value_name = "ARG")]
    pub include: Vec<String>,

    /// Topic to store the preset under (default: source topic)
    #[arg(long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Append the preset to the catalog file
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub values: ValueArgs,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_preset(args: PresetArgs, catalog_path: &Path) -> Result<()> {
    let session = open_session(
        catalog_path,
        &args.command,
        &args.values,
        Some(&args.context),
    )?;
    let (Some(spec), Some(store), Some(source_topic)) =
        (session.selected(), session.store(), session.selected_topic())
    else {
        anyhow::bail!("no command selected");
    };

    let selection = PresetSelection::from_names(&args.include);
    let preset = build_preset(spec, store, &args.name, &selection)?;
    let topic = args
        .topic
        .clone()
        .unwrap_or_else(|| source_topic.to_string());
    let line = synthesize(&preset, &ValueStore::seed(&preset));

    if args.save {
        let mut doc = load_document(catalog_path)?;
        append_to_document(&mut doc, &topic, &preset)
            .with_context(|| format!("cannot add '{}' to topic '{topic}'", preset.name))?;
        save_document(catalog_path, &doc)?;
    }

    if args.json {
        let v = serde_json::json!({
            "status": "ok",
            "saved": args.save,
            "topic": topic,
            "line": line,
            "preset": preset,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&v).unwrap_or_else(|_| v.to_string())
        );
        return Ok(());
    }

    let style = StyleOptions::detect();
    let title = if args.save {
        format!("{} Saved '{}'", emoji("save", &style), preset.name)
    } else {
        format!("{} Preset '{}'", emoji("spark", &style), preset.name)
    };
    println!(
        "{}",
        box_header(title, Some(format!("topic={topic}")), &style)
    );
    println!("{} {}", color(Role::Bold, "Line:", &style), line);
    if !args.save {
        println!(
            "{}",
            serde_json::to_string_pretty(&preset).context("cannot serialize preset")?
        );
        println!(
            "\n{} {}",
            emoji("info", &style),
            color(Role::Dim, "Re-run with --save to append it to the catalog", &style)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use quish::catalog::Catalog;
    use std::io::Write;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        Preset(PresetArgs),
    }

    fn parse(argv: &[&str]) -> PresetArgs {
        let TestSub::Preset(a) = TestCli::try_parse_from(argv).unwrap().cmd;
        a
    }

    #[test]
    fn clap_requires_name() {
        assert!(TestCli::try_parse_from(["t", "preset", "List"]).is_err());
        let a = parse(&["t", "preset", "List", "--name", "Long list", "--include", "sudo"]);
        assert_eq!(a.name, "Long list");
        assert_eq!(a.include, vec!["sudo"]);
        assert!(!a.save);
    }

    #[test]
    fn save_appends_to_catalog_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(
            br#"{"topics": {"Files": [{"name": "List", "executable": "ls", "arguments": [
                {"name": "Long", "type": "boolean", "flag": "-l"},
                {"name": "Path", "type": "folder", "mandatory": true}
            ]}]}}"#,
        )
        .unwrap();

        let a = parse(&[
            "t", "preset", "List", "--name", "List tmp", "--set", "Long=yes", "--set",
            "Path=/tmp", "--include", "Long", "--save", "--json",
        ]);
        execute_preset(a, f.path()).unwrap();

        let cat = Catalog::load(f.path()).unwrap();
        let (topic, saved) = cat.resolve("List tmp").unwrap();
        assert_eq!(topic, "Files");
        assert_eq!(synthesize(saved, &ValueStore::seed(saved)), "ls -l /tmp");
    }
}
