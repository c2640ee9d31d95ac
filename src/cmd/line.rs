/*!
`line.rs`

Implements the `line` subcommand: print the command line a set of values
synthesizes to, without running it.

Human output is the bare line on stdout (pipe-friendly); empty mandatory
arguments are reported as warnings on stderr.

JSON Output Shape:
{
  "status": "ok",
  "topic": "Search",
  "command": "Grep",
  "line": "grep -i -e \"hello world\"",
  "missing_mandatory": []
}
*/

use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::cmd::shared::{ValueArgs, open_session};

/// CLI arguments for `quish line <COMMAND>`
#[derive(Args, Debug)]
pub struct LineArgs {
    /// Command name or topic/name
    #[arg(value_name = "COMMAND")]
    pub command: String,

    #[command(flatten)]
    pub values: ValueArgs,

    /// Output JSON instead of the bare line
    #[arg(long)]
    pub json: bool,
}

pub fn execute_line(args: LineArgs, catalog_path: &Path) -> Result<()> {
    let session = open_session(catalog_path, &args.command, &args.values, None)?;
    let missing = session.missing_mandatory();

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "topic": session.selected_topic(),
                "command": session.selected().map(|s| s.name.as_str()),
                "line": session.command_line(),
                "missing_mandatory": missing,
            })
        );
        return Ok(());
    }

    for name in &missing {
        log::warn!("mandatory argument '{name}' is empty");
    }
    println!("{}", session.command_line());
    Ok(())
}
