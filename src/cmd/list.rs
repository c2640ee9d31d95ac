/*!
`list.rs`

Implements the `list` subcommand for the `quish` CLI.

Subjects (via `Subject` enum):
  - topics   : topic names in catalog order with their command count
  - commands : every command (or those of `--topic T`) with executable and
               argument count

JSON Output Shape (commands):
{
  "status": "ok",
  "subject": "commands",
  "catalog": "/home/u/.Quish/config.json",
  "count": 2,
  "commands": [
    { "topic": "Files", "name": "List", "executable": "ls", "arguments": 3 }
  ]
}
*/

use anyhow::{Result, bail};
use clap::Args;
use std::path::Path;

use quish::catalog::Catalog;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table};
use crate::cmd::shared::load_catalog;
use crate::cmd::subject::Subject;

/// CLI arguments for `quish list <subject>`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Subject to list (topics|commands)
    pub subject: Subject,

    /// Only commands of this topic (subject=commands)
    #[arg(long, value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// Entry point for the list subcommand.
pub fn execute_list(args: ListArgs, catalog_path: &Path) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    match args.subject {
        Subject::Topics => list_topics(&catalog, catalog_path, args.json),
        Subject::Commands => list_commands(&catalog, catalog_path, args.topic.as_deref(), args.json),
    }
}

fn list_topics(catalog: &Catalog, path: &Path, json: bool) -> Result<()> {
    let topics = catalog.topics();
    if json {
        let items: Vec<_> = topics
            .iter()
            .map(|t| serde_json::json!({"name": t.name, "commands": t.commands.len()}))
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "subject": Subject::Topics.to_string(),
                "catalog": path.display().to_string(),
                "count": topics.len(),
                "topics": items
            })
        );
        return Ok(());
    }

    let style = StyleOptions::detect();
    println!(
        "{}",
        box_header(
            format!("{} Topics ({})", emoji("topic", &style), topics.len()),
            Some(path.display().to_string()),
            &style,
        )
    );
    if topics.is_empty() {
        println!("{}", color(Role::Dim, "(none)", &style));
        return Ok(());
    }
    let rows: Vec<Vec<String>> = topics
        .iter()
        .enumerate()
        .map(|(i, t)| vec![(i + 1).to_string(), t.name.clone(), t.commands.len().to_string()])
        .collect();
    println!("{}", table(&["#", "TOPIC", "COMMANDS"], &rows, &style));
    Ok(())
}

fn list_commands(catalog: &Catalog, path: &Path, topic: Option<&str>, json: bool) -> Result<()> {
    if let Some(t) = topic
        && catalog.commands(t).is_none()
    {
        bail!("unknown topic: {t}");
    }
    let commands: Vec<_> = catalog
        .iter()
        .filter(|(t, _)| topic.is_none_or(|want| *t == want))
        .collect();

    if json {
        let items: Vec<_> = commands
            .iter()
            .map(|(t, c)| {
                serde_json::json!({
                    "topic": t,
                    "name": c.name,
                    "executable": c.raw_executable,
                    "arguments": c.arguments.len()
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "subject": Subject::Commands.to_string(),
                "catalog": path.display().to_string(),
                "count": commands.len(),
                "commands": items
            })
        );
        return Ok(());
    }

    let style = StyleOptions::detect();
    let title = match topic {
        Some(t) => format!("{} {t} ({})", emoji("list", &style), commands.len()),
        None => format!("{} Commands ({})", emoji("list", &style), commands.len()),
    };
    println!(
        "{}",
        box_header(title, Some(path.display().to_string()), &style)
    );
    if commands.is_empty() {
        println!("{}", color(Role::Dim, "(none)", &style));
        return Ok(());
    }
    let rows: Vec<Vec<String>> = commands
        .iter()
        .map(|(t, c)| {
            vec![
                t.to_string(),
                c.name.clone(),
                c.raw_executable.clone(),
                c.arguments.len().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        table(&["TOPIC", "NAME", "EXECUTABLE", "ARGS"], &rows, &style)
    );
    println!(
        "\n{} {}",
        emoji("info", &style),
        color(
            Role::Dim,
            "Use `quish show <topic/name>` for the argument list of one command",
            &style
        )
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        List(ListArgs),
    }

    #[test]
    fn clap_parses_list_commands_with_topic() {
        let cli = TestCli::try_parse_from(["t", "list", "commands", "--topic", "Files"]).unwrap();
        let TestSub::List(a) = cli.cmd;
        assert_eq!(a.subject, Subject::Commands);
        assert_eq!(a.topic.as_deref(), Some("Files"));
        assert!(!a.json);
    }

    #[test]
    fn clap_rejects_unknown_subject() {
        assert!(TestCli::try_parse_from(["t", "list", "tools"]).is_err());
    }

    #[test]
    fn unknown_topic_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, br#"{"topics": {"Files": []}}"#).unwrap();
        let args = ListArgs {
            subject: Subject::Commands,
            topic: Some("Nope".into()),
            json: true,
        };
        let err = execute_list(args, f.path()).unwrap_err();
        assert!(err.to_string().contains("unknown topic"));
    }
}
