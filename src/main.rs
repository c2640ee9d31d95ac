use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod utils;

use cmd::{LineArgs, ListArgs, PresetArgs, RunArgs, ShowArgs};

/// Quish - run commands described by a JSON catalog
///
/// Command layout:
///   quish list <topics|commands> [--topic T] [--json]
///   quish show <COMMAND> [--json]
///   quish line <COMMAND> [--set NAME=VALUE ...] [--values-file P] [--sudo] [--json]
///   quish run  <COMMAND> [value flags] [--cwd DIR] [--clear] [--kill-after S] [--json]
///   quish preset <COMMAND> --name N [--include ARG ...] [--topic T] [--save]
///
/// COMMAND is a command name or `topic/name`.
///
/// Global flags / env:
///   -v / -vv        Increase verbosity
///   -q / --quiet    Errors only
///   -c / --catalog  Catalog file (or QUISH_CATALOG env; default ~/.Quish/config.json)
///
/// Examples:
///   quish list commands --topic Files
///   quish line Search/Grep --set Pattern="hello world" --set "Ignore case=yes"
///   quish run "Disk usage" --sudo --cwd /var
///   quish preset List --name "List tmp" --set Path=/tmp --save
#[derive(Parser, Debug)]
#[command(
    name = "quish",
    version,
    about = "Quish - run commands described by a JSON catalog",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Catalog file (falls back to QUISH_CATALOG, then ~/.Quish/config.json)
    #[arg(short = 'c', long = "catalog", global = true, value_name = "PATH")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List topics or commands
    List(ListArgs),

    /// Show one command's arguments and default line
    Show(ShowArgs),

    /// Print the synthesized command line
    Line(LineArgs),

    /// Run a command and stream its output
    Run(RunArgs),

    /// Derive a new command from current values
    Preset(PresetArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let catalog = cmd::resolve_catalog_path(cli.catalog)?;
    log::debug!("catalog: {}", catalog.display());

    match cli.command {
        Commands::List(args) => cmd::execute_list(args, &catalog),
        Commands::Show(args) => cmd::execute_show(args, &catalog),
        Commands::Line(args) => cmd::execute_line(args, &catalog),
        Commands::Run(args) => cmd::execute_run(args, &catalog),
        Commands::Preset(args) => cmd::execute_preset(args, &catalog),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_anywhere() {
        let cli = Cli::try_parse_from(["quish", "show", "List", "-vv", "-c", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.catalog, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(cli.command, Commands::Show(_)));
    }

    #[test]
    fn subcommand_required() {
        assert!(Cli::try_parse_from(["quish"]).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
