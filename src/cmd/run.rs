/*!
`run.rs`

Implements the `run` subcommand: synthesize the line, hand it to the
supervisor, stream the merged stdout/stderr of the child and report the
terminal status.

Behavior:
  - Output chunks are written to stdout as they arrive.
  - `--clear` clears the terminal before the first chunk (only when stdout
    is a terminal and not in JSON mode).
  - Ctrl-C sends a termination request to the child; with `--kill-after S`
    it is force-killed if still alive S seconds later.
  - Mandatory arguments are advisory unless `--require-mandatory` is given.
  - Exit code of `quish` mirrors the child: its code, 128+signal when it was
    killed, 127 when it never started.

JSON Output Shape (output is buffered and included):
{
  "status": "ok" | "error",
  "command": "List",
  "line": "ls -l",
  "exit_code": 0,
  "signal": null,
  "error": null,
  "cancelled": false,
  "elapsed_ms": 12,
  "output": "..."
}
*/

use anyhow::{Context, Result, bail};
use clap::Args;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use quish::store::RunContext;
use quish::supervisor::{RunExit, Supervisor, SupervisorEvent, TerminalStatus};

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use crate::cmd::shared::{ContextArgs, ValueArgs, open_session};

/// Exit code reported when the process could not be started.
const SPAWN_FAILED_EXIT: i32 = 127;

/// CLI arguments for `quish run <COMMAND>`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command name or topic/name
    #[arg(value_name = "COMMAND")]
    pub command: String,

    #[command(flatten)]
    pub values: ValueArgs,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Refuse to run while a mandatory argument is empty
    #[arg(long)]
    pub require_mandatory: bool,

    /// Force-kill a cancelled process still alive after SECS seconds
    #[arg(long, value_name = "SECS")]
    pub kill_after: Option<u64>,

    /// Output JSON (child output is captured into the document)
    #[arg(long)]
    pub json: bool,
}

pub fn execute_run(args: RunArgs, catalog_path: &Path) -> Result<()> {
    let mut session = open_session(
        catalog_path,
        &args.command,
        &args.values,
        Some(&args.context),
    )?;

    let missing: Vec<String> = session
        .missing_mandatory()
        .into_iter()
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        if args.require_mandatory {
            bail!("mandatory argument(s) empty: {}", missing.join(", "));
        }
        for name in &missing {
            log::warn!("mandatory argument '{name}' is empty");
        }
    }

    let (line, ctx) = session.prepare_run()?;
    let name = session
        .selected()
        .map(|s| s.name.clone())
        .unwrap_or_default();
    log::info!("running: {line}");

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let kill_after = args.kill_after.map(Duration::from_secs);
    let (status, captured) = rt.block_on(supervise(&line, &ctx, kill_after, args.json))?;

    if args.json {
        print_json(&name, &line, &status, &captured);
    } else {
        print_status(&status);
    }

    let code = exit_code(&status.exit);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Drive one run to its terminal status. Output is streamed to stdout, or
/// captured and returned when `capture` is set.
async fn supervise(
    line: &str,
    ctx: &RunContext,
    kill_after: Option<Duration>,
    capture: bool,
) -> Result<(TerminalStatus, Vec<u8>)> {
    let (supervisor, mut events) = Supervisor::new();
    let supervisor = match kill_after {
        Some(grace) => supervisor.with_kill_after(grace),
        None => supervisor,
    };
    supervisor
        .run(line, ctx)
        .with_context(|| format!("cannot run '{line}'"))?;

    let mut stdout = tokio::io::stdout();
    let clear_screen = !capture && std::io::stdout().is_terminal();
    let mut captured = Vec::new();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SupervisorEvent::Cleared) => {
                    if clear_screen {
                        stdout.write_all(b"\x1b[2J\x1b[H").await?;
                    }
                }
                Some(SupervisorEvent::Output(bytes)) => {
                    if capture {
                        captured.extend_from_slice(&bytes);
                    } else {
                        stdout.write_all(&bytes).await?;
                        stdout.flush().await?;
                    }
                }
                Some(SupervisorEvent::Finished(status)) => {
                    stdout.flush().await?;
                    return Ok((status, captured));
                }
                None => bail!("supervisor stopped without reporting a status"),
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                log::info!("interrupt received, stopping process");
                supervisor.cancel();
            }
        }
    }
}

fn exit_code(exit: &RunExit) -> i32 {
    match exit {
        RunExit::Code(c) => *c,
        RunExit::Signal(s) => 128 + s,
        RunExit::SpawnFailed(_) => SPAWN_FAILED_EXIT,
    }
}

fn status_json(
    name: &str,
    line: &str,
    status: &TerminalStatus,
    output: &[u8],
) -> serde_json::Value {
    let (signal, error) = match &status.exit {
        RunExit::Signal(s) => (Some(*s), None),
        RunExit::SpawnFailed(e) => (None, Some(e.to_string())),
        RunExit::Code(_) => (None, None),
    };
    serde_json::json!({
        "status": if error.is_some() { "error" } else { "ok" },
        "command": name,
        "line": line,
        "exit_code": status.exit_code(),
        "signal": signal,
        "error": error,
        "cancelled": status.cancelled,
        "elapsed_ms": status.elapsed_ms(),
        "output": String::from_utf8_lossy(output),
    })
}

fn print_json(name: &str, line: &str, status: &TerminalStatus, output: &[u8]) {
    let v = status_json(name, line, status, output);
    println!(
        "{}",
        serde_json::to_string_pretty(&v).unwrap_or_else(|_| v.to_string())
    );
}

fn print_status(status: &TerminalStatus) {
    let style = StyleOptions::detect();
    let elapsed = format!("{} {} ms", emoji("clock", &style), status.elapsed_ms());
    let title = match &status.exit {
        RunExit::Code(0) => color(
            Role::Success,
            format!("{} exit code 0", emoji("success", &style)),
            &style,
        ),
        RunExit::Code(c) => color(
            Role::Warning,
            format!("{} exit code {c}", emoji("warn", &style)),
            &style,
        ),
        RunExit::Signal(_) if status.cancelled => color(
            Role::Warning,
            format!("{} stopped ({})", emoji("stop", &style), status.exit),
            &style,
        ),
        other => color(
            Role::Error,
            format!("{} {other}", emoji("error", &style)),
            &style,
        ),
    };
    eprintln!("{}", box_header(title, Some(elapsed), &style));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use quish::error::SpawnError;
    use serde_json::json;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        Run(RunArgs),
    }

    #[test]
    fn clap_parses_run_flags() {
        let cli = TestCli::try_parse_from([
            "t",
            "run",
            "List",
            "--cwd",
            "/tmp",
            "--clear",
            "--kill-after",
            "3",
            "--require-mandatory",
        ])
        .unwrap();
        let TestSub::Run(a) = cli.cmd;
        assert_eq!(a.context.cwd.as_deref(), Some(Path::new("/tmp")));
        assert!(a.context.clear);
        assert_eq!(a.kill_after, Some(3));
        assert!(a.require_mandatory);
        assert!(!a.json);
    }

    #[test]
    fn exit_code_mirrors_child() {
        assert_eq!(exit_code(&RunExit::Code(3)), 3);
        assert_eq!(exit_code(&RunExit::Signal(15)), 143);
        let spawn = SpawnError {
            program: "nope".into(),
            message: "not found".into(),
        };
        assert_eq!(exit_code(&RunExit::SpawnFailed(spawn)), 127);
    }

    #[test]
    fn json_for_spawn_failure() {
        let status = TerminalStatus {
            exit: RunExit::SpawnFailed(SpawnError {
                program: "nope".into(),
                message: "not found".into(),
            }),
            elapsed: Duration::ZERO,
            cancelled: false,
        };
        let v = status_json("Broken", "nope", &status, b"");
        assert_eq!(v["status"], json!("error"));
        assert_eq!(v["exit_code"], json!(null));
        assert!(v["error"].as_str().unwrap().contains("nope"));
    }

    #[test]
    fn json_for_cancelled_run() {
        let status = TerminalStatus {
            exit: RunExit::Signal(15),
            elapsed: Duration::from_millis(40),
            cancelled: true,
        };
        let v = status_json("Sleep", "sleep 5", &status, b"partial\n");
        assert_eq!(v["status"], json!("ok"));
        assert_eq!(v["signal"], json!(15));
        assert_eq!(v["cancelled"], json!(true));
        assert_eq!(v["elapsed_ms"], json!(40));
        assert_eq!(v["output"], json!("partial\n"));
    }

    #[cfg(unix)]
    #[test]
    fn supervise_captures_output() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let ctx = RunContext {
            sudo: false,
            clear_output_before_run: false,
            working_directory: std::env::temp_dir(),
        };
        let (status, out) = rt
            .block_on(supervise("echo captured", &ctx, None, true))
            .unwrap();
        assert_eq!(status.exit, RunExit::Code(0));
        assert_eq!(String::from_utf8_lossy(&out), "captured\n");
    }
}
