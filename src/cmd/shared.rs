/*!
shared.rs - shared helpers for subcommands.

Focus:
  - resolve_catalog_path / load_catalog: `--catalog` > QUISH_CATALOG > ~/.Quish/config.json
  - ValueArgs / ContextArgs: value and run-context flags reused by line/run/preset
  - coerce_value: raw CLI string -> ArgumentValue per argument type
  - load_values_file: JSON or YAML object of NAME -> value
  - open_session: catalog + selected command + applied values
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use std::path::{Path, PathBuf};

use quish::catalog::{ArgType, ArgumentValue, Catalog, CommandSpec, default_catalog_path};
use quish::session::Session;

/// Environment fallback for `--catalog`.
pub const CATALOG_ENV: &str = "QUISH_CATALOG";

/* ---- Catalog location ---- */

/// Effective catalog path (CLI flag > QUISH_CATALOG env > default location).
pub fn resolve_catalog_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    pick_catalog_path(flag, std::env::var(CATALOG_ENV).ok(), default_catalog_path())
}

fn pick_catalog_path(
    flag: Option<PathBuf>,
    env: Option<String>,
    fallback: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(p) = flag {
        return Ok(p);
    }
    if let Some(e) = env
        && !e.trim().is_empty()
    {
        return Ok(PathBuf::from(e.trim()));
    }
    fallback.ok_or_else(|| anyhow!("no home directory; pass --catalog or set {CATALOG_ENV}"))
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("failed to load catalog: {}", path.display()))?;
    log::debug!(
        "catalog {} loaded: {} topic(s), {} command(s)",
        path.display(),
        catalog.topics().len(),
        catalog.len()
    );
    Ok(catalog)
}

/* ---- Shared flag groups ---- */

/// Argument value flags.
#[derive(Args, Debug, Default, Clone)]
pub struct ValueArgs {
    /// Set an argument value (NAME=VALUE), repeatable
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Load values from file (JSON or YAML object). --set overrides file entries
    #[arg(long = "values-file", value_name = "PATH")]
    pub values_file: Option<PathBuf>,

    /// Prefix the command line with sudo
    #[arg(long, conflicts_with = "no_sudo")]
    pub sudo: bool,

    /// Do not use sudo even if the command enables it by default
    #[arg(long = "no-sudo")]
    pub no_sudo: bool,
}

/// Run-context flags.
#[derive(Args, Debug, Default, Clone)]
pub struct ContextArgs {
    /// Working directory for the process (default: command's own, else home)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Clear previous output before the run
    #[arg(long)]
    pub clear: bool,
}

/* ---- Value coercion ---- */

/// Coerce a raw string using the declared argument type.
pub fn coerce_value(raw: &str, ty: ArgType) -> Result<ArgumentValue> {
    let value = match ty {
        ArgType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => ArgumentValue::Bool(true),
            "false" | "0" | "no" | "n" => ArgumentValue::Bool(false),
            _ => bail!("expected a boolean (true/false/yes/no/1/0), got '{raw}'"),
        },
        ArgType::Integer if raw.trim().is_empty() => ArgumentValue::Integer(0),
        ArgType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(ArgumentValue::Integer)
            .map_err(|_| anyhow!("expected an integer, got '{raw}'"))?,
        ArgType::Files => ArgumentValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => ArgumentValue::Text(raw.to_string()),
    };
    Ok(value)
}

/// Split `NAME=VALUE` at the first `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("empty argument name in '{raw}'");
    }
    Ok((name.to_string(), value.to_string()))
}

/// Read a JSON or YAML object (by extension; YAML for .yaml/.yml).
pub fn load_values_file(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read values file: {}", path.display()))?;
    let lower = path.to_string_lossy().to_ascii_lowercase();

    let value: serde_json::Value = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML values file")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON values file")?
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("values file root must be an object"),
    }
}

fn argument_type(spec: &CommandSpec, name: &str) -> Result<ArgType> {
    spec.argument(name)
        .map(|a| a.arg_type)
        .ok_or_else(|| anyhow!("'{}' has no argument named '{name}'", spec.name))
}

/// Ordered (name, value) writes: file entries first, then `--set` entries.
pub fn collect_values(
    spec: &CommandSpec,
    args: &ValueArgs,
) -> Result<Vec<(String, ArgumentValue)>> {
    let cli: Vec<(String, String)> = args
        .set
        .iter()
        .map(|s| parse_assignment(s))
        .collect::<Result<_>>()?;

    let mut writes = Vec::new();
    if let Some(path) = &args.values_file {
        for (name, raw) in load_values_file(path)? {
            if cli.iter().any(|(n, _)| *n == name) {
                continue; // CLI overrides file
            }
            let ty = argument_type(spec, &name)?;
            let value = match &raw {
                serde_json::Value::String(s) => coerce_value(s, ty)?,
                other => ArgumentValue::from_json(ty, other)
                    .ok_or_else(|| anyhow!("'{name}' expects {}", ty.expected()))?,
            };
            writes.push((name, value));
        }
    }
    for (name, raw) in cli {
        let ty = argument_type(spec, &name)?;
        let value = coerce_value(&raw, ty).with_context(|| format!("invalid value for '{name}'"))?;
        writes.push((name, value));
    }
    Ok(writes)
}

/* ---- Session bootstrap ---- */

/// Load the catalog, select `command` and apply value/context flags.
pub fn open_session(
    catalog_path: &Path,
    command: &str,
    values: &ValueArgs,
    context: Option<&ContextArgs>,
) -> Result<Session> {
    let mut session = Session::new(load_catalog(catalog_path)?);
    session.select(command)?;

    let spec = session
        .selected()
        .cloned()
        .ok_or_else(|| anyhow!("no command selected"))?;
    for (name, value) in collect_values(&spec, values)? {
        session.set(&name, value)?;
    }
    if values.sudo {
        session.set_sudo(true)?;
    } else if values.no_sudo {
        session.set_sudo(false)?;
    }
    if let Some(ctx) = context {
        if let Some(dir) = &ctx.cwd {
            session.set_working_directory(dir.clone())?;
        }
        if ctx.clear {
            session.set_clear_output(true)?;
        }
    }
    log::debug!("command line: {}", session.command_line());
    Ok(session)
}

/* ---- Tests ---- */
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{"topics": {"Search": [
        {"name": "Grep", "executable": "grep", "arguments": [
            {"name": "Ignore case", "type": "boolean", "flag": "-i"},
            {"name": "Context", "type": "integer", "flag": "-C"},
            {"name": "Pattern", "type": "string", "flag": "-e", "mandatory": true},
            {"name": "Inputs", "type": "files"}
        ]}
    ]}}"#;

    fn catalog_file() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(CATALOG.as_bytes()).unwrap();
        f
    }

    #[test]
    fn catalog_path_precedence() {
        let flag = Some(PathBuf::from("/a.json"));
        let env = Some("/b.json".to_string());
        let def = Some(PathBuf::from("/c.json"));
        assert_eq!(
            pick_catalog_path(flag, env.clone(), def.clone()).unwrap(),
            PathBuf::from("/a.json")
        );
        assert_eq!(
            pick_catalog_path(None, env, def.clone()).unwrap(),
            PathBuf::from("/b.json")
        );
        assert_eq!(
            pick_catalog_path(None, Some("  ".into()), def).unwrap(),
            PathBuf::from("/c.json")
        );
        assert!(pick_catalog_path(None, None, None).is_err());
    }

    #[test]
    fn coerce_boolean() {
        assert_eq!(
            coerce_value("Yes", ArgType::Boolean).unwrap(),
            ArgumentValue::Bool(true)
        );
        assert_eq!(
            coerce_value("0", ArgType::Boolean).unwrap(),
            ArgumentValue::Bool(false)
        );
        assert!(coerce_value("maybe", ArgType::Boolean).is_err());
    }

    #[test]
    fn coerce_integer() {
        assert_eq!(
            coerce_value("42", ArgType::Integer).unwrap(),
            ArgumentValue::Integer(42)
        );
        assert!(coerce_value("x42", ArgType::Integer).is_err());
    }

    #[test]
    fn coerce_files_splits_on_commas() {
        assert_eq!(
            coerce_value("/a, /b,,/c", ArgType::Files).unwrap(),
            ArgumentValue::List(vec!["/a".into(), "/b".into(), "/c".into()])
        );
    }

    #[test]
    fn assignment_splits_at_first_equals() {
        assert_eq!(
            parse_assignment("Pattern=a=b").unwrap(),
            ("Pattern".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn values_file_yaml_merges_under_cli() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(f, "Context: 3\nPattern: from file\n\"Ignore case\": true").unwrap();
        let cat = catalog_file();
        let args = ValueArgs {
            set: vec!["Pattern=needle".into()],
            values_file: Some(f.path().to_path_buf()),
            ..Default::default()
        };
        let session = open_session(cat.path(), "Grep", &args, None).unwrap();
        assert_eq!(session.command_line(), "grep -i -C 3 -e needle");
    }

    #[test]
    fn values_file_json_typed_values() {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, r#"{{"Inputs": ["/x", "/y"], "Context": "2"}}"#).unwrap();
        let cat = catalog_file();
        let args = ValueArgs {
            values_file: Some(f.path().to_path_buf()),
            sudo: true,
            ..Default::default()
        };
        let session = open_session(cat.path(), "Search/Grep", &args, None).unwrap();
        assert_eq!(session.command_line(), "sudo grep -C 2 /x /y");
        assert_eq!(session.missing_mandatory(), vec!["Pattern"]);
    }

    #[test]
    fn unknown_argument_rejected() {
        let cat = catalog_file();
        let args = ValueArgs {
            set: vec!["Depth=3".into()],
            ..Default::default()
        };
        let err = open_session(cat.path(), "Grep", &args, None).unwrap_err();
        assert!(err.to_string().contains("Depth"));
    }

    #[test]
    fn context_flags_applied() {
        let cat = catalog_file();
        let ctx = ContextArgs {
            cwd: Some(PathBuf::from("/srv")),
            clear: true,
        };
        let mut session = open_session(cat.path(), "grep", &ValueArgs::default(), Some(&ctx))
            .unwrap();
        let (line, run_ctx) = session.prepare_run().unwrap();
        assert_eq!(line, "grep");
        assert!(run_ctx.clear_output_before_run);
        assert_eq!(run_ctx.working_directory, PathBuf::from("/srv"));
    }
}
