//! Schema model: the catalog document and the command definitions it holds.
//!
//! Catalog::from_json_str / Catalog::load -> topics (insertion order) -> CommandSpec
//! (array order) -> ArgumentSpec (emission order).
//!
//! Everything here is immutable once loaded; runtime values live in `store`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{EngineError, Result, ValidationError};

/// Folder (under the user's home) holding the default catalog.
pub const APP_FOLDER: &str = ".Quish";
/// Default catalog file name inside [`APP_FOLDER`].
pub const CATALOG_FILE: &str = "config.json";

/* ---- Argument types / values ---- */

/// Declared type of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    String,
    RawString,
    Integer,
    Boolean,
    File,
    Folder,
    NewFile,
    NewFolder,
    Files,
}

impl ArgType {
    pub const fn variants() -> &'static [ArgType] {
        &[
            ArgType::String,
            ArgType::RawString,
            ArgType::Integer,
            ArgType::Boolean,
            ArgType::File,
            ArgType::Folder,
            ArgType::NewFile,
            ArgType::NewFolder,
            ArgType::Files,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::RawString => "raw_string",
            ArgType::Integer => "integer",
            ArgType::Boolean => "boolean",
            ArgType::File => "file",
            ArgType::Folder => "folder",
            ArgType::NewFile => "newfile",
            ArgType::NewFolder => "newfolder",
            ArgType::Files => "files",
        }
    }

    /// Types whose value is a single line of text.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ArgType::String
                | ArgType::RawString
                | ArgType::File
                | ArgType::Folder
                | ArgType::NewFile
                | ArgType::NewFolder
        )
    }

    /// Value a freshly selected command starts with when no default is given.
    pub fn empty_value(&self) -> ArgumentValue {
        match self {
            ArgType::Integer => ArgumentValue::Integer(0),
            ArgType::Boolean => ArgumentValue::Bool(false),
            ArgType::Files => ArgumentValue::List(Vec::new()),
            _ => ArgumentValue::Text(String::new()),
        }
    }

    /// Human description of the accepted value shape (error messages).
    pub fn expected(&self) -> &'static str {
        match self {
            ArgType::Integer => "an integer",
            ArgType::Boolean => "a boolean",
            ArgType::Files => "a list of paths",
            _ => "a string",
        }
    }

    /// Whether `value` has the shape this type stores.
    pub fn accepts(&self, value: &ArgumentValue) -> bool {
        match value {
            ArgumentValue::Text(_) => self.is_text(),
            ArgumentValue::Integer(_) => matches!(self, ArgType::Integer),
            ArgumentValue::Bool(_) => matches!(self, ArgType::Boolean),
            ArgumentValue::List(_) => matches!(self, ArgType::Files),
        }
    }
}

impl FromStr for ArgType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ArgType::variants()
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown argument type '{s}'"))
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One runtime (or default) value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
}

impl ArgumentValue {
    /// Coerce a JSON value into the shape `ty` stores.
    ///
    /// Strings accept numbers and booleans (stringified), integers accept
    /// numeric strings, booleans accept "true"/"false", and `files` accepts
    /// either an array of strings or a single string.
    pub fn from_json(ty: ArgType, value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match ty {
            ArgType::Boolean => match value {
                Value::Bool(b) => Some(ArgumentValue::Bool(*b)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(ArgumentValue::Bool(true)),
                    "false" => Some(ArgumentValue::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            ArgType::Integer => match value {
                Value::Number(n) => n.as_i64().map(ArgumentValue::Integer),
                Value::String(s) if s.trim().is_empty() => Some(ArgumentValue::Integer(0)),
                Value::String(s) => s.trim().parse().ok().map(ArgumentValue::Integer),
                _ => None,
            },
            ArgType::Files => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(ArgumentValue::List),
                Value::String(s) if s.is_empty() => Some(ArgumentValue::List(Vec::new())),
                Value::String(s) => Some(ArgumentValue::List(vec![s.clone()])),
                _ => None,
            },
            _ => match value {
                Value::String(s) => Some(ArgumentValue::Text(s.clone())),
                Value::Number(n) => Some(ArgumentValue::Text(n.to_string())),
                Value::Bool(b) => Some(ArgumentValue::Text(b.to_string())),
                _ => None,
            },
        }
    }

    /// Empty in the synthesis sense: produces no token.
    ///
    /// `Integer(0)` counts as empty, so an integer argument can never emit an
    /// explicit zero (`-c 0` is unreachable; leave the argument unset instead).
    pub fn is_empty(&self) -> bool {
        match self {
            ArgumentValue::Text(s) => s.is_empty(),
            ArgumentValue::Integer(n) => *n == 0,
            ArgumentValue::Bool(b) => !b,
            ArgumentValue::List(items) => items.iter().all(|p| p.is_empty()),
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, ArgumentValue::Bool(true))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ArgumentValue::Text(s) => serde_json::Value::String(s.clone()),
            ArgumentValue::Integer(n) => serde_json::Value::from(*n),
            ArgumentValue::Bool(b) => serde_json::Value::Bool(*b),
            ArgumentValue::List(items) => serde_json::Value::from(items.clone()),
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::Text(s) => f.write_str(s),
            ArgumentValue::Integer(n) => write!(f, "{n}"),
            ArgumentValue::Bool(b) => write!(f, "{b}"),
            ArgumentValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/* ---- Argument / command definitions ---- */

/// Static description of one configurable parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawArgument", into = "RawArgument")]
pub struct ArgumentSpec {
    pub name: String,
    pub arg_type: ArgType,
    /// Literal token emitted before the value (e.g. `-v`).
    pub flag: Option<String>,
    pub exclusive_group: Option<String>,
    /// Advisory only; never blocks a run.
    pub mandatory: bool,
    pub default: Option<ArgumentValue>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, arg_type: ArgType) -> Self {
        Self {
            name: name.into(),
            arg_type,
            flag: None,
            exclusive_group: None,
            mandatory: false,
            default: None,
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.exclusive_group = Some(group.into());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_default(mut self, value: ArgumentValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Default if declared, otherwise the type's empty value.
    pub fn initial_value(&self) -> ArgumentValue {
        self.default
            .clone()
            .unwrap_or_else(|| self.arg_type.empty_value())
    }

    /// Boolean member of an exclusive group.
    pub fn is_exclusive(&self) -> bool {
        self.arg_type == ArgType::Boolean && self.exclusive_group.is_some()
    }
}

/// Wire form of [`ArgumentSpec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawArgument {
    name: String,
    #[serde(rename = "type")]
    arg_type: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    flag: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    exclusive_group: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<serde_json::Value>,
}

impl TryFrom<RawArgument> for ArgumentSpec {
    type Error = String;

    fn try_from(raw: RawArgument) -> std::result::Result<Self, Self::Error> {
        let arg_type: ArgType = raw
            .arg_type
            .parse()
            .map_err(|e| format!("argument '{}': {e}", raw.name))?;
        let default = match raw.default {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(ArgumentValue::from_json(arg_type, &v).ok_or_else(|| {
                format!(
                    "argument '{}': default {v} is not {}",
                    raw.name,
                    arg_type.expected()
                )
            })?),
        };
        Ok(ArgumentSpec {
            name: raw.name,
            arg_type,
            flag: raw.flag,
            exclusive_group: raw.exclusive_group,
            mandatory: raw.mandatory,
            default,
        })
    }
}

impl From<ArgumentSpec> for RawArgument {
    fn from(spec: ArgumentSpec) -> Self {
        RawArgument {
            name: spec.name,
            arg_type: spec.arg_type.as_str().to_string(),
            flag: spec.flag,
            exclusive_group: spec.exclusive_group,
            mandatory: spec.mandatory,
            default: spec.default.map(|v| v.to_json()),
        }
    }
}

/// Flags and group ids written as "" by older presets mean "absent".
fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(T::from))
}

/// One runnable command definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    /// May be empty in the document; rejected by [`CommandSpec::executable`].
    #[serde(rename = "executable", default)]
    pub raw_executable: String,
    #[serde(rename = "sudo", default, skip_serializing_if = "std::ops::Not::not")]
    pub sudo_default: bool,
    #[serde(
        rename = "clear_output",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub clear_output_default: bool,
    #[serde(
        rename = "working_directory",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub working_directory: Option<PathBuf>,
    #[serde(
        rename = "man",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub man_page: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_executable: executable.into(),
            sudo_default: false,
            clear_output_default: false,
            working_directory: None,
            man_page: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, arg: ArgumentSpec) -> Self {
        self.arguments.push(arg);
        self
    }

    /// The executable, or a schema error when the definition left it empty.
    pub fn executable(&self) -> Result<&str> {
        let exe = self.raw_executable.trim();
        if exe.is_empty() {
            return Err(EngineError::schema(format!(
                "command '{}' has no executable",
                self.name
            )));
        }
        Ok(exe)
    }

    /// Declared working directory (with `~` expanded) or the user's home.
    pub fn working_directory_default(&self) -> PathBuf {
        match &self.working_directory {
            Some(dir) => expand_home(dir),
            None => home_dir(),
        }
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Exclusive group ids in first-appearance order.
    pub fn exclusive_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for arg in self.arguments.iter().filter(|a| a.is_exclusive()) {
            if let Some(g) = arg.exclusive_group.as_deref()
                && !groups.contains(&g)
            {
                groups.push(g);
            }
        }
        groups
    }

    pub fn mandatory_arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments.iter().filter(|a| a.mandatory)
    }
}

/* ---- Catalog ---- */

/// Named list of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub commands: Vec<CommandSpec>,
}

/// Full catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    topics: Vec<Topic>,
}

impl Catalog {
    /// Parse a catalog from raw JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| EngineError::schema(format!("invalid JSON: {e}")))?;
        Self::from_value(&doc)
    }

    /// Build from an already parsed document.
    pub fn from_value(doc: &serde_json::Value) -> Result<Self> {
        let topics_obj = doc
            .get("topics")
            .ok_or_else(|| EngineError::schema("'topics' object not found"))?
            .as_object()
            .ok_or_else(|| EngineError::schema("'topics' must be an object"))?;

        let mut topics = Vec::with_capacity(topics_obj.len());
        for (topic_name, entries) in topics_obj {
            let arr = entries.as_array().ok_or_else(|| {
                EngineError::schema(format!("topic '{topic_name}' must be an array of commands"))
            })?;
            let mut commands = Vec::with_capacity(arr.len());
            for (idx, entry) in arr.iter().enumerate() {
                let cmd: CommandSpec = serde_json::from_value(entry.clone()).map_err(|e| {
                    EngineError::schema(format!("topic '{topic_name}', command #{idx}: {e}"))
                })?;
                commands.push(cmd);
            }
            topics.push(Topic {
                name: topic_name.clone(),
                commands,
            });
        }
        log::debug!("catalog parsed: {} topic(s)", topics.len());
        Ok(Catalog { topics })
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let catalog = Self::from_json_str(&raw)?;
        log::info!(
            "loaded catalog {} ({} commands)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn commands(&self, topic: &str) -> Option<&[CommandSpec]> {
        self.topics
            .iter()
            .find(|t| t.name == topic)
            .map(|t| t.commands.as_slice())
    }

    /// Iterate `(topic, command)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandSpec)> {
        self.topics
            .iter()
            .flat_map(|t| t.commands.iter().map(move |c| (t.name.as_str(), c)))
    }

    /// Total number of commands over all topics.
    pub fn len(&self) -> usize {
        self.topics.iter().map(|t| t.commands.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First command with this name in topic order; exact match wins over a
    /// case-insensitive one.
    pub fn find(&self, name: &str) -> Option<(&str, &CommandSpec)> {
        self.iter()
            .find(|(_, c)| c.name == name)
            .or_else(|| self.iter().find(|(_, c)| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn find_in(&self, topic: &str, name: &str) -> Option<&CommandSpec> {
        let commands = self.commands(topic)?;
        commands
            .iter()
            .find(|c| c.name == name)
            .or_else(|| commands.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Resolve `name` or `topic/name`.
    pub fn resolve(&self, reference: &str) -> Result<(&str, &CommandSpec)> {
        let reference = reference.trim();
        if let Some(found) = self.find(reference) {
            return Ok(found);
        }
        if let Some((topic, name)) = reference.split_once('/')
            && let Some(cmd) = self.find_in(topic.trim(), name.trim())
        {
            let topic_name = self
                .topics
                .iter()
                .find(|t| t.name == topic.trim())
                .map(|t| t.name.as_str())
                .unwrap_or_default();
            return Ok((topic_name, cmd));
        }
        Err(ValidationError::UnknownCommand(reference.to_string()).into())
    }
}

/* ---- Paths ---- */

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// `~/.Quish/config.json`, if a home directory is known.
pub fn default_catalog_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_FOLDER).join(CATALOG_FILE))
}
