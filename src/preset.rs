//! Presets: a new command whose defaults are a snapshot of the current values.
//!
//! build_preset picks the run-context entries and arguments to keep;
//! append_to_document / save_document write it back into a catalog file while
//! leaving the rest of the document (and its key order) untouched.

use std::path::Path;

use crate::catalog::{ArgType, ArgumentValue, Catalog, CommandSpec};
use crate::error::{EngineError, Result, ValidationError};
use crate::store::ValueStore;

/// Special names accepted next to argument names.
pub const SUDO_ENTRY: &str = "sudo";
pub const CLEAR_OUTPUT_ENTRY: &str = "clear_output";
pub const WORKING_DIRECTORY_ENTRY: &str = "working_directory";

/// What to carry into a preset. Mandatory arguments are always carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetSelection {
    pub sudo: bool,
    pub clear_output: bool,
    pub working_directory: bool,
    pub arguments: Vec<String>,
}

impl PresetSelection {
    /// Split a flat list of names into special entries and argument names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut sel = PresetSelection::default();
        for name in names {
            match name.as_ref().trim() {
                SUDO_ENTRY => sel.sudo = true,
                CLEAR_OUTPUT_ENTRY => sel.clear_output = true,
                WORKING_DIRECTORY_ENTRY => sel.working_directory = true,
                other => sel.arguments.push(other.to_string()),
            }
        }
        sel
    }

    fn includes(&self, name: &str) -> bool {
        self.arguments.iter().any(|a| a == name)
    }
}

/// Derive a preset named `name` from `spec` and its current `values`.
///
/// Arguments keep their declaration order. A member of an exclusive group is
/// carried only when it is the selected one.
pub fn build_preset(
    spec: &CommandSpec,
    values: &ValueStore,
    name: &str,
    selection: &PresetSelection,
) -> Result<CommandSpec> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyPresetName.into());
    }
    if let Some(unknown) = selection
        .arguments
        .iter()
        .find(|a| spec.argument(a).is_none())
    {
        return Err(ValidationError::UnknownArgument(unknown.clone()).into());
    }

    let mut preset = CommandSpec::new(name, spec.raw_executable.clone());
    preset.man_page = spec.man_page.clone();
    if selection.sudo {
        preset.sudo_default = values.sudo();
    }
    if selection.clear_output {
        preset.clear_output_default = values.clear_output();
    }
    if selection.working_directory {
        preset.working_directory = Some(values.working_directory().clone());
    }

    for arg in &spec.arguments {
        if !(arg.mandatory || selection.includes(&arg.name)) {
            continue;
        }
        let mut kept = arg.clone();
        if let (ArgType::Boolean, Some(group)) = (arg.arg_type, arg.exclusive_group.as_deref()) {
            if values.selected(group) != Some(arg.name.as_str()) {
                continue;
            }
            kept.default = Some(ArgumentValue::Bool(true));
        } else {
            kept.default = Some(values.get(&arg.name)?.clone());
        }
        preset.arguments.push(kept);
    }
    log::debug!(
        "built preset '{}' with {} argument(s)",
        preset.name,
        preset.arguments.len()
    );
    Ok(preset)
}

/// Insert `preset` under `topics.<topic>`, creating the topic if needed.
///
/// The document must remain a valid catalog afterwards.
pub fn append_to_document(
    doc: &mut serde_json::Value,
    topic: &str,
    preset: &CommandSpec,
) -> Result<()> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| EngineError::schema("catalog root must be an object"))?;
    let topics = root
        .entry("topics")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .ok_or_else(|| EngineError::schema("'topics' must be an object"))?;
    let commands = topics
        .entry(topic)
        .or_insert_with(|| serde_json::json!([]))
        .as_array_mut()
        .ok_or_else(|| {
            EngineError::schema(format!("topic '{topic}' must be an array of commands"))
        })?;

    let exists = commands
        .iter()
        .any(|c| c.get("name").and_then(|v| v.as_str()) == Some(preset.name.as_str()));
    if exists {
        return Err(ValidationError::DuplicateCommand {
            topic: topic.to_string(),
            name: preset.name.clone(),
        }
        .into());
    }

    let value = serde_json::to_value(preset)
        .map_err(|e| EngineError::schema(format!("cannot serialize preset: {e}")))?;
    commands.push(value);
    Catalog::from_value(doc)?;
    Ok(())
}

/// Read a catalog file as a raw JSON document.
pub fn load_document(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| EngineError::schema(format!("invalid JSON: {e}")))
}

/// Write a catalog document as pretty JSON.
pub fn save_document(path: &Path, doc: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(doc)
        .map_err(|e| EngineError::schema(format!("cannot serialize catalog: {e}")))?;
    std::fs::write(path, text + "\n").map_err(|e| EngineError::io(path, e))?;
    log::info!("catalog written to {}", path.display());
    Ok(())
}
