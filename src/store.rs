//! Argument value store: the mutable runtime state behind one selected command.
//!
//! The store only guarantees consistency (typed values, one selected member per
//! exclusive group). It never synthesizes; `session::Session` re-runs the
//! synthesizer after every write.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::catalog::{ArgType, ArgumentValue, CommandSpec};
use crate::error::ValidationError;

/// Per-run settings copied out of the store when a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub sudo: bool,
    pub clear_output_before_run: bool,
    pub working_directory: PathBuf,
}

/// Values for the arguments of one command.
#[derive(Debug, Clone)]
pub struct ValueStore {
    command: String,
    types: HashMap<String, (ArgType, Option<String>)>,
    values: HashMap<String, ArgumentValue>,
    /// group id -> selected member name
    groups: HashMap<String, Option<String>>,
    sudo: bool,
    clear_output: bool,
    working_directory: PathBuf,
}

impl ValueStore {
    /// Fresh store for `spec`: defaults (or empty values) plus run-context defaults.
    ///
    /// When several members of one exclusive group default to `true`, the first
    /// in declaration order is selected and the others start off.
    pub fn seed(spec: &CommandSpec) -> Self {
        let mut store = ValueStore {
            command: spec.name.clone(),
            types: HashMap::with_capacity(spec.arguments.len()),
            values: HashMap::with_capacity(spec.arguments.len()),
            groups: HashMap::new(),
            sudo: spec.sudo_default,
            clear_output: spec.clear_output_default,
            working_directory: spec.working_directory_default(),
        };

        for arg in &spec.arguments {
            store.types.insert(
                arg.name.clone(),
                (arg.arg_type, arg.exclusive_group.clone()),
            );
            let mut value = arg.initial_value();
            if arg.is_exclusive()
                && let Some(group) = arg.exclusive_group.as_deref()
            {
                let slot = store.groups.entry(group.to_string()).or_insert(None);
                if value.as_bool() {
                    if slot.is_none() {
                        *slot = Some(arg.name.clone());
                    } else {
                        value = ArgumentValue::Bool(false);
                    }
                }
            }
            store.values.insert(arg.name.clone(), value);
        }
        log::trace!(
            "seeded {} value(s) for '{}'",
            store.values.len(),
            store.command
        );
        store
    }

    /// Name of the command this store was seeded from.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn get(&self, name: &str) -> Result<&ArgumentValue, ValidationError> {
        self.values
            .get(name)
            .ok_or_else(|| ValidationError::UnknownArgument(name.to_string()))
    }

    /// Overwrite one value.
    ///
    /// For a boolean in an exclusive group, `true` selects it and clears the
    /// previous member in the same call; `false` on the selected member leaves
    /// the group without a selection.
    pub fn set(&mut self, name: &str, value: ArgumentValue) -> Result<(), ValidationError> {
        let (ty, group) = self
            .types
            .get(name)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownArgument(name.to_string()))?;
        if !ty.accepts(&value) {
            return Err(ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: ty.expected(),
            });
        }

        if let (ArgType::Boolean, Some(group)) = (ty, group) {
            let on = value.as_bool();
            let previous = self.groups.get(&group).cloned().flatten();
            if on {
                if let Some(prev) = previous.as_deref()
                    && prev != name
                {
                    self.values
                        .insert(prev.to_string(), ArgumentValue::Bool(false));
                }
                self.groups.insert(group, Some(name.to_string()));
            } else if previous.as_deref() == Some(name) {
                self.groups.insert(group, None);
            }
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Selected member of an exclusive group.
    pub fn selected(&self, group: &str) -> Option<&str> {
        self.groups.get(group).and_then(|s| s.as_deref())
    }

    pub fn sudo(&self) -> bool {
        self.sudo
    }

    pub fn set_sudo(&mut self, on: bool) {
        self.sudo = on;
    }

    pub fn clear_output(&self) -> bool {
        self.clear_output
    }

    pub fn set_clear_output(&mut self, on: bool) {
        self.clear_output = on;
    }

    pub fn working_directory(&self) -> &PathBuf {
        &self.working_directory
    }

    pub fn set_working_directory(&mut self, dir: impl Into<PathBuf>) {
        self.working_directory = dir.into();
    }

    pub fn run_context(&self) -> RunContext {
        RunContext {
            sudo: self.sudo,
            clear_output_before_run: self.clear_output,
            working_directory: self.working_directory.clone(),
        }
    }

    /// Mandatory arguments of `spec` whose current value is empty.
    ///
    /// Booleans are skipped: a checkbox always carries a value. Advisory only;
    /// callers decide whether to enforce it.
    pub fn missing_mandatory<'a>(&self, spec: &'a CommandSpec) -> Vec<&'a str> {
        spec.mandatory_arguments()
            .filter(|a| a.arg_type != ArgType::Boolean)
            .filter(|a| self.values.get(&a.name).is_none_or(|v| v.is_empty()))
            .map(|a| a.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ArgumentSpec;

    fn ping() -> CommandSpec {
        CommandSpec::new("Ping", "ping")
            .with_argument(
                ArgumentSpec::new("Count", ArgType::Integer)
                    .with_flag("-c")
                    .with_default(ArgumentValue::Integer(4)),
            )
            .with_argument(
                ArgumentSpec::new("V4", ArgType::Boolean)
                    .with_flag("-4")
                    .in_group("ip"),
            )
            .with_argument(
                ArgumentSpec::new("V6", ArgType::Boolean)
                    .with_flag("-6")
                    .in_group("ip"),
            )
            .with_argument(ArgumentSpec::new("Host", ArgType::String).mandatory())
            .with_argument(ArgumentSpec::new("Extra", ArgType::Files))
    }

    #[test]
    fn seed_uses_defaults_and_empty_values() {
        let store = ValueStore::seed(&ping());
        assert_eq!(store.get("Count").unwrap(), &ArgumentValue::Integer(4));
        assert_eq!(store.get("V4").unwrap(), &ArgumentValue::Bool(false));
        assert_eq!(store.get("Host").unwrap(), &ArgumentValue::Text(String::new()));
        assert_eq!(store.get("Extra").unwrap(), &ArgumentValue::List(vec![]));
        assert_eq!(store.selected("ip"), None);
        assert_eq!(store.command(), "Ping");
    }

    #[test]
    fn seed_selects_first_true_member_only() {
        let spec = CommandSpec::new("x", "x")
            .with_argument(
                ArgumentSpec::new("A", ArgType::Boolean)
                    .in_group("g")
                    .with_default(ArgumentValue::Bool(true)),
            )
            .with_argument(
                ArgumentSpec::new("B", ArgType::Boolean)
                    .in_group("g")
                    .with_default(ArgumentValue::Bool(true)),
            );
        let store = ValueStore::seed(&spec);
        assert_eq!(store.selected("g"), Some("A"));
        assert!(!store.get("B").unwrap().as_bool());
    }

    #[test]
    fn selecting_member_clears_previous() {
        let mut store = ValueStore::seed(&ping());
        store.set("V4", ArgumentValue::Bool(true)).unwrap();
        assert_eq!(store.selected("ip"), Some("V4"));
        store.set("V6", ArgumentValue::Bool(true)).unwrap();
        assert_eq!(store.selected("ip"), Some("V6"));
        assert!(!store.get("V4").unwrap().as_bool());
        assert!(store.get("V6").unwrap().as_bool());
    }

    #[test]
    fn deselecting_other_member_keeps_selection() {
        let mut store = ValueStore::seed(&ping());
        store.set("V4", ArgumentValue::Bool(true)).unwrap();
        store.set("V6", ArgumentValue::Bool(false)).unwrap();
        assert_eq!(store.selected("ip"), Some("V4"));
        store.set("V4", ArgumentValue::Bool(false)).unwrap();
        assert_eq!(store.selected("ip"), None);
    }

    #[test]
    fn unknown_name_and_wrong_shape_rejected() {
        let mut store = ValueStore::seed(&ping());
        assert_eq!(
            store.set("Nope", ArgumentValue::Bool(true)),
            Err(ValidationError::UnknownArgument("Nope".into()))
        );
        assert!(matches!(
            store.set("Count", ArgumentValue::Text("four".into())),
            Err(ValidationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get("Nope"),
            Err(ValidationError::UnknownArgument(_))
        ));
        // failed write leaves the old value
        assert_eq!(store.get("Count").unwrap(), &ArgumentValue::Integer(4));
    }

    #[test]
    fn run_context_copies_special_entries() {
        let mut spec = ping();
        spec.sudo_default = true;
        spec.working_directory = Some(PathBuf::from("/var/tmp"));
        let mut store = ValueStore::seed(&spec);
        store.set_clear_output(true);
        let ctx = store.run_context();
        assert!(ctx.sudo);
        assert!(ctx.clear_output_before_run);
        assert_eq!(ctx.working_directory, PathBuf::from("/var/tmp"));

        store.set_sudo(false);
        store.set_working_directory("/srv");
        assert!(!store.run_context().sudo);
        assert_eq!(store.working_directory(), &PathBuf::from("/srv"));
    }

    #[test]
    fn missing_mandatory_is_advisory_list() {
        let spec = ping();
        let mut store = ValueStore::seed(&spec);
        assert_eq!(store.missing_mandatory(&spec), vec!["Host"]);
        store
            .set("Host", ArgumentValue::Text("example.org".into()))
            .unwrap();
        assert!(store.missing_mandatory(&spec).is_empty());
    }
}
