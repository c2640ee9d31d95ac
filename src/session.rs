//! Recompute-on-mutation: one catalog, one selected command, one live line.
//!
//! Every successful write to the value store is followed by a synthesis call,
//! so `command_line()` always reflects the current values. A rejected write
//! leaves both the store and the cached line untouched.

use std::path::PathBuf;

use crate::catalog::{ArgumentValue, Catalog, CommandSpec};
use crate::error::{Result, ValidationError};
use crate::store::{RunContext, ValueStore};
use crate::synth::synthesize;

#[derive(Debug)]
struct Active {
    topic: String,
    spec: CommandSpec,
    store: ValueStore,
}

/// Editing state a front end drives.
#[derive(Debug, Default)]
pub struct Session {
    catalog: Catalog,
    active: Option<Active>,
    line: String,
}

impl Session {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            active: None,
            line: String::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replace the catalog with a freshly loaded one.
    ///
    /// On error the previous catalog and selection stay usable. On success the
    /// selection is dropped.
    pub fn reload(&mut self, loaded: Result<Catalog>) -> Result<()> {
        let catalog = loaded?;
        self.catalog = catalog;
        self.active = None;
        self.line.clear();
        Ok(())
    }

    /// Select a command (`name` or `topic/name`) and seed its values.
    pub fn select(&mut self, reference: &str) -> Result<&str> {
        let (topic, spec) = self.catalog.resolve(reference)?;
        let store = ValueStore::seed(spec);
        self.active = Some(Active {
            topic: topic.to_string(),
            spec: spec.clone(),
            store,
        });
        log::debug!("selected '{}'", reference);
        Ok(self.recompute())
    }

    pub fn selected(&self) -> Option<&CommandSpec> {
        self.active.as_ref().map(|a| &a.spec)
    }

    pub fn selected_topic(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.topic.as_str())
    }

    pub fn store(&self) -> Option<&ValueStore> {
        self.active.as_ref().map(|a| &a.store)
    }

    pub fn get(&self, name: &str) -> Result<&ArgumentValue> {
        let active = self.active()?;
        Ok(active.store.get(name)?)
    }

    pub fn set(&mut self, name: &str, value: ArgumentValue) -> Result<&str> {
        self.active_mut()?.store.set(name, value)?;
        Ok(self.recompute())
    }

    pub fn set_sudo(&mut self, on: bool) -> Result<&str> {
        self.active_mut()?.store.set_sudo(on);
        Ok(self.recompute())
    }

    pub fn set_clear_output(&mut self, on: bool) -> Result<&str> {
        self.active_mut()?.store.set_clear_output(on);
        Ok(self.recompute())
    }

    pub fn set_working_directory(&mut self, dir: impl Into<PathBuf>) -> Result<&str> {
        self.active_mut()?.store.set_working_directory(dir);
        Ok(self.recompute())
    }

    /// Latest synthesized line (empty when nothing is selected).
    pub fn command_line(&self) -> &str {
        &self.line
    }

    /// Re-synthesize and return the line together with its run context, as
    /// done immediately before spawning.
    ///
    /// A command without an executable is rejected here: its line would start
    /// with `sudo` or a positional value, which the supervisor cannot tell
    /// apart from a real program.
    pub fn prepare_run(&mut self) -> Result<(String, RunContext)> {
        let active = self.active()?;
        if active.spec.executable().is_err() {
            return Err(ValidationError::EmptyExecutable.into());
        }
        let ctx = active.store.run_context();
        let line = self.recompute().to_string();
        Ok((line, ctx))
    }

    /// Advisory list of mandatory arguments still empty.
    pub fn missing_mandatory(&self) -> Vec<&str> {
        match &self.active {
            Some(a) => a.store.missing_mandatory(&a.spec),
            None => Vec::new(),
        }
    }

    fn recompute(&mut self) -> &str {
        self.line = match &self.active {
            Some(a) => synthesize(&a.spec, &a.store),
            None => String::new(),
        };
        log::trace!("command line: {}", self.line);
        &self.line
    }

    fn active(&self) -> std::result::Result<&Active, ValidationError> {
        self.active.as_ref().ok_or(ValidationError::NoCommandSelected)
    }

    fn active_mut(&mut self) -> std::result::Result<&mut Active, ValidationError> {
        self.active.as_mut().ok_or(ValidationError::NoCommandSelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::from_value(&json!({"topics": {"Files": [
            {"name": "List", "executable": "ls", "arguments": [
                {"name": "Long", "type": "boolean", "flag": "-l", "default": true},
                {"name": "Path", "type": "folder", "mandatory": true}
            ]},
            {"name": "Copy", "executable": "cp", "arguments": []},
            {"name": "Bare", "executable": "  ", "arguments": [
                {"name": "P", "type": "string", "default": "echo"}
            ]}
        ]}}))
        .unwrap()
    }

    #[test]
    fn every_write_recomputes_line() {
        let mut s = Session::new(catalog());
        assert_eq!(s.select("List").unwrap(), "ls -l");
        assert_eq!(
            s.set("Path", ArgumentValue::Text("/tmp/a b".into()))
                .unwrap(),
            "ls -l \"/tmp/a b\""
        );
        assert_eq!(s.set_sudo(true).unwrap(), "sudo ls -l \"/tmp/a b\"");
        assert_eq!(s.command_line(), "sudo ls -l \"/tmp/a b\"");
        assert_eq!(s.selected_topic(), Some("Files"));
    }

    #[test]
    fn rejected_write_keeps_line() {
        let mut s = Session::new(catalog());
        s.select("List").unwrap();
        let err = s.set("Nope", ArgumentValue::Bool(true)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::UnknownArgument(_))
        ));
        assert_eq!(s.command_line(), "ls -l");
    }

    #[test]
    fn selecting_another_command_discards_values() {
        let mut s = Session::new(catalog());
        s.select("List").unwrap();
        s.set("Long", ArgumentValue::Bool(false)).unwrap();
        assert_eq!(s.select("Copy").unwrap(), "cp");
        assert_eq!(s.select("List").unwrap(), "ls -l");
    }

    #[test]
    fn writes_without_selection_rejected() {
        let mut s = Session::new(catalog());
        assert!(matches!(
            s.set_sudo(true),
            Err(EngineError::Validation(ValidationError::NoCommandSelected))
        ));
        assert!(s.prepare_run().is_err());
    }

    #[test]
    fn failed_reload_keeps_previous_state() {
        let mut s = Session::new(catalog());
        s.select("List").unwrap();
        let bad = Catalog::from_value(&json!({"no_topics": true}));
        assert!(s.reload(bad).is_err());
        assert_eq!(s.command_line(), "ls -l");
        assert_eq!(s.catalog().len(), 3);
    }

    #[test]
    fn prepare_run_returns_context() {
        let mut s = Session::new(catalog());
        s.select("List").unwrap();
        s.set_clear_output(true).unwrap();
        s.set_working_directory("/srv").unwrap();
        let (line, ctx) = s.prepare_run().unwrap();
        assert_eq!(line, "ls -l");
        assert!(ctx.clear_output_before_run);
        assert_eq!(ctx.working_directory, PathBuf::from("/srv"));
        assert_eq!(s.missing_mandatory(), vec!["Path"]);
    }

    #[test]
    fn run_without_executable_rejected() {
        let mut s = Session::new(catalog());
        assert_eq!(s.select("Bare").unwrap(), "echo");
        assert!(matches!(
            s.prepare_run(),
            Err(EngineError::Validation(ValidationError::EmptyExecutable))
        ));
    }

    #[test]
    fn sudo_does_not_stand_in_for_missing_executable() {
        let mut s = Session::new(catalog());
        s.select("Bare").unwrap();
        s.set("P", ArgumentValue::Text(String::new())).unwrap();
        assert_eq!(s.set_sudo(true).unwrap(), "sudo");
        assert!(matches!(
            s.prepare_run(),
            Err(EngineError::Validation(ValidationError::EmptyExecutable))
        ));
    }
}
