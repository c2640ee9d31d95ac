//! Error taxonomy shared by the engine modules.
//!
//! Loading and editing failures are returned synchronously. Spawn failures
//! never surface here: they travel inside the terminal status of the run
//! (see `supervisor::RunExit::SpawnFailed`), and a non-zero exit code is not
//! an error at all.

use std::path::PathBuf;

use thiserror::Error;

/// Rejections of a single operation. The engine state is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing to run.
    #[error("command line is empty")]
    EmptyCommandLine,
    /// The leading token of the command line is empty.
    #[error("command line has an empty executable")]
    EmptyExecutable,
    /// The command line cannot be split into words.
    #[error("command line has unbalanced quoting: {0}")]
    UnbalancedQuotes(String),
    /// Argument name not present in the active command.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    /// Value shape does not match the declared argument type.
    #[error("argument '{name}' expects {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    /// Command name not present in the catalog.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// An operation needs a selected command.
    #[error("no command selected")]
    NoCommandSelected,
    /// Preset saved without a name.
    #[error("preset name cannot be empty")]
    EmptyPresetName,
    /// A command with this name already exists in the target topic.
    #[error("command '{name}' already exists in topic '{topic}'")]
    DuplicateCommand { topic: String, name: String },
}

/// Failure to start a process. Carried by the terminal status, never thrown.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to start '{program}': {message}")]
pub struct SpawnError {
    pub program: String,
    pub message: String,
}

/// Top-level engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed catalog document.
    #[error("schema error: {0}")]
    Schema(String),
    /// Operation rejected, see [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// `run()` while a process is still running.
    #[error("a process is already running")]
    Busy,
    /// Catalog file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn schema(msg: impl Into<String>) -> Self {
        EngineError::Schema(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, EngineError::Busy)
    }
}

/// A typed result used across the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_converts_into_engine_error() {
        let err: EngineError = ValidationError::UnknownArgument("Depth".into()).into();
        assert_eq!(err.to_string(), "unknown argument: Depth");
        assert!(!err.is_busy());
    }

    #[test]
    fn io_error_names_path() {
        let err = EngineError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().starts_with("/tmp/missing.json"));
    }

    #[test]
    fn spawn_error_message() {
        let err = SpawnError {
            program: "nope".into(),
            message: "No such file or directory".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to start 'nope': No such file or directory"
        );
    }
}
