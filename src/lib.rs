//! Quish engine: a JSON catalog of command definitions, per-command argument
//! values, command-line synthesis and a single-slot process supervisor.
//!
//! Module map:
//!   catalog    - schema model and catalog loading
//!   store      - current argument values + run context
//!   synth      - (definition, values) -> command line
//!   session    - recompute-on-mutation glue a front end drives
//!   supervisor - spawn, stream, cancel, report
//!   preset     - snapshot current values into a new catalog entry
//!   error      - engine error types

pub mod catalog;
pub mod error;
pub mod preset;
pub mod session;
pub mod store;
pub mod supervisor;
pub mod synth;

pub use catalog::{ArgType, ArgumentSpec, ArgumentValue, Catalog, CommandSpec, Topic};
pub use error::{EngineError, Result, SpawnError, ValidationError};
pub use session::Session;
pub use store::{RunContext, ValueStore};
pub use supervisor::{ProcessState, RunExit, Supervisor, SupervisorEvent, TerminalStatus};
pub use synth::synthesize;
