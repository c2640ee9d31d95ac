/*!
Subject enum for the `list` subcommand.

Variants:
  topics   (topic names with command counts)
  commands (every command, optionally filtered by topic)

Display matches the clap value name and is used as the JSON `subject` field.
*/

use std::fmt;

/// What `quish list` enumerates.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Subject {
    /// Catalog topics
    Topics,
    /// Commands across topics
    Commands,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Subject::Topics => "topics",
            Subject::Commands => "commands",
        };
        f.write_str(s)
    }
}
