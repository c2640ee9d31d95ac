//! Command line -> program + argument vector.
//!
//! parse_invocation splits with shell-word rules so that the double quotes the
//! synthesizer puts around spaced values keep them as one argument.

use shell_words::split as shell_split;
use std::fmt;

use crate::error::ValidationError;

/// A command line ready to hand to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Line as synthesized (kept for diagnostics).
    pub original: String,
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Whether the line escalates through `sudo`.
    pub fn is_sudo(&self) -> bool {
        self.program == "sudo"
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Split `line` into an [`Invocation`].
///
/// Rejects an empty line, an empty leading token (e.g. `"" -v`) and quoting
/// that does not balance.
pub fn parse_invocation(line: &str) -> Result<Invocation, ValidationError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCommandLine);
    }
    let parts =
        shell_split(trimmed).map_err(|e| ValidationError::UnbalancedQuotes(e.to_string()))?;
    let Some((program, args)) = parts.split_first() else {
        return Err(ValidationError::EmptyCommandLine);
    };
    if program.trim().is_empty() {
        return Err(ValidationError::EmptyExecutable);
    }
    Ok(Invocation {
        original: line.to_string(),
        program: program.clone(),
        args: args.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let inv = parse_invocation("ls -l /tmp").unwrap();
        assert_eq!(inv.program, "ls");
        assert_eq!(inv.args, vec!["-l", "/tmp"]);
        assert!(!inv.is_sudo());
    }

    #[test]
    fn quoted_value_stays_one_argument() {
        let inv = parse_invocation(r#"grep -e "hello world" "/tmp/my dir""#).unwrap();
        assert_eq!(inv.args, vec!["-e", "hello world", "/tmp/my dir"]);
    }

    #[test]
    fn sudo_prefix_is_the_program() {
        let inv = parse_invocation("sudo du -sh").unwrap();
        assert!(inv.is_sudo());
        assert_eq!(inv.to_string(), "sudo du -sh");
    }

    #[test]
    fn empty_line_rejected() {
        assert_eq!(
            parse_invocation("   "),
            Err(ValidationError::EmptyCommandLine)
        );
    }

    #[test]
    fn empty_program_rejected() {
        assert_eq!(
            parse_invocation(r#""" -v"#),
            Err(ValidationError::EmptyExecutable)
        );
    }

    #[test]
    fn unbalanced_quotes_rejected() {
        assert!(matches!(
            parse_invocation(r#"echo "oops"#),
            Err(ValidationError::UnbalancedQuotes(_))
        ));
    }
}
