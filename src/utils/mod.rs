//! Utilities: stderr logger behind the `log` facade (dynamic level).
//!
//! Key items:
//!   init_logging / derive_level

use std::time::{SystemTime, UNIX_EPOCH};

/// Logging helpers.
pub mod logging {
    use super::*;
    use log::{LevelFilter, Log, Metadata, Record};

    struct StderrLogger;

    static LOGGER: StderrLogger = StderrLogger;

    fn timestamp() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }

    /// `[LEVEL][epoch-ms] message`, one line per record.
    pub fn format_record(level: log::Level, ts: u128, msg: &std::fmt::Arguments<'_>) -> String {
        format!("[{}][{}] {}", level.as_str(), ts, msg)
    }

    impl Log for StderrLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            // stdout carries child output and --json documents
            eprintln!("{}", format_record(record.level(), timestamp(), record.args()));
        }

        fn flush(&self) {}
    }

    /// Install the logger. Calling twice only updates the level.
    pub fn init_logging(level: LevelFilter) {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(level);
    }

    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Error;
        }
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

pub use logging::{derive_level, init_logging};

#[cfg(test)]
mod tests {
    use super::logging::*;
    use log::{Level, LevelFilter};

    #[test]
    fn level_from_flags() {
        assert_eq!(derive_level(0, false), LevelFilter::Info);
        assert_eq!(derive_level(1, false), LevelFilter::Debug);
        assert_eq!(derive_level(4, false), LevelFilter::Trace);
        assert_eq!(derive_level(2, true), LevelFilter::Error);
    }

    #[test]
    fn record_layout() {
        let line = format_record(Level::Warn, 42, &format_args!("catalog {}", "missing"));
        assert_eq!(line, "[WARN][42] catalog missing");
    }
}
