#![deny(missing_docs)]

//! Log output for `tape`.
//!
//! Logs go to stderr so that stdout only ever carries command output,
//! which keeps `tape render` and `--format json` pipeable.

mod format;

pub use tracing_core::Level;

/// The log levels accepted by `--log`, quietest first.
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Installs the global subscriber for `level`.
///
/// Without a level nothing is installed and no logs are printed.
/// Calling this twice keeps the first subscriber.
pub fn init(level: Option<Level>) {
    if let Some(level) = level {
        format::LogFormat::for_level(level).install(level);
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use tracing_core::metadata::ParseLevelError;

    use super::{init, Level, LEVELS};

    #[test]
    fn every_listed_level_parses() -> Result<(), ParseLevelError> {
        for level in &LEVELS {
            Level::from_str(level)?;
        }
        Ok(())
    }

    #[test]
    fn init_can_run_more_than_once() {
        init(Some(Level::DEBUG));
        init(Some(Level::TRACE));
        init(None);
    }
}
