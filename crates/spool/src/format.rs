use std::io;

use tracing_subscriber::fmt;

use crate::Level;

/// How much context each log line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    /// One short line per event, no timestamp or target.
    Compact,
    /// Timestamps and the module the event came from.
    Full,
    /// `Full` plus the emitting thread.
    WithThreads,
}

impl LogFormat {
    pub(crate) fn for_level(level: Level) -> Self {
        if level <= Level::WARN {
            LogFormat::Compact
        } else if level == Level::TRACE {
            LogFormat::WithThreads
        } else {
            LogFormat::Full
        }
    }

    pub(crate) fn install(self, level: Level) {
        let builder = fmt().with_max_level(level).with_writer(io::stderr);
        // try_init fails only when a subscriber is already set
        let _ = match self {
            LogFormat::Compact => builder
                .event_format(fmt::format().without_time().with_target(false).compact())
                .try_init(),
            LogFormat::Full => builder.try_init(),
            LogFormat::WithThreads => builder.with_thread_ids(true).try_init(),
        };
    }
}
