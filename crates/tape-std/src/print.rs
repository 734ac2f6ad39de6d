//! Status lines for humans on stderr, each behind a styled prefix.
//!
//! Machine-readable output belongs on stdout; these never write there.

use std::fmt;
use std::io::{self, Write};

use crate::Style;

/// Writes `prefix`, a space and the message as one line on stderr.
///
/// Used by the print macros; a closed stderr is ignored.
#[doc(hidden)]
pub fn eprint_prefixed(style: Style, prefix: &str, message: fmt::Arguments<'_>) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{} {}", style.paint(prefix), message);
}

/// Prints a progress message to stderr behind a `==>` prefix.
#[macro_export]
macro_rules! infoln {
    ($($t:tt)*) => {
        $crate::print::eprint_prefixed($crate::Style::InfoPrefix, "==>", format_args!($($t)*))
    };
}

/// Prints a warning to stderr behind a `warning:` prefix.
#[macro_export]
macro_rules! warnln {
    ($($t:tt)*) => {
        $crate::print::eprint_prefixed($crate::Style::WarningPrefix, "warning:", format_args!($($t)*))
    };
}

/// Prints an error to stderr behind an `error:` prefix.
#[macro_export]
macro_rules! errln {
    ($($t:tt)*) => {
        $crate::print::eprint_prefixed($crate::Style::ErrorPrefix, "error:", format_args!($($t)*))
    };
}

/// Prints a success message to stderr behind a checkmark.
#[macro_export]
macro_rules! successln {
    ($($t:tt)*) => {
        $crate::print::eprint_prefixed($crate::Style::SuccessPrefix, "✓", format_args!($($t)*))
    };
}
