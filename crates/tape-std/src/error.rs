use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// A file system operation that failed, with the path it failed on.
#[derive(Error, Debug)]
pub enum TapeStdError {
    /// Nothing exists at the path
    #[error("could not find '{path}'")]
    NotFound {
        /// The path that was looked up
        path: Utf8PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },

    /// The path exists but is a directory or something else that can't be read as text
    #[error("'{path}' is not a file")]
    NotAFile {
        /// The path that was read
        path: Utf8PathBuf,
    },

    /// The file holds nothing but whitespace
    #[error("'{path}' is an empty file")]
    EmptyFile {
        /// The path that was read
        path: Utf8PathBuf,
    },

    /// Reading, writing or listing failed
    #[error("could not {action} '{path}'")]
    Io {
        /// What was being done, e.g. "read" or "list the entries of"
        action: &'static str,
        /// The path it was being done to
        path: Utf8PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },
}
