use std::fs;
use std::io;

use camino::{ReadDirUtf8, Utf8Path};

use crate::TapeStdError;

/// Interact with a file system
#[derive(Default, Copy, Clone)]
pub struct Fs {}

impl Fs {
    /// Reads a UTF-8 text file. Directories and files holding only
    /// whitespace are rejected.
    pub fn read_file<P>(path: P) -> Result<String, TapeStdError>
    where
        P: AsRef<Utf8Path>,
    {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| TapeStdError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(TapeStdError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        tracing::info!("reading {} from disk", path);
        let contents = fs::read_to_string(path).map_err(io_error("read", path))?;
        if contents.trim().is_empty() {
            return Err(TapeStdError::EmptyFile {
                path: path.to_path_buf(),
            });
        }
        Ok(contents)
    }

    /// Writes `contents` to `path`, replacing the file if it exists and
    /// creating missing parent directories.
    pub fn write_file<P, C>(path: P, contents: C) -> Result<(), TapeStdError>
    where
        P: AsRef<Utf8Path>,
        C: AsRef<[u8]>,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            if !parent.is_dir() {
                tracing::debug!("creating missing parent directory {}", parent);
                fs::create_dir_all(parent).map_err(io_error("create the directory", parent))?;
            }
        }

        tracing::info!("writing {} to disk", path);
        fs::write(path, contents).map_err(io_error("write", path))
    }

    /// Lists the entries of a directory.
    pub fn get_dir_entries<D>(dir: D) -> Result<ReadDirUtf8, TapeStdError>
    where
        D: AsRef<Utf8Path>,
    {
        let dir = dir.as_ref();
        dir.read_dir_utf8()
            .map_err(io_error("list the entries of", dir))
    }

    /// checks if a path is a directory, errors if the path does not exist
    pub fn path_is_dir<D>(dir: D) -> Result<bool, TapeStdError>
    where
        D: AsRef<Utf8Path>,
    {
        let dir = dir.as_ref();
        fs::metadata(dir)
            .map(|metadata| metadata.is_dir())
            .map_err(|source| TapeStdError::NotFound {
                path: dir.to_path_buf(),
                source,
            })
    }
}

fn io_error<'a>(
    action: &'static str,
    path: &'a Utf8Path,
) -> impl FnOnce(io::Error) -> TapeStdError + 'a {
    move |source| TapeStdError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}
