use std::fmt;
use std::io::Read;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use camino::Utf8PathBuf;
use tape_std::Fs;

use crate::TapeResult;

/// A path to read from, or `-` for stdin.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FileDescriptorType {
    Stdin,
    File(Utf8PathBuf),
}

impl FileDescriptorType {
    pub fn read_file_descriptor(
        &self,
        file_description: &str,
        stdin: &mut impl Read,
    ) -> TapeResult<String> {
        match self {
            Self::Stdin => {
                let mut buffer = String::new();
                stdin
                    .read_to_string(&mut buffer)
                    .with_context(|| format!("Failed to read {} from stdin", file_description))?;
                Ok(buffer)
            }
            Self::File(file_path) => Ok(Fs::read_file(file_path)?),
        }
    }
}

impl FromStr for FileDescriptorType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Self::Stdin)
        } else if s.is_empty() {
            Err(anyhow!("The file path you provided is invalid."))
        } else {
            Ok(Self::File(Utf8PathBuf::from(s)))
        }
    }
}

impl fmt::Display for FileDescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File(path) => write!(f, "{}", path),
        }
    }
}
