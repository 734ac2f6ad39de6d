pub mod cli;
pub mod command;
mod error;
mod options;
pub mod utils;

pub use command::TapeOutput;
pub use error::{TapeError, TapeErrorCode, TapeErrorMetadata, TapeErrorSuggestion, TapeResult};

pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
