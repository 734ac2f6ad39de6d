mod error;
mod fs;
mod style;

pub mod print;
pub use error::TapeStdError;
pub use fs::Fs;
pub use style::Style;
