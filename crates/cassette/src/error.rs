use camino::Utf8PathBuf;
use tape_std::TapeStdError;
use thiserror::Error;

/// CassetteError is the type of Error that occurred while loading,
/// rendering or replaying a fixture.
#[derive(Error, Debug)]
pub enum CassetteError {
    /// The fixture file could not be split into a request header, a query
    /// document and an optional response, or one of those parts is invalid.
    #[error("The fixture at '{path}' is malformed: {reason}")]
    MalformedFixture {
        /// The file the fixture was read from
        path: Utf8PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A required (non-null, no default) variable was not provided.
    #[error("Operation '{operation}' requires the variable '${variable}' of type {expected}, but no value was provided.")]
    MissingVariable {
        /// The operation being rendered
        operation: String,
        /// The variable name, without `$`
        variable: String,
        /// The declared GraphQL type
        expected: String,
    },

    /// A variable value does not conform to its declared type.
    #[error("The variable '${variable}' of operation '{operation}' expects {expected} at '{path}', but found {found}.")]
    TypeMismatch {
        /// The operation being rendered
        operation: String,
        /// The variable name, without `$`
        variable: String,
        /// Where in the value the mismatch is, e.g. `areas[1]`
        path: String,
        /// The expected GraphQL type at `path`
        expected: String,
        /// A description of the value that was found
        found: String,
    },

    /// Two fixture files record the same operation.
    #[error("The operation '{operation}' is recorded in both '{first}' and '{second}'.")]
    DuplicateFixture {
        /// The operation name
        operation: String,
        /// The file that was kept
        first: Utf8PathBuf,
        /// The file that was rejected
        second: Utf8PathBuf,
    },

    /// There is no fixture for the requested operation.
    #[error("There is no fixture for the operation '{operation}'.")]
    UnknownFixture {
        /// The requested operation name
        operation: String,
        /// Every operation name that is available
        available: Vec<String>,
    },

    /// The fixture has no `#response` section to compare against.
    #[error("The fixture for '{operation}' has no recorded response to compare against.")]
    NoRecordedResponse {
        /// The operation name
        operation: String,
    },

    /// A JSON path pattern could not be parsed.
    #[error("'{pattern}' is not a valid path pattern: {reason}")]
    InvalidPathPattern {
        /// The pattern as written
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// A numeric tolerance could not be parsed.
    #[error("'{tolerance}' is not a valid tolerance: {reason}")]
    InvalidTolerance {
        /// The tolerance as written
        tolerance: String,
        /// Why it was rejected
        reason: String,
    },

    /// Some input that should have been JSON was not.
    #[error("Could not parse {origin} as JSON.")]
    InvalidJson {
        /// Where the JSON came from
        origin: String,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Reading from the file system failed.
    #[error(transparent)]
    Fs(#[from] TapeStdError),
}
