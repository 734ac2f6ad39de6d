mod failure;
pub(crate) mod metadata;

pub(crate) use failure::CommandFailure;
pub use metadata::{TapeErrorCode, TapeErrorMetadata, TapeErrorSuggestion};

pub type TapeResult<T> = std::result::Result<T, TapeError>;

use calm_io::stderr;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use tape_std::Style;

use std::borrow::BorrowMut;
use std::fmt::{self, Debug, Display};
use std::io;

/// A specialized `Error` type for tape that wraps `anyhow`
/// and provides some extra `Metadata` for end users depending
/// on the specific error they encountered.
#[derive(Debug)]
pub struct TapeError {
    error: anyhow::Error,
    metadata: TapeErrorMetadata,
}

impl TapeError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        let mut error = error.into();
        let metadata = TapeErrorMetadata::from(error.borrow_mut());

        Self { error, metadata }
    }

    pub fn set_suggestion(&mut self, suggestion: TapeErrorSuggestion) {
        self.metadata.suggestion = Some(suggestion);
    }

    pub fn suggestion(&self) -> Option<TapeErrorSuggestion> {
        self.metadata.suggestion.clone()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub const fn code(&self) -> Option<TapeErrorCode> {
        self.metadata.code
    }

    pub fn print(&self) -> io::Result<()> {
        // a failed command still prints what it found
        if let Some(failure) = self.error.downcast_ref::<CommandFailure>() {
            failure.output().print()?;
        }

        stderr!("{}", self)?;
        Ok(())
    }

    pub(crate) fn get_internal_data_json(&self) -> Value {
        if let Some(failure) = self.error.downcast_ref::<CommandFailure>() {
            return failure.output().get_internal_data_json();
        }
        json!({})
    }

    pub(crate) fn get_internal_error_json(&self) -> Value {
        json!(self)
    }
}

impl Serialize for TapeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut data = serializer.serialize_struct("error", 2)?;
        data.serialize_field("message", &self.message())?;
        data.serialize_field("code", &self.code().map(|code| code.to_string()))?;
        data.end()
    }
}

impl Display for TapeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error_descriptor_message = if let Some(code) = &self.metadata.code {
            format!("error[{}]:", code)
        } else {
            "error:".to_string()
        };
        let error_descriptor = Style::ErrorPrefix.paint(&error_descriptor_message);

        if self.metadata.skip_printing_cause {
            writeln!(formatter, "{} {}", error_descriptor, &self.error)?;
        } else {
            writeln!(formatter, "{} {:?}", error_descriptor, &self.error)?;
        }

        if let Some(suggestion) = &self.metadata.suggestion {
            writeln!(formatter, "        {}", suggestion)?;
        }
        Ok(())
    }
}

impl<E: Into<anyhow::Error>> From<E> for TapeError {
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use cassette::CassetteError;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn it_serializes_message_and_code() {
        let error = TapeError::new(CassetteError::NoRecordedResponse {
            operation: "getMapPlacesPredictions".to_string(),
        });
        assert_eq!(
            error.get_internal_error_json(),
            json!({
                "message": "The fixture for 'getMapPlacesPredictions' has no recorded response to compare against.",
                "code": "E007"
            })
        );
    }

    #[test]
    fn adhoc_errors_have_no_code() {
        let error = TapeError::new(anyhow::anyhow!("something went sideways"));
        assert_eq!(error.code(), None);
        assert_eq!(
            error.get_internal_error_json(),
            json!({"message": "something went sideways", "code": null})
        );
        assert_eq!(error.get_internal_data_json(), json!({}));
    }
}
