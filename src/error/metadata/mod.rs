mod code;
mod suggestion;

pub use code::TapeErrorCode;
pub use suggestion::TapeErrorSuggestion;

use cassette::CassetteError;

use crate::TapeOutput;
use crate::error::CommandFailure;
use crate::utils::config::ConfigError;

/// Metadata contains extra information about specific errors
/// Currently this includes an optional error `Code`
/// and an optional `Suggestion`
#[derive(Default, Debug)]
pub struct TapeErrorMetadata {
    pub suggestion: Option<TapeErrorSuggestion>,
    pub code: Option<TapeErrorCode>,
    pub skip_printing_cause: bool,
}

/// The code and suggestion for an error raised by the fixture library.
pub(crate) fn cassette_metadata(
    error: &CassetteError,
) -> (Option<TapeErrorSuggestion>, Option<TapeErrorCode>) {
    match error {
        CassetteError::MalformedFixture { path, .. } => (
            Some(TapeErrorSuggestion::FixFixture { path: path.clone() }),
            Some(TapeErrorCode::E001),
        ),
        CassetteError::MissingVariable {
            variable, expected, ..
        } => (
            Some(TapeErrorSuggestion::ProvideVariable {
                variable: variable.clone(),
                expected: expected.clone(),
            }),
            Some(TapeErrorCode::E002),
        ),
        CassetteError::TypeMismatch {
            variable, expected, ..
        } => (
            Some(TapeErrorSuggestion::FixVariableType {
                variable: variable.clone(),
                expected: expected.clone(),
            }),
            Some(TapeErrorCode::E003),
        ),
        CassetteError::UnknownFixture { available, .. } => (
            Some(TapeErrorSuggestion::ProvideValidOperation {
                available: available.clone(),
            }),
            Some(TapeErrorCode::E004),
        ),
        CassetteError::DuplicateFixture { second, .. } => (
            Some(TapeErrorSuggestion::RemoveDuplicate {
                path: second.clone(),
            }),
            Some(TapeErrorCode::E004),
        ),
        CassetteError::InvalidPathPattern { .. } | CassetteError::InvalidTolerance { .. } => {
            (Some(TapeErrorSuggestion::CheckRuleSyntax), Some(TapeErrorCode::E006))
        }
        CassetteError::NoRecordedResponse { operation } => (
            Some(TapeErrorSuggestion::RecordResponse {
                operation: operation.clone(),
            }),
            Some(TapeErrorCode::E007),
        ),
        CassetteError::InvalidJson { .. } | CassetteError::Fs(_) => (None, None),
    }
}

/// `Metadata` structs can be created from an `anyhow::Error`
/// This works by downcasting the errors to their underlying types
/// and creating `Suggestion`s and `Code`s where applicable
impl From<&mut anyhow::Error> for TapeErrorMetadata {
    fn from(error: &mut anyhow::Error) -> Self {
        if let Some(cassette_error) = error.downcast_ref::<CassetteError>() {
            let (suggestion, code) = cassette_metadata(cassette_error);
            return TapeErrorMetadata {
                suggestion,
                code,
                skip_printing_cause: code.is_some(),
            };
        }

        if let Some(config_error) = error.downcast_ref::<ConfigError>() {
            let suggestion = match config_error {
                ConfigError::FixturesDir { .. } => TapeErrorSuggestion::CheckFixturesDir,
                ConfigError::Read { .. }
                | ConfigError::Parse { .. }
                | ConfigError::InvalidRule { .. } => TapeErrorSuggestion::FixConfig,
            };
            return TapeErrorMetadata {
                suggestion: Some(suggestion),
                code: Some(TapeErrorCode::E008),
                skip_printing_cause: false,
            };
        }

        if let Some(failure) = error.downcast_ref::<CommandFailure>() {
            let (suggestion, code) = match failure.output() {
                TapeOutput::MatchReports { reports, .. }
                    if reports.iter().any(|report| !report.is_match()) =>
                {
                    (
                        Some(TapeErrorSuggestion::ReviewResponseDiffs),
                        Some(TapeErrorCode::E005),
                    )
                }
                TapeOutput::MatchReports { skipped, .. } => (
                    Some(TapeErrorSuggestion::ExplainCheckFailures),
                    skipped.iter().find_map(|response| response.code),
                ),
                _ => (Some(TapeErrorSuggestion::ExplainCheckFailures), None),
            };
            return TapeErrorMetadata {
                suggestion,
                code,
                skip_printing_cause: true,
            };
        }

        TapeErrorMetadata::default()
    }
}
