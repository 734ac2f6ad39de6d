use thiserror::Error;

use crate::TapeOutput;

/// A command that ran to completion but found problems, e.g. fixtures that
/// fail `tape check` or responses that differ from their recordings.
///
/// The output is kept so it can still be printed alongside the error.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct CommandFailure {
    message: String,
    output: Box<TapeOutput>,
}

impl CommandFailure {
    pub(crate) fn new(message: impl Into<String>, output: TapeOutput) -> CommandFailure {
        CommandFailure {
            message: message.into(),
            output: Box::new(output),
        }
    }

    pub(crate) fn output(&self) -> &TapeOutput {
        &self.output
    }
}
