use std::io::Read;

use cassette::{CassetteError, JsonKind};
use clap::Parser;
use serde_json::{Map, Value};

use crate::utils::parsers::FileDescriptorType;
use crate::{TapeError, TapeErrorSuggestion, TapeResult};

#[derive(Debug, Default, Parser)]
pub struct VariablesOpt {
    /// Variables to render the operation with, as a JSON object.
    /// Defaults to the variables recorded in the fixture.
    #[arg(long = "variables", conflicts_with = "variables_file")]
    variables: Option<String>,

    /// A file holding the variables as a JSON object.
    /// Pass `-` to read them from stdin.
    #[arg(long = "variables-file", value_name = "FILE | -")]
    variables_file: Option<FileDescriptorType>,
}

impl VariablesOpt {
    /// The variables given on the command line, or `recorded` when none were.
    pub(crate) fn resolve(
        &self,
        recorded: &Map<String, Value>,
        stdin: &mut impl Read,
    ) -> TapeResult<Map<String, Value>> {
        let (origin, raw) = match (&self.variables, &self.variables_file) {
            (Some(raw), _) => ("--variables".to_string(), raw.clone()),
            (None, Some(file)) => (
                file.to_string(),
                file.read_file_descriptor("variables", stdin)?,
            ),
            (None, None) => return Ok(recorded.clone()),
        };

        let value: Value =
            serde_json::from_str(&raw).map_err(|source| CassetteError::InvalidJson {
                origin: origin.clone(),
                source,
            })?;
        match value {
            Value::Object(variables) => {
                tracing::debug!(%origin, count = variables.len(), "read variables");
                Ok(variables)
            }
            other => {
                let mut error = TapeError::new(anyhow::anyhow!(
                    "The variables in {} must be a JSON object, not {}.",
                    origin,
                    JsonKind::of(&other)
                ));
                error.set_suggestion(TapeErrorSuggestion::Adhoc(
                    "Wrap the values in an object keyed by variable name, e.g. {\"areas\": [\"...\"]}."
                        .to_string(),
                ));
                Err(error)
            }
        }
    }
}
