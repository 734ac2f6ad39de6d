use camino::Utf8PathBuf;
use cassette::{
    CassetteError, Fixture, FixtureStore, QueryRenderer, QueryTemplate, RenderMode, RequestPayload,
};
use clap::Parser;
use serde::Serialize;
use serde::ser::SerializeStruct;
use tape_std::{Style, infoln};

use crate::error::CommandFailure;
use crate::error::metadata::cassette_metadata;
use crate::{TapeErrorCode, TapeOutput, TapeResult};

#[derive(Debug, Parser)]
pub struct Check {
    /// Also render every fixture with its variables inlined and make sure
    /// the result still parses
    #[arg(long)]
    inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed {
        message: String,
        code: Option<TapeErrorCode>,
    },
}

impl CheckStatus {
    fn failed(error: &CassetteError) -> CheckStatus {
        let (_, code) = cassette_metadata(error);
        CheckStatus::Failed {
            message: error.to_string(),
            code,
        }
    }
}

/// The outcome of checking one fixture file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub operation: String,
    pub path: Utf8PathBuf,
    #[serde(flatten)]
    pub status: CheckStatus,
    pub warnings: Vec<String>,
}

impl CheckResult {
    const fn passed(&self) -> bool {
        matches!(self.status, CheckStatus::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckSummary {
    pub results: Vec<CheckResult>,
}

impl CheckSummary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}

impl Serialize for CheckSummary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut data = serializer.serialize_struct("CheckSummary", 3)?;
        data.serialize_field("results", &self.results)?;
        data.serialize_field("passed", &self.passed())?;
        data.serialize_field("failed", &self.failed())?;
        data.end()
    }
}

impl Check {
    pub fn run(&self, store: &FixtureStore) -> TapeResult<TapeOutput> {
        infoln!(
            "Checking {} fixture(s)",
            Style::Command.paint(store.len().to_string())
        );

        let mut summary = CheckSummary::default();
        for fixture in store.fixtures() {
            summary.results.push(self.check_fixture(fixture));
        }
        for failure in store.failures() {
            summary.results.push(CheckResult {
                // files that fail to load are named by path
                operation: failure.path.to_string(),
                path: failure.path.clone(),
                status: CheckStatus::failed(&failure.error),
                warnings: Vec::new(),
            });
        }

        let failed = summary.failed();
        let output = TapeOutput::CheckResults(summary);
        if failed > 0 {
            let message = if failed == 1 {
                "1 fixture failed its check".to_string()
            } else {
                format!("{failed} fixtures failed their checks")
            };
            return Err(CommandFailure::new(message, output).into());
        }
        Ok(output)
    }

    fn check_fixture(&self, fixture: &Fixture) -> CheckResult {
        let invocation = fixture.invocation();
        let warnings = invocation
            .undeclared_variables()
            .into_iter()
            .map(|name| format!("'${name}' is not declared by the operation and is passed through"))
            .collect();

        let mut status = match round_trip(fixture) {
            Ok(()) => CheckStatus::Passed,
            Err(error) => CheckStatus::failed(&error),
        };
        if self.inline && status == CheckStatus::Passed {
            if let Err(error) = inline_parses(fixture) {
                status = CheckStatus::failed(&error);
            }
        }

        tracing::debug!(
            operation = fixture.operation_name(),
            ?status,
            "checked fixture"
        );
        CheckResult {
            operation: fixture.operation_name().to_string(),
            path: fixture.path().to_path_buf(),
            status,
            warnings,
        }
    }
}

/// Renders the fixture with its own variables and makes sure serializing
/// the request reproduces the recorded `operationName` and `variables` exactly.
fn round_trip(fixture: &Fixture) -> Result<(), CassetteError> {
    let payload = QueryRenderer::new(RenderMode::Variables).render_invocation(fixture.invocation())?;
    let origin = format!("the request rendered from '{}'", fixture.path());
    let invalid_json = |source| CassetteError::InvalidJson {
        origin: origin.clone(),
        source,
    };

    let serialized = serde_json::to_string(&payload).map_err(invalid_json)?;
    let reparsed: RequestPayload = serde_json::from_str(&serialized).map_err(invalid_json)?;

    let malformed = |reason: String| CassetteError::MalformedFixture {
        path: fixture.path().to_path_buf(),
        reason,
    };
    if reparsed.operation_name != fixture.operation_name() {
        return Err(malformed(format!(
            "the rendered request is named '{}' instead of '{}'",
            reparsed.operation_name,
            fixture.operation_name()
        )));
    }
    let recorded = serde_json::to_string(fixture.invocation().variable_values()).map_err(invalid_json)?;
    let rendered = serde_json::to_string(&reparsed.variables).map_err(invalid_json)?;
    if recorded != rendered {
        return Err(malformed(format!(
            "the rendered variables {rendered} differ from the recorded {recorded}"
        )));
    }
    Ok(())
}

/// Inlines the recorded variables and parses the resulting document again.
fn inline_parses(fixture: &Fixture) -> Result<(), CassetteError> {
    let payload = QueryRenderer::new(RenderMode::Inline).render_invocation(fixture.invocation())?;
    QueryTemplate::parse(&payload.query, Some(&payload.operation_name)).map_err(
        |reason| CassetteError::MalformedFixture {
            path: fixture.path().to_path_buf(),
            reason: format!("the inlined document does not parse: {reason}"),
        },
    )?;
    Ok(())
}
