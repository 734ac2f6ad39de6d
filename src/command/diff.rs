use std::io;

use anyhow::anyhow;
use camino::{Utf8Path, Utf8PathBuf};
use cassette::{CassetteError, FixtureStore, MatchReport, MatchRules, ResponseMatcher};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tape_std::{Fs, Style, infoln, warnln};

use crate::error::CommandFailure;
use crate::options::MatchRulesOpt;
use crate::utils::config::TapeConfig;
use crate::utils::parsers::FileDescriptorType;
use crate::{TapeError, TapeErrorCode, TapeOutput, TapeResult};

#[derive(Debug, Parser)]
pub struct Diff {
    /// The recorded operation to compare against
    #[arg(
        value_name = "OPERATION",
        requires = "response",
        conflicts_with = "responses"
    )]
    operation: Option<String>,

    /// The response to compare, as a JSON file. Pass `-` to read it from stdin.
    #[arg(long, value_name = "FILE | -", requires = "operation")]
    response: Option<FileDescriptorType>,

    /// A directory of responses named `<OPERATION>.json`, each compared
    /// against the fixture for that operation
    #[arg(long, value_name = "DIR", required_unless_present = "operation")]
    responses: Option<Utf8PathBuf>,

    #[clap(flatten)]
    rules: MatchRulesOpt,
}

/// A response in a `--responses` directory that could not be compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedResponse {
    pub operation: String,
    pub path: Utf8PathBuf,
    pub message: String,
    pub code: Option<TapeErrorCode>,
}

impl SkippedResponse {
    fn new(operation: String, path: Utf8PathBuf, error: &TapeError) -> SkippedResponse {
        SkippedResponse {
            operation,
            path,
            message: error.message(),
            code: error.code(),
        }
    }
}

impl Diff {
    pub fn run(&self, store: &FixtureStore, config: &TapeConfig) -> TapeResult<TapeOutput> {
        let cli_rules = self.rules.rules()?;
        let mut reports = Vec::new();
        let mut skipped = Vec::new();
        match (&self.operation, &self.response, &self.responses) {
            (Some(operation), Some(response), _) => {
                let raw = response.read_file_descriptor("response", &mut io::stdin())?;
                let actual = parse_response(&raw, &response.to_string())?;
                reports.push(compare(store, config, &cli_rules, operation, &actual)?);
            }
            (None, _, Some(dir)) => {
                for (operation, path) in response_files(dir)? {
                    match compare_file(store, config, &cli_rules, &operation, &path) {
                        Ok(report) => reports.push(report),
                        Err(error) => {
                            tracing::debug!(%path, ?error, "could not compare response");
                            skipped.push(SkippedResponse::new(operation, path, &error));
                        }
                    }
                }
                if reports.is_empty() && skipped.is_empty() {
                    warnln!("No responses were found in {}", Style::Path.paint(dir));
                }
            }
            _ => {
                return Err(anyhow!(
                    "Pass an operation with --response, or a directory with --responses."
                )
                .into());
            }
        }

        let mismatched = reports.iter().filter(|report| !report.is_match()).count();
        let mut problems = Vec::new();
        match mismatched {
            0 => {}
            1 => problems.push("1 response does not match its recording".to_string()),
            n => problems.push(format!("{n} responses do not match their recordings")),
        }
        match skipped.len() {
            0 => {}
            1 => problems.push("1 response could not be compared".to_string()),
            n => problems.push(format!("{n} responses could not be compared")),
        }

        let output = TapeOutput::MatchReports { reports, skipped };
        if !problems.is_empty() {
            return Err(CommandFailure::new(problems.join(", "), output).into());
        }
        Ok(output)
    }
}

fn compare_file(
    store: &FixtureStore,
    config: &TapeConfig,
    cli_rules: &MatchRules,
    operation: &str,
    path: &Utf8Path,
) -> TapeResult<MatchReport> {
    let actual = parse_response(&Fs::read_file(path)?, path.as_str())?;
    compare(store, config, cli_rules, operation, &actual)
}

/// Compares `actual` with the recording for `operation` under the configured
/// rules followed by the rules given on the command line.
fn compare(
    store: &FixtureStore,
    config: &TapeConfig,
    cli_rules: &MatchRules,
    operation: &str,
    actual: &Value,
) -> TapeResult<MatchReport> {
    let fixture = store.get(operation)?;
    let mut rules = config.rules_for(operation);
    rules.extend(cli_rules.clone());

    infoln!(
        "Comparing {} with {}",
        Style::Command.paint(operation),
        Style::Path.paint(fixture.path())
    );
    Ok(ResponseMatcher::new(rules).compare_fixture(fixture, actual)?)
}

fn parse_response(raw: &str, origin: &str) -> Result<Value, CassetteError> {
    serde_json::from_str(raw).map_err(|source| CassetteError::InvalidJson {
        origin: origin.to_string(),
        source,
    })
}

/// Every `<operation>.json` file directly inside `dir`, sorted by operation.
fn response_files(dir: &Utf8Path) -> TapeResult<Vec<(String, Utf8PathBuf)>> {
    let mut files = Vec::new();
    for entry in Fs::get_dir_entries(dir)? {
        let path = entry?.into_path();
        if path.extension() != Some("json") || !path.is_file() {
            continue;
        }
        if let Some(operation) = path.file_stem().map(str::to_string) {
            files.push((operation, path));
        }
    }
    files.sort();
    tracing::debug!(%dir, count = files.len(), "found responses");
    Ok(files)
}
