use std::fmt::{self, Display};
use std::io;

use calm_io::stdoutln;
use camino::Utf8PathBuf;
use cassette::{DiffKind, MatchReport, RequestPayload};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{Value, json};
use tape_std::{Style, errln, infoln, successln, warnln};
use termimad::MadSkin;
use termimad::crossterm::style::Attribute::Underlined;

use crate::TapeError;
use crate::command::{
    CheckStatus, CheckSummary, FixtureSummary, LoadFailureSummary, SkippedResponse,
};

/// TapeOutput defines all of the different types of data that are printed
/// to `stdout`. Every one of tape's commands should return `TapeResult<TapeOutput>`.
/// If the command needs to output some type of data, it should be structured
/// in this enum, and its print logic should be handled in `TapeOutput::print`.
///
/// Not all commands will output machine readable information, and those should
/// return `Ok(TapeOutput::EmptySuccess)`.
#[derive(Clone, PartialEq, Debug)]
pub enum TapeOutput {
    FixtureList {
        fixtures: Vec<FixtureSummary>,
        failures: Vec<LoadFailureSummary>,
    },
    RenderedPayload {
        payload: RequestPayload,
        written_to: Option<Utf8PathBuf>,
    },
    CheckResults(CheckSummary),
    MatchReports {
        reports: Vec<MatchReport>,
        skipped: Vec<SkippedResponse>,
    },
    ErrorExplanation(String),
    EmptySuccess,
}

impl TapeOutput {
    pub fn print(&self) -> io::Result<()> {
        match self {
            TapeOutput::FixtureList { fixtures, failures } => {
                if fixtures.is_empty() {
                    warnln!("No fixtures were found.");
                } else {
                    let mut table = new_table();
                    table.set_header(vec!["Operation", "Kind", "Variables", "Response", "File"]);
                    for fixture in fixtures {
                        table.add_row(vec![
                            Cell::new(&fixture.operation),
                            Cell::new(fixture.kind),
                            Cell::new(fixture.variables.join("\n")),
                            Cell::new(if fixture.has_response { "yes" } else { "no" }),
                            Cell::new(&fixture.path),
                        ]);
                    }
                    stdoutln!("{}", table)?;
                }
                for failure in failures {
                    warnln!(
                        "Skipped {}: {}",
                        Style::Path.paint(&failure.path),
                        failure.message
                    );
                }
            }
            TapeOutput::RenderedPayload {
                payload,
                written_to,
            } => match written_to {
                Some(path) => {
                    successln!(
                        "Wrote the request for {} to {}",
                        Style::Command.paint(&payload.operation_name),
                        Style::Path.paint(path)
                    );
                }
                None => {
                    let rendered = serde_json::to_string_pretty(payload).map_err(io::Error::other)?;
                    stdoutln!("{}", rendered)?;
                }
            },
            TapeOutput::CheckResults(summary) => {
                for result in &summary.results {
                    let operation = Style::Command.paint(&result.operation);
                    match &result.status {
                        CheckStatus::Passed => successln!("{}", operation),
                        CheckStatus::Failed { message, code } => match code {
                            Some(code) => errln!("{} [{}] {}", operation, code, message),
                            None => errln!("{} {}", operation, message),
                        },
                    }
                    for warning in &result.warnings {
                        warnln!("{}: {}", operation, warning);
                    }
                }
                infoln!(
                    "{} of {} fixtures passed",
                    summary.passed(),
                    summary.results.len()
                );
            }
            TapeOutput::MatchReports { reports, skipped } => {
                for report in reports {
                    print_match_report(report)?;
                }
                for response in skipped {
                    let operation = Style::Command.paint(&response.operation);
                    match response.code {
                        Some(code) => errln!("{} [{}] {}", operation, code, response.message),
                        None => errln!("{} {}", operation, response.message),
                    }
                }
            }
            TapeOutput::ErrorExplanation(explanation) => {
                // underline bolded md
                let mut skin = MadSkin::default();
                skin.bold.add_attr(Underlined);
                stdoutln!("{}", skin.term_text(explanation))?;
            }
            TapeOutput::EmptySuccess => (),
        }
        Ok(())
    }

    pub(crate) fn get_internal_data_json(&self) -> Value {
        match self {
            TapeOutput::FixtureList { fixtures, failures } => {
                json!({ "fixtures": fixtures, "failures": failures })
            }
            TapeOutput::RenderedPayload {
                payload,
                written_to,
            } => json!({ "payload": payload, "written_to": written_to }),
            TapeOutput::CheckResults(summary) => json!(summary),
            TapeOutput::MatchReports { reports, skipped } => {
                json!({ "reports": reports, "skipped": skipped })
            }
            TapeOutput::ErrorExplanation(explanation) => json!({ "explanation": explanation }),
            TapeOutput::EmptySuccess => json!(null),
        }
    }

    pub(crate) const fn get_json_version(&self) -> JsonVersion {
        JsonVersion::One
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn print_match_report(report: &MatchReport) -> io::Result<()> {
    let operation = Style::Command.paint(&report.operation_name);
    if report.is_match() {
        successln!(
            "{} matches its recording ({} tolerated, {} ignored)",
            operation,
            report.tolerated.len(),
            report.ignored.len()
        );
        return Ok(());
    }

    errln!(
        "{} differs from its recording in {} field(s)",
        operation,
        report.diffs.len()
    );
    let mut table = new_table();
    table.set_header(vec!["Path", "Change", "Expected", "Found"]);
    for diff in &report.diffs {
        let (change, expected, found) = match &diff.kind {
            DiffKind::Missing { expected } => ("missing", expected.to_string(), String::new()),
            DiffKind::Unexpected { actual } => ("unexpected", String::new(), actual.to_string()),
            DiffKind::TypeChanged { expected, actual } => {
                ("type changed", expected.to_string(), actual.to_string())
            }
            DiffKind::ValueChanged { expected, actual } => {
                ("value changed", expected.to_string(), actual.to_string())
            }
        };
        table.add_row(vec![
            Cell::new(diff.path.to_string()),
            Cell::new(change),
            Cell::new(Style::Expected.paint(expected)),
            Cell::new(Style::Actual.paint(found)),
        ]);
    }
    stdoutln!("{}", table)?;
    for drift in &report.tolerated {
        infoln!("tolerated {}", drift);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    json_version: JsonVersion,
    data: JsonData,
    error: Value,
}

impl JsonOutput {
    pub fn print(&self) -> io::Result<()> {
        stdoutln!("{}", self)
    }
}

impl Display for JsonOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", json!(self))
    }
}

impl From<TapeOutput> for JsonOutput {
    fn from(output: TapeOutput) -> Self {
        Self {
            json_version: output.get_json_version(),
            data: JsonData::success(output.get_internal_data_json()),
            error: Value::Null,
        }
    }
}

impl From<TapeError> for JsonOutput {
    fn from(error: TapeError) -> Self {
        Self {
            json_version: JsonVersion::One,
            data: JsonData::failure(error.get_internal_data_json()),
            error: error.get_internal_error_json(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct JsonData {
    #[serde(flatten)]
    inner: Value,
    success: bool,
}

impl JsonData {
    const fn success(inner: Value) -> JsonData {
        JsonData {
            inner,
            success: true,
        }
    }

    const fn failure(inner: Value) -> JsonData {
        JsonData {
            inner,
            success: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Default)]
pub(crate) enum JsonVersion {
    #[default]
    #[serde(rename = "1")]
    One,
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;
    use cassette::{FieldDiff, JsonPath, MatchReport};
    use serde_json::Map;

    use super::*;
    use crate::TapeErrorCode;
    use crate::command::CheckResult;
    use crate::error::CommandFailure;

    fn mismatched_report() -> MatchReport {
        MatchReport {
            operation_name: "getBusinessFromAreaQuery".to_string(),
            diffs: vec![FieldDiff {
                path: JsonPath::root()
                    .child_key("data")
                    .child_key("businesses")
                    .child_key("size"),
                kind: DiffKind::ValueChanged {
                    expected: json!(897),
                    actual: json!(912),
                },
            }],
            tolerated: vec![],
            ignored: vec![],
        }
    }

    #[test]
    fn empty_success_json() {
        let actual = json!(JsonOutput::from(TapeOutput::EmptySuccess));
        let expected = json!({
            "json_version": "1",
            "data": { "success": true },
            "error": null
        });
        assert_json_eq!(expected, actual);
    }

    #[test]
    fn rendered_payload_json() {
        let mut variables = Map::new();
        variables.insert("areas".to_string(), json!(["86cdd3cf-82dd-461a-8764-5778344f1666"]));
        let output = TapeOutput::RenderedPayload {
            payload: RequestPayload {
                operation_name: "getBusinessFromAreaQuery".to_string(),
                variables,
                query: "query getBusinessFromAreaQuery($areas: [String]!) { businesses { size(areas: $areas) } }".to_string(),
            },
            written_to: None,
        };
        let expected = json!({
            "json_version": "1",
            "data": {
                "payload": {
                    "operationName": "getBusinessFromAreaQuery",
                    "variables": { "areas": ["86cdd3cf-82dd-461a-8764-5778344f1666"] },
                    "query": "query getBusinessFromAreaQuery($areas: [String]!) { businesses { size(areas: $areas) } }"
                },
                "written_to": null,
                "success": true
            },
            "error": null
        });
        assert_json_eq!(expected, json!(JsonOutput::from(output)));
    }

    #[test]
    fn check_results_json() {
        let output = TapeOutput::CheckResults(CheckSummary {
            results: vec![
                CheckResult {
                    operation: "getBusinessFromAreaQuery".to_string(),
                    path: Utf8PathBuf::from("fixtures/get_business_count_in_area.cs"),
                    status: CheckStatus::Passed,
                    warnings: vec![],
                },
                CheckResult {
                    operation: "getBusinessesByBoundingBoxWithTags".to_string(),
                    path: Utf8PathBuf::from("fixtures/bbox.cs"),
                    status: CheckStatus::Passed,
                    warnings: vec!["'$isics' is not declared by the operation".to_string()],
                },
            ],
        });
        let expected = json!({
            "json_version": "1",
            "data": {
                "results": [
                    {
                        "operation": "getBusinessFromAreaQuery",
                        "path": "fixtures/get_business_count_in_area.cs",
                        "status": "passed",
                        "warnings": []
                    },
                    {
                        "operation": "getBusinessesByBoundingBoxWithTags",
                        "path": "fixtures/bbox.cs",
                        "status": "passed",
                        "warnings": ["'$isics' is not declared by the operation"]
                    }
                ],
                "passed": 2,
                "failed": 0,
                "success": true
            },
            "error": null
        });
        assert_json_eq!(expected, json!(JsonOutput::from(output)));
    }

    #[test]
    fn failed_diff_json_keeps_reports() {
        let report = mismatched_report();
        let error = TapeError::new(CommandFailure::new(
            "1 response does not match its recording",
            TapeOutput::MatchReports {
                reports: vec![report],
                skipped: vec![],
            },
        ));
        let expected = json!({
            "json_version": "1",
            "data": {
                "reports": [{
                    "operationName": "getBusinessFromAreaQuery",
                    "diffs": [{
                        "path": "data.businesses.size",
                        "kind": "value_changed",
                        "expected": 897,
                        "actual": 912
                    }],
                    "tolerated": [],
                    "ignored": []
                }],
                "skipped": [],
                "success": false
            },
            "error": {
                "message": "1 response does not match its recording",
                "code": "E005"
            }
        });
        assert_json_eq!(expected, json!(JsonOutput::from(error)));
    }

    #[test]
    fn skipped_responses_keep_their_codes() {
        let error = TapeError::new(CommandFailure::new(
            "1 response could not be compared",
            TapeOutput::MatchReports {
                reports: vec![],
                skipped: vec![SkippedResponse {
                    operation: "getMapPlacesPredictions".to_string(),
                    path: Utf8PathBuf::from("responses/getMapPlacesPredictions.json"),
                    message: "no recorded response".to_string(),
                    code: Some(TapeErrorCode::E007),
                }],
            },
        ));
        let expected = json!({
            "json_version": "1",
            "data": {
                "reports": [],
                "skipped": [{
                    "operation": "getMapPlacesPredictions",
                    "path": "responses/getMapPlacesPredictions.json",
                    "message": "no recorded response",
                    "code": "E007"
                }],
                "success": false
            },
            "error": {
                "message": "1 response could not be compared",
                "code": "E007"
            }
        });
        assert_json_eq!(expected, json!(JsonOutput::from(error)));
    }

    #[test]
    fn explanation_json() {
        let output = TapeOutput::ErrorExplanation("**E007**".to_string());
        let expected = json!({
            "json_version": "1",
            "data": { "explanation": "**E007**", "success": true },
            "error": null
        });
        assert_json_eq!(expected, json!(JsonOutput::from(output)));
    }
}
