use camino::Utf8PathBuf;
use cassette::{Fixture, FixtureStore, LoadFailure, OperationKind};
use clap::Parser;
use serde::Serialize;
use tape_std::{Style, infoln};

use crate::error::metadata::cassette_metadata;
use crate::{TapeErrorCode, TapeOutput, TapeResult};

#[derive(Debug, Parser)]
pub struct List {
    /// Only list fixtures that have a recorded response
    #[arg(long)]
    with_response: bool,
}

/// One row of `tape list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureSummary {
    pub operation: String,
    pub kind: OperationKind,
    /// Declarations as written, e.g. `$zoom: Int = 13`
    pub variables: Vec<String>,
    pub has_response: bool,
    pub path: Utf8PathBuf,
}

impl From<&Fixture> for FixtureSummary {
    fn from(fixture: &Fixture) -> Self {
        let variables = fixture
            .template()
            .variable_schema()
            .iter()
            .map(|definition| match &definition.default {
                Some(default) => format!("${}: {} = {}", definition.name, definition.ty, default),
                None => format!("${}: {}", definition.name, definition.ty),
            })
            .collect();
        FixtureSummary {
            operation: fixture.operation_name().to_string(),
            kind: fixture.template().operation_kind(),
            variables,
            has_response: fixture.invocation().expected_response().is_some(),
            path: fixture.path().to_path_buf(),
        }
    }
}

/// A file in the fixtures directory that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailureSummary {
    pub path: Utf8PathBuf,
    pub message: String,
    pub code: Option<TapeErrorCode>,
}

impl From<&LoadFailure> for LoadFailureSummary {
    fn from(failure: &LoadFailure) -> Self {
        let (_, code) = cassette_metadata(&failure.error);
        LoadFailureSummary {
            path: failure.path.clone(),
            message: failure.error.to_string(),
            code,
        }
    }
}

impl List {
    pub fn run(&self, store: &FixtureStore) -> TapeResult<TapeOutput> {
        infoln!(
            "Found {} fixture(s) and {} unreadable file(s)",
            Style::Command.paint(store.len().to_string()),
            Style::Command.paint(store.failures().len().to_string())
        );

        let fixtures = store
            .fixtures()
            .filter(|fixture| {
                !self.with_response || fixture.invocation().expected_response().is_some()
            })
            .map(FixtureSummary::from)
            .collect();
        let failures = store
            .failures()
            .iter()
            .map(LoadFailureSummary::from)
            .collect();

        Ok(TapeOutput::FixtureList { fixtures, failures })
    }
}
