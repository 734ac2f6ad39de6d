use std::{io, process};

use camino::{Utf8Path, Utf8PathBuf};
use cassette::FixtureStore;
use clap::{Parser, Subcommand, ValueEnum};
use spool::Level;

use crate::command::{self, JsonOutput};
use crate::utils::config::{CONFIG_FILE_NAME, ConfigError, TapeConfig};
use crate::utils::env::{TapeEnv, TapeEnvKey};
use crate::{TapeOutput, TapeResult};

/// The fixtures directory used when none is configured.
pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";

#[derive(Debug, Parser)]
#[command(
    name = "tape",
    author,
    version,
    about = "
tape - replay recorded GraphQL requests

A fixture is a recorded request: the JSON header that was sent, the query
document, and optionally the response that came back after a `#response` line.

The most common commands are:

    - tape list: show every recorded operation
    - tape render <OPERATION>: build the request body for an operation
    - tape check: make sure every fixture still renders with its own variables
    - tape diff <OPERATION> --response <FILE>: compare a live response with the recording
"
)]
pub struct Tape {
    #[command(subcommand)]
    command: Command,

    /// Specify tape's log level
    #[arg(long = "log", short = 'l', global = true)]
    log_level: Option<Level>,

    /// The output format
    #[arg(long = "format", value_enum, default_value = "plain", global = true)]
    format_kind: TapeOutputFormatKind,

    /// The directory holding fixture files. Defaults to `$TAPE_FIXTURES_DIR`, then `./fixtures`
    #[arg(long = "fixtures", value_name = "DIR", global = true)]
    fixtures: Option<Utf8PathBuf>,

    /// The config file with matching rules. Defaults to `$TAPE_CONFIG`,
    /// then `tape.toml` inside the fixtures directory if it exists
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<Utf8PathBuf>,

    #[arg(skip)]
    env_store: TapeEnv,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TapeOutputFormatKind {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the recorded operations
    List(command::List),

    /// Render the request body for a recorded operation
    Render(command::Render),

    /// Check that every fixture renders with its own variables
    Check(command::Check),

    /// Compare responses with the recorded ones
    Diff(command::Diff),

    /// Explain error codes
    Explain(command::Explain),
}

impl Tape {
    pub fn run_from_args() -> io::Result<()> {
        Tape::parse().run()
    }

    pub fn run(&self) -> io::Result<()> {
        spool::init(self.log_level);

        match self.execute_command() {
            Ok(output) => {
                match self.format_kind {
                    TapeOutputFormatKind::Plain => output.print()?,
                    TapeOutputFormatKind::Json => JsonOutput::from(output).print()?,
                }
                process::exit(0);
            }
            Err(error) => {
                tracing::debug!(?error);
                match self.format_kind {
                    TapeOutputFormatKind::Plain => error.print()?,
                    TapeOutputFormatKind::Json => JsonOutput::from(error).print()?,
                }
                process::exit(1);
            }
        }
    }

    pub fn execute_command(&self) -> TapeResult<TapeOutput> {
        match &self.command {
            Command::List(command) => command.run(&self.load_store()?),
            Command::Render(command) => command.run(&self.load_store()?),
            Command::Check(command) => command.run(&self.load_store()?),
            Command::Diff(command) => command.run(&self.load_store()?, &self.load_config()?),
            Command::Explain(command) => command.run(),
        }
    }

    pub(crate) fn get_fixtures_dir(&self) -> TapeResult<Utf8PathBuf> {
        if let Some(dir) = &self.fixtures {
            return Ok(dir.clone());
        }
        Ok(self
            .env_store
            .get(TapeEnvKey::FixturesDir)?
            .map_or_else(|| Utf8PathBuf::from(DEFAULT_FIXTURES_DIR), Utf8PathBuf::from))
    }

    pub(crate) fn get_config_path(&self) -> TapeResult<Option<Utf8PathBuf>> {
        if let Some(path) = &self.config {
            return Ok(Some(path.clone()));
        }
        if let Some(path) = self.env_store.get(TapeEnvKey::Config)? {
            return Ok(Some(Utf8PathBuf::from(path)));
        }
        let default = self.get_fixtures_dir()?.join(CONFIG_FILE_NAME);
        Ok(default.is_file().then_some(default))
    }

    fn load_config(&self) -> TapeResult<TapeConfig> {
        match self.get_config_path()? {
            Some(path) => Ok(TapeConfig::load(&path)?),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(TapeConfig::default())
            }
        }
    }

    fn load_store(&self) -> TapeResult<FixtureStore> {
        let config = self.load_config()?;
        let dir = self.get_fixtures_dir()?;
        load_store_from(&dir, &config)
    }
}

fn load_store_from(dir: &Utf8Path, config: &TapeConfig) -> TapeResult<FixtureStore> {
    let store = FixtureStore::load(dir, &config.load_options()).map_err(|source| {
        ConfigError::FixturesDir {
            path: dir.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(
        %dir,
        fixtures = store.len(),
        failures = store.failures().len(),
        "loaded fixture store"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use speculoos::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::TapeErrorCode;

    fn tape(args: &[&str]) -> Tape {
        let mut argv = vec!["tape"];
        argv.extend_from_slice(args);
        Tape::parse_from(argv)
    }

    #[test]
    fn the_cli_is_well_formed() {
        Tape::command().debug_assert();
    }

    #[test]
    fn fixtures_dir_defaults_to_fixtures() {
        let tape = tape(&["list"]);
        assert_that!(tape.get_fixtures_dir().unwrap())
            .is_equal_to(Utf8PathBuf::from(DEFAULT_FIXTURES_DIR));
    }

    #[test]
    fn fixtures_dir_reads_the_environment() {
        let mut tape = tape(&["list"]);
        tape.env_store.insert(TapeEnvKey::FixturesDir, "recordings");
        assert_that!(tape.get_fixtures_dir().unwrap()).is_equal_to(Utf8PathBuf::from("recordings"));
    }

    #[test]
    fn the_flag_wins_over_the_environment() {
        let mut tape = tape(&["--fixtures", "from-flag", "list"]);
        tape.env_store.insert(TapeEnvKey::FixturesDir, "recordings");
        assert_that!(tape.get_fixtures_dir().unwrap()).is_equal_to(Utf8PathBuf::from("from-flag"));
    }

    #[test]
    fn config_is_found_inside_the_fixtures_dir() {
        let dir = TempDir::new().unwrap();
        let dir_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let tape = tape(&["--fixtures", dir_path.as_str(), "list"]);
        assert_that!(tape.get_config_path().unwrap()).is_none();

        std::fs::write(dir_path.join(CONFIG_FILE_NAME), "[matching]\n").unwrap();
        assert_that!(tape.get_config_path().unwrap())
            .is_equal_to(Some(dir_path.join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn a_missing_fixtures_dir_is_a_config_error() {
        let tape = tape(&["--fixtures", "/definitely/not/here", "list"]);
        let error = tape.execute_command().unwrap_err();
        assert_that!(error.code()).is_equal_to(Some(TapeErrorCode::E008));
    }

    #[test]
    fn explain_needs_no_fixtures() {
        let tape = tape(&["--fixtures", "/definitely/not/here", "explain", "E001"]);
        assert_that!(tape.execute_command()).is_ok();
    }

    #[test]
    fn format_is_global() {
        let tape = tape(&["list", "--format", "json"]);
        assert_that!(tape.format_kind).is_equal_to(TapeOutputFormatKind::Json);
    }
}
