use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use cassette::{CassetteError, LoadOptions, MatchRules, PathPattern, Tolerance};
use indexmap::IndexMap;
use serde::Deserialize;
use tape_std::{Fs, TapeStdError};
use thiserror::Error;

/// The name of the config file looked for inside the fixtures directory.
pub const CONFIG_FILE_NAME: &str = "tape.toml";

/// Problems with the configuration or the fixtures directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read the config file at '{path}'.")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: TapeStdError,
    },

    #[error("The config file at '{path}' is not valid TOML.")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("The config file at '{path}' has an invalid matching rule.")]
    InvalidRule {
        path: Utf8PathBuf,
        #[source]
        source: CassetteError,
    },

    #[error("Could not load fixtures from '{path}'.")]
    FixturesDir {
        path: Utf8PathBuf,
        #[source]
        source: CassetteError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    fixtures: FixturesSection,
    #[serde(default)]
    matching: MatchingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixturesSection {
    extensions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchingSection {
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    tolerance: IndexMap<String, String>,
    #[serde(default)]
    operations: BTreeMap<String, RulesSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesSection {
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    tolerance: IndexMap<String, String>,
}

fn compile_rules(
    ignore: &[String],
    tolerance: &IndexMap<String, String>,
) -> Result<MatchRules, CassetteError> {
    let mut rules = MatchRules::new();
    for pattern in ignore {
        rules.add_ignore(pattern.parse::<PathPattern>()?);
    }
    for (pattern, amount) in tolerance {
        rules.add_tolerance(pattern.parse()?, amount.parse::<Tolerance>()?);
    }
    Ok(rules)
}

/// Settings read from `tape.toml`.
///
/// ```toml
/// [fixtures]
/// extensions = ["cs"]
///
/// [matching]
/// ignore = ["extensions"]
/// tolerance = { "data.businesses.size" = "5%" }
///
/// [matching.operations.getSectorsSizeQuery]
/// ignore = ["data.businesses.aggregationByIsic.isicBuckets[*].size"]
/// ```
#[derive(Debug, Default)]
pub struct TapeConfig {
    extensions: Option<Vec<String>>,
    rules: MatchRules,
    operations: BTreeMap<String, MatchRules>,
}

impl TapeConfig {
    pub fn load(path: &Utf8Path) -> Result<TapeConfig, ConfigError> {
        let contents = match Fs::read_file(path) {
            Ok(contents) => contents,
            Err(TapeStdError::EmptyFile { .. }) => {
                tracing::debug!(%path, "config file is empty, using defaults");
                String::new()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        TapeConfig::parse(path, &contents)
    }

    pub fn parse(path: &Utf8Path, contents: &str) -> Result<TapeConfig, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let invalid_rule = |source| ConfigError::InvalidRule {
            path: path.to_path_buf(),
            source,
        };

        let rules =
            compile_rules(&file.matching.ignore, &file.matching.tolerance).map_err(invalid_rule)?;
        let mut operations = BTreeMap::new();
        for (operation, section) in &file.matching.operations {
            operations.insert(
                operation.clone(),
                compile_rules(&section.ignore, &section.tolerance).map_err(invalid_rule)?,
            );
        }

        tracing::debug!(
            %path,
            operations = operations.len(),
            "loaded config"
        );
        Ok(TapeConfig {
            extensions: file.fixtures.extensions,
            rules,
            operations,
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        match &self.extensions {
            Some(extensions) => LoadOptions {
                extensions: extensions.clone(),
                ..Default::default()
            },
            None => LoadOptions::default(),
        }
    }

    /// The global rules followed by the rules for `operation`.
    pub fn rules_for(&self, operation: &str) -> MatchRules {
        let mut rules = self.rules.clone();
        if let Some(operation_rules) = self.operations.get(operation) {
            rules.extend(operation_rules.clone());
        }
        rules
    }
}
