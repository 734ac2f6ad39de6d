use std::fmt::{self, Display};

use camino::Utf8PathBuf;
use tape_std::Style;

use crate::utils::env::TapeEnvKey;

#[derive(Clone, Debug)]
pub enum TapeErrorSuggestion {
    FixFixture {
        path: Utf8PathBuf,
    },
    ProvideVariable {
        variable: String,
        expected: String,
    },
    FixVariableType {
        variable: String,
        expected: String,
    },
    ProvideValidOperation {
        available: Vec<String>,
    },
    RemoveDuplicate {
        path: Utf8PathBuf,
    },
    ReviewResponseDiffs,
    CheckRuleSyntax,
    RecordResponse {
        operation: String,
    },
    CheckFixturesDir,
    FixConfig,
    ExplainCheckFailures,
    Adhoc(String),
}

impl Display for TapeErrorSuggestion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suggestion = match self {
            TapeErrorSuggestion::FixFixture { path } => format!(
                "Fix the fixture at {} so it holds a JSON request header with a \"variables\" object followed by a GraphQL document. Run {} to find every fixture with problems.",
                Style::Path.paint(path),
                Style::Command.paint("`tape check`")
            ),
            TapeErrorSuggestion::ProvideVariable { variable, expected } => format!(
                "Pass a value of type {} for {} with {}.",
                Style::Command.paint(expected),
                Style::Command.paint(format!("${variable}")),
                Style::Command.paint("--variables")
            ),
            TapeErrorSuggestion::FixVariableType { variable, expected } => format!(
                "Change the value of {} so it is a {}. Lists must be JSON arrays, even with a single item.",
                Style::Command.paint(format!("${variable}")),
                Style::Command.paint(expected)
            ),
            TapeErrorSuggestion::ProvideValidOperation { available } => {
                if available.is_empty() {
                    format!(
                        "No fixtures were loaded. Check the directory passed to {} or set with {}.",
                        Style::Command.paint("--fixtures"),
                        Style::Command.paint(TapeEnvKey::FixturesDir.to_string())
                    )
                } else {
                    let mut operations = available.clone();
                    operations.sort();
                    format!(
                        "Try one of the recorded operations instead: {}",
                        operations.join(", ")
                    )
                }
            }
            TapeErrorSuggestion::RemoveDuplicate { path } => format!(
                "Remove {} or rename the operation it records.",
                Style::Path.paint(path)
            ),
            TapeErrorSuggestion::ReviewResponseDiffs => format!(
                "If these changes are expected, record the new response in the fixture, or mark volatile fields with {} or {}.",
                Style::Command.paint("--ignore"),
                Style::Command.paint("--tolerance")
            ),
            TapeErrorSuggestion::CheckRuleSyntax => format!(
                "Patterns are dotted paths such as {}, where {} matches any key, {} any index and {} any depth. Tolerances are written as {} or {}.",
                Style::Command.paint("data.businesses.size"),
                Style::Command.paint("*"),
                Style::Command.paint("[*]"),
                Style::Command.paint("**"),
                Style::Command.paint("5%"),
                Style::Command.paint("12")
            ),
            TapeErrorSuggestion::RecordResponse { operation } => format!(
                "Append a {} line and the recorded JSON response to the fixture for {}.",
                Style::Command.paint("#response"),
                Style::Command.paint(operation)
            ),
            TapeErrorSuggestion::CheckFixturesDir => format!(
                "Pass the directory holding your fixtures with {} or set {}.",
                Style::Command.paint("--fixtures"),
                Style::Command.paint(TapeEnvKey::FixturesDir.to_string())
            ),
            TapeErrorSuggestion::FixConfig => format!(
                "Fix the config file, or point {} or {} at a different one.",
                Style::Command.paint("--config"),
                Style::Command.paint(TapeEnvKey::Config.to_string())
            ),
            TapeErrorSuggestion::ExplainCheckFailures => format!(
                "Run {} with any of the codes above to learn more.",
                Style::Command.paint("`tape explain`")
            ),
            TapeErrorSuggestion::Adhoc(msg) => msg.to_string(),
        };
        write!(formatter, "{}", &suggestion)
    }
}
