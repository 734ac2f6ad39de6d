use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Display};
use strum_macros::{EnumIter, EnumString};

/// `TapeErrorCode` contains the error codes associated with specific errors.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum TapeErrorCode {
    E001,
    E002,
    E003,
    E004,
    E005,
    E006,
    E007,
    E008,
}

impl Display for TapeErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:?}", &self)
    }
}

impl TapeErrorCode {
    // builds a Map of every possible code and its explanation, so we can
    // access from the `explain` function
    fn explanations() -> HashMap<TapeErrorCode, String> {
        let contents = [
            (TapeErrorCode::E001, include_str!("./codes/E001.md").to_string()),
            (TapeErrorCode::E002, include_str!("./codes/E002.md").to_string()),
            (TapeErrorCode::E003, include_str!("./codes/E003.md").to_string()),
            (TapeErrorCode::E004, include_str!("./codes/E004.md").to_string()),
            (TapeErrorCode::E005, include_str!("./codes/E005.md").to_string()),
            (TapeErrorCode::E006, include_str!("./codes/E006.md").to_string()),
            (TapeErrorCode::E007, include_str!("./codes/E007.md").to_string()),
            (TapeErrorCode::E008, include_str!("./codes/E008.md").to_string()),
        ];
        contents.into_iter().collect()
    }

    /// For a given error code, returns a markdown string with a given error's
    /// explanation. Explanations are in ./codes
    pub fn explain(&self) -> String {
        let all_explanations = TapeErrorCode::explanations();
        let explanation = all_explanations.get(self);
        if let Some(explanation) = explanation {
            format!("**{}**\n\n{}\n\n", &self, &explanation)
        } else {
            "Explanation not available".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_code_has_an_explanation() {
        let explanations = TapeErrorCode::explanations();
        for code in TapeErrorCode::iter() {
            assert!(explanations.contains_key(&code), "{code} is not explained");
        }
    }

    #[rstest]
    #[case::upper("E005", TapeErrorCode::E005)]
    #[case::lower("e002", TapeErrorCode::E002)]
    fn codes_parse_from_strings(#[case] input: &str, #[case] expected: TapeErrorCode) {
        assert_eq!(TapeErrorCode::from_str(input).unwrap(), expected);
    }

    #[test]
    fn unknown_codes_do_not_parse() {
        assert!(TapeErrorCode::from_str("E999").is_err());
    }
}
