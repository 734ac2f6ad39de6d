use cassette::{CassetteError, MatchRules, PathPattern, Tolerance};
use clap::Parser;

#[derive(Debug, Default, Parser)]
pub struct MatchRulesOpt {
    /// Skip fields matching this path pattern, e.g. `data.*.updatedAt` or `**.size`.
    /// Can be passed more than once.
    #[arg(long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Allow numbers matching a pattern to drift, as `PATTERN=5%` (relative)
    /// or `PATTERN=12` (absolute). Can be passed more than once.
    #[arg(long = "tolerance", value_name = "PATTERN=AMOUNT")]
    tolerance: Vec<String>,
}

impl MatchRulesOpt {
    /// Compiles the rules passed on the command line.
    pub(crate) fn rules(&self) -> Result<MatchRules, CassetteError> {
        let mut rules = MatchRules::new();
        for pattern in &self.ignore {
            rules.add_ignore(pattern.parse::<PathPattern>()?);
        }
        for rule in &self.tolerance {
            let (pattern, amount) =
                rule.rsplit_once('=')
                    .ok_or_else(|| CassetteError::InvalidTolerance {
                        tolerance: rule.clone(),
                        reason: "expected PATTERN=AMOUNT".to_string(),
                    })?;
            rules.add_tolerance(pattern.parse()?, amount.parse::<Tolerance>()?);
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use cassette::JsonPath;
    use rstest::rstest;
    use speculoos::prelude::*;

    use super::*;

    fn size_path() -> JsonPath {
        JsonPath::root()
            .child_key("data")
            .child_key("businesses")
            .child_key("size")
    }

    #[test]
    fn it_compiles_ignores_and_tolerances() {
        let opt = MatchRulesOpt {
            ignore: vec!["extensions".to_string()],
            tolerance: vec!["data.businesses.size=5%".to_string()],
        };
        let rules = opt.rules().unwrap();
        assert_that!(rules.is_ignored(&JsonPath::root().child_key("extensions"))).is_true();
        assert_that!(rules.tolerance_for(&size_path()))
            .is_equal_to(Some(Tolerance::Relative(0.05)));
    }

    #[rstest]
    #[case::no_separator("data.businesses.size")]
    #[case::bad_amount("data.businesses.size=lots")]
    #[case::bad_pattern("data..size=5")]
    fn invalid_rules_are_rejected(#[case] rule: &str) {
        let opt = MatchRulesOpt {
            ignore: vec![],
            tolerance: vec![rule.to_string()],
        };
        assert_that!(opt.rules()).is_err();
    }
}
