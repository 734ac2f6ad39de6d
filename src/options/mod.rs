mod matching;
mod variables;

pub(crate) use matching::MatchRulesOpt;
pub(crate) use variables::VariablesOpt;
