use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use crate::{CassetteError, Fixture, JsonKind, JsonPath, PathPattern};

/// How far a number may drift from its recorded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// A fraction of the recorded value, written `5%`.
    Relative(f64),
    /// An absolute difference, written `12`.
    Absolute(f64),
}

impl Tolerance {
    pub fn allows(&self, expected: f64, actual: f64) -> bool {
        let delta = (expected - actual).abs();
        match self {
            Tolerance::Relative(fraction) => delta <= fraction * expected.abs(),
            Tolerance::Absolute(allowed) => delta <= *allowed,
        }
    }
}

impl FromStr for Tolerance {
    type Err = CassetteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CassetteError::InvalidTolerance {
            tolerance: s.to_string(),
            reason: reason.to_string(),
        };

        let written = s.trim();
        let (number, relative) = match written.strip_suffix('%') {
            Some(percent) => (percent.trim(), true),
            None => (written, false),
        };
        let amount: f64 = number
            .parse()
            .map_err(|_| invalid("expected a number such as '12' or a percentage such as '5%'"))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(invalid("tolerances must be finite and not negative"));
        }

        Ok(if relative {
            Tolerance::Relative(amount / 100.0)
        } else {
            Tolerance::Absolute(amount)
        })
    }
}

impl Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Relative(fraction) => write!(f, "{}%", fraction * 100.0),
            Tolerance::Absolute(delta) => write!(f, "{delta}"),
        }
    }
}

impl Serialize for Tolerance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Which fields of a response are volatile.
#[derive(Debug, Clone, Default)]
pub struct MatchRules {
    ignore: Vec<PathPattern>,
    tolerances: Vec<(PathPattern, Tolerance)>,
}

impl MatchRules {
    pub fn new() -> MatchRules {
        MatchRules::default()
    }

    pub fn ignore(mut self, pattern: PathPattern) -> MatchRules {
        self.add_ignore(pattern);
        self
    }

    pub fn tolerate(mut self, pattern: PathPattern, tolerance: Tolerance) -> MatchRules {
        self.add_tolerance(pattern, tolerance);
        self
    }

    pub fn add_ignore(&mut self, pattern: PathPattern) {
        self.ignore.push(pattern);
    }

    pub fn add_tolerance(&mut self, pattern: PathPattern, tolerance: Tolerance) {
        self.tolerances.push((pattern, tolerance));
    }

    /// Appends `other`'s rules after these.
    pub fn extend(&mut self, other: MatchRules) {
        self.ignore.extend(other.ignore);
        self.tolerances.extend(other.tolerances);
    }

    pub fn ignore_patterns(&self) -> &[PathPattern] {
        &self.ignore
    }

    pub fn tolerances(&self) -> &[(PathPattern, Tolerance)] {
        &self.tolerances
    }

    pub fn is_ignored(&self, path: &JsonPath) -> bool {
        self.ignore.iter().any(|pattern| pattern.matches(path))
    }

    /// The tolerance for `path`. Later rules take precedence.
    pub fn tolerance_for(&self, path: &JsonPath) -> Option<Tolerance> {
        self.tolerances
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, tolerance)| *tolerance)
    }

    pub fn is_empty(&self) -> bool {
        self.ignore.is_empty() && self.tolerances.is_empty()
    }
}

/// What differs at a path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffKind {
    /// The recording has a value the response lacks.
    Missing { expected: Value },
    /// The response has a value the recording lacks.
    Unexpected { actual: Value },
    TypeChanged { expected: JsonKind, actual: JsonKind },
    ValueChanged { expected: Value, actual: Value },
}

/// A single difference between the recorded and the actual response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub path: JsonPath,
    #[serde(flatten)]
    pub kind: DiffKind,
}

impl Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiffKind::Missing { expected } => {
                write!(f, "{}: missing, expected {expected}", self.path)
            }
            DiffKind::Unexpected { actual } => write!(f, "{}: unexpected {actual}", self.path),
            DiffKind::TypeChanged { expected, actual } => {
                write!(f, "{}: expected {expected}, found {actual}", self.path)
            }
            DiffKind::ValueChanged { expected, actual } => {
                write!(f, "{}: expected {expected}, found {actual}", self.path)
            }
        }
    }
}

/// A number that drifted within its tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToleratedDrift {
    pub path: JsonPath,
    pub expected: Number,
    pub actual: Number,
    pub tolerance: Tolerance,
}

impl Display for ToleratedDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} drifted to {} (within {})",
            self.path, self.expected, self.actual, self.tolerance
        )
    }
}

/// The per-field outcome of comparing one response with its recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub operation_name: String,
    pub diffs: Vec<FieldDiff>,
    pub tolerated: Vec<ToleratedDrift>,
    pub ignored: Vec<JsonPath>,
}

impl MatchReport {
    fn new(operation_name: &str) -> MatchReport {
        MatchReport {
            operation_name: operation_name.to_string(),
            diffs: Vec::new(),
            tolerated: Vec::new(),
            ignored: Vec::new(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.diffs.is_empty()
    }
}

/// Compares responses structurally under a set of [`MatchRules`].
#[derive(Debug, Clone, Default)]
pub struct ResponseMatcher {
    rules: MatchRules,
}

impl ResponseMatcher {
    pub const fn new(rules: MatchRules) -> ResponseMatcher {
        ResponseMatcher { rules }
    }

    pub const fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn compare(&self, operation_name: &str, expected: &Value, actual: &Value) -> MatchReport {
        let mut report = MatchReport::new(operation_name);
        self.walk(JsonPath::root(), Some(expected), Some(actual), &mut report);
        tracing::debug!(
            operation = operation_name,
            diffs = report.diffs.len(),
            tolerated = report.tolerated.len(),
            ignored = report.ignored.len(),
            "compared response"
        );
        report
    }

    /// Compares `actual` with the response recorded in `fixture`.
    pub fn compare_fixture(
        &self,
        fixture: &Fixture,
        actual: &Value,
    ) -> Result<MatchReport, CassetteError> {
        let expected = fixture.invocation().expected_response().ok_or_else(|| {
            CassetteError::NoRecordedResponse {
                operation: fixture.operation_name().to_string(),
            }
        })?;
        Ok(self.compare(fixture.operation_name(), expected, actual))
    }

    fn walk(
        &self,
        path: JsonPath,
        expected: Option<&Value>,
        actual: Option<&Value>,
        report: &mut MatchReport,
    ) {
        if expected.is_none() && actual.is_none() {
            return;
        }
        if self.rules.is_ignored(&path) {
            report.ignored.push(path);
            return;
        }
        match (expected, actual) {
            (Some(expected), Some(actual)) => self.compare_values(path, expected, actual, report),
            (Some(expected), None) => report.diffs.push(FieldDiff {
                path,
                kind: DiffKind::Missing {
                    expected: expected.clone(),
                },
            }),
            (None, Some(actual)) => report.diffs.push(FieldDiff {
                path,
                kind: DiffKind::Unexpected {
                    actual: actual.clone(),
                },
            }),
            (None, None) => {}
        }
    }

    fn compare_values(&self, path: JsonPath, expected: &Value, actual: &Value, report: &mut MatchReport) {
        match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                for (key, expected_value) in expected {
                    self.walk(path.child_key(key), Some(expected_value), actual.get(key), report);
                }
                for (key, actual_value) in actual {
                    if !expected.contains_key(key) {
                        self.walk(path.child_key(key), None, Some(actual_value), report);
                    }
                }
            }
            (Value::Array(expected), Value::Array(actual)) => {
                for index in 0..expected.len().max(actual.len()) {
                    self.walk(path.child_index(index), expected.get(index), actual.get(index), report);
                }
            }
            (Value::Number(expected_number), Value::Number(actual_number)) => {
                if numbers_equal(expected_number, actual_number) {
                    return;
                }
                let within = self.rules.tolerance_for(&path).and_then(|tolerance| {
                    let (e, a) = (expected_number.as_f64()?, actual_number.as_f64()?);
                    tolerance.allows(e, a).then_some(tolerance)
                });
                match within {
                    Some(tolerance) => report.tolerated.push(ToleratedDrift {
                        path,
                        expected: expected_number.clone(),
                        actual: actual_number.clone(),
                        tolerance,
                    }),
                    None => report.diffs.push(FieldDiff {
                        path,
                        kind: DiffKind::ValueChanged {
                            expected: expected.clone(),
                            actual: actual.clone(),
                        },
                    }),
                }
            }
            _ if JsonKind::of(expected) != JsonKind::of(actual) => report.diffs.push(FieldDiff {
                path,
                kind: DiffKind::TypeChanged {
                    expected: JsonKind::of(expected),
                    actual: JsonKind::of(actual),
                },
            }),
            _ if expected != actual => report.diffs.push(FieldDiff {
                path,
                kind: DiffKind::ValueChanged {
                    expected: expected.clone(),
                    actual: actual.clone(),
                },
            }),
            _ => {}
        }
    }
}

/// `1` and `1.0` are equal; integers compare exactly.
fn numbers_equal(expected: &Number, actual: &Number) -> bool {
    if let (Some(e), Some(a)) = (expected.as_i64(), actual.as_i64()) {
        return e == a;
    }
    if let (Some(e), Some(a)) = (expected.as_u64(), actual.as_u64()) {
        return e == a;
    }
    match (expected.as_f64(), actual.as_f64()) {
        (Some(e), Some(a)) => e == a,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use speculoos::prelude::*;

    use super::*;

    fn pattern(p: &str) -> PathPattern {
        p.parse().unwrap()
    }

    fn paths(diffs: &[FieldDiff]) -> Vec<String> {
        diffs.iter().map(|diff| diff.path.to_string()).collect()
    }

    #[test]
    fn identical_responses_match() {
        let response = json!({"data": {"businesses": {"size": 897}}});
        let report = ResponseMatcher::default().compare("q", &response, &response);
        assert_that!(report.is_match()).is_true();
        assert_that!(report.tolerated).is_empty();
    }

    #[test]
    fn it_reports_every_differing_field() {
        let expected = json!({
            "data": {
                "facts": [{"value": 1}, {"value": 2}],
                "name": "Riyadh",
                "population": {"size": 10},
                "gone": true
            }
        });
        let actual = json!({
            "data": {
                "facts": [{"value": 1}, {"value": 3}, {"value": 4}],
                "name": "Jeddah",
                "population": "10",
                "extra": null
            }
        });

        let report = ResponseMatcher::default().compare("q", &expected, &actual);

        assert_eq!(
            paths(&report.diffs),
            vec![
                "data.facts[1].value",
                "data.facts[2]",
                "data.name",
                "data.population",
                "data.gone",
                "data.extra"
            ]
        );
        assert_eq!(
            report.diffs[3].kind,
            DiffKind::TypeChanged {
                expected: JsonKind::Object,
                actual: JsonKind::String
            }
        );
        assert_eq!(
            report.diffs[4].kind,
            DiffKind::Missing {
                expected: json!(true)
            }
        );
        assert_eq!(
            report.diffs[5].kind,
            DiffKind::Unexpected { actual: Value::Null }
        );
    }

    #[test]
    fn integers_and_floats_compare_numerically() {
        let report = ResponseMatcher::default().compare("q", &json!({"a": 1}), &json!({"a": 1.0}));
        assert_that!(report.is_match()).is_true();
    }

    #[test]
    fn ignored_fields_are_listed_not_diffed() {
        let rules = MatchRules::new().ignore(pattern("data.isicBuckets[*].size"));
        let expected = json!({"data": {"isicBuckets": [{"key": "G", "size": 1}, {"key": "Q", "size": 2}]}});
        let actual = json!({"data": {"isicBuckets": [{"key": "G", "size": 5}, {"key": "Q", "size": 9}]}});

        let report = ResponseMatcher::new(rules).compare("q", &expected, &actual);

        assert_that!(report.is_match()).is_true();
        let ignored = report.ignored.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(
            ignored,
            vec!["data.isicBuckets[0].size", "data.isicBuckets[1].size"]
        );
    }

    #[rstest]
    #[case::relative_inside("5%", 1000, 1040, true)]
    #[case::relative_outside("5%", 1000, 1060, false)]
    #[case::absolute_inside("12", 897, 885, true)]
    #[case::absolute_outside("12", 897, 884, false)]
    fn tolerances_absorb_numeric_drift(
        #[case] tolerance: &str,
        #[case] expected: i64,
        #[case] actual: i64,
        #[case] tolerated: bool,
    ) {
        let rules = MatchRules::new().tolerate(pattern("**.size"), tolerance.parse().unwrap());
        let report = ResponseMatcher::new(rules).compare(
            "q",
            &json!({"data": {"businesses": {"size": expected}}}),
            &json!({"data": {"businesses": {"size": actual}}}),
        );

        assert_that!(report.is_match()).is_equal_to(tolerated);
        assert_that!(report.tolerated.len()).is_equal_to(usize::from(tolerated));
    }

    #[test]
    fn later_tolerances_take_precedence() {
        let rules = MatchRules::new()
            .tolerate(pattern("**"), Tolerance::Absolute(1.0))
            .tolerate(pattern("data.size"), Tolerance::Absolute(100.0));
        let path = JsonPath::root().child_key("data").child_key("size");
        assert_eq!(rules.tolerance_for(&path), Some(Tolerance::Absolute(100.0)));
    }

    #[rstest]
    #[case::percent("5%", Tolerance::Relative(0.05))]
    #[case::spaced_percent(" 25 % ", Tolerance::Relative(0.25))]
    #[case::absolute("12", Tolerance::Absolute(12.0))]
    #[case::fractional("0.5", Tolerance::Absolute(0.5))]
    fn tolerances_parse(#[case] written: &str, #[case] expected: Tolerance) {
        assert_eq!(written.parse::<Tolerance>().unwrap(), expected);
    }

    #[rstest]
    #[case::word("lots")]
    #[case::negative("-3")]
    #[case::empty("")]
    #[case::bare_percent("%")]
    fn bad_tolerances_are_rejected(#[case] written: &str) {
        assert!(matches!(
            written.parse::<Tolerance>(),
            Err(CassetteError::InvalidTolerance { .. })
        ));
    }

    #[test]
    fn reports_serialize_with_tagged_diffs() {
        let report = ResponseMatcher::default().compare(
            "getPopulation",
            &json!({"data": {"size": 1}}),
            &json!({"data": {"size": 2}}),
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "operationName": "getPopulation",
                "diffs": [{"path": "data.size", "kind": "value_changed", "expected": 1, "actual": 2}],
                "tolerated": [],
                "ignored": []
            })
        );
        assert_eq!(report.diffs[0].to_string(), "data.size: expected 1, found 2");
    }
}
