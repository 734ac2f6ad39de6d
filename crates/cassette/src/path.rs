use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::CassetteError;

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// The location of a value inside a JSON document, e.g. `data.facts[3].value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    pub const fn root() -> JsonPath {
        JsonPath(Vec::new())
    }

    pub fn child_key(&self, key: &str) -> JsonPath {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        JsonPath(segments)
    }

    pub fn child_index(&self, index: usize) -> JsonPath {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        JsonPath(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    if position > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                PathSegment::Key(key) => write!(f, "[{}]", Value::String(key.clone()))?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for JsonPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    AnyKey,
    Index(usize),
    AnyIndex,
    AnyDepth,
}

impl PatternSegment {
    fn accepts(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (PatternSegment::Key(expected), PathSegment::Key(key)) => expected == key,
            (PatternSegment::AnyKey, PathSegment::Key(_)) => true,
            (PatternSegment::Index(expected), PathSegment::Index(index)) => expected == index,
            (PatternSegment::AnyIndex, PathSegment::Index(_)) => true,
            _ => false,
        }
    }
}

/// A pattern over [`JsonPath`]s used to mark volatile fields.
///
/// `*` matches any single object key, `[*]` any array index and `**` any
/// number of segments. Keys that are not plain identifiers are written as
/// `["13/5161/3514"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &JsonPath) -> bool {
        matches_from(&self.segments, path.segments())
    }
}

fn matches_from(pattern: &[PatternSegment], path: &[PathSegment]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((PatternSegment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| matches_from(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.accepts(head) && matches_from(rest, tail),
            None => false,
        },
    }
}

impl FromStr for PathPattern {
    type Err = CassetteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CassetteError::InvalidPathPattern {
            pattern: s.to_string(),
            reason: reason.to_string(),
        };

        let source = s.trim();
        if source.is_empty() {
            return Err(invalid("the pattern is empty"));
        }

        let mut segments = Vec::new();
        let mut rest = source;
        let mut after_dot = false;
        while !rest.is_empty() {
            if let Some(bracketed) = rest.strip_prefix('[') {
                let close = find_closing_bracket(bracketed)
                    .ok_or_else(|| invalid("a '[' is never closed"))?;
                let inner = bracketed[..close].trim();
                segments.push(parse_bracketed(inner).map_err(|reason| invalid(&reason))?);
                rest = &bracketed[close + 1..];
                after_dot = false;
            } else if let Some(after) = rest.strip_prefix('.') {
                if segments.is_empty() || after_dot {
                    return Err(invalid("a segment is empty"));
                }
                rest = after;
                after_dot = true;
                if rest.is_empty() {
                    return Err(invalid("the pattern ends with '.'"));
                }
            } else {
                if !segments.is_empty() && !after_dot {
                    return Err(invalid("keys must be separated by '.'"));
                }
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                let key = &rest[..end];
                segments.push(match key {
                    "*" => PatternSegment::AnyKey,
                    "**" => PatternSegment::AnyDepth,
                    key => PatternSegment::Key(key.to_string()),
                });
                rest = &rest[end..];
                after_dot = false;
            }
        }

        Ok(PathPattern {
            source: source.to_string(),
            segments,
        })
    }
}

fn find_closing_bracket(bracketed: &str) -> Option<usize> {
    // a quoted key may itself contain ']'
    if bracketed.trim_start().starts_with('"') {
        let mut escaped = false;
        let mut in_string = false;
        for (position, c) in bracketed.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                ']' if !in_string => return Some(position),
                _ => {}
            }
        }
        None
    } else {
        bracketed.find(']')
    }
}

fn parse_bracketed(inner: &str) -> Result<PatternSegment, String> {
    if inner == "*" {
        Ok(PatternSegment::AnyIndex)
    } else if inner.starts_with('"') {
        serde_json::from_str::<String>(inner)
            .map(PatternSegment::Key)
            .map_err(|e| format!("'{inner}' is not a valid quoted key: {e}"))
    } else {
        inner
            .parse::<usize>()
            .map(PatternSegment::Index)
            .map_err(|_| format!("'[{inner}]' must hold an index, '*' or a quoted key"))
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use speculoos::prelude::*;

    use super::*;

    fn path(segments: &[PathSegment]) -> JsonPath {
        JsonPath(segments.to_vec())
    }

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn paths_display_like_accessors() {
        let p = JsonPath::root()
            .child_key("data")
            .child_key("businesses")
            .child_key("otherClusters")
            .child_key("geohashGridBuckets")
            .child_index(0)
            .child_key("13/5161/3514");

        assert_eq!(
            p.to_string(),
            r#"data.businesses.otherClusters.geohashGridBuckets[0]["13/5161/3514"]"#
        );
        assert_eq!(JsonPath::root().to_string(), "$");
    }

    #[rstest]
    #[case::exact("data.businesses.size", true)]
    #[case::any_key("data.*.size", true)]
    #[case::any_depth("**.size", true)]
    #[case::any_depth_prefix("data.**", true)]
    #[case::too_short("data.businesses", false)]
    #[case::other_key("data.population.size", false)]
    #[case::index_on_key("data[0].size", false)]
    fn patterns_match_object_paths(#[case] pattern: &str, #[case] expected: bool) {
        let p = path(&[key("data"), key("businesses"), key("size")]);
        let pattern: PathPattern = pattern.parse().unwrap();
        assert_that!(pattern.matches(&p)).is_equal_to(expected);
    }

    #[rstest]
    #[case::any_index("data.isicBuckets[*].size", true)]
    #[case::exact_index("data.isicBuckets[2].size", true)]
    #[case::other_index("data.isicBuckets[1].size", false)]
    #[case::star_is_not_an_index("data.isicBuckets.*.size", false)]
    #[case::quoted_key(r#"["data"].isicBuckets[*]["size"]"#, true)]
    fn patterns_match_array_paths(#[case] pattern: &str, #[case] expected: bool) {
        let p = path(&[
            key("data"),
            key("isicBuckets"),
            PathSegment::Index(2),
            key("size"),
        ]);
        let pattern: PathPattern = pattern.parse().unwrap();
        assert_that!(pattern.matches(&p)).is_equal_to(expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_dot(".data")]
    #[case::double_dot("data..size")]
    #[case::trailing_dot("data.")]
    #[case::unclosed("data[0")]
    #[case::bad_index("data[x]")]
    #[case::missing_separator("data[0]size")]
    fn invalid_patterns_are_rejected(#[case] pattern: &str) {
        let result = pattern.parse::<PathPattern>();
        assert!(matches!(
            result,
            Err(CassetteError::InvalidPathPattern { .. })
        ));
    }
}
