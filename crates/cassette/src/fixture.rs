use camino::{Utf8Path, Utf8PathBuf};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tape_std::{Fs, TapeStdError};

use crate::{CassetteError, QueryTemplate};

/// The `query` value recorded in headers whose document follows the header.
const QUERY_PLACEHOLDER: &str = "...";

lazy_static! {
    // `#response` and `# response` both occur in recorded files
    static ref RESPONSE_MARKER: Regex =
        Regex::new(r"(?mi)^[ \t]*#[ \t]*response[ \t]*\r?$").expect("response marker regex");
}

/// A template together with the variables it was recorded with and,
/// when it was captured, the response the API sent back.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleInvocation {
    template: QueryTemplate,
    variable_values: Map<String, Value>,
    expected_response: Option<Value>,
}

impl ExampleInvocation {
    pub const fn new(
        template: QueryTemplate,
        variable_values: Map<String, Value>,
        expected_response: Option<Value>,
    ) -> ExampleInvocation {
        ExampleInvocation {
            template,
            variable_values,
            expected_response,
        }
    }

    pub const fn template(&self) -> &QueryTemplate {
        &self.template
    }

    pub const fn variable_values(&self) -> &Map<String, Value> {
        &self.variable_values
    }

    pub const fn expected_response(&self) -> Option<&Value> {
        self.expected_response.as_ref()
    }

    /// Names in the variables block that the document never declares.
    pub fn undeclared_variables(&self) -> Vec<&str> {
        self.variable_values
            .keys()
            .filter(|name| self.template.variable(name).is_none())
            .map(String::as_str)
            .collect()
    }
}

/// A recorded fixture file.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    path: Utf8PathBuf,
    invocation: ExampleInvocation,
}

impl Fixture {
    /// Reads and parses the fixture at `path`.
    pub fn load<P>(path: P) -> Result<Fixture, CassetteError>
    where
        P: AsRef<Utf8Path>,
    {
        let path = path.as_ref();
        let contents = Fs::read_file(path).map_err(|error| match error {
            TapeStdError::EmptyFile { path } => CassetteError::MalformedFixture {
                path,
                reason: "the file is empty".to_string(),
            },
            error => CassetteError::Fs(error),
        })?;
        Fixture::parse(path, &contents)
    }

    /// Parses fixture `contents`, using `path` for error reporting.
    ///
    /// A fixture is a JSON request header (`operationName`, `variables` and a
    /// `query` placeholder), the GraphQL document, then optionally a
    /// `#response` marker line followed by the recorded JSON response.
    pub fn parse<P>(path: P, contents: &str) -> Result<Fixture, CassetteError>
    where
        P: Into<Utf8PathBuf>,
    {
        let path = path.into();
        let malformed = |reason: String| CassetteError::MalformedFixture {
            path: path.clone(),
            reason,
        };

        let (header, rest) = split_header(contents).map_err(&malformed)?;

        let operation_name = match header.get("operationName") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.as_str()),
            Some(_) => return Err(malformed("\"operationName\" must be a string".to_string())),
        };
        let variable_values = match header.get("variables") {
            Some(Value::Object(variables)) => variables.clone(),
            Some(_) => return Err(malformed("\"variables\" must be a JSON object".to_string())),
            None => {
                return Err(malformed(
                    "the request header has no \"variables\" block".to_string(),
                ))
            }
        };

        let (document, response) = match RESPONSE_MARKER.find(rest) {
            Some(marker) => (&rest[..marker.start()], Some(&rest[marker.end()..])),
            None => (rest, None),
        };

        let document = if document.trim().is_empty() {
            match header.get("query") {
                Some(Value::String(query))
                    if !query.trim().is_empty() && query.trim() != QUERY_PLACEHOLDER =>
                {
                    query.as_str()
                }
                _ => return Err(malformed("there is no query document".to_string())),
            }
        } else {
            document
        };

        let template = QueryTemplate::parse(document, operation_name).map_err(&malformed)?;

        let expected_response = match response.map(str::trim) {
            None => None,
            Some("") => {
                return Err(malformed(
                    "the response marker is not followed by a response".to_string(),
                ))
            }
            Some(response) => Some(
                serde_json::from_str::<Value>(response)
                    .map_err(|e| malformed(format!("the recorded response is not valid JSON: {e}")))?,
            ),
        };

        tracing::debug!(
            %path,
            operation = template.operation_name(),
            has_response = expected_response.is_some(),
            "parsed fixture"
        );

        Ok(Fixture {
            path,
            invocation: ExampleInvocation::new(template, variable_values, expected_response),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn operation_name(&self) -> &str {
        self.invocation.template().operation_name()
    }

    pub const fn invocation(&self) -> &ExampleInvocation {
        &self.invocation
    }

    pub const fn template(&self) -> &QueryTemplate {
        self.invocation.template()
    }
}

/// Splits the leading JSON object off `contents`, returning it and the text after it.
fn split_header(contents: &str) -> Result<(Map<String, Value>, &str), String> {
    if !contents.trim_start().starts_with('{') {
        return Err("the file does not start with a JSON request header".to_string());
    }
    let mut stream = serde_json::Deserializer::from_str(contents).into_iter::<Value>();
    match stream.next() {
        Some(Ok(Value::Object(header))) => Ok((header, &contents[stream.byte_offset()..])),
        Some(Ok(_)) => Err("the request header is not a JSON object".to_string()),
        Some(Err(e)) => Err(format!("the request header is not valid JSON: {e}")),
        None => Err("the file does not start with a JSON request header".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use speculoos::prelude::*;

    use super::*;

    const BOUNDING_BOX: &str = indoc! {r#"

        {
          "operationName": "getBusinessesByBoundingBox",
          "variables": {
            "minLat": 24.611954469013053,
            "maxLat": 24.75233471922736,
            "minLng": 46.767420507324225,
            "maxLng": 46.93015549267579,
            "isics": []
          },
          "query": "..."
        }

        query getBusinessesByBoundingBox(
          $minLat: Float!
          $maxLat: Float!
          $minLng: Float!
          $maxLng: Float!
        ) {
          businesses {
            size(
              locationBoundingBox: {
                minimalLatitude: $minLat
                maximalLatitude: $maxLat
                minimalLongitude: $minLng
                maximalLongitude: $maxLng
              }
            )
          }
        }

        #response
        {"data":{"businesses":{"size":29916}}}
    "#};

    #[test]
    fn it_parses_a_recorded_fixture() {
        let fixture = Fixture::parse("getBusinessesByBoundingBox.cs", BOUNDING_BOX).unwrap();
        let invocation = fixture.invocation();

        assert_eq!(fixture.operation_name(), "getBusinessesByBoundingBox");
        assert_eq!(fixture.template().variable_schema().len(), 4);
        assert_eq!(
            invocation.expected_response(),
            Some(&json!({"data": {"businesses": {"size": 29916}}}))
        );
        assert_eq!(
            invocation.variable_values().keys().collect::<Vec<_>>(),
            vec!["minLat", "maxLat", "minLng", "maxLng", "isics"]
        );
        assert_eq!(invocation.undeclared_variables(), vec!["isics"]);
        assert_that!(fixture.template().document_text()).starts_with("query getBusinessesByBoundingBox(");
        assert_that!(fixture.template().document_text()).does_not_contain("#response");
    }

    #[rstest]
    #[case::spaced_marker("# response")]
    #[case::tight_marker("#response")]
    #[case::shouting_marker("# RESPONSE")]
    fn response_markers_are_recognised(#[case] marker: &str) {
        let contents = format!(
            "{{\"operationName\": \"q\", \"variables\": {{}}}}\nquery q {{ a }}\n\n{marker}\n\n{{\"data\": {{\"a\": 1}}}}\n"
        );
        let fixture = Fixture::parse("q.cs", &contents).unwrap();
        assert_eq!(
            fixture.invocation().expected_response(),
            Some(&json!({"data": {"a": 1}}))
        );
    }

    #[test]
    fn comments_in_the_document_are_not_response_markers() {
        let contents = indoc! {r#"
            {"operationName": "q", "variables": {}}
            # responses are recorded below
            query q { a }
        "#};
        let fixture = Fixture::parse("q.cs", contents).unwrap();
        assert_that!(fixture.invocation().expected_response()).is_none();
    }

    #[test]
    fn the_header_query_is_used_when_no_document_follows() {
        let contents = r#"{"operationName": "q", "variables": {"id": "1"}, "query": "query q($id: ID!) { a(id: $id) }"}"#;
        let fixture = Fixture::parse("q.cs", contents).unwrap();
        assert_eq!(fixture.template().document_text(), "query q($id: ID!) { a(id: $id) }");
    }

    #[test]
    fn the_operation_name_is_inferred_from_a_single_operation() {
        let contents = "{\"variables\": {}}\nquery onlyOne { a }";
        let fixture = Fixture::parse("q.cs", contents).unwrap();
        assert_eq!(fixture.operation_name(), "onlyOne");
    }

    #[rstest]
    #[case::no_header("query q { a }", "does not start with a JSON request header")]
    #[case::broken_header("{\"variables\": {\n query q { a }", "not valid JSON")]
    #[case::no_variables("{\"operationName\": \"q\"}\nquery q { a }", "no \"variables\" block")]
    #[case::variables_not_object("{\"variables\": []}\nquery q { a }", "must be a JSON object")]
    #[case::placeholder_only("{\"variables\": {}, \"query\": \"...\"}\n", "no query document")]
    #[case::bad_graphql("{\"variables\": {}}\nquery q { a(", "not valid GraphQL")]
    #[case::wrong_operation("{\"operationName\": \"p\", \"variables\": {}}\nquery q { a }", "no operation named 'p'")]
    #[case::bad_response("{\"variables\": {}}\nquery q { a }\n#response\n{\"data\": ", "not valid JSON")]
    #[case::empty_response("{\"variables\": {}}\nquery q { a }\n#response\n\n", "not followed by a response")]
    fn malformed_fixtures_are_rejected(#[case] contents: &str, #[case] reason: &str) {
        let error = Fixture::parse("broken.cs", contents).unwrap_err();
        match error {
            CassetteError::MalformedFixture { path, reason: actual } => {
                assert_eq!(path, Utf8PathBuf::from("broken.cs"));
                assert_that!(actual).contains(reason);
            }
            other => panic!("expected a malformed fixture, got {other:?}"),
        }
    }
}
