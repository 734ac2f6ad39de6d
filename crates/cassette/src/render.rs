use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::describe;
use crate::{CassetteError, ExampleInvocation, QueryTemplate, TypeRef};

/// How variable values end up in the rendered request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Send the document untouched with values in the `variables` block.
    #[default]
    Variables,
    /// Substitute values into the document as GraphQL literals.
    Inline,
}

/// The JSON body of a GraphQL request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub operation_name: String,
    pub variables: Map<String, Value>,
    pub query: String,
}

/// Binds variables to [`QueryTemplate`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRenderer {
    mode: RenderMode,
}

impl QueryRenderer {
    pub const fn new(mode: RenderMode) -> QueryRenderer {
        QueryRenderer { mode }
    }

    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Validates `variables` against the template's declarations and builds the request.
    pub fn render(
        &self,
        template: &QueryTemplate,
        variables: &Map<String, Value>,
    ) -> Result<RequestPayload, CassetteError> {
        validate_variables(template, variables)?;

        let payload = match self.mode {
            RenderMode::Variables => RequestPayload {
                operation_name: template.operation_name().to_string(),
                variables: variables.clone(),
                query: template.document_text().to_string(),
            },
            RenderMode::Inline => {
                check_inlinable(template, variables)?;
                RequestPayload {
                    operation_name: template.operation_name().to_string(),
                    variables: variables
                        .iter()
                        .filter(|(name, _)| template.variable(name).is_none())
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect(),
                    query: inline_document(template, variables),
                }
            }
        };

        tracing::debug!(
            operation = %payload.operation_name,
            mode = ?self.mode,
            variables = payload.variables.len(),
            "rendered request payload"
        );
        Ok(payload)
    }

    /// Renders an invocation with the variables it was recorded with.
    pub fn render_invocation(
        &self,
        invocation: &ExampleInvocation,
    ) -> Result<RequestPayload, CassetteError> {
        self.render(invocation.template(), invocation.variable_values())
    }
}

/// Checks every declared variable of `template` against `variables`, in
/// declaration order, returning the first problem found.
///
/// Values for names the template does not declare are not checked.
pub fn validate_variables(
    template: &QueryTemplate,
    variables: &Map<String, Value>,
) -> Result<(), CassetteError> {
    for definition in template.variable_schema() {
        match variables.get(&definition.name) {
            None if definition.is_required() => {
                return Err(CassetteError::MissingVariable {
                    operation: template.operation_name().to_string(),
                    variable: definition.name.clone(),
                    expected: definition.ty.to_string(),
                })
            }
            None => {}
            Some(value) => {
                check_value(&definition.ty, value, &definition.name).map_err(|mismatch| {
                    CassetteError::TypeMismatch {
                        operation: template.operation_name().to_string(),
                        variable: definition.name.clone(),
                        path: mismatch.path,
                        expected: mismatch.expected,
                        found: mismatch.found,
                    }
                })?
            }
        }
    }
    Ok(())
}

#[derive(Debug)]
struct Mismatch {
    path: String,
    expected: String,
    found: String,
}

fn check_value(ty: &TypeRef, value: &Value, path: &str) -> Result<(), Mismatch> {
    let mismatch = || Mismatch {
        path: path.to_string(),
        expected: ty.to_string(),
        found: describe(value),
    };

    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return Err(mismatch());
            }
            // report the declared non-null type, not its inner type
            check_value(inner, value, path).map_err(|m| if m.path == path { mismatch() } else { m })
        }
        _ if value.is_null() => Ok(()),
        TypeRef::List(item) => match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .try_for_each(|(index, item_value)| {
                    check_value(item, item_value, &format!("{path}[{index}]"))
                }),
            _ => Err(mismatch()),
        },
        TypeRef::Named(name) => {
            if scalar_accepts(name, value) {
                Ok(())
            } else {
                Err(mismatch())
            }
        }
    }
}

/// Built-in scalars are checked; enums, input objects and custom scalars
/// cannot be checked without a schema and accept any value.
fn scalar_accepts(name: &str, value: &Value) -> bool {
    match name {
        "Int" => value
            .as_i64()
            .is_some_and(|n| i32::try_from(n).is_ok()),
        "Float" => value.is_number(),
        "String" => value.is_string(),
        "Boolean" => value.is_boolean(),
        "ID" => value.is_string() || value.is_i64() || value.is_u64(),
        _ => true,
    }
}

/// Object keys in declared values become GraphQL field names when inlined,
/// so every key must be a valid GraphQL name.
fn check_inlinable(
    template: &QueryTemplate,
    variables: &Map<String, Value>,
) -> Result<(), CassetteError> {
    for definition in template.variable_schema() {
        let Some(value) = variables.get(&definition.name) else {
            continue;
        };
        check_field_names(value, &definition.name).map_err(|mismatch| {
            CassetteError::TypeMismatch {
                operation: template.operation_name().to_string(),
                variable: definition.name.clone(),
                path: mismatch.path,
                expected: mismatch.expected,
                found: mismatch.found,
            }
        })?;
    }
    Ok(())
}

fn check_field_names(value: &Value, path: &str) -> Result<(), Mismatch> {
    match value {
        Value::Object(fields) => fields.iter().try_for_each(|(key, field)| {
            if !is_graphql_name(key) {
                return Err(Mismatch {
                    path: path.to_string(),
                    expected: "an input object with GraphQL field names".to_string(),
                    found: format!("the key {}", Value::String(key.clone())),
                });
            }
            check_field_names(field, &format!("{path}.{key}"))
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(index, item)| check_field_names(item, &format!("{path}[{index}]"))),
        _ => Ok(()),
    }
}

fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn inline_document(template: &QueryTemplate, variables: &Map<String, Value>) -> String {
    let text = template.document_text();

    let mut edits: Vec<(Range<usize>, String)> = template
        .usages()
        .iter()
        .map(|usage| {
            let literal = match variables.get(&usage.name) {
                Some(value) => to_graphql_literal(value),
                None => template
                    .variable(&usage.name)
                    .and_then(|definition| definition.default.clone())
                    .unwrap_or_else(|| "null".to_string()),
            };
            (usage.span.clone(), literal)
        })
        .collect();
    if let Some(span) = template.definitions_span() {
        edits.push((span.clone(), String::new()));
    }
    edits.sort_by_key(|(span, _)| span.start);

    let mut rendered = String::with_capacity(text.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        rendered.push_str(&text[cursor..span.start]);
        rendered.push_str(&replacement);
        cursor = span.end;
    }
    rendered.push_str(&text[cursor..]);
    rendered
}

/// Writes a JSON value as a GraphQL input literal.
///
/// Strings are always string literals; enum values cannot be told apart
/// from strings without a schema. Object keys are written unquoted, so they
/// must already be GraphQL names.
pub fn to_graphql_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // JSON string escapes are valid GraphQL string escapes
        Value::String(_) => value.to_string(),
        Value::Array(items) => format!(
            "[{}]",
            items
                .iter()
                .map(to_graphql_literal)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(key, field)| format!("{key}: {}", to_graphql_literal(field)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
