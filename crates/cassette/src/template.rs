use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::ops::Range;

use apollo_parser::cst::{self, CstNode};
use apollo_parser::{Parser, SyntaxNode};
use serde::Serialize;

/// The kind of operation a template sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        };
        write!(f, "{kind}")
    }
}

/// A GraphQL input type reference, as written in a variable definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub const fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    fn from_cst(ty: &cst::Type) -> Result<TypeRef, String> {
        match ty {
            cst::Type::NamedType(named) => Self::from_named(named),
            cst::Type::ListType(list) => Self::from_list(list),
            cst::Type::NonNullType(non_null) => {
                let inner = if let Some(named) = non_null.named_type() {
                    Self::from_named(&named)?
                } else if let Some(list) = non_null.list_type() {
                    Self::from_list(&list)?
                } else {
                    return Err("a non-null type is missing its inner type".to_string());
                };
                Ok(TypeRef::NonNull(Box::new(inner)))
            }
        }
    }

    fn from_named(named: &cst::NamedType) -> Result<TypeRef, String> {
        named
            .name()
            .map(|name| TypeRef::Named(name.text().to_string()))
            .ok_or_else(|| "a named type is missing its name".to_string())
    }

    fn from_list(list: &cst::ListType) -> Result<TypeRef, String> {
        let inner = list
            .ty()
            .ok_or_else(|| "a list type is missing its item type".to_string())?;
        Ok(TypeRef::List(Box::new(Self::from_cst(&inner)?)))
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A `$name: Type = default` declaration on an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// The default value, as GraphQL literal text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl VariableDefinition {
    /// A variable is required when it is non-null and has no default value.
    pub const fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default.is_none()
    }
}

/// A `$name` reference inside the selection set, directives or fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VariableUsage {
    pub(crate) name: String,
    pub(crate) span: Range<usize>,
}

/// A parsed GraphQL document with the operation a fixture sends selected.
///
/// Templates are immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    operation_name: String,
    operation_kind: OperationKind,
    document_text: String,
    variables: Vec<VariableDefinition>,
    usages: Vec<VariableUsage>,
    definitions_span: Option<Range<usize>>,
}

impl QueryTemplate {
    /// Parses `document` and selects the operation named `operation_name`.
    ///
    /// Without a name the document must contain exactly one operation, and
    /// that operation must be named.
    pub fn parse(document: &str, operation_name: Option<&str>) -> Result<QueryTemplate, String> {
        let document_text = document.trim().to_string();
        let tree = Parser::new(&document_text).parse();
        let errors: Vec<_> = tree.errors().collect();
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| e.message().to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(format!("the query document is not valid GraphQL: {messages}"));
        }

        let doc = tree.document();
        let mut operations = Vec::new();
        let mut fragments = Vec::new();
        for definition in doc.definitions() {
            match definition {
                cst::Definition::OperationDefinition(operation) => operations.push(operation),
                cst::Definition::FragmentDefinition(fragment) => fragments.push(fragment),
                _ => {}
            }
        }

        let operation = select_operation(operations, operation_name)?;
        let operation_name = operation_name_of(&operation)
            .ok_or_else(|| "the query document's operation has no name".to_string())?;
        let operation_kind = operation_kind_of(&operation);

        let mut variables: Vec<VariableDefinition> = Vec::new();
        let mut definitions_span = None;
        if let Some(definitions) = operation.variable_definitions() {
            definitions_span = Some(span_of(definitions.syntax()));
            for definition in definitions.variable_definitions() {
                let variable = build_variable_definition(&definition)?;
                if variables.iter().any(|v| v.name == variable.name) {
                    return Err(format!(
                        "the variable '${}' is declared more than once",
                        variable.name
                    ));
                }
                variables.push(variable);
            }
        }

        let mut usages = Vec::new();
        collect_usages(
            &document_text,
            operation.syntax(),
            definitions_span.as_ref(),
            &mut usages,
        );
        for fragment in reachable_fragments(&operation, &fragments) {
            collect_usages(&document_text, fragment.syntax(), None, &mut usages);
        }
        usages.sort_by_key(|usage| usage.span.start);

        if let Some(undeclared) = usages
            .iter()
            .find(|usage| !variables.iter().any(|v| v.name == usage.name))
        {
            return Err(format!(
                "the variable '${}' is used but not declared by '{}'",
                undeclared.name, operation_name
            ));
        }

        tracing::debug!(
            operation = %operation_name,
            variables = variables.len(),
            usages = usages.len(),
            "parsed query template"
        );

        Ok(QueryTemplate {
            operation_name,
            operation_kind,
            document_text,
            variables,
            usages,
            definitions_span,
        })
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub const fn operation_kind(&self) -> OperationKind {
        self.operation_kind
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    /// The declared variables, in declaration order.
    pub fn variable_schema(&self) -> &[VariableDefinition] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn required_variables(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.variables.iter().filter(|v| v.is_required())
    }

    pub(crate) fn usages(&self) -> &[VariableUsage] {
        &self.usages
    }

    pub(crate) fn definitions_span(&self) -> Option<&Range<usize>> {
        self.definitions_span.as_ref()
    }
}

fn select_operation(
    operations: Vec<cst::OperationDefinition>,
    operation_name: Option<&str>,
) -> Result<cst::OperationDefinition, String> {
    match operation_name {
        Some(name) => operations
            .into_iter()
            .find(|operation| operation_name_of(operation).as_deref() == Some(name))
            .ok_or_else(|| format!("the query document has no operation named '{name}'")),
        None => {
            let count = operations.len();
            let mut operations = operations.into_iter();
            match (operations.next(), count) {
                (Some(operation), 1) => Ok(operation),
                (None, _) => Err("the query document contains no operation".to_string()),
                _ => Err(format!(
                    "the query document contains {count} operations and no operationName selects one"
                )),
            }
        }
    }
}

fn operation_name_of(operation: &cst::OperationDefinition) -> Option<String> {
    operation.name().map(|name| name.text().to_string())
}

/// The fragments `operation` spreads, directly or through other fragments.
fn reachable_fragments<'a>(
    operation: &cst::OperationDefinition,
    fragments: &'a [cst::FragmentDefinition],
) -> Vec<&'a cst::FragmentDefinition> {
    let mut pending = fragment_spreads(operation.syntax());
    let mut seen = BTreeSet::new();
    let mut reached = Vec::new();
    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let fragment = fragments.iter().find(|fragment| {
            fragment
                .fragment_name()
                .and_then(|fragment_name| fragment_name.name())
                .is_some_and(|fragment_name| name.as_str() == fragment_name.text())
        });
        if let Some(fragment) = fragment {
            pending.extend(fragment_spreads(fragment.syntax()));
            reached.push(fragment);
        }
    }
    reached
}

fn fragment_spreads(node: &SyntaxNode) -> Vec<String> {
    node.descendants()
        .filter_map(cst::FragmentSpread::cast)
        .filter_map(|spread| spread.fragment_name()?.name())
        .map(|name| name.text().to_string())
        .collect()
}

fn operation_kind_of(operation: &cst::OperationDefinition) -> OperationKind {
    // `{ ... }` shorthand has no operation type and is always a query
    match operation
        .operation_type()
        .map(|ty| ty.syntax().text().to_string())
        .as_deref()
    {
        Some("mutation") => OperationKind::Mutation,
        Some("subscription") => OperationKind::Subscription,
        _ => OperationKind::Query,
    }
}

fn build_variable_definition(
    definition: &cst::VariableDefinition,
) -> Result<VariableDefinition, String> {
    let name = definition
        .variable()
        .and_then(|variable| variable.name())
        .map(|name| name.text().to_string())
        .ok_or_else(|| "a variable definition has no name".to_string())?;
    let ty = definition
        .ty()
        .ok_or_else(|| format!("the variable '${name}' has no type"))?;
    let ty = TypeRef::from_cst(&ty)?;
    let default = definition
        .default_value()
        .and_then(|default| default.value())
        .map(|value| value.syntax().text().to_string());
    Ok(VariableDefinition { name, ty, default })
}

fn collect_usages(
    document: &str,
    node: &SyntaxNode,
    skip: Option<&Range<usize>>,
    usages: &mut Vec<VariableUsage>,
) {
    for descendant in node.descendants() {
        let Some(variable) = cst::Variable::cast(descendant) else {
            continue;
        };
        let node_span = span_of(variable.syntax());
        if skip.is_some_and(|skip| skip.start <= node_span.start && node_span.end <= skip.end) {
            continue;
        }
        let Some(name) = variable.name() else {
            continue;
        };
        let name = name.text().to_string();
        // the node may carry trivia, the usage is exactly `$name`
        let Some(dollar) = document
            .get(node_span.clone())
            .and_then(|text| text.find('$'))
        else {
            continue;
        };
        let start = node_span.start + dollar;
        usages.push(VariableUsage {
            span: start..start + 1 + name.len(),
            name,
        });
    }
}

fn span_of(node: &SyntaxNode) -> Range<usize> {
    let range = node.text_range();
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    start..end
}
