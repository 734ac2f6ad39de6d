//! Recorded GraphQL request/response fixtures.
//!
//! A fixture file holds the JSON request header a client sent, the GraphQL
//! document, and optionally the response the API returned after a
//! `#response` marker. This crate loads those files into a [`FixtureStore`],
//! renders them back into requests with a [`QueryRenderer`], and compares
//! fresh responses with the recordings using a [`ResponseMatcher`].

mod error;
mod fixture;
mod kind;
mod matcher;
mod path;
mod render;
mod store;
mod template;

pub use error::CassetteError;
pub use fixture::{ExampleInvocation, Fixture};
pub use kind::JsonKind;
pub use matcher::{
    DiffKind, FieldDiff, MatchReport, MatchRules, ResponseMatcher, ToleratedDrift, Tolerance,
};
pub use path::{JsonPath, PathPattern, PathSegment};
pub use render::{to_graphql_literal, validate_variables, QueryRenderer, RenderMode, RequestPayload};
pub use store::{FixtureStore, LoadFailure, LoadOptions};
pub use template::{OperationKind, QueryTemplate, TypeRef, VariableDefinition};
