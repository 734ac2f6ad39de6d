mod check;
mod diff;
mod explain;
mod list;
pub(crate) mod output;
mod render;

pub use check::{Check, CheckResult, CheckStatus, CheckSummary};
pub use diff::{Diff, SkippedResponse};
pub use explain::Explain;
pub use list::{FixtureSummary, List, LoadFailureSummary};
pub use output::{JsonOutput, TapeOutput};
pub use render::Render;
