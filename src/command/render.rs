use std::io;

use camino::Utf8PathBuf;
use cassette::{FixtureStore, QueryRenderer, RenderMode};
use clap::Parser;
use tape_std::{Fs, Style, infoln, warnln};

use crate::options::VariablesOpt;
use crate::{TapeOutput, TapeResult};

#[derive(Debug, Parser)]
pub struct Render {
    /// The name of the recorded operation to render
    #[arg(value_name = "OPERATION")]
    operation: String,

    #[clap(flatten)]
    variables: VariablesOpt,

    /// Write variable values into the query document as GraphQL literals
    /// instead of sending them in the `variables` block
    #[arg(long)]
    inline: bool,

    /// Write the request body to this file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<Utf8PathBuf>,
}

impl Render {
    pub fn run(&self, store: &FixtureStore) -> TapeResult<TapeOutput> {
        let fixture = store.get(&self.operation)?;
        let variables = self
            .variables
            .resolve(fixture.invocation().variable_values(), &mut io::stdin())?;

        let mode = if self.inline {
            RenderMode::Inline
        } else {
            RenderMode::Variables
        };
        infoln!(
            "Rendering {} from {}",
            Style::Command.paint(&self.operation),
            Style::Path.paint(fixture.path())
        );
        let payload = QueryRenderer::new(mode).render(fixture.template(), &variables)?;

        for name in variables
            .keys()
            .filter(|name| fixture.template().variable(name).is_none())
        {
            warnln!(
                "{} is not declared by {} and is passed through as is",
                Style::Command.paint(format!("${name}")),
                Style::Command.paint(&self.operation)
            );
        }

        if let Some(path) = &self.output {
            let contents = serde_json::to_string_pretty(&payload)?;
            Fs::write_file(path, contents)?;
        }

        Ok(TapeOutput::RenderedPayload {
            payload,
            written_to: self.output.clone(),
        })
    }
}
