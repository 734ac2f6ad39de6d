use clap::Parser;

use crate::{TapeErrorCode, TapeOutput, TapeResult};

#[derive(Debug, Parser)]
pub struct Explain {
    /// The full error code. For example, E005
    #[arg(value_name = "CODE")]
    code: TapeErrorCode,
}

impl Explain {
    pub fn run(&self) -> TapeResult<TapeOutput> {
        Ok(TapeOutput::ErrorExplanation(self.code.explain()))
    }
}
