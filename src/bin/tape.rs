use std::io;

use tape::cli::Tape;

fn main() -> io::Result<()> {
    Tape::run_from_args()
}
