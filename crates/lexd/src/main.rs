//! Binary entrypoint for the `lexd` language server.
//!
//! Delegates to [`lexd::run`], which serves framed requests from stdin until
//! end of stream. Startup failures are reported on stderr.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match lexd::run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr().lock(), "lexd: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
