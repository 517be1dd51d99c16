//! otto - run tasks declared in an ottofile

use std::process::ExitCode;

fn main() -> ExitCode {
    match otto::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
