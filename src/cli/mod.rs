//! # Command-Line Interface
//!
//! The `otto` binary: everything except the optional `-o/--ottofile FILE`
//! is the task stream.
//!
//! ```bash
//! otto build --release test --fast
//! otto -o ci/otto.yml deploy prod
//! ```
//!
//! ## Output Formats
//!
//! `OTTO_FORMAT` selects how results are printed:
//! - `text` (default) - one block per task, `name = value` lines
//! - `json` - an array of `{"task": ..., "args": {...}}` objects
//!
//! ## Verbose Mode
//!
//! Set `OTTO_VERBOSE=1` for diagnostics on stderr:
//! ```bash
//! OTTO_VERBOSE=1 otto build
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to dispatch the process arguments and print the results.

mod app;
mod output;

pub use app::run;
pub use output::{Output, OutputFormat};
