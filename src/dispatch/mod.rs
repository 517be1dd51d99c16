//! # Dispatch
//!
//! Orchestrates one invocation: find the ottofile, load it, split the
//! command line by task names and parse each piece.
//!
//! ## Modes
//!
//! | Mode | When | Results |
//! |------|------|---------|
//! | [`Mode::NoFile`] | No ottofile found, or the explicit one is missing | one `otto` help result |
//! | [`Mode::Flat`] | Ottofile declares `params` (or nothing) | one `otto` result |
//! | [`Mode::Subcommand`] | Tasks declared, none named on the line | one result, help when no subcommand |
//! | [`Mode::Partitioned`] | At least one task named | one result per task run, in order |
//!
//! Any error aborts the whole dispatch; there are no partial results.
//!
//! ## Known limitations
//!
//! - Tokens before the first task name are not parsed. They are returned
//!   in [`Dispatch::dropped`] so the CLI can warn about them.
//! - A flag value equal to a task name (`--message build`) starts a new
//!   run. There is no escaping.
//! - `-o` and `--ottofile` are global and taken anywhere before a `--`,
//!   so a task cannot declare them for itself.

mod dispatcher;

pub use dispatcher::{Dispatch, DispatchError, Dispatcher, Mode, TaskArgs, Values, PROGRAM};
