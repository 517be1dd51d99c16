//! # Grammar Synthesis
//!
//! Turns the ottofile schema into clap commands at runtime.
//!
//! ## Builders
//!
//! | Builder | Used for |
//! |---------|----------|
//! | [`split_ottofile_args`] | First pass: pull `--ottofile` out of the line, keep everything else |
//! | [`seed_grammar`] | Global `-o/--ottofile` only (value or `OTTO_YML`); help on missing ottofile |
//! | [`subcommand_grammar`] | Seed + one subcommand per task, for discovery |
//! | [`task_grammar`] | One flag per parameter of a task |
//! | [`flat_grammar`] | One flag per top-level parameter |
//!
//! ## Parameter identifiers
//!
//! | Identifier | Accepted as |
//! |------------|-------------|
//! | `-v\|--verbose` | `-v` or `--verbose`, stored as `verbose` |
//! | `--dry-run` | `--dry-run`, stored as `dry_run` |
//! | `-q` | `-q`, stored as `q` |
//! | `target` | positional, stored as `target` |

mod builder;
mod values;

pub use builder::{
    flat_grammar, seed_grammar, split_ottofile_args, subcommand_grammar, task_grammar, Grammar,
    GrammarError, ParamSpec, OTTOFILE_ARG,
};
pub use values::{extract, ArgValues, Parsed};
