//! Main CLI application flow

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::Value;

use super::output::Output;
use crate::dispatch::{Dispatch, DispatchError, Dispatcher, Mode, TaskArgs, Values};
use crate::storage::{Config, OsFilesystem, SelfLocation};

/// Main entry point for the CLI
pub fn run() -> Result<ExitCode> {
    let config = Config::from_env()?;
    let output = Output::new(config.format, config.verbose);

    output.verbose("otto starting");
    if output.is_verbose() {
        describe_self(&output);
    }

    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    output.verbose_ctx("locate", &format!("Working directory: {}", cwd.display()));

    let dispatcher = Dispatcher::new(OsFilesystem, cwd);
    let dispatch = match dispatcher.dispatch(std::env::args_os()) {
        Ok(dispatch) => dispatch,
        // Usage errors and --help belong to clap, including the exit status
        Err(DispatchError::Usage(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };

    report(&output, &dispatch);

    if dispatch.mode == Mode::NoFile {
        return Ok(ExitCode::FAILURE);
    }

    output.verbose("Dispatch completed successfully");
    Ok(ExitCode::SUCCESS)
}

fn describe_self(output: &Output) {
    match SelfLocation::current() {
        Ok(loc) if loc.is_link() => output.verbose_ctx(
            "self",
            &format!("{} -> {}", loc.invoked.display(), loc.real.display()),
        ),
        Ok(loc) => output.verbose_ctx("self", &loc.real.display().to_string()),
        Err(e) => output.verbose_ctx("self", &format!("Cannot resolve executable: {}", e)),
    }
}

fn report(output: &Output, dispatch: &Dispatch) {
    match (&dispatch.ottofile, dispatch.mode) {
        (Some(path), Mode::NoFile) => {
            output.verbose_ctx("locate", &format!("Not found: {}", path.display()))
        }
        (Some(path), _) => output.verbose_ctx("locate", &format!("Using {}", path.display())),
        (None, _) => output.verbose_ctx("locate", "No ottofile in scope"),
    }
    output.verbose_ctx(
        "dispatch",
        &format!("Mode {:?}, {} result(s)", dispatch.mode, dispatch.results.len()),
    );

    if !dispatch.dropped.is_empty() {
        output.warn(&format!(
            "ignoring arguments before the first task: {}",
            dispatch.dropped.join(" ")
        ));
    }

    if output.is_json() {
        output.data(&dispatch.results);
        return;
    }

    for result in &dispatch.results {
        print_result(output, result);
    }
}

fn print_result(output: &Output, result: &TaskArgs) {
    match &result.values {
        Values::Help(text) => output.text(text),
        Values::Args(values) => {
            println!("{}", result.task);
            for (name, value) in values {
                println!("  {} = {}", name, display_value(value));
            }
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
