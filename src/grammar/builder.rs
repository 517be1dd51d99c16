//! Grammar synthesis
//!
//! Builds clap commands at runtime from the ottofile schema. Every builder
//! here is pure: it takes schema values and returns a [`Grammar`], or the
//! first reason the schema cannot be expressed as one.

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

use super::values::{extract, Parsed};
use crate::domain::{ParamAction, ParamError, ParamForms, Parameter, Scalar, Task};
use crate::storage::OTTOFILE_ENV;

/// Id of the global `-o/--ottofile` argument
pub const OTTOFILE_ARG: &str = "ottofile";

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("Parameter '{identifier}' stores into '{destination}', which is already taken")]
    DuplicateDestination {
        identifier: String,
        destination: String,
    },

    #[error("Parameter '{identifier}' reuses flag '{form}'")]
    DuplicateForm { identifier: String, form: String },

    #[error("Parameter '{identifier}' is positional and cannot use action '{action:?}'")]
    UnsupportedAction {
        identifier: String,
        action: ParamAction,
    },

    #[error("Positional parameter '{identifier}' {reason}")]
    PositionalOrder { identifier: String, reason: String },
}

/// A parameter resolved into everything the grammar needs
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub identifier: String,
    pub forms: ParamForms,
    pub destination: String,
    pub action: ParamAction,
    pub default: Option<Scalar>,
    pub help: Option<String>,
}

impl ParamSpec {
    /// Resolves a declared parameter
    pub fn from_parameter(param: &Parameter) -> Result<Self, GrammarError> {
        let forms = ParamForms::parse(&param.name)?;

        let inferred = match (&param.default, forms.is_positional()) {
            (_, true) => ParamAction::Set,
            (Some(Scalar::Bool(false)), false) => ParamAction::SetTrue,
            (Some(Scalar::Bool(true)), false) => ParamAction::SetFalse,
            _ => ParamAction::Set,
        };
        let action = param.action.unwrap_or(inferred);

        if forms.is_positional() && !matches!(action, ParamAction::Set | ParamAction::Append) {
            return Err(GrammarError::UnsupportedAction {
                identifier: param.name.clone(),
                action,
            });
        }

        Ok(Self {
            identifier: param.name.clone(),
            destination: forms.destination(),
            forms,
            action,
            default: param.default.clone(),
            help: param.help.clone(),
        })
    }

    /// Id of the clap argument the value is stored under.
    ///
    /// Positionals live in their own namespace, so one called `help` does
    /// not collide with the help flag.
    pub fn arg_id(&self) -> String {
        match self.forms {
            ParamForms::Positional(_) => format!("<{}>", self.destination),
            ParamForms::Flag { .. } => self.destination.clone(),
        }
    }

    fn takes_value(&self) -> bool {
        matches!(self.action, ParamAction::Set | ParamAction::Append)
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.arg_id());

        match &self.forms {
            ParamForms::Positional(_) => {
                arg = arg
                    .value_name(self.destination.to_uppercase())
                    .required(self.default.is_none());
                if self.action == ParamAction::Append {
                    arg = arg.num_args(if self.default.is_some() { 0.. } else { 1.. });
                }
            }
            ParamForms::Flag { shorts, longs } => {
                if let Some((first, rest)) = shorts.split_first() {
                    arg = arg.short(*first).visible_short_aliases(rest.to_vec());
                }
                if let Some((first, rest)) = longs.split_first() {
                    arg = arg.long(first.clone()).visible_aliases(rest.to_vec());
                }
                if self.takes_value() {
                    arg = arg.value_name(self.destination.to_uppercase());
                }
            }
        }

        arg = arg.action(match self.action {
            ParamAction::Set => ArgAction::Set,
            ParamAction::SetTrue => ArgAction::SetTrue,
            ParamAction::SetFalse => ArgAction::SetFalse,
            ParamAction::Count => ArgAction::Count,
            ParamAction::Append => ArgAction::Append,
        });

        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }

        // Appended lists report the typed default themselves when nothing was passed
        if let (ParamAction::Set, Some(default)) = (self.action, &self.default) {
            arg = arg.default_value(default.to_string());
        }

        arg
    }
}

/// A synthesized command plus the parameters its values are read back with
#[derive(Debug, Clone)]
pub struct Grammar {
    command: Command,
    params: Vec<ParamSpec>,
}

impl Grammar {
    /// Appends text shown after the help output
    pub fn with_epilog(mut self, epilog: impl Into<String>) -> Self {
        self.command = self.command.after_help(epilog.into());
        self
    }

    /// Renders the help text without parsing anything
    pub fn render_help(&mut self) -> String {
        self.command.render_help().to_string()
    }

    /// Parses `args` (program name first) against this grammar
    pub fn parse<I, T>(&mut self, args: I) -> Result<Parsed, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.matches(args)?;
        Ok(Parsed {
            subcommand: matches.subcommand_name().map(str::to_string),
            values: extract(&matches, &self.params),
        })
    }

    /// Parses `args` and returns clap's raw matches
    pub fn matches<I, T>(&mut self, args: I) -> Result<ArgMatches, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.command.try_get_matches_from_mut(args)
    }
}

fn ottofile_arg() -> Arg {
    Arg::new(OTTOFILE_ARG)
        .short('o')
        .long("ottofile")
        .value_name("FILE")
        .env(OTTOFILE_ENV)
        .action(ArgAction::Set)
        .help("Path to the ottofile (default: search upward for otto.yml)")
}

/// The global grammar: only `-o/--ottofile`.
///
/// With help disabled a bare `-h` is not claimed, so it survives for the
/// task it belongs to.
pub fn seed_grammar(program: &str, help_enabled: bool) -> Grammar {
    let command = Command::new(program.to_string())
        .about("Run tasks declared in an ottofile")
        .arg(ottofile_arg())
        .disable_help_flag(!help_enabled);

    Grammar {
        command,
        params: Vec::new(),
    }
}

/// Splits the `--ottofile` tokens out of an argument list.
///
/// `-o FILE`, `-oFILE`, `--ottofile FILE` and `--ottofile=FILE` are taken
/// wherever they appear up to a `--`; every other token is kept, in order,
/// for the task stream. The taken tokens are parsed by [`seed_grammar`].
pub fn split_ottofile_args(tokens: &[String]) -> (Vec<String>, Vec<String>) {
    let mut ottofile = Vec::new();
    let mut rest = Vec::with_capacity(tokens.len());
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        match token.as_str() {
            "--" => {
                rest.push(token.clone());
                rest.extend(iter.cloned());
                break;
            }
            "-o" | "--ottofile" => {
                ottofile.push(token.clone());
                ottofile.extend(iter.next().cloned());
            }
            t if t.starts_with("--ottofile=") || (t.starts_with("-o") && !t.starts_with("--")) => {
                ottofile.push(token.clone())
            }
            _ => rest.push(token.clone()),
        }
    }

    (ottofile, rest)
}

/// Adds one subcommand per task, carrying only its name and help.
///
/// Task flags are not attached: this grammar is for discovery, real
/// parsing happens per task run.
pub fn subcommand_grammar(seed: Grammar, tasks: &[Task]) -> Grammar {
    let subcommands = tasks.iter().map(|task| {
        let mut sub = Command::new(task.name.clone());
        if let Some(help) = &task.help {
            sub = sub.about(help.clone());
        }
        sub
    });

    Grammar {
        command: seed
            .command
            .disable_help_subcommand(true)
            .subcommands(subcommands),
        params: seed.params,
    }
}

/// The grammar of a single task, used to parse that task's run
pub fn task_grammar(program: &str, task: &Task) -> Result<Grammar, GrammarError> {
    let mut grammar = params_grammar(&task.name, &task.params)?;
    grammar.command = grammar.command.bin_name(format!("{} {}", program, task.name));
    if let Some(help) = &task.help {
        grammar.command = grammar.command.about(help.clone());
    }
    Ok(grammar)
}

/// The grammar for an ottofile that declares parameters but no tasks
pub fn flat_grammar(program: &str, params: &[Parameter]) -> Result<Grammar, GrammarError> {
    params_grammar(program, params)
}

fn params_grammar(name: &str, params: &[Parameter]) -> Result<Grammar, GrammarError> {
    let specs = params
        .iter()
        .map(ParamSpec::from_parameter)
        .collect::<Result<Vec<_>, _>>()?;

    check_unique(&specs)?;
    check_positionals(&specs)?;

    let claims_help = specs.iter().any(|s| s.forms.claims_help());
    let command = Command::new(name.to_string())
        .disable_help_flag(claims_help)
        .args(specs.iter().map(ParamSpec::to_arg));

    Ok(Grammar {
        command,
        params: specs,
    })
}

fn check_unique(specs: &[ParamSpec]) -> Result<(), GrammarError> {
    let mut destinations: Vec<&str> = Vec::new();
    let mut forms: Vec<String> = Vec::new();

    for spec in specs {
        if destinations.contains(&spec.destination.as_str()) {
            return Err(GrammarError::DuplicateDestination {
                identifier: spec.identifier.clone(),
                destination: spec.destination.clone(),
            });
        }
        destinations.push(&spec.destination);

        if let ParamForms::Flag { shorts, longs } = &spec.forms {
            let spelled = shorts
                .iter()
                .map(|c| format!("-{}", c))
                .chain(longs.iter().map(|l| format!("--{}", l)));
            for form in spelled {
                if forms.contains(&form) {
                    return Err(GrammarError::DuplicateForm {
                        identifier: spec.identifier.clone(),
                        form,
                    });
                }
                forms.push(form);
            }
        }
    }

    Ok(())
}

fn check_positionals(specs: &[ParamSpec]) -> Result<(), GrammarError> {
    let positionals: Vec<&ParamSpec> = specs.iter().filter(|s| s.forms.is_positional()).collect();
    let mut seen_optional = false;

    for (i, spec) in positionals.iter().enumerate() {
        let optional = spec.default.is_some();
        if seen_optional && !optional {
            return Err(GrammarError::PositionalOrder {
                identifier: spec.identifier.clone(),
                reason: "has no default but follows a positional with one".to_string(),
            });
        }
        if spec.action == ParamAction::Append && i + 1 != positionals.len() {
            return Err(GrammarError::PositionalOrder {
                identifier: spec.identifier.clone(),
                reason: "collects a list and must be the last positional".to_string(),
            });
        }
        seen_optional |= optional;
    }

    Ok(())
}
