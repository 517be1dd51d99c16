//! The dispatch pipeline
//!
//! locate → load → partition → parse, once per invocation. Nothing is
//! cached between calls and nothing is printed here; the caller gets a
//! [`Dispatch`] report back.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{partition, Layout, SpecDocument};
use crate::grammar::{
    flat_grammar, seed_grammar, split_ottofile_args, subcommand_grammar, task_grammar, ArgValues,
    GrammarError, OTTOFILE_ARG,
};
use crate::storage::{load, locate, Filesystem, LocateError, SpecError, OTTOFILE_NAMES};

/// Program name used for non-task results and usage lines
pub const PROGRAM: &str = "otto";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("Cannot build arguments for '{scope}'")]
    Grammar {
        scope: String,
        #[source]
        source: GrammarError,
    },

    #[error("Task '{0}' is not declared in the ottofile")]
    UnknownTask(String),

    /// Owned by the flag parser: unknown flags, missing values, `--help`
    #[error(transparent)]
    Usage(#[from] clap::Error),
}

/// Which path through the pipeline an invocation took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No ottofile: usage is shown
    NoFile,
    /// Ottofile without tasks: one flat parse of the whole line
    Flat,
    /// Tasks declared but none named on the line: subcommand surface
    Subcommand,
    /// One parse per task run
    Partitioned,
}

/// Parsed values, or help text when the invocation asks for usage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Values {
    Args(ArgValues),
    Help(String),
}

/// One result pair: a task name and what was parsed for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskArgs {
    pub task: String,
    #[serde(flatten)]
    pub values: Values,
}

impl TaskArgs {
    fn args(task: impl Into<String>, values: ArgValues) -> Self {
        Self {
            task: task.into(),
            values: Values::Args(values),
        }
    }

    fn help(task: impl Into<String>, text: String) -> Self {
        Self {
            task: task.into(),
            values: Values::Help(text),
        }
    }

    /// Returns the parsed values, if this is not a help result
    pub fn values(&self) -> Option<&ArgValues> {
        match &self.values {
            Values::Args(values) => Some(values),
            Values::Help(_) => None,
        }
    }
}

/// Report of one dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub mode: Mode,
    /// Ottofile used, or attempted when missing
    pub ottofile: Option<PathBuf>,
    /// Tokens before the first task name; they are not parsed
    pub dropped: Vec<String>,
    /// Results in command-line order
    pub results: Vec<TaskArgs>,
}

/// Runs the dispatch pipeline against a filesystem and working directory
pub struct Dispatcher<F: Filesystem> {
    fs: F,
    cwd: PathBuf,
}

impl<F: Filesystem> Dispatcher<F> {
    pub fn new(fs: F, cwd: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            cwd: cwd.into(),
        }
    }

    /// Dispatches a full argument vector (program name first)
    pub fn dispatch<I, T>(&self, argv: I) -> Result<Dispatch, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let (explicit, rest) = divine_ottofile(argv)?;
        let explicit = explicit.map(|p| self.absolute(&p));

        let path = match locate(&self.fs, explicit.as_deref(), &self.cwd)? {
            Some(path) if self.fs.is_file(&path) => path,
            _ => return Ok(self.no_file(explicit)),
        };

        let doc = load(&self.fs, &path)?;
        let (mode, dropped, results) = match doc.layout() {
            Layout::Tasks(_) => self.dispatch_tasks(&doc, &rest)?,
            Layout::Flat(params) => {
                let mut grammar = flat_grammar(PROGRAM, params).map_err(|source| {
                    DispatchError::Grammar {
                        scope: PROGRAM.to_string(),
                        source,
                    }
                })?;
                let parsed = grammar.parse(program_and(&rest))?;
                (Mode::Flat, Vec::new(), vec![TaskArgs::args(PROGRAM, parsed.values)])
            }
            Layout::Empty => {
                let mut grammar = seed_grammar(PROGRAM, true);
                let parsed = grammar.parse(program_and(&rest))?;
                (Mode::Flat, Vec::new(), vec![TaskArgs::args(PROGRAM, parsed.values)])
            }
        };

        Ok(Dispatch {
            mode,
            ottofile: Some(path),
            dropped,
            results,
        })
    }

    fn dispatch_tasks(
        &self,
        doc: &SpecDocument,
        rest: &[String],
    ) -> Result<(Mode, Vec<String>, Vec<TaskArgs>), DispatchError> {
        let names = doc.task_names();
        let partition = partition(rest, &names);

        if partition.is_empty() {
            let mut grammar = subcommand_grammar(seed_grammar(PROGRAM, true), doc.tasks());
            let help = grammar.render_help();
            let parsed = grammar.parse(program_and(rest))?;
            let result = match parsed.subcommand {
                Some(task) => TaskArgs::args(task, parsed.values),
                None => TaskArgs::help(PROGRAM, help),
            };
            return Ok((Mode::Subcommand, Vec::new(), vec![result]));
        }

        let mut results = Vec::with_capacity(partition.runs.len());
        for run in &partition.runs {
            let task = doc
                .task(run.task())
                .ok_or_else(|| DispatchError::UnknownTask(run.task().to_string()))?;
            let mut grammar =
                task_grammar(PROGRAM, task).map_err(|source| DispatchError::Grammar {
                    scope: task.name.clone(),
                    source,
                })?;
            let parsed = grammar.parse(run.tokens())?;
            results.push(TaskArgs::args(task.name.clone(), parsed.values));
        }

        Ok((Mode::Partitioned, partition.preamble.to_vec(), results))
    }

    fn no_file(&self, explicit: Option<PathBuf>) -> Dispatch {
        let epilog = match &explicit {
            Some(path) => format!("ottofile not found: {}", path.display()),
            None => format!(
                "No ottofile found in {} or any parent directory.\nLooked for: {}",
                self.cwd.display(),
                OTTOFILE_NAMES.join(", ")
            ),
        };

        let mut grammar = seed_grammar(PROGRAM, true).with_epilog(epilog);

        Dispatch {
            mode: Mode::NoFile,
            ottofile: explicit,
            dropped: Vec::new(),
            results: vec![TaskArgs::help(PROGRAM, grammar.render_help())],
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// First pass: pulls out `--ottofile` (flag anywhere, or `OTTO_YML`) and
/// keeps every remaining token, since task flags are not known yet
fn divine_ottofile<I, T>(argv: I) -> Result<(Option<PathBuf>, Vec<String>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let tokens = argv
        .into_iter()
        .skip(1)
        .map(|arg| {
            let arg: OsString = arg.into();
            arg.into_string().map_err(|raw| {
                clap::Error::raw(
                    ErrorKind::InvalidUtf8,
                    format!("Invalid UTF-8 in argument {:?}\n", raw),
                )
            })
        })
        .collect::<Result<Vec<String>, _>>()?;

    let (ottofile_args, rest) = split_ottofile_args(&tokens);
    let matches = seed_grammar(PROGRAM, false).matches(program_and(&ottofile_args))?;

    let ottofile = matches
        .get_one::<String>(OTTOFILE_ARG)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    Ok((ottofile, rest))
}

fn program_and(tokens: &[String]) -> Vec<&str> {
    std::iter::once(PROGRAM)
        .chain(tokens.iter().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamError;
    use crate::storage::memory::MemoryFs;
    use crate::storage::OsFilesystem;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const TASKS_YML: &str = r#"
otto:
  tasks:
    build:
      help: compile
      params:
        "-v|--verbose":
          default: false
        "--target":
          default: debug
    test:
      help: run the tests
      params:
        "--fast":
          action: set_true
"#;

    fn argv(s: &str) -> Vec<String> {
        std::iter::once("otto")
            .chain(s.split_whitespace())
            .map(String::from)
            .collect()
    }

    fn values(result: &TaskArgs) -> &ArgValues {
        result.values().expect("expected parsed values")
    }

    #[test]
    fn two_tasks_in_order() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("build --verbose test --fast")).unwrap();

        assert_eq!(dispatch.mode, Mode::Partitioned);
        assert_eq!(dispatch.ottofile, Some(PathBuf::from("/proj/otto.yml")));
        assert_eq!(dispatch.results.len(), 2);
        assert_eq!(dispatch.results[0].task, "build");
        assert_eq!(values(&dispatch.results[0])["verbose"], json!(true));
        assert_eq!(values(&dispatch.results[0])["target"], json!("debug"));
        assert_eq!(dispatch.results[1].task, "test");
        assert_eq!(values(&dispatch.results[1])["fast"], json!(true));
    }

    #[test]
    fn order_follows_command_line() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj/sub");

        let dispatch = dispatcher
            .dispatch(argv("test build --target release test --fast"))
            .unwrap();

        let tasks: Vec<&str> = dispatch.results.iter().map(|r| r.task.as_str()).collect();
        assert_eq!(tasks, vec!["test", "build", "test"]);
        assert_eq!(values(&dispatch.results[0])["fast"], json!(false));
        assert_eq!(values(&dispatch.results[1])["target"], json!("release"));
        assert_eq!(values(&dispatch.results[2])["fast"], json!(true));
    }

    #[test]
    fn preamble_is_reported_not_parsed() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("--stray x build")).unwrap();

        assert_eq!(dispatch.dropped, vec!["--stray", "x"]);
        assert_eq!(dispatch.results.len(), 1);
        assert_eq!(dispatch.results[0].task, "build");
    }

    #[test]
    fn no_task_names_shows_subcommands() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("")).unwrap();

        assert_eq!(dispatch.mode, Mode::Subcommand);
        match &dispatch.results[0].values {
            Values::Help(text) => {
                assert!(text.contains("build"));
                assert!(text.contains("run the tests"));
            }
            other => panic!("expected help, got {:?}", other),
        }
    }

    #[test]
    fn unknown_flag_without_task_is_usage_error() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let err = dispatcher.dispatch(argv("--bogus")).unwrap_err();
        assert!(matches!(err, DispatchError::Usage(_)));
    }

    #[test]
    fn missing_file_yields_help() {
        let memfs = MemoryFs::new();
        let dispatcher = Dispatcher::new(&memfs, "/nowhere/deep");

        let dispatch = dispatcher.dispatch(argv("build")).unwrap();

        assert_eq!(dispatch.mode, Mode::NoFile);
        assert_eq!(dispatch.ottofile, None);
        assert_eq!(dispatch.results.len(), 1);
        assert_eq!(dispatch.results[0].task, "otto");
        match &dispatch.results[0].values {
            Values::Help(text) => {
                assert!(text.contains("--ottofile"));
                assert!(text.contains("otto.yml, otto.yaml, .otto.yml, .otto.yaml"));
            }
            other => panic!("expected help, got {:?}", other),
        }
    }

    #[test]
    fn missing_explicit_file_names_the_path() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("-o other.yml build")).unwrap();

        assert_eq!(dispatch.mode, Mode::NoFile);
        assert_eq!(dispatch.ottofile, Some(PathBuf::from("/proj/other.yml")));
        match &dispatch.results[0].values {
            Values::Help(text) => assert!(text.contains("ottofile not found: /proj/other.yml")),
            other => panic!("expected help, got {:?}", other),
        }
    }

    #[test]
    fn ottofile_flag_is_taken_anywhere() {
        let memfs = MemoryFs::new()
            .with_file("/proj/otto.yml", "otto:\n  tasks:\n    lint: {}\n")
            .with_file("/proj/other.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher
            .dispatch(argv("build --verbose -o other.yml"))
            .unwrap();

        assert_eq!(dispatch.ottofile, Some(PathBuf::from("/proj/other.yml")));
        assert_eq!(dispatch.mode, Mode::Partitioned);
        assert_eq!(dispatch.results.len(), 1);
        assert_eq!(values(&dispatch.results[0])["verbose"], json!(true));

        let dispatch = dispatcher
            .dispatch(argv("build --ottofile=other.yml test --fast"))
            .unwrap();
        let tasks: Vec<&str> = dispatch.results.iter().map(|r| r.task.as_str()).collect();
        assert_eq!(tasks, vec!["build", "test"]);
    }

    #[test]
    fn ottofile_flag_between_preamble_and_task() {
        let memfs = MemoryFs::new()
            .with_file("/proj/otto.yml", "otto:\n  tasks:\n    lint: {}\n")
            .with_file("/proj/other.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher
            .dispatch(argv("--verbose -o other.yml build"))
            .unwrap();

        assert_eq!(dispatch.ottofile, Some(PathBuf::from("/proj/other.yml")));
        assert_eq!(dispatch.dropped, vec!["--verbose"]);
        assert_eq!(dispatch.results[0].task, "build");
    }

    #[test]
    fn ottofile_flag_after_double_dash_belongs_to_task() {
        let yaml = "otto:\n  tasks:\n    run:\n      params:\n        args:\n          action: append\n";
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", yaml);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("run -- -o x.yml")).unwrap();

        assert_eq!(dispatch.ottofile, Some(PathBuf::from("/proj/otto.yml")));
        assert_eq!(values(&dispatch.results[0])["args"], json!(["-o", "x.yml"]));
    }

    #[test]
    fn task_named_help_lists_subcommands() {
        let memfs = MemoryFs::new().with_file(
            "/proj/otto.yml",
            "otto:\n  tasks:\n    help:\n      help: explain things\n",
        );
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("")).unwrap();
        assert_eq!(dispatch.mode, Mode::Subcommand);
        match &dispatch.results[0].values {
            Values::Help(text) => assert!(text.contains("explain things")),
            other => panic!("expected help, got {:?}", other),
        }

        let dispatch = dispatcher.dispatch(argv("help")).unwrap();
        assert_eq!(dispatch.mode, Mode::Partitioned);
        assert_eq!(dispatch.results[0].task, "help");
    }

    #[test]
    fn explicit_file_bypasses_search() {
        let memfs = MemoryFs::new()
            .with_file("/proj/otto.yml", "otto:\n  tasks:\n    lint: {}\n")
            .with_file("/elsewhere/custom.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher
            .dispatch(argv("--ottofile /elsewhere/custom.yml build"))
            .unwrap();

        assert_eq!(dispatch.ottofile, Some(PathBuf::from("/elsewhere/custom.yml")));
        assert_eq!(dispatch.results[0].task, "build");
    }

    #[test]
    fn ambiguity_fails_before_reading() {
        let memfs = MemoryFs::new()
            .with_file("/proj/otto.yml", TASKS_YML)
            .with_file("/proj/.otto.yaml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let err = dispatcher.dispatch(argv("build")).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Locate(LocateError::AmbiguousSpecLocation { .. })
        ));
        assert_eq!(memfs.reads(), 0);
    }

    #[test]
    fn flat_params() {
        let memfs = MemoryFs::new().with_file(
            "/proj/otto.yml",
            "otto:\n  params:\n    \"--name\":\n      help: who\n",
        );
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("--name alice")).unwrap();

        assert_eq!(dispatch.mode, Mode::Flat);
        assert_eq!(dispatch.results.len(), 1);
        assert_eq!(dispatch.results[0].task, "otto");
        assert_eq!(values(&dispatch.results[0])["name"], json!("alice"));
    }

    #[test]
    fn empty_ottofile_is_degenerate_grammar() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", "");
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let dispatch = dispatcher.dispatch(argv("")).unwrap();
        assert_eq!(dispatch.mode, Mode::Flat);
        assert!(values(&dispatch.results[0]).is_empty());

        let err = dispatcher.dispatch(argv("--anything")).unwrap_err();
        assert!(matches!(err, DispatchError::Usage(_)));
    }

    #[test]
    fn invalid_identifier_aborts_dispatch() {
        let yaml = "otto:\n  tasks:\n    build:\n      params:\n        \"a|b|c\": {}\n";
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", yaml);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let err = dispatcher.dispatch(argv("build")).unwrap_err();

        match err {
            DispatchError::Grammar { scope, source } => {
                assert_eq!(scope, "build");
                assert!(matches!(
                    source,
                    GrammarError::Param(ParamError::InvalidParameterIdentifier { .. })
                ));
            }
            other => panic!("expected grammar error, got {:?}", other),
        }
    }

    #[test]
    fn failure_in_later_run_discards_earlier_results() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", TASKS_YML);
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let err = dispatcher.dispatch(argv("build -v test --slow")).unwrap_err();
        assert!(matches!(err, DispatchError::Usage(_)));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let memfs = MemoryFs::new().with_file("/proj/otto.yml", "otto:\n  tasks: [oops]\n");
        let dispatcher = Dispatcher::new(&memfs, "/proj");

        let err = dispatcher.dispatch(argv("")).unwrap_err();
        assert!(matches!(err, DispatchError::Spec(SpecError::Invalid { .. })));
    }

    #[test]
    fn dispatch_on_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".otto.yml"), TASKS_YML).unwrap();
        let nested = dir.path().join("src");
        fs::create_dir(&nested).unwrap();
        let dispatcher = Dispatcher::new(OsFilesystem, &nested);

        let dispatch = dispatcher.dispatch(argv("-o ../.otto.yml build -v")).unwrap();

        assert_eq!(dispatch.mode, Mode::Partitioned);
        assert_eq!(values(&dispatch.results[0])["verbose"], json!(true));
    }
}
