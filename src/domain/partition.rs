//! Command-line partitioning
//!
//! Splits a flat token stream into per-task runs. A run starts at a token
//! that exactly equals a known task name and extends up to the next such
//! token. There are no explicit separators, and the partitioner knows
//! nothing about flag arity: `--message build` still starts a `build` run.

/// Tokens belonging to one task invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRun<'a> {
    task: &'a str,
    tokens: &'a [String],
}

impl<'a> TaskRun<'a> {
    /// Name of the task this run invokes
    pub fn task(&self) -> &'a str {
        self.task
    }

    /// Arguments after the task name
    pub fn args(&self) -> &'a [String] {
        &self.tokens[1..]
    }

    /// The whole run, task name first
    pub fn tokens(&self) -> &'a [String] {
        self.tokens
    }
}

/// Result of partitioning a token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    /// Tokens not claimed by any run: everything before the first task
    /// name, or the whole stream when no task name occurs
    pub preamble: &'a [String],

    /// Runs in command-line order
    pub runs: Vec<TaskRun<'a>>,
}

impl Partition<'_> {
    /// Returns true if no task boundary was found
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Partitions `tokens` at every token equal to one of `task_names`
pub fn partition<'a, S: AsRef<str>>(tokens: &'a [String], task_names: &[S]) -> Partition<'a> {
    let starts: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| task_names.iter().any(|name| name.as_ref() == token.as_str()))
        .map(|(i, _)| i)
        .collect();

    let Some(&first) = starts.first() else {
        return Partition {
            preamble: tokens,
            runs: Vec::new(),
        };
    };

    let mut runs = Vec::with_capacity(starts.len());
    let mut end = tokens.len();
    for &start in starts.iter().rev() {
        runs.push(TaskRun {
            task: tokens[start].as_str(),
            tokens: &tokens[start..end],
        });
        end = start;
    }
    runs.reverse();

    Partition {
        preamble: &tokens[..first],
        runs,
    }
}
