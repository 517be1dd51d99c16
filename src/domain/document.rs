//! Ottofile document model
//!
//! An ottofile declares either named tasks, each with its own ordered
//! parameters, or a flat list of parameters for the whole command line.
//! The YAML is deserialized straight into these types and checked once,
//! so the rest of the pipeline works on closed variants.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to parse ottofile: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("'otto.tasks' and 'otto.params' cannot both be declared")]
    ConflictingSections,
}

/// A scalar default value, kept with its YAML type
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Converts the scalar into a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// How a parameter consumes the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamAction {
    /// Takes one value (the default for most parameters)
    Set,
    /// Switch that stores `true` when present
    SetTrue,
    /// Switch that stores `false` when present
    SetFalse,
    /// Counts occurrences (`-vvv`)
    Count,
    /// Collects every occurrence into a list
    Append,
}

/// A declared parameter of a task (or of the flat command line)
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    /// Identifier as written in the ottofile, e.g. `-v|--verbose`
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub default: Option<Scalar>,

    #[serde(default)]
    pub help: Option<String>,

    /// Explicit action; inferred from the default when absent
    #[serde(default)]
    pub action: Option<ParamAction>,
}

impl Parameter {
    /// Creates a parameter with no default, help or action
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: Scalar) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_action(mut self, action: ParamAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// A named task with its ordered parameters
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub help: Option<String>,

    #[serde(default, deserialize_with = "named_entries")]
    pub params: Vec<Parameter>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }
}

/// What an ottofile declares at the top level
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Layout {
    /// One or more named tasks
    Tasks(Vec<Task>),
    /// Parameters for the whole command line, no tasks
    Flat(Vec<Parameter>),
    /// Nothing declared; only the global `--ottofile` flag exists
    #[default]
    Empty,
}

/// A loaded ottofile
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDocument {
    layout: Layout,
}

impl SpecDocument {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Parses an ottofile from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, DocumentError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: Option<RawDocument> = serde_yaml::from_str(content)?;
        let section = raw.and_then(|r| r.otto).unwrap_or_default();

        let layout = match (section.tasks.is_empty(), section.params.is_empty()) {
            (false, false) => return Err(DocumentError::ConflictingSections),
            (false, true) => Layout::Tasks(section.tasks),
            (true, false) => Layout::Flat(section.params),
            (true, true) => Layout::Empty,
        };

        Ok(Self { layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the declared tasks (empty outside task mode)
    pub fn tasks(&self) -> &[Task] {
        match &self.layout {
            Layout::Tasks(tasks) => tasks,
            _ => &[],
        }
    }

    /// Looks up a task by exact name
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks().iter().find(|t| t.name == name)
    }

    /// Returns task names in declaration order
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks().iter().map(|t| t.name.as_str()).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    otto: Option<RawSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSection {
    #[serde(default, deserialize_with = "named_entries")]
    tasks: Vec<Task>,

    #[serde(default, deserialize_with = "named_entries")]
    params: Vec<Parameter>,
}

/// Entries that take their name from the key they are declared under
trait Named: Default {
    fn named(self, name: String) -> Self;
}

impl Named for Task {
    fn named(mut self, name: String) -> Self {
        self.name = name;
        self
    }
}

impl Named for Parameter {
    fn named(mut self, name: String) -> Self {
        self.name = name;
        self
    }
}

/// Deserializes a YAML mapping into a list, preserving document order.
///
/// Names must be unique. A null body (`build:` with nothing under it) is treated as an empty
/// definition, and a null mapping as no entries.
fn named_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Named,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for EntriesVisitor<T>
    where
        T: Deserialize<'de> + Named,
    {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of names to definitions")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut names: Vec<String> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            let mut entries = Vec::with_capacity(names.capacity());
            while let Some((name, body)) = map.next_entry::<String, Option<T>>()? {
                if names.contains(&name) {
                    return Err(de::Error::custom(format!("duplicate entry '{}'", name)));
                }
                names.push(name.clone());
                entries.push(body.unwrap_or_default().named(name));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(EntriesVisitor(PhantomData))
}
