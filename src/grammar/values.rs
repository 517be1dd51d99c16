//! Reading parsed values back out of clap

use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::ArgMatches;
use serde_json::Value;

use super::builder::ParamSpec;
use crate::domain::ParamAction;

/// Parsed values keyed by destination name
pub type ArgValues = BTreeMap<String, Value>;

/// Outcome of parsing a token run against a grammar
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Subcommand selected, if the grammar has any
    pub subcommand: Option<String>,
    pub values: ArgValues,
}

/// Collects one value per parameter.
///
/// Supplied values are kept as strings; anything not supplied falls back
/// to the declared default with its YAML type, or `null`.
pub fn extract(matches: &ArgMatches, params: &[ParamSpec]) -> ArgValues {
    params
        .iter()
        .map(|spec| (spec.destination.clone(), value_of(matches, spec)))
        .collect()
}

fn value_of(matches: &ArgMatches, spec: &ParamSpec) -> Value {
    let id = spec.arg_id();
    let id = id.as_str();

    match spec.action {
        ParamAction::SetTrue | ParamAction::SetFalse => Value::Bool(matches.get_flag(id)),
        ParamAction::Count => Value::from(matches.get_count(id)),
        ParamAction::Append => match matches.get_many::<String>(id) {
            Some(values) => Value::Array(values.cloned().map(Value::String).collect()),
            None => default_of(spec),
        },
        ParamAction::Set => match matches.value_source(id) {
            Some(ValueSource::DefaultValue) | None => default_of(spec),
            Some(_) => matches
                .get_one::<String>(id)
                .cloned()
                .map(Value::String)
                .unwrap_or(Value::Null),
        },
    }
}

fn default_of(spec: &ParamSpec) -> Value {
    spec.default.as_ref().map(|d| d.to_json()).unwrap_or(Value::Null)
}
