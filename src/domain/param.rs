//! Parameter identifiers
//!
//! Parameters are declared under names such as `-v|--verbose`, `--output`,
//! `-q` or `target`. An identifier decodes into one or two flag forms, or
//! into a single positional name.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Invalid parameter identifier '{identifier}': {reason}")]
    InvalidParameterIdentifier { identifier: String, reason: String },
}

/// A single `|`-separated piece of an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
enum Form {
    Short(char),
    Long(String),
    Positional(String),
}

impl Form {
    fn parse(form: &str) -> Result<Self, String> {
        if form.is_empty() {
            return Err("empty flag form".to_string());
        }
        if form.chars().any(char::is_whitespace) {
            return Err(format!("'{}' contains whitespace", form));
        }

        if let Some(long) = form.strip_prefix("--") {
            if long.is_empty() || long.starts_with('-') {
                return Err(format!("'{}' is not a valid long flag", form));
            }
            return Ok(Form::Long(long.to_string()));
        }

        if let Some(short) = form.strip_prefix('-') {
            let mut chars = short.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Form::Short(c)),
                _ => Err(format!(
                    "'{}' is not a valid short flag (exactly one character after '-')",
                    form
                )),
            };
        }

        Ok(Form::Positional(form.to_string()))
    }
}

/// The accepted forms of one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamForms {
    /// A bare word: matched by position, not by flag
    Positional(String),
    /// One or two flag spellings for the same destination
    Flag { shorts: Vec<char>, longs: Vec<String> },
}

impl ParamForms {
    /// Decodes an identifier into its forms
    pub fn parse(identifier: &str) -> Result<Self, ParamError> {
        let invalid = |reason: String| ParamError::InvalidParameterIdentifier {
            identifier: identifier.to_string(),
            reason,
        };

        let pieces: Vec<&str> = identifier.split('|').map(str::trim).collect();
        if pieces.len() > 2 {
            return Err(invalid(format!(
                "expected one or two '|'-separated forms, found {}",
                pieces.len()
            )));
        }

        let forms = pieces
            .iter()
            .map(|p| Form::parse(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        if let [Form::Positional(name)] = forms.as_slice() {
            return Ok(ParamForms::Positional(name.clone()));
        }

        let mut shorts = Vec::new();
        let mut longs = Vec::new();
        for form in forms {
            match form {
                Form::Short(c) if shorts.contains(&c) => {
                    return Err(invalid(format!("'-{}' is repeated", c)));
                }
                Form::Long(l) if longs.contains(&l) => {
                    return Err(invalid(format!("'--{}' is repeated", l)));
                }
                Form::Short(c) => shorts.push(c),
                Form::Long(l) => longs.push(l),
                Form::Positional(name) => {
                    return Err(invalid(format!(
                        "positional '{}' cannot be combined with another form",
                        name
                    )));
                }
            }
        }

        Ok(ParamForms::Flag { shorts, longs })
    }

    /// Returns true for bare-word parameters
    pub fn is_positional(&self) -> bool {
        matches!(self, ParamForms::Positional(_))
    }

    /// Name the parsed value is stored under.
    ///
    /// The first long form wins, then the short form, then the positional
    /// name. Dashes become underscores (`--dry-run` stores as `dry_run`).
    pub fn destination(&self) -> String {
        let raw = match self {
            ParamForms::Positional(name) => name.clone(),
            ParamForms::Flag { shorts, longs } => match (longs.first(), shorts.first()) {
                (Some(long), _) => long.clone(),
                (None, Some(short)) => short.to_string(),
                (None, None) => String::new(),
            },
        };
        raw.replace('-', "_")
    }

    /// Returns true if this parameter claims the `-h` or `--help` flag
    pub fn claims_help(&self) -> bool {
        match self {
            ParamForms::Positional(_) => false,
            ParamForms::Flag { shorts, longs } => {
                shorts.contains(&'h') || longs.iter().any(|l| l == "help")
            }
        }
    }
}
