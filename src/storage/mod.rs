//! # Storage Layer
//!
//! Everything otto reads from outside the process: the ottofile itself,
//! the directory tree it is searched in, and environment settings.
//!
//! ## Ottofile discovery
//!
//! | Step | Source |
//! |------|--------|
//! | 1 | `-o/--ottofile FILE` on the command line |
//! | 2 | `OTTO_YML` environment variable |
//! | 3 | Upward search from the working directory for `otto.yml`, `otto.yaml`, `.otto.yml` or `.otto.yaml` |
//!
//! Two candidates in one directory stop the search with an error.
//!
//! ## Key Types
//!
//! - [`Filesystem`] - The file primitives the locator and loader need
//! - [`locate`] - Resolves the active ottofile path
//! - [`load`] - Reads and parses an ottofile into a [`SpecDocument`](crate::domain::SpecDocument)
//! - [`Config`] - Environment settings

mod config;
mod fs;
mod loader;
mod locator;
mod self_location;

pub use config::{Config, ConfigError, OutputFormat, FORMAT_ENV, OTTOFILE_ENV, VERBOSE_ENV};
pub use fs::{Filesystem, OsFilesystem};
pub use loader::{load, SpecError};
pub use locator::{locate, search_upward, LocateError, OTTOFILE_NAMES};
pub use self_location::SelfLocation;

#[cfg(test)]
pub(crate) use fs::memory;
