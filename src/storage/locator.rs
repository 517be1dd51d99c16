//! Ottofile discovery
//!
//! An explicit path always wins. Otherwise the search walks upward from
//! the working directory and stops at the first directory holding one of
//! [`OTTOFILE_NAMES`]. Two candidates in the same directory are an error
//! the user has to resolve; candidates in different ancestors never
//! conflict, the closest one is used.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::fs::Filesystem;

/// File names recognized as an ottofile
pub const OTTOFILE_NAMES: [&str; 4] = ["otto.yml", "otto.yaml", ".otto.yml", ".otto.yaml"];

#[derive(Debug, Error)]
pub enum LocateError {
    #[error(
        "Multiple ottofiles found in {}: {}. Keep only one of them.",
        directory.display(),
        candidates.join(", ")
    )]
    AmbiguousSpecLocation {
        directory: PathBuf,
        candidates: Vec<String>,
    },

    #[error("Failed to list directory {}: {source}", path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves the ottofile to use.
///
/// Returns `Ok(None)` when nothing was found up to the filesystem root.
/// An explicit path is returned as is; whether it exists is checked by
/// the caller.
pub fn locate(
    fs: &impl Filesystem,
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<Option<PathBuf>, LocateError> {
    match explicit {
        Some(path) => Ok(Some(path.to_path_buf())),
        None => search_upward(fs, cwd),
    }
}

/// Walks from `start` to the root looking for an ottofile
pub fn search_upward(fs: &impl Filesystem, start: &Path) -> Result<Option<PathBuf>, LocateError> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let entries = fs.list_dir(dir).map_err(|source| LocateError::ListDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut found: Vec<String> = OTTOFILE_NAMES
            .iter()
            .filter(|name| entries.iter().any(|e| e == *name))
            .map(|name| name.to_string())
            .collect();

        match found.len() {
            0 => current = dir.parent(),
            1 => return Ok(Some(dir.join(found.remove(0)))),
            _ => {
                return Err(LocateError::AmbiguousSpecLocation {
                    directory: dir.to_path_buf(),
                    candidates: found,
                })
            }
        }
    }

    Ok(None)
}
