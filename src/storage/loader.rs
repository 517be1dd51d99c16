//! Ottofile loading

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::fs::Filesystem;
use crate::domain::{DocumentError, SpecDocument};

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Failed to read ottofile {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid ottofile {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Reads and parses the ottofile at `path`
pub fn load(fs: &impl Filesystem, path: &Path) -> Result<SpecDocument, SpecError> {
    let content = fs.read_to_string(path).map_err(|source| SpecError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    SpecDocument::from_yaml(&content).map_err(|source| SpecError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
