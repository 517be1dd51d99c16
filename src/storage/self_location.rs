//! Where the running otto binary lives
//!
//! Resolves one level of symlink so diagnostics can show both the name
//! otto was invoked through and the real executable.

use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfLocation {
    /// Path the binary was started through
    pub invoked: PathBuf,
    /// Path of the real file, after following a symlink
    pub real: PathBuf,
}

impl SelfLocation {
    /// Locates the current executable
    pub fn current() -> io::Result<Self> {
        Self::resolve(std::env::current_exe()?)
    }

    /// Resolves `path`, following it once if it is a symlink
    pub fn resolve(path: PathBuf) -> io::Result<Self> {
        let meta = fs::symlink_metadata(&path)?;
        if !meta.file_type().is_symlink() {
            return Ok(Self {
                real: path.clone(),
                invoked: path,
            });
        }

        let target = fs::read_link(&path)?;
        let real = match path.parent() {
            Some(dir) if target.is_relative() => dir.join(target),
            _ => target,
        };

        Ok(Self { invoked: path, real })
    }

    pub fn is_link(&self) -> bool {
        self.invoked != self.real
    }
}
