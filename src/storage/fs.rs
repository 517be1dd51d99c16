//! Filesystem access
//!
//! The locator and loader only need three primitives, so they go through
//! this trait and tests can swap in an in-memory tree.

use std::fs;
use std::io;
use std::path::Path;

/// File-system primitives used while locating and loading an ottofile
pub trait Filesystem {
    /// Returns true if `path` exists and is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Lists the entry names of a directory
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Reads a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

impl<F: Filesystem + ?Sized> Filesystem for &F {
    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).list_dir(dir)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}
