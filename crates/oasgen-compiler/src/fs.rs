//! Filesystem and clock capabilities.
//!
//! The history store and the artifact writer are the only components with
//! side effects, and they reach the outside world exclusively through these
//! traits. Tests swap in a [`FixedClock`] to make run ids and migration stamps
//! predictable.

use std::cell::Cell;
use std::path::Path;

use chrono::NaiveDateTime;
use walkdir::WalkDir;

use crate::diagnostic::GenError;

/// Raw file primitives used by the generator.
pub trait FileStore {
    /// Reads a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, GenError>;

    /// Writes a file, creating missing parent directories.
    fn write(&self, path: &Path, contents: &str) -> Result<(), GenError>;

    /// Whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Creates a directory and all of its parents.
    fn create_dir_all(&self, path: &Path) -> Result<(), GenError>;

    /// Names of the direct children of `dir`, sorted ascending.
    ///
    /// A missing directory yields an empty list.
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>, GenError>;

    /// Copies `from` to `to` so that `to` only ever appears complete.
    fn copy_atomic(&self, from: &Path, to: &Path) -> Result<(), GenError>;

    /// Moves a file or directory; `to` must not exist.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), GenError>;

    /// Removes a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> Result<(), GenError>;
}

/// [`FileStore`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileStore;

impl FileStore for OsFileStore {
    fn read_to_string(&self, path: &Path) -> Result<String, GenError> {
        std::fs::read_to_string(path).map_err(|e| GenError::io(path, e.to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), GenError> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        std::fs::write(path, contents).map_err(|e| GenError::io(path, e.to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), GenError> {
        std::fs::create_dir_all(path).map_err(|e| GenError::io(path, e.to_string()))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<String>, GenError> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| GenError::io(dir, e.to_string()))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn copy_atomic(&self, from: &Path, to: &Path) -> Result<(), GenError> {
        let file_name = to
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| GenError::io(to, "destination has no file name"))?;
        let staging = to.with_file_name(format!(".{}.tmp", file_name));

        std::fs::copy(from, &staging).map_err(|e| GenError::io(from, e.to_string()))?;
        std::fs::rename(&staging, to).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            GenError::io(to, e.to_string())
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), GenError> {
        if to.exists() {
            return Err(GenError::io(to, "destination already exists"));
        }
        std::fs::rename(from, to).map_err(|e| GenError::io(to, e.to_string()))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), GenError> {
        std::fs::remove_dir_all(path).map_err(|e| GenError::io(path, e.to_string()))
    }
}

/// Source of wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// [`Clock`] reading local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// [`Clock`] frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}
