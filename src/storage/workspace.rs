//! Workspace location for the embedded engine.
//!
//! A directory workspace keeps one `SQLite` file per database
//! (`<dir>/<database>.db`, plus its WAL side files). The in-memory workspace
//! keeps nothing on disk and is what tests use.

use crate::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Address that selects the in-memory workspace.
pub const IN_MEMORY: &str = ":memory:";

/// File extension of database files.
const DB_EXTENSION: &str = "db";

/// Side files `SQLite` keeps next to a database in WAL mode.
const SIDE_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

/// Where databases live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workspace {
    /// Databases are files in this directory.
    Directory(PathBuf),
    /// Databases live in memory for the life of the engine.
    InMemory,
}

impl Workspace {
    /// Parses a storage address.
    ///
    /// `:memory:` selects the in-memory workspace; anything else is a
    /// directory path. Network addresses are rejected: the engine is embedded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for empty or network addresses.
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::InvalidInput("storage address is empty".to_string()));
        }
        if address == IN_MEMORY {
            return Ok(Self::InMemory);
        }
        if address.contains("://") {
            return Err(Error::InvalidInput(format!(
                "storage address '{address}' is a network address; only local paths are supported"
            )));
        }
        Ok(Self::Directory(PathBuf::from(address)))
    }

    /// Path of a database file, `None` for the in-memory workspace.
    #[must_use]
    pub fn database_path(&self, database: &str) -> Option<PathBuf> {
        match self {
            Self::Directory(dir) => Some(dir.join(format!("{database}.{DB_EXTENSION}"))),
            Self::InMemory => None,
        }
    }

    /// Removes every database file of a directory workspace, then the
    /// directory itself if nothing else is left in it.
    ///
    /// Files that are not databases are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if a file cannot be removed.
    pub fn remove_databases(&self) -> Result<usize> {
        let Self::Directory(dir) = self else {
            return Ok(0);
        };
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|e| Error::operation("read_workspace", e))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| Error::operation("read_workspace", e))?
                .path();
            if is_database_file(&path) {
                fs::remove_file(&path).map_err(|e| {
                    Error::operation("remove_database_file", format!("{}: {e}", path.display()))
                })?;
                removed += 1;
            }
        }

        let empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            fs::remove_dir(dir).map_err(|e| Error::operation("remove_workspace_dir", e))?;
        }

        Ok(removed)
    }
}

fn is_database_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let base = SIDE_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name);
    Path::new(base)
        .extension()
        .is_some_and(|ext| ext == DB_EXTENSION)
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::InMemory => f.write_str(IN_MEMORY),
        }
    }
}
