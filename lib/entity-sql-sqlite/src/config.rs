use std::path::{Path, PathBuf};

/// Where a [`SqliteDatabase`](crate::SqliteDatabase) lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// A database file, created when missing.
    Path(PathBuf),
    /// A private in-memory database, gone when the connection closes.
    Memory,
}

const MEMORY: &str = ":memory:";

impl From<&str> for ConnectionConfig {
    fn from(path: &str) -> Self {
        if path == MEMORY {
            ConnectionConfig::Memory
        } else {
            ConnectionConfig::Path(PathBuf::from(path))
        }
    }
}

impl From<String> for ConnectionConfig {
    fn from(path: String) -> Self {
        ConnectionConfig::from(path.as_str())
    }
}

impl From<&String> for ConnectionConfig {
    fn from(path: &String) -> Self {
        ConnectionConfig::from(path.as_str())
    }
}

impl From<PathBuf> for ConnectionConfig {
    fn from(path: PathBuf) -> Self {
        ConnectionConfig::Path(path)
    }
}

impl From<&Path> for ConnectionConfig {
    fn from(path: &Path) -> Self {
        ConnectionConfig::Path(path.to_path_buf())
    }
}
