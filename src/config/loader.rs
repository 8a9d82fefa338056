use crate::config::schema::ZdevConfig;
use crate::edit::{atomic_write, EditError};
use crate::paths::ZdevHome;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Serialize {
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: EditError,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "failed to access {}: {}", path.display(), source)
            }
            StoreError::Serialize { source } => {
                write!(f, "failed to serialize zdev config: {}", source)
            }
            StoreError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Serialize { source } => Some(source),
            StoreError::Write { source, .. } => Some(source),
        }
    }
}

/// Load the store, creating it with defaults on first use.
///
/// An unparsable store is not fatal: it is logged and defaults are returned,
/// so the next save overwrites it.
pub fn load(home: &ZdevHome) -> Result<ZdevConfig, StoreError> {
    home.ensure_dirs().map_err(|source| StoreError::Io {
        path: home.root().to_path_buf(),
        source,
    })?;

    let path = home.config_path();
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let config = ZdevConfig::default();
            save(home, &config)?;
            return Ok(config);
        }
        Err(source) => return Err(StoreError::Io { path, source }),
    };

    match serde_json::from_str(&contents) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable zdev config: {err}");
            Ok(ZdevConfig::default())
        }
    }
}

pub fn save(home: &ZdevHome, config: &ZdevConfig) -> Result<(), StoreError> {
    home.ensure_dirs().map_err(|source| StoreError::Io {
        path: home.root().to_path_buf(),
        source,
    })?;

    let mut json =
        serde_json::to_string_pretty(config).map_err(|source| StoreError::Serialize { source })?;
    json.push('\n');

    let path = home.config_path();
    atomic_write(&path, json.as_bytes()).map_err(|source| StoreError::Write { path, source })
}
