//! Shelf configuration and the TOML loader.

use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_MAX_RECENT_TASKS: usize = 20;
const DEFAULT_MAX_INBOX_EVENTS: usize = 256;

/// Location of the shelf config relative to the host's config root.
pub const SHELF_CONFIG_PATH: &str = "config/shelf.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Tunables of a shelf instance. Every field falls back to its default when omitted.
pub struct ShelfConfig {
    /// Upper bound on tasks requested from the task source per reconciliation.
    pub max_recent_tasks: usize,
    /// Check the partition invariant after every reducer action and log breaches.
    pub verify_invariants: bool,
    /// Per-subscriber bound on undrained pinned-list notifications.
    pub max_inbox_events: usize,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            max_recent_tasks: DEFAULT_MAX_RECENT_TASKS,
            verify_invariants: false,
            max_inbox_events: DEFAULT_MAX_INBOX_EVENTS,
        }
    }
}

impl ShelfConfig {
    /// Loads [`SHELF_CONFIG_PATH`] under `root`, falling back to defaults when the file does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let loader = ConfigLoader::<Self>::new(root, SHELF_CONFIG_PATH);
        if !loader.path().exists() {
            debug!(path = %loader.path().display(), "no shelf config, using defaults");
            return Ok(Self::default());
        }
        loader.load()
    }

    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid for this shape.
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        toml::from_str(body).map_err(|err| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Configuration loading failures.
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {message}", .path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// I/O error text.
        message: String,
    },
    /// The file is not valid TOML for the target type.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Parser error text.
        message: String,
    },
}

/// TOML-backed config loader.
///
/// `ConfigLoader<T>` only reads and deserializes; semantic checks belong to the caller.
#[derive(Clone, Debug)]
pub struct ConfigLoader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> ConfigLoader<T>
where
    T: DeserializeOwned,
{
    /// Creates a loader for `relative_path` under `root`.
    pub fn new(root: &Path, relative_path: &str) -> Self {
        Self {
            path: root.join(relative_path),
            _marker: PhantomData,
        }
    }

    /// Loads and deserializes the file.
    pub fn load(&self) -> Result<T, ConfigError> {
        let body = fs::read_to_string(&self.path).map_err(|err| ConfigError::Read {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        toml::from_str(&body).map_err(|err| ConfigError::Parse {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    /// Returns the config path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
