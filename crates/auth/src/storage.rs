//! File-backed token store.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use portico_client::TokenStore;

use crate::error::{Error, ErrorKind, Result};

/// Persists each key as its own JSON file under a directory.
///
/// Default directory: `~/.portico/tokens/`. Files are written with `0600`
/// permissions on Unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    base_path: PathBuf,
}

impl FileTokenStore {
    /// Create a store rooted at the default directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_path: default_token_dir()?,
        })
    }

    /// Create a store rooted at `path`.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            base_path: path.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the token files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// When `key` was last written.
    pub fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read(key)?.map(|stored| stored.stored_at))
    }

    /// List all stored keys (in their sanitized file form).
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    keys.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn token_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();

        self.base_path.join(format!("{safe_key}.json"))
    }

    fn read(&self, key: &str) -> Result<Option<StoredValue>> {
        let path = self.token_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)?;
        let stored = serde_json::from_str(&json).map_err(|e| {
            Error::with_source(ErrorKind::Corrupt(path.display().to_string()), e)
        })?;
        Ok(Some(stored))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.base_path)?;

        let path = self.token_path(key);
        let stored = StoredValue {
            value: value.to_string(),
            stored_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;

        // `mode` only applies on creation; tighten older files before writing.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())?;

        debug!(key, "Token stored");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.token_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "Token removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> portico_client::Result<Option<String>> {
        Ok(self.read(key)?.map(|stored| stored.value))
    }

    fn set(&self, key: &str, value: &str) -> portico_client::Result<()> {
        Ok(self.write(key, value)?)
    }

    fn remove(&self, key: &str) -> portico_client::Result<()> {
        Ok(self.delete(key)?)
    }
}

/// A value with storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    stored_at: DateTime<Utc>,
}

/// Get the default token storage directory.
pub fn default_token_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        Error::new(ErrorKind::Config("Could not find home directory".to_string()))
    })?;

    Ok(home.join(".portico").join("tokens"))
}
