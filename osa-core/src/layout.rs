//! Well-known directory layout of the in-memory OS.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, OsaError, OsaResult};
use crate::fs::{clean, SEPARATOR};

/// Where the well-known directories live in a virtual filesystem.
///
/// Loaded from JSON with camelCase keys; missing keys take their defaults:
///
/// ```json
/// { "tempDir": "/tmp", "homeDir": "/users/me" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub temp_dir: String,
    pub home_dir: String,
    pub cache_dir: String,
    pub config_dir: String,
    /// Working directory reported by `getwd`. Defaults to the home directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<String>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            temp_dir: "/temp".to_string(),
            home_dir: "/home".to_string(),
            cache_dir: "/home/.cache".to_string(),
            config_dir: "/home/.config".to_string(),
            work_dir: None,
        }
    }
}

impl Layout {
    /// Parse a layout from JSON.
    pub fn from_json(json: &str) -> OsaResult<Self> {
        let layout: Layout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Every configured path must be absolute.
    pub fn validate(&self) -> OsaResult<()> {
        for path in self.paths() {
            if !path.starts_with(SEPARATOR) {
                return Err(OsaError::path("layout", path, ErrorKind::OperationFailed));
            }
        }
        Ok(())
    }

    /// The same layout with every path lexically cleaned.
    pub fn normalized(self) -> Self {
        Self {
            temp_dir: clean(&self.temp_dir),
            home_dir: clean(&self.home_dir),
            cache_dir: clean(&self.cache_dir),
            config_dir: clean(&self.config_dir),
            work_dir: self.work_dir.as_deref().map(clean),
        }
    }

    /// Directories to create up front, normalized.
    pub fn dirs(&self) -> Vec<String> {
        self.paths().map(clean).collect()
    }

    pub fn work_dir(&self) -> &str {
        self.work_dir.as_deref().unwrap_or(&self.home_dir)
    }

    fn paths(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.temp_dir.as_str()),
            Some(self.home_dir.as_str()),
            Some(self.cache_dir.as_str()),
            Some(self.config_dir.as_str()),
            self.work_dir.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}
