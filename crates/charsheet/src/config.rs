//! Directory settings.

use serde::Deserialize;

/// Limits and retry policy for a [`Directory`](crate::directory::Directory).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Largest serialized form-values payload accepted by a save.
    pub max_payload_bytes: usize,
    /// How many rows `recent_revisions` returns.
    pub recent_revisions_limit: usize,
    /// Retries after a storage write conflict before giving up.
    pub conflict_retries: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 20 * 1024 * 1024,
            recent_revisions_limit: 10,
            conflict_retries: 3,
        }
    }
}

impl DirectoryConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }
}
