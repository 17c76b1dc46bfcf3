use std::fs;
use std::io;
use std::path::Path;

use pit_types::Identity;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Name of the config file inside the `.pit` directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Per-repository settings, stored as TOML in `.pit/config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Identity recorded as author and committer. Commits are refused
    /// without one unless the caller supplies an override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

impl RepoConfig {
    /// Read the config at `path`. A missing file yields the default config.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&text).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(user) = &config.user {
            user.validate().map_err(|e| SdkError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        Ok(config)
    }

    /// Write the config to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, text)?;
        Ok(())
    }
}
