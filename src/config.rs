use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

/// Default address of the codebase service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Configuration for the codebase client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Request timeout; `None` keeps the HTTP client's own defaults
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: format!("codebase-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codebase-client").join("config.toml"))
    }

    /// Load a TOML config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ClientError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check the base URL and strip any trailing slash
    pub fn validated(mut self) -> Result<Self> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| ClientError::InvalidConfig {
            message: format!("invalid base URL {:?}: {}", self.base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig {
                message: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        self.base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }
}
