use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Smallest body, in bytes, worth gzip-encoding by default.
pub const DEFAULT_GZIP_MIN_SIZE: u64 = 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Root directory of the filesystem content store.
    pub content_root: PathBuf,
    /// JSON catalog mapping repositories to the objects they reference.
    pub catalog_path: Option<PathBuf>,
    pub compression: CompressionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            content_root: PathBuf::from("lfs"),
            catalog_path: None,
            compression: CompressionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// Transport compression settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enable_gzip: bool,
    /// Bodies smaller than this are always sent raw.
    pub min_size: u64,
    /// Send payloads that already carry a compressed-container signature raw.
    pub skip_precompressed: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enable_gzip: false,
            min_size: DEFAULT_GZIP_MIN_SIZE,
            skip_precompressed: true,
        }
    }
}

impl CompressionConfig {
    /// Gzip enabled with the default threshold.
    pub fn gzip() -> Self {
        Self {
            enable_gzip: true,
            ..Default::default()
        }
    }
}
