use std::time::Duration;

use serde::Deserialize;

/// Read-through cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds (default: 300)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Bind address for `folio serve`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Defaults applied to file downloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Filename used when the caller does not provide one
    pub default_filename: String,
    /// Content type sent with every passthrough response
    pub content_type: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_filename: "app.apk".to_string(),
            content_type: "application/vnd.android.package-archive".to_string(),
        }
    }
}
