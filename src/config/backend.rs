//! Table store connection settings.

use std::time::Duration;

use serde::Deserialize;

/// Where the portfolio's tables live and how to reach them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// REST endpoint, including the API version segment.
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub blogs_table: String,
    pub apps_table: String,
    pub profile_table: String,
    pub messages_table: String,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://fra.cloud.appwrite.io/v1".to_string(),
            project_id: "68b8245700358388fd64".to_string(),
            database_id: "68b8266e001d4f873a52".to_string(),
            blogs_table: "blogs".to_string(),
            apps_table: "apps".to_string(),
            profile_table: "profile".to_string(),
            messages_table: "messages".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL for the rows of one table.
    pub fn rows_url(&self, table: &str) -> String {
        format!(
            "{}/tablesdb/{}/tables/{}/rows",
            self.endpoint.trim_end_matches('/'),
            self.database_id,
            table
        )
    }
}
