//! Access to the remote table store.
//!
//! [`TableStore`] is the raw row API; [`Gateway`] layers typed reads with
//! read-through caching and uncached counter writes on top of it.

pub mod http;
pub mod query;
pub mod service;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::app::Result;

pub use http::HttpTableStore;
pub use query::Query;
pub use service::{Gateway, Tables};

/// One page of rows from a listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub rows: Vec<Value>,
}

#[async_trait]
pub trait TableStore {
    async fn list_rows(&self, table: &str, queries: &[Query]) -> Result<RowList>;

    /// A single row by id. A missing row is `FolioError::NotFound`.
    async fn get_row(&self, table: &str, id: &str) -> Result<Value>;

    /// Create a row with a store-assigned id and return it.
    async fn create_row(&self, table: &str, data: Value) -> Result<Value>;

    /// Atomically add `by` to a numeric column.
    async fn increment_column(&self, table: &str, id: &str, column: &str, by: u64)
        -> Result<Value>;

    /// Atomically subtract `by` from a numeric column, not going below `min`.
    async fn decrement_column(
        &self,
        table: &str,
        id: &str,
        column: &str,
        by: u64,
        min: Option<i64>,
    ) -> Result<Value>;
}
