//! In-process [`TableStore`] used by tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::{FolioError, Result};
use crate::gateway::{Query, RowList, TableStore};

#[derive(Default)]
pub(crate) struct MemoryTableStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failing: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
    pub(crate) reads: AtomicUsize,
    pub(crate) writes: AtomicUsize,
}

impl MemoryTableStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Make every call touching `table` fail with a 503.
    pub(crate) fn fail_table(&self, table: &str) {
        self.failing.lock().unwrap().insert(table.to_string());
    }

    pub(crate) fn heal_table(&self, table: &str) {
        self.failing.lock().unwrap().remove(table);
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn column(&self, table: &str, id: &str, column: &str) -> Option<i64> {
        self.rows(table)
            .into_iter()
            .find(|row| row["$id"] == id)
            .and_then(|row| row[column].as_i64())
    }

    pub(crate) fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self, table: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(table) {
            Err(FolioError::Upstream { status: 503 })
        } else {
            Ok(())
        }
    }

    fn adjust(&self, table: &str, id: &str, column: &str, delta: i64, min: Option<i64>) -> Result<Value> {
        self.check(table)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row["$id"] == id))
            .ok_or_else(|| FolioError::NotFound(format!("{table}/{id}")))?;

        let mut value = row[column].as_i64().unwrap_or(0) + delta;
        if let Some(min) = min {
            value = value.max(min);
        }
        row[column] = json!(value);
        Ok(row.clone())
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    match query {
        Query::Equal(attr, values) => values.iter().any(|v| row[attr] == *v),
        Query::Contains(attr, values) => row[attr]
            .as_array()
            .is_some_and(|items| values.iter().any(|v| items.iter().any(|i| i == v))),
        _ => true,
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn list_rows(&self, table: &str, queries: &[Query]) -> Result<RowList> {
        self.check(table)?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| queries.iter().all(|q| matches(row, q)))
            .collect();

        for query in queries {
            match query {
                Query::OrderDesc(attr) => rows.sort_by(|a, b| {
                    b[attr].as_str().unwrap_or("").cmp(a[attr].as_str().unwrap_or(""))
                }),
                Query::OrderAsc(attr) => rows.sort_by(|a, b| {
                    a[attr].as_str().unwrap_or("").cmp(b[attr].as_str().unwrap_or(""))
                }),
                _ => {}
            }
        }

        let total = rows.len() as u64;
        let offset = queries
            .iter()
            .find_map(|q| match q {
                Query::Offset(n) => Some(*n as usize),
                _ => None,
            })
            .unwrap_or(0);
        let limit = queries
            .iter()
            .find_map(|q| match q {
                Query::Limit(n) => Some(*n as usize),
                _ => None,
            })
            .unwrap_or(25);

        let rows = rows.into_iter().skip(offset).take(limit).collect();
        Ok(RowList { total, rows })
    }

    async fn get_row(&self, table: &str, id: &str) -> Result<Value> {
        self.check(table)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.rows(table)
            .into_iter()
            .find(|row| row["$id"] == id)
            .ok_or_else(|| FolioError::NotFound(format!("{table}/{id}")))
    }

    async fn create_row(&self, table: &str, mut data: Value) -> Result<Value> {
        self.check(table)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        data["$id"] = json!(format!("row{n}"));
        self.insert(table, data.clone());
        Ok(data)
    }

    async fn increment_column(&self, table: &str, id: &str, column: &str, by: u64) -> Result<Value> {
        self.adjust(table, id, column, by as i64, None)
    }

    async fn decrement_column(
        &self,
        table: &str,
        id: &str,
        column: &str,
        by: u64,
        min: Option<i64>,
    ) -> Result<Value> {
        self.adjust(table, id, column, -(by as i64), min)
    }
}

pub(crate) fn post_row(id: &str, slug: &str, created_at: &str) -> Value {
    json!({
        "$id": id,
        "$createdAt": created_at,
        "$updatedAt": created_at,
        "title": format!("Post {id}"),
        "slug": slug,
        "excerpt": format!("About {slug}"),
        "content": r#"[{"type":"paragraph","text":"Body"}]"#,
        "readTime": 3,
        "tags": ["rust"],
        "views": 0,
        "likes": 0
    })
}

pub(crate) fn app_row(id: &str, title: &str, created_at: &str) -> Value {
    json!({
        "$id": id,
        "$createdAt": created_at,
        "title": title,
        "description": "An app",
        "version": "1.0",
        "features": [],
        "downloadLink": format!("https://cdn.example.com/{id}.apk"),
        "icon": "",
        "size": "5",
        "downloads": 0
    })
}
