use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::app::{FolioError, Result};
use crate::config::BackendConfig;
use crate::gateway::{Query, RowList, TableStore};

const PROJECT_HEADER: &str = "X-Appwrite-Project";

/// [`TableStore`] over the backend's REST interface.
pub struct HttpTableStore {
    client: Client,
    config: BackendConfig,
}

impl HttpTableStore {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    fn rows_url(&self, table: &str) -> Result<Url> {
        Ok(Url::parse(&self.config.rows_url(table))?)
    }

    fn row_url(&self, table: &str, id: &str) -> Result<Url> {
        let url = format!(
            "{}/{}",
            self.config.rows_url(table),
            urlencoding::encode(id)
        );
        Ok(Url::parse(&url)?)
    }

    fn column_url(&self, table: &str, id: &str, column: &str, op: &str) -> Result<Url> {
        let url = format!(
            "{}/{}/{}/{}",
            self.config.rows_url(table),
            urlencoding::encode(id),
            urlencoding::encode(column),
            op
        );
        Ok(Url::parse(&url)?)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let response = request
            .header(PROJECT_HEADER, &self.config.project_id)
            .send()
            .await?;
        read_json(response, what).await
    }
}

async fn read_json(response: Response, what: &str) -> Result<Value> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(FolioError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        return Err(FolioError::Upstream {
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl TableStore for HttpTableStore {
    async fn list_rows(&self, table: &str, queries: &[Query]) -> Result<RowList> {
        let mut url = self.rows_url(table)?;
        if !queries.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for query in queries {
                pairs.append_pair("queries[]", &query.encode());
            }
        }
        tracing::debug!(table, %url, "listing rows");

        let body = self.send_json(self.client.get(url), table).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_row(&self, table: &str, id: &str) -> Result<Value> {
        let url = self.row_url(table, id)?;
        self.send_json(self.client.get(url), &format!("{table}/{id}"))
            .await
    }

    async fn create_row(&self, table: &str, data: Value) -> Result<Value> {
        let url = self.rows_url(table)?;
        let body = json!({ "rowId": "unique()", "data": data });
        self.send_json(self.client.post(url).json(&body), table)
            .await
    }

    async fn increment_column(
        &self,
        table: &str,
        id: &str,
        column: &str,
        by: u64,
    ) -> Result<Value> {
        let url = self.column_url(table, id, column, "increment")?;
        let body = json!({ "value": by });
        self.send_json(self.client.patch(url).json(&body), &format!("{table}/{id}"))
            .await
    }

    async fn decrement_column(
        &self,
        table: &str,
        id: &str,
        column: &str,
        by: u64,
        min: Option<i64>,
    ) -> Result<Value> {
        let url = self.column_url(table, id, column, "decrement")?;
        let mut body = json!({ "value": by });
        if let Some(min) = min {
            body["min"] = json!(min);
        }
        self.send_json(self.client.patch(url).json(&body), &format!("{table}/{id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query as QueryParams, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, patch};
    use axum::{Json, Router};

    use super::*;

    #[derive(Default)]
    struct Seen {
        queries: Vec<String>,
        project: Option<String>,
        bodies: Vec<Value>,
    }

    type Shared = Arc<Mutex<Seen>>;

    async fn list(
        State(seen): State<Shared>,
        headers: HeaderMap,
        QueryParams(params): QueryParams<Vec<(String, String)>>,
    ) -> Json<Value> {
        let mut seen = seen.lock().unwrap();
        seen.project = headers
            .get(PROJECT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        seen.queries = params
            .into_iter()
            .filter(|(k, _)| k == "queries[]")
            .map(|(_, v)| v)
            .collect();
        Json(json!({ "total": 1, "rows": [{ "$id": "r1", "slug": "hello" }] }))
    }

    async fn row(
        Path((_, _, id)): Path<(String, String, String)>,
    ) -> (StatusCode, Json<Value>) {
        if id == "r1" {
            (StatusCode::OK, Json(json!({ "$id": "r1" })))
        } else {
            (StatusCode::NOT_FOUND, Json(json!({ "message": "Row not found" })))
        }
    }

    async fn create(State(seen): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().unwrap().bodies.push(body.clone());
        let mut row = body["data"].clone();
        row["$id"] = json!("new1");
        Json(row)
    }

    async fn adjust(
        State(seen): State<Shared>,
        Path(params): Path<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        seen.lock().unwrap().bodies.push(json!({ "path": params, "body": body }));
        Json(json!({ "$id": "r1", "likes": 1 }))
    }

    async fn broken() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn start_server() -> (String, Shared) {
        let seen: Shared = Arc::default();
        let app = Router::new()
            .route("/v1/tablesdb/{db}/tables/{table}/rows", get(list).post(create))
            .route("/v1/tablesdb/{db}/tables/{table}/rows/{id}", get(row))
            .route(
                "/v1/tablesdb/{db}/tables/{table}/rows/{id}/{column}/{op}",
                patch(adjust),
            )
            .route("/v1/tablesdb/{db}/tables/broken/rows", get(broken))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1"), seen)
    }

    fn store_for(endpoint: &str) -> HttpTableStore {
        let config = BackendConfig {
            endpoint: endpoint.to_string(),
            project_id: "proj".to_string(),
            database_id: "db".to_string(),
            ..BackendConfig::default()
        };
        HttpTableStore::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_list_rows_sends_queries_and_project() {
        let (endpoint, seen) = start_server().await;
        let store = store_for(&endpoint);

        let rows = store
            .list_rows("blogs", &[Query::equal("slug", "hello"), Query::Limit(1)])
            .await
            .unwrap();
        assert_eq!(rows.total, 1);
        assert_eq!(rows.rows[0]["slug"], "hello");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.project.as_deref(), Some("proj"));
        assert_eq!(seen.queries.len(), 2);
        let first: Value = serde_json::from_str(&seen.queries[0]).unwrap();
        assert_eq!(first["method"], "equal");
    }

    #[tokio::test]
    async fn test_get_row_not_found() {
        let (endpoint, _) = start_server().await;
        let store = store_for(&endpoint);

        assert_eq!(store.get_row("blogs", "r1").await.unwrap()["$id"], "r1");
        let err = store.get_row("blogs", "missing").await.unwrap_err();
        assert!(matches!(err, FolioError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_success_is_upstream_error() {
        let (endpoint, _) = start_server().await;
        let store = store_for(&endpoint);

        let err = store.list_rows("broken", &[]).await.unwrap_err();
        assert!(matches!(err, FolioError::Upstream { status: 500 }));
    }

    #[tokio::test]
    async fn test_create_row_wraps_data() {
        let (endpoint, seen) = start_server().await;
        let store = store_for(&endpoint);

        let row = store
            .create_row("messages", json!({ "name": "Ada" }))
            .await
            .unwrap();
        assert_eq!(row["$id"], "new1");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.bodies[0]["rowId"], "unique()");
        assert_eq!(seen.bodies[0]["data"]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_decrement_sends_min() {
        let (endpoint, seen) = start_server().await;
        let store = store_for(&endpoint);

        store
            .decrement_column("blogs", "r1", "likes", 1, Some(0))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let call = &seen.bodies[0];
        assert_eq!(call["path"]["op"], "decrement");
        assert_eq!(call["path"]["column"], "likes");
        assert_eq!(call["body"], json!({ "value": 1, "min": 0 }));
    }
}
