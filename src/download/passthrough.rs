//! HTTP route that re-serves an upstream file as an attachment.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::app::Result;
use crate::config::{DownloadConfig, ServerConfig};

#[derive(Clone)]
pub struct PassthroughState {
    pub client: Client,
    pub config: DownloadConfig,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    url: Option<String>,
    filename: Option<String>,
}

pub fn router(state: PassthroughState) -> Router {
    Router::new()
        .route("/api/download", get(download))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `config.host:config.port` and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: PassthroughState) -> Result<()> {
    let app = router(state).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Serving downloads on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn download(
    State(state): State<PassthroughState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let url = params.url.unwrap_or_default();
    if url.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "Missing url");
    }

    let filename = params
        .filename
        .as_deref()
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| sanitize_filename(&state.config.default_filename));

    let upstream = match state.client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::warn!(%url, status = %response.status(), "upstream refused download");
            return error(StatusCode::BAD_GATEWAY, "Failed to fetch file");
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "upstream download failed");
            return error(StatusCode::BAD_GATEWAY, "Failed to fetch file");
        }
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &state.config.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        );
    if let Some(len) = upstream.content_length() {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "failed to build download response");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

/// Strip characters that could break out of the `Content-Disposition` value
/// or name a path.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '"' | '/' | '\\') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    fn test_router() -> Router {
        router(PassthroughState {
            client: Client::new(),
            config: DownloadConfig::default(),
        })
    }

    async fn upstream() -> String {
        let app = Router::new()
            .route("/pkg.apk", get(|| async { "apk-bytes" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn get_uri(uri: &str) -> Response {
        test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let response = get_uri("/api/download").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "Missing url" }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let response = get_uri("/api/download?url=http%3A%2F%2F127.0.0.1%3A1%2Fx.apk").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to fetch file" })
        );
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_bad_gateway() {
        let base = upstream().await;
        let uri = format!("/api/download?url={}", urlencoding::encode(&format!("{base}/missing")));
        let response = get_uri(&uri).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_streams_file_as_attachment() {
        let base = upstream().await;
        let uri = format!(
            "/api/download?url={}&filename=Notes.apk",
            urlencoding::encode(&format!("{base}/pkg.apk"))
        );
        let response = get_uri(&uri).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Notes.apk\""
        );
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/vnd.android.package-archive"
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "9");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"apk-bytes");
    }

    #[tokio::test]
    async fn test_default_filename() {
        let base = upstream().await;
        let uri = format!("/api/download?url={}", urlencoding::encode(&format!("{base}/pkg.apk")));
        let response = get_uri(&uri).await;
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"app.apk\""
        );
    }

    #[tokio::test]
    async fn test_health() {
        let response = get_uri("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My App.apk"), "My App.apk");
        assert_eq!(sanitize_filename("../evil\".apk"), "..evil.apk");
        assert_eq!(sanitize_filename("a\r\nb.apk"), "ab.apk");
        assert_eq!(sanitize_filename(" \" "), "");
    }
}
