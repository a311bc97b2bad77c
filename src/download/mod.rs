//! Fetching app packages.
//!
//! [`download_with_progress`] streams a file into memory and reports
//! progress as chunks arrive. [`download_app`] saves a store app to disk and
//! bumps its download counter once the file is complete. The
//! [`passthrough`] module serves the same files over HTTP.

pub mod passthrough;

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;

use crate::app::{FolioError, Result};
use crate::domain::App;
use crate::gateway::Gateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received: u64,
    /// Declared body length, when the server sent one.
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Whole percent received, capped at 100. `None` without a usable total.
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => {
                let pct = (self.received as f64 / total as f64 * 100.0).round();
                Some(pct.min(100.0) as u8)
            }
            _ => None,
        }
    }
}

/// Fetch `url` fully into memory, calling `on_progress` after every chunk.
///
/// Any failure drops whatever had been received.
pub async fn download_with_progress<F>(client: &Client, url: &str, mut on_progress: F) -> Result<Vec<u8>>
where
    F: FnMut(DownloadProgress),
{
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FolioError::Upstream {
            status: status.as_u16(),
        });
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0).min(64 * 1024 * 1024) as usize);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        on_progress(DownloadProgress {
            received: body.len() as u64,
            total,
        });
    }

    Ok(body)
}

#[derive(Debug)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: u64,
    /// Set when the file was saved but the download counter was not bumped.
    pub counter_error: Option<FolioError>,
}

/// Download `app` into `dir` and record the download.
///
/// The file is written only after the whole body arrived. The counter is
/// bumped exactly once after the write; its failure does not fail the
/// download.
pub async fn download_app<F>(
    gateway: &Gateway,
    client: &Client,
    app: &App,
    dir: &Path,
    on_progress: F,
) -> Result<DownloadOutcome>
where
    F: FnMut(DownloadProgress),
{
    let body = download_with_progress(client, &app.download_link, on_progress).await?;

    let path = dir.join(app.download_filename());
    save_atomically(&path, &body).await?;
    tracing::info!(app = %app.id, path = %path.display(), bytes = body.len(), "download saved");

    let counter_error = gateway.increment_downloads(&app.id).await.err();

    Ok(DownloadOutcome {
        path,
        bytes: body.len() as u64,
        counter_error,
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Write through a sibling `.part` file so a failed write leaves nothing behind.
async fn save_atomically(path: &Path, body: &[u8]) -> Result<()> {
    let partial = partial_path(path);
    let written = match tokio::fs::write(&partial, body).await {
        Ok(()) => tokio::fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use axum::Router;

    use super::*;
    use crate::cache::{TtlCache, DEFAULT_TTL};
    use crate::domain::apps::tests::sample_app;
    use crate::gateway::memory::{app_row, MemoryTableStore};
    use crate::gateway::Tables;

    const PAYLOAD: &[u8] = b"0123456789abcdefghij";

    async fn start_server() -> String {
        let app = Router::new()
            .route(
                "/file.apk",
                get(|| async { ([(header::CONTENT_TYPE, "application/octet-stream")], PAYLOAD) }),
            )
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway_with_app(id: &str) -> (Gateway, Arc<MemoryTableStore>) {
        let remote = Arc::new(MemoryTableStore::new());
        remote.insert("apps", app_row(id, "Habit Tracker", "2024-01-01T00:00:00.000+00:00"));
        let gateway = Gateway::new(
            remote.clone(),
            Arc::new(TtlCache::new(DEFAULT_TTL)),
            Tables::default(),
        );
        (gateway, remote)
    }

    #[test]
    fn test_percent() {
        let p = |received, total| DownloadProgress { received, total };
        assert_eq!(p(0, Some(200)).percent(), Some(0));
        assert_eq!(p(1, Some(3)).percent(), Some(33));
        assert_eq!(p(2, Some(3)).percent(), Some(67));
        assert_eq!(p(300, Some(200)).percent(), Some(100));
        assert_eq!(p(10, None).percent(), None);
        assert_eq!(p(10, Some(0)).percent(), None);
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let base = start_server().await;
        let client = Client::new();
        let mut seen = Vec::new();

        let body = download_with_progress(&client, &format!("{base}/file.apk"), |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(body, PAYLOAD);
        let last = seen.last().unwrap();
        assert_eq!(last.received, PAYLOAD.len() as u64);
        assert_eq!(last.percent(), Some(100));
    }

    #[tokio::test]
    async fn test_download_failure_is_error() {
        let base = start_server().await;
        let client = Client::new();
        let err = download_with_progress(&client, &format!("{base}/gone"), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Upstream { status: 404 }));
    }

    #[tokio::test]
    async fn test_download_app_writes_file_and_counts_once() {
        let base = start_server().await;
        let (gateway, remote) = gateway_with_app("a1");
        let dir = tempfile::tempdir().unwrap();

        let mut app = sample_app("a1");
        app.download_link = format!("{base}/file.apk");

        let outcome = download_app(&gateway, &Client::new(), &app, dir.path(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.path, dir.path().join("Habit_Tracker.apk"));
        assert_eq!(std::fs::read(&outcome.path).unwrap(), PAYLOAD);
        assert!(outcome.counter_error.is_none());
        assert_eq!(remote.column("apps", "a1", "downloads"), Some(1));
    }

    #[tokio::test]
    async fn test_download_app_failed_save_leaves_no_file() {
        let base = start_server().await;
        let (gateway, remote) = gateway_with_app("a1");
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail
        std::fs::create_dir(dir.path().join("Habit_Tracker.apk")).unwrap();

        let mut app = sample_app("a1");
        app.download_link = format!("{base}/file.apk");

        let result = download_app(&gateway, &Client::new(), &app, dir.path(), |_| {}).await;

        assert!(result.is_err());
        assert!(!dir.path().join("Habit_Tracker.apk.part").exists());
        assert!(dir.path().join("Habit_Tracker.apk").is_dir());
        assert_eq!(remote.column("apps", "a1", "downloads"), Some(0));
    }

    #[test]
    fn test_partial_path_sits_beside_target() {
        let path = Path::new("/tmp/out/App.apk");
        assert_eq!(partial_path(path), PathBuf::from("/tmp/out/App.apk.part"));
    }

    #[tokio::test]
    async fn test_failed_download_writes_nothing_and_does_not_count() {
        let base = start_server().await;
        let (gateway, remote) = gateway_with_app("a1");
        let dir = tempfile::tempdir().unwrap();

        let mut app = sample_app("a1");
        app.download_link = format!("{base}/gone");

        assert!(download_app(&gateway, &Client::new(), &app, dir.path(), |_| {})
            .await
            .is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(remote.column("apps", "a1", "downloads"), Some(0));
    }

    #[tokio::test]
    async fn test_counter_failure_keeps_download() {
        let base = start_server().await;
        let (gateway, remote) = gateway_with_app("a1");
        remote.fail_table("apps");
        let dir = tempfile::tempdir().unwrap();

        let mut app = sample_app("a1");
        app.download_link = format!("{base}/file.apk");

        let outcome = download_app(&gateway, &Client::new(), &app, dir.path(), |_| {})
            .await
            .unwrap();
        assert!(outcome.counter_error.is_some());
        assert!(outcome.path.exists());
    }
}
