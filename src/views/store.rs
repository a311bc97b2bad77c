use crate::domain::{format_downloads, format_size, App};
use crate::gateway::Gateway;
use crate::views::PageState;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreView {
    pub apps: Vec<App>,
}

impl StoreView {
    pub fn total_downloads(&self) -> u64 {
        self.apps.iter().map(|app| app.downloads).sum()
    }

    pub fn total_downloads_label(&self) -> String {
        format_downloads(self.total_downloads())
    }

    /// `(size, downloads)` labels for one card.
    pub fn labels(app: &App) -> (String, String) {
        (format_size(&app.size), format_downloads(app.downloads))
    }

    pub fn find(&self, app_id: &str) -> Option<&App> {
        self.apps.iter().find(|app| app.id == app_id)
    }

    /// Reflect a completed download without refetching.
    pub fn record_download(&mut self, app_id: &str) -> bool {
        match self.apps.iter_mut().find(|app| app.id == app_id) {
            Some(app) => {
                app.downloads += 1;
                true
            }
            None => false,
        }
    }
}

pub async fn load_store(gateway: &Gateway) -> PageState<StoreView> {
    match gateway.try_all_apps().await {
        Ok(apps) if apps.is_empty() => PageState::Empty,
        Ok(apps) => PageState::Ready(StoreView { apps }),
        Err(e) => {
            tracing::error!(error = %e, "failed to load apps");
            PageState::Failed("Failed to load apps".to_string())
        }
    }
}
