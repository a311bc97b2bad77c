use serde::{Deserialize, Serialize};

/// An app listed in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    #[serde(rename = "$id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub download_link: String,
    #[serde(default)]
    pub icon: String,
    /// Size in megabytes, as entered by the author.
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default, rename = "info_detail")]
    pub info_detail: Option<String>,
}

impl App {
    /// Title with every run of non-alphanumerics replaced by `_`, plus `.apk`.
    pub fn download_filename(&self) -> String {
        let mut name = String::with_capacity(self.title.len() + 4);
        let mut in_gap = false;
        for c in self.title.chars() {
            if c.is_ascii_alphanumeric() {
                name.push(c);
                in_gap = false;
            } else if !in_gap {
                name.push('_');
                in_gap = true;
            }
        }
        name.push_str(".apk");
        name
    }

    /// Both parts of the info popup, when the author filled them in.
    pub fn info_popup(&self) -> Option<(&str, &str)> {
        match (self.info.as_deref(), self.info_detail.as_deref()) {
            (Some(info), Some(detail)) if !info.is_empty() && !detail.is_empty() => {
                Some((info, detail))
            }
            _ => None,
        }
    }
}

/// Compact download count: `1.2K`, `3.4M`.
pub fn format_downloads(downloads: u64) -> String {
    if downloads >= 1_000_000 {
        format!("{:.1}M", downloads as f64 / 1_000_000.0)
    } else if downloads >= 1_000 {
        format!("{:.1}K", downloads as f64 / 1_000.0)
    } else {
        downloads.to_string()
    }
}

pub fn format_size(size: &str) -> String {
    format!("{size} MB")
}
