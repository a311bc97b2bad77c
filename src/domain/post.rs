use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{self, ContentBlock};

/// A blog row as stored in the table store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(rename = "$id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    /// JSON text encoding of the post's content blocks.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub read_time: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub featured_image: Option<String>,
    /// Id of the next part in a series.
    #[serde(default)]
    pub related_blog: Option<String>,
    #[serde(default)]
    pub suggested_reading: Option<Vec<String>>,
    #[serde(default)]
    pub part_number: Option<u32>,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Parsed content blocks; never empty.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        content::parse(&self.content)
    }

    /// Ids of suggested posts, without blanks or this post's own id.
    pub fn suggested_ids(&self) -> Vec<String> {
        self.suggested_reading
            .iter()
            .flatten()
            .filter(|id| !id.trim().is_empty() && **id != self.id)
            .cloned()
            .collect()
    }

    /// The related post id, if one is set.
    pub fn related_id(&self) -> Option<&str> {
        self.related_blog
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive match against title, excerpt and tags.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.excerpt.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }

    /// "Continue reading" navigation toward `related`, the next part.
    pub fn series_navigation(&self, related: Option<BlogPost>) -> Option<SeriesNav> {
        let next = related?;
        Some(SeriesNav {
            next_part_number: self.part_number.unwrap_or(1).max(1) + 1,
            next,
        })
    }

    pub fn display_date(&self) -> String {
        self.created_at.format("%B %-d, %Y").to_string()
    }

    /// Up to `max` tags, plus how many were left out.
    pub fn visible_tags(&self, max: usize) -> (&[String], usize) {
        let shown = self.tags.len().min(max);
        (&self.tags[..shown], self.tags.len() - shown)
    }
}

/// Link to the next part of a multi-part series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesNav {
    pub next_part_number: u32,
    pub next: BlogPost,
}

impl SeriesNav {
    pub fn label(&self) -> String {
        format!("Part {}", self.next_part_number)
    }

    pub fn href(&self) -> String {
        format!("/blogs/{}", self.next.slug)
    }
}
