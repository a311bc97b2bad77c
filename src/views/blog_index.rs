use crate::app::Result;
use crate::domain::BlogPost;
use crate::gateway::Gateway;
use crate::views::PageState;

/// How many posts the index loads at once.
pub const INDEX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct BlogIndex {
    pub posts: Vec<BlogPost>,
}

impl BlogIndex {
    pub fn new(posts: Vec<BlogPost>) -> Self {
        Self { posts }
    }

    /// Every tag in use, once each, in first-seen order.
    pub fn all_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for tag in self.posts.iter().flat_map(|p| &p.tags) {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Posts matching `search` (case-insensitive, title/excerpt/tags) and
    /// carrying exactly `tag`. Blank criteria match everything.
    pub fn filter(&self, search: &str, tag: Option<&str>) -> Vec<&BlogPost> {
        let search = search.trim();
        let tag = tag.filter(|t| !t.is_empty());

        self.posts
            .iter()
            .filter(|post| search.is_empty() || post.matches_search(search))
            .filter(|post| tag.is_none_or(|t| post.has_tag(t)))
            .collect()
    }
}

pub async fn load_blog_index(gateway: &Gateway) -> PageState<BlogIndex> {
    match gateway.try_published_posts(INDEX_PAGE_SIZE, 0).await {
        Ok(posts) if posts.is_empty() => PageState::Empty,
        Ok(posts) => PageState::Ready(BlogIndex::new(posts)),
        Err(e) => {
            tracing::error!(error = %e, "failed to load blog index");
            PageState::Failed("Failed to load blogs".to_string())
        }
    }
}

/// One page of published posts, optionally restricted to a tag.
///
/// A tag goes to the store as a containment filter; the offset is then
/// applied to the tagged results.
pub async fn load_posts_page(
    gateway: &Gateway,
    limit: u32,
    offset: u32,
    tag: Option<&str>,
) -> Result<Vec<BlogPost>> {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => {
            let posts = gateway
                .try_posts_by_tag(tag, limit.saturating_add(offset))
                .await?;
            Ok(posts.into_iter().skip(offset as usize).collect())
        }
        None => gateway.try_published_posts(limit, offset).await,
    }
}
