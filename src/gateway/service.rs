use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::app::{FolioError, Result};
use crate::cache::{keys, TtlCache};
use crate::config::BackendConfig;
use crate::domain::{App, BlogPost, Message, NewMessage, Profile};
use crate::gateway::{Query, TableStore};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_LATEST: u32 = 3;

const CREATED_AT: &str = "$createdAt";

/// Table names the gateway reads and writes.
#[derive(Debug, Clone)]
pub struct Tables {
    pub blogs: String,
    pub apps: String,
    pub profile: String,
    pub messages: String,
}

impl Tables {
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            blogs: config.blogs_table.clone(),
            apps: config.apps_table.clone(),
            profile: config.profile_table.clone(),
            messages: config.messages_table.clone(),
        }
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::from_config(&BackendConfig::default())
    }
}

/// Values held by the gateway's read cache.
#[derive(Debug, Clone)]
pub enum CachedRead {
    Posts(Vec<BlogPost>),
    Post(Option<BlogPost>),
    Apps(Vec<App>),
    Profile(Option<Profile>),
}

trait Cached: Sized {
    fn wrap(self) -> CachedRead;
    fn unwrap_from(read: CachedRead) -> Option<Self>;
}

impl Cached for Vec<BlogPost> {
    fn wrap(self) -> CachedRead {
        CachedRead::Posts(self)
    }
    fn unwrap_from(read: CachedRead) -> Option<Self> {
        match read {
            CachedRead::Posts(v) => Some(v),
            _ => None,
        }
    }
}

impl Cached for Option<BlogPost> {
    fn wrap(self) -> CachedRead {
        CachedRead::Post(self)
    }
    fn unwrap_from(read: CachedRead) -> Option<Self> {
        match read {
            CachedRead::Post(v) => Some(v),
            _ => None,
        }
    }
}

impl Cached for Vec<App> {
    fn wrap(self) -> CachedRead {
        CachedRead::Apps(self)
    }
    fn unwrap_from(read: CachedRead) -> Option<Self> {
        match read {
            CachedRead::Apps(v) => Some(v),
            _ => None,
        }
    }
}

impl Cached for Option<Profile> {
    fn wrap(self) -> CachedRead {
        CachedRead::Profile(self)
    }
    fn unwrap_from(read: CachedRead) -> Option<Self> {
        match read {
            CachedRead::Profile(v) => Some(v),
            _ => None,
        }
    }
}

/// Typed access to the portfolio tables.
///
/// Reads come in two forms. `try_*` returns the failure so a page can tell
/// "failed" from "empty"; the plain form logs and returns an empty or `None`
/// result. Successful reads are cached for the cache's TTL. Writes go
/// straight to the store, leave the cache alone and return a `Result` the
/// caller may ignore.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn TableStore + Send + Sync>,
    cache: Arc<TtlCache<CachedRead>>,
    tables: Tables,
}

impl Gateway {
    pub fn new(
        store: Arc<dyn TableStore + Send + Sync>,
        cache: Arc<TtlCache<CachedRead>>,
        tables: Tables,
    ) -> Self {
        Self {
            store,
            cache,
            tables,
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn cache(&self) -> &TtlCache<CachedRead> {
        &self.cache
    }

    async fn cached<T, F, Fut>(&self, key: &str, load: F) -> Result<T>
    where
        T: Cached,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let read = self
            .cache
            .get_or_load(key, || async move { load().await.map(T::wrap) })
            .await?;
        T::unwrap_from(read)
            .ok_or_else(|| FolioError::Other(format!("cache entry {key} has an unexpected shape")))
    }

    async fn list<T: DeserializeOwned>(&self, table: &str, queries: &[Query]) -> Result<Vec<T>> {
        let list = self.store.list_rows(table, queries).await?;
        Ok(decode_rows(table, list.rows))
    }

    // Reads

    pub async fn try_published_posts(&self, limit: u32, offset: u32) -> Result<Vec<BlogPost>> {
        let key = keys::published_page(limit, offset);
        self.cached(&key, || async {
            self.list(
                &self.tables.blogs,
                &[
                    Query::order_desc(CREATED_AT),
                    Query::Limit(limit),
                    Query::Offset(offset),
                ],
            )
            .await
        })
        .await
    }

    pub async fn published_posts(&self, limit: u32, offset: u32) -> Vec<BlogPost> {
        self.try_published_posts(limit, offset)
            .await
            .unwrap_or_else(|e| neutral("published posts", e))
    }

    pub async fn try_latest_posts(&self, limit: u32) -> Result<Vec<BlogPost>> {
        let key = keys::latest(limit);
        self.cached(&key, || async {
            self.list(
                &self.tables.blogs,
                &[Query::order_desc(CREATED_AT), Query::Limit(limit)],
            )
            .await
        })
        .await
    }

    pub async fn latest_posts(&self, limit: u32) -> Vec<BlogPost> {
        self.try_latest_posts(limit)
            .await
            .unwrap_or_else(|e| neutral("latest posts", e))
    }

    /// Look a post up by its public slug. Percent-encoded slugs are decoded first.
    pub async fn try_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let slug = decode_slug(slug);
        let key = keys::post_slug(&slug);
        self.cached(&key, || async {
            let posts: Vec<BlogPost> = self
                .list(
                    &self.tables.blogs,
                    &[Query::equal("slug", slug.as_str()), Query::Limit(1)],
                )
                .await?;
            Ok(posts.into_iter().next())
        })
        .await
    }

    pub async fn post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        self.try_post_by_slug(slug)
            .await
            .unwrap_or_else(|e| neutral("post by slug", e))
    }

    pub async fn try_post_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        let key = keys::post_id(id);
        self.cached(&key, || async {
            match self.store.get_row(&self.tables.blogs, id).await {
                Ok(row) => Ok(Some(serde_json::from_value(row)?)),
                Err(FolioError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn post_by_id(&self, id: &str) -> Option<BlogPost> {
        self.try_post_by_id(id)
            .await
            .unwrap_or_else(|e| neutral("post by id", e))
    }

    /// Posts for the given ids in the order requested. Unknown ids are skipped.
    pub async fn try_posts_by_ids(&self, ids: &[String]) -> Result<Vec<BlogPost>> {
        let mut wanted: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !id.is_empty() && !wanted.contains(id) {
                wanted.push(id.clone());
            }
        }
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let key = keys::posts_ids(&wanted);
        self.cached(&key, || async {
            let found: Vec<BlogPost> = self
                .list(
                    &self.tables.blogs,
                    &[
                        Query::equal_any("$id", wanted.clone()),
                        Query::Limit(wanted.len() as u32),
                    ],
                )
                .await?;
            Ok(wanted
                .iter()
                .filter_map(|id| found.iter().find(|p| &p.id == id).cloned())
                .collect())
        })
        .await
    }

    pub async fn posts_by_ids(&self, ids: &[String]) -> Vec<BlogPost> {
        self.try_posts_by_ids(ids)
            .await
            .unwrap_or_else(|e| neutral("posts by ids", e))
    }

    pub async fn try_posts_by_tag(&self, tag: &str, limit: u32) -> Result<Vec<BlogPost>> {
        let key = keys::posts_tag(tag, limit);
        self.cached(&key, || async {
            self.list(
                &self.tables.blogs,
                &[
                    Query::contains("tags", tag),
                    Query::order_desc(CREATED_AT),
                    Query::Limit(limit),
                ],
            )
            .await
        })
        .await
    }

    pub async fn posts_by_tag(&self, tag: &str, limit: u32) -> Vec<BlogPost> {
        self.try_posts_by_tag(tag, limit)
            .await
            .unwrap_or_else(|e| neutral("posts by tag", e))
    }

    pub async fn try_all_apps(&self) -> Result<Vec<App>> {
        let key = keys::apps();
        self.cached(&key, || async {
            self.list(&self.tables.apps, &[Query::order_desc(CREATED_AT)])
                .await
        })
        .await
    }

    pub async fn all_apps(&self) -> Vec<App> {
        self.try_all_apps()
            .await
            .unwrap_or_else(|e| neutral("apps", e))
    }

    pub async fn try_profile(&self) -> Result<Option<Profile>> {
        let key = keys::profile();
        self.cached(&key, || async {
            let rows: Vec<Profile> = self
                .list(&self.tables.profile, &[Query::Limit(1)])
                .await?;
            Ok(rows.into_iter().next())
        })
        .await
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.try_profile()
            .await
            .unwrap_or_else(|e| neutral("profile", e))
    }

    // Writes

    pub async fn increment_views(&self, post_id: &str) -> Result<()> {
        let result = self
            .store
            .increment_column(&self.tables.blogs, post_id, "views", 1)
            .await;
        written("increment views", post_id, result)
    }

    pub async fn increment_likes(&self, post_id: &str) -> Result<()> {
        let result = self
            .store
            .increment_column(&self.tables.blogs, post_id, "likes", 1)
            .await;
        written("increment likes", post_id, result)
    }

    /// Remove one like; the counter never goes below zero.
    pub async fn decrement_likes(&self, post_id: &str) -> Result<()> {
        let result = self
            .store
            .decrement_column(&self.tables.blogs, post_id, "likes", 1, Some(0))
            .await;
        written("decrement likes", post_id, result)
    }

    pub async fn increment_downloads(&self, app_id: &str) -> Result<()> {
        let result = self
            .store
            .increment_column(&self.tables.apps, app_id, "downloads", 1)
            .await;
        written("increment downloads", app_id, result)
    }

    pub async fn create_message(&self, message: &NewMessage) -> Result<Message> {
        let data = serde_json::to_value(message)?;
        match self.store.create_row(&self.tables.messages, data).await {
            Ok(row) => Ok(serde_json::from_value(row)?),
            Err(e) => {
                tracing::error!(error = %e, "failed to create message");
                Err(e)
            }
        }
    }
}

fn neutral<T: Default>(what: &str, error: FolioError) -> T {
    tracing::error!(error = %error, "failed to fetch {what}");
    T::default()
}

fn written(what: &str, id: &str, result: Result<Value>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!(row = id, error = %e, "{what} failed");
            Err(e)
        }
    }
}

/// Deserialize rows one at a time so one malformed row does not hide the rest.
fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(table, index, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}

fn decode_slug(slug: &str) -> String {
    match urlencoding::decode(slug) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => slug.to_string(),
    }
}
