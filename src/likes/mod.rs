//! Like and unlike a post.
//!
//! The local liked set gates the remote counter, so repeating a like (or an
//! unlike) from the same client does nothing. Counter writes never block the
//! local state change; their failure is reported in the returned change.

use crate::app::{FolioError, Result};
use crate::domain::BlogPost;
use crate::gateway::Gateway;
use crate::store::LikedStore;

#[derive(Debug)]
pub struct LikeChange {
    /// Whether the post is liked by this client afterwards.
    pub liked: bool,
    /// `false` when the call was a no-op.
    pub changed: bool,
    /// Like count to display, adjusted locally.
    pub likes: u64,
    pub counter_error: Option<FolioError>,
}

impl LikeChange {
    fn unchanged(liked: bool, likes: u64) -> Self {
        Self {
            liked,
            changed: false,
            likes,
            counter_error: None,
        }
    }
}

pub async fn like(
    gateway: &Gateway,
    store: &dyn LikedStore,
    post: &BlogPost,
) -> Result<LikeChange> {
    if store.is_liked(&post.id)? {
        return Ok(LikeChange::unchanged(true, post.likes));
    }

    let counter = gateway.increment_likes(&post.id).await;
    store.mark_liked(&post.id)?;
    tracing::info!(post = %post.id, "liked");

    Ok(LikeChange {
        liked: true,
        changed: true,
        likes: post.likes + 1,
        counter_error: counter.err(),
    })
}

pub async fn unlike(
    gateway: &Gateway,
    store: &dyn LikedStore,
    post: &BlogPost,
) -> Result<LikeChange> {
    if !store.is_liked(&post.id)? {
        return Ok(LikeChange::unchanged(false, post.likes));
    }

    let counter = gateway.decrement_likes(&post.id).await;
    store.remove_liked(&post.id)?;
    tracing::info!(post = %post.id, "unliked");

    Ok(LikeChange {
        liked: false,
        changed: true,
        likes: post.likes.saturating_sub(1),
        counter_error: counter.err(),
    })
}

pub async fn toggle(
    gateway: &Gateway,
    store: &dyn LikedStore,
    post: &BlogPost,
) -> Result<LikeChange> {
    if store.is_liked(&post.id)? {
        unlike(gateway, store, post).await
    } else {
        like(gateway, store, post).await
    }
}
