pub mod sqlite;

use crate::app::Result;

pub use sqlite::SqliteLikedStore;

/// Local record of which posts this client has liked.
///
/// Only drives the like/unlike affordance. The remote counter stays the
/// source of truth for the like count.
pub trait LikedStore {
    fn is_liked(&self, post_id: &str) -> Result<bool>;
    /// Record a like. Returns `false` if the post was already liked.
    fn mark_liked(&self, post_id: &str) -> Result<bool>;
    /// Forget a like. Returns `false` if the post was not liked.
    fn remove_liked(&self, post_id: &str) -> Result<bool>;
    /// Liked post ids, most recent first.
    fn liked_ids(&self) -> Result<Vec<String>>;
}
