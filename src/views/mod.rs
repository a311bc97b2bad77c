//! Page loaders.
//!
//! Each loader gathers what one page shows and reports failure separately
//! from "nothing to show", so callers can offer a retry instead of an empty
//! list.

pub mod blog_index;
pub mod contact;
pub mod home;
pub mod post;
pub mod store;

pub use blog_index::{load_blog_index, load_posts_page, BlogIndex, INDEX_PAGE_SIZE};
pub use contact::{send_message, CONTACT_FAILED, CONTACT_SENT};
pub use home::{load_home, HomeView};
pub use post::{load_post, PostView, POST_FAILED, POST_NOT_FOUND};
pub use store::{load_store, StoreView};

#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    Ready(T),
    /// The read succeeded but there was nothing to show.
    Empty,
    /// The read failed; carries the message shown to the reader.
    Failed(String),
}

impl<T> PageState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PageState::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            PageState::Ready(value) => Some(value),
            _ => None,
        }
    }
}
