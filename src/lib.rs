//! # Folio
//!
//! Client core for a personal portfolio site: blog, app store and contact
//! form, all backed by a remote table store.
//!
//! ## Architecture
//!
//! ```text
//! TableStore → Gateway (+ TtlCache) → views → cli
//!                  │
//!          post content → content::parse → content::render_article
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # List posts tagged "rust"
//! folio posts --tag rust
//!
//! # Render a post to HTML and open it
//! folio show my-first-post --open
//!
//! # Serve the download passthrough on :3000
//! folio serve
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires the gateway, the liked-posts store
/// and the download client together.
pub mod app;

/// Read-through cache with a fixed time-to-live.
pub mod cache;

/// Command-line interface using clap.
pub mod cli;

/// Loads `~/.config/folio/config.toml`.
pub mod config;

/// Post content: block schema, tolerant parser, inline markup and HTML rendering.
pub mod content;

/// Rows of the portfolio tables.
///
/// - [`BlogPost`](domain::BlogPost) with series navigation
/// - [`App`](domain::App) store entries
/// - [`NewMessage`](domain::NewMessage) contact form input
/// - [`Profile`](domain::Profile)
pub mod domain;

/// App package downloads and the HTTP download passthrough.
pub mod download;

/// Remote table store access.
///
/// - [`TableStore`](gateway::TableStore): raw row operations
/// - [`HttpTableStore`](gateway::HttpTableStore): reqwest-based implementation
/// - [`Gateway`](gateway::Gateway): typed, cached reads and counter writes
pub mod gateway;

/// Idempotent like and unlike.
pub mod likes;

/// Local SQLite record of liked posts.
pub mod store;

/// Page loaders for the blog index, post detail, store, contact and home pages.
pub mod views;
