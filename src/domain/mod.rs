pub mod apps;
pub mod message;
pub mod post;
pub mod profile;

pub use apps::{format_downloads, format_size, App};
pub use message::{Message, NewMessage};
pub use post::{BlogPost, SeriesNav};
pub use profile::Profile;
