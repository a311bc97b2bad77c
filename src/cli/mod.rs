pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::gateway::service::DEFAULT_PAGE_SIZE;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Read and manage a portfolio blog and app store", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/folio/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Liked-posts database (default: <data dir>/folio/folio.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List published posts
    Posts {
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Case-insensitive search over title, excerpt and tags
        #[arg(short, long)]
        search: Option<String>,
        /// Only posts carrying exactly this tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Show a post
    Show {
        slug: String,
        /// Write the rendered article HTML to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Open the rendered file in the browser
        #[arg(long)]
        open: bool,
    },
    /// Like a post
    Like { slug: String },
    /// Remove your like from a post
    Unlike { slug: String },
    /// List store apps
    Apps,
    /// Download an app package
    Download {
        app_id: String,
        /// Destination directory (default: current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    /// Show the profile
    Profile,
    /// Run the download passthrough service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
}
