use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::{AppContext, FolioError, Result};
use crate::domain::{format_downloads, format_size, BlogPost, NewMessage};
use crate::download::{self, passthrough, DownloadProgress};
use crate::likes;
use crate::store::LikedStore;
use crate::views::{self, BlogIndex, PageState, StoreView};

pub async fn list_posts(
    ctx: &AppContext,
    limit: u32,
    offset: u32,
    search: Option<&str>,
    tag: Option<&str>,
) -> Result<()> {
    let posts = views::load_posts_page(&ctx.gateway, limit, offset, tag)
        .await
        .map_err(|e| {
            eprintln!("Failed to load blogs. Please try again.");
            e
        })?;

    let index = BlogIndex::new(posts);
    let shown = index.filter(search.unwrap_or(""), tag);

    if shown.is_empty() {
        println!("No posts found");
        return Ok(());
    }

    let liked: HashSet<String> = ctx
        .likes
        .liked_ids()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read liked posts");
            Vec::new()
        })
        .into_iter()
        .collect();

    for post in shown {
        print_post_line(post, liked.contains(&post.id));
    }

    let tags = index.all_tags();
    if !tags.is_empty() {
        println!("\nTags: {}", tags.join(", "));
    }
    Ok(())
}

fn print_post_line(post: &BlogPost, liked: bool) {
    let (tags, hidden) = post.visible_tags(3);
    let more = if hidden > 0 {
        format!(" +{hidden}")
    } else {
        String::new()
    };

    println!("{}{}", if liked { "♥ " } else { "  " }, post.title);
    println!(
        "    /blogs/{} · {} · {} min read · {} views · {} likes",
        post.slug,
        post.display_date(),
        post.read_time,
        post.views,
        post.likes
    );
    if !tags.is_empty() {
        println!("    [{}]{}", tags.join(", "), more);
    }
}

pub async fn show_post(ctx: &AppContext, slug: &str, out: Option<&Path>, open: bool) -> Result<()> {
    let view = match views::load_post(&ctx.gateway, ctx.likes.as_ref(), slug).await {
        PageState::Ready(view) => view,
        PageState::Empty => return Err(FolioError::NotFound(format!("{}: {slug}", views::POST_NOT_FOUND))),
        PageState::Failed(message) => return Err(FolioError::Other(message)),
    };

    let post = &view.post;
    println!("{}", post.title);
    println!(
        "{} · {} min read · {} views · {} likes{}",
        post.display_date(),
        post.read_time,
        post.views,
        post.likes,
        if view.liked { " (liked)" } else { "" }
    );
    if !post.tags.is_empty() {
        println!("Tags: {}", post.tags.join(", "));
    }
    if !post.excerpt.is_empty() {
        println!("\n{}", post.excerpt);
    }
    println!("\n{} content blocks", view.blocks.len());

    if let Some(series) = &view.series {
        println!("\nContinue reading: {} · {} ({})", series.label(), series.next.title, series.href());
    }
    if !view.suggested.is_empty() {
        println!("\nSuggested reading:");
        for next in &view.suggested {
            println!("  {} (/blogs/{})", next.title, next.slug);
        }
    }

    let target = match (out, open) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, true) => Some(std::env::temp_dir().join(format!("folio-{}.html", post.id))),
        (None, false) => None,
    };

    if let Some(path) = target {
        std::fs::write(&path, view.document())?;
        println!("\nWrote {}", path.display());
        if open {
            if let Err(e) = open::that(&path) {
                eprintln!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Ok(())
}

async fn post_for_slug(ctx: &AppContext, slug: &str) -> Result<BlogPost> {
    ctx.gateway
        .try_post_by_slug(slug)
        .await?
        .ok_or_else(|| FolioError::NotFound(format!("{}: {slug}", views::POST_NOT_FOUND)))
}

pub async fn like_post(ctx: &AppContext, slug: &str) -> Result<()> {
    let post = post_for_slug(ctx, slug).await?;
    let change = likes::like(&ctx.gateway, ctx.likes.as_ref(), &post).await?;

    if change.changed {
        println!("Liked \"{}\" ({} likes)", post.title, change.likes);
    } else {
        println!("Already liked \"{}\"", post.title);
    }
    if let Some(e) = change.counter_error {
        eprintln!("  Like count not updated: {}", e);
    }
    Ok(())
}

pub async fn unlike_post(ctx: &AppContext, slug: &str) -> Result<()> {
    let post = post_for_slug(ctx, slug).await?;
    let change = likes::unlike(&ctx.gateway, ctx.likes.as_ref(), &post).await?;

    if change.changed {
        println!("Removed like from \"{}\" ({} likes)", post.title, change.likes);
    } else {
        println!("\"{}\" was not liked", post.title);
    }
    if let Some(e) = change.counter_error {
        eprintln!("  Like count not updated: {}", e);
    }
    Ok(())
}

pub async fn list_apps(ctx: &AppContext) -> Result<()> {
    let view = match views::load_store(&ctx.gateway).await {
        PageState::Ready(view) => view,
        PageState::Empty => {
            println!("No apps");
            return Ok(());
        }
        PageState::Failed(message) => return Err(FolioError::Other(message)),
    };

    println!(
        "{} apps · {} downloads\n",
        view.apps.len(),
        view.total_downloads_label()
    );
    for app in &view.apps {
        let (size, downloads) = StoreView::labels(app);
        println!("{} v{} [{}]", app.title, app.version, app.id);
        println!("    {} · {} downloads", size, downloads);
        if !app.description.is_empty() {
            println!("    {}", app.description);
        }
        for feature in &app.features {
            println!("    - {}", feature);
        }
        if let Some((info, detail)) = app.info_popup() {
            println!("    {}: {}", info, detail);
        }
    }
    Ok(())
}

pub async fn download_app(ctx: &AppContext, app_id: &str, dir: Option<&Path>) -> Result<()> {
    let mut store = match views::load_store(&ctx.gateway).await {
        PageState::Ready(view) => view,
        PageState::Empty => return Err(FolioError::NotFound(format!("app {app_id}"))),
        PageState::Failed(message) => return Err(FolioError::Other(message)),
    };
    let app = store
        .find(app_id)
        .cloned()
        .ok_or_else(|| FolioError::NotFound(format!("app {app_id}")))?;

    let dir: PathBuf = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    println!("Downloading {} ({})", app.title, format_size(&app.size));
    let outcome = download::download_app(&ctx.gateway, &ctx.http, &app, &dir, print_progress).await;
    eprintln!();

    let outcome = outcome.map_err(|e| {
        eprintln!("Download failed. Please try again.");
        e
    })?;

    println!("Saved {} ({} bytes)", outcome.path.display(), outcome.bytes);
    match outcome.counter_error {
        None => {
            store.record_download(&app.id);
            let downloads = store.find(&app.id).map_or(app.downloads, |a| a.downloads);
            println!("Downloads: {}", format_downloads(downloads));
        }
        Some(e) => eprintln!("  Download count not updated: {}", e),
    }
    Ok(())
}

fn print_progress(progress: DownloadProgress) {
    match progress.percent() {
        Some(pct) => eprint!("\r  {:>3}%", pct),
        None => eprint!("\r  {} bytes", progress.received),
    }
    let _ = std::io::stderr().flush();
}

pub async fn send_contact(ctx: &AppContext, message: NewMessage) -> Result<()> {
    match views::send_message(&ctx.gateway, &message).await {
        Ok(_) => {
            println!("{}", views::CONTACT_SENT);
            Ok(())
        }
        Err(e @ FolioError::Validation(_)) => Err(e),
        Err(e) => {
            eprintln!("{}", views::CONTACT_FAILED);
            Err(e)
        }
    }
}

pub async fn show_profile(ctx: &AppContext) -> Result<()> {
    let home = views::load_home(&ctx.gateway).await;

    match home.profile.as_ref().and_then(|p| p.image_url()) {
        Some(url) => println!("Profile image: {}", url),
        None => println!("No profile"),
    }

    if !home.latest.is_empty() {
        println!("\nLatest posts:");
        for post in &home.latest {
            println!("  {} (/blogs/{})", post.title, post.slug);
        }
    }
    Ok(())
}

pub async fn serve(ctx: &AppContext, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut server = ctx.config.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }

    let state = passthrough::PassthroughState {
        client: ctx.http.clone(),
        config: ctx.config.download.clone(),
    };
    passthrough::serve(&server, state).await
}
