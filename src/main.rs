use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use folio::app::AppContext;
use folio::cli::{commands, Cli, Commands};
use folio::config::Config;
use folio::domain::NewMessage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config, cli.db.clone())?;

    match cli.command {
        Commands::Posts {
            limit,
            offset,
            search,
            tag,
        } => {
            commands::list_posts(&ctx, limit, offset, search.as_deref(), tag.as_deref()).await?;
        }
        Commands::Show { slug, out, open } => {
            commands::show_post(&ctx, &slug, out.as_deref(), open).await?;
        }
        Commands::Like { slug } => {
            commands::like_post(&ctx, &slug).await?;
        }
        Commands::Unlike { slug } => {
            commands::unlike_post(&ctx, &slug).await?;
        }
        Commands::Apps => {
            commands::list_apps(&ctx).await?;
        }
        Commands::Download { app_id, dir } => {
            commands::download_app(&ctx, &app_id, dir.as_deref()).await?;
        }
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let message = NewMessage::new(name, email, subject, message);
            commands::send_contact(&ctx, message).await?;
        }
        Commands::Profile => {
            commands::show_profile(&ctx).await?;
        }
        Commands::Serve { host, port } => {
            commands::serve(&ctx, host, port).await?;
        }
    }

    Ok(())
}
