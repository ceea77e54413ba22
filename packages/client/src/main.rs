use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use common::storage::filesystem::FilesystemBlobStore;
use common::{DeepLink, Hunt, KnownHuntSet};
use tracing::Level;
use uuid::Uuid;

use hunt_client::config::ClientConfig;
use hunt_client::remote::HttpRemoteMedia;
use hunt_client::{ApiClient, MediaCache, ScanTarget};

/// Upper bound for a single cached blob; matches the largest accepted upload.
const MAX_CACHED_BLOB: u64 = common::media::MAX_MEDIA_SIZE;

#[derive(Parser)]
#[command(name = "hunt", version, about = "Play and manage QR treasure hunts from the terminal")]
struct Cli {
    /// Server origin; overrides `api_url` from the config.
    #[arg(long, env = "HUNT_API_URL")]
    api_url: Option<String>,

    /// Log more (repeat for debug output).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the hunts this device knows, forgetting deleted ones.
    Hunts,
    /// Create a hunt and remember it.
    Create {
        #[arg(default_value = "")]
        name: String,
    },
    /// Stop listing a hunt on this device.
    Forget { hunt_id: Uuid },
    /// Follow a scanned QR payload (full URL or `/hunt/...` path).
    Scan { payload: String },
    /// Download every media file of a hunt into the local cache.
    Prefetch { hunt_id: Uuid },
    /// Attach a photo or video to a clue.
    Upload {
        hunt_id: Uuid,
        clue_id: Uuid,
        file: PathBuf,
    },
    /// Manage the local media cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Delete every cached media file.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::load().context("Failed to load client configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let http = reqwest::Client::new();
    let known = Arc::new(KnownHuntSet::new(config.known_hunts_path.clone()));
    let api = ApiClient::new(http.clone(), &config.api_url, known);

    match cli.command {
        Command::Hunts => {
            let hunts = api.known_hunts().await.context("Failed to list hunts")?;
            if hunts.is_empty() {
                println!("No known hunts. Create one with `hunt create <name>`.");
            }
            for hunt in &hunts {
                print_hunt_line(hunt);
            }
        }
        Command::Create { name } => {
            let hunt = api
                .create_hunt(&name)
                .await
                .context("Failed to create hunt")?;
            println!("Created {} ({})", hunt.title(), hunt.id);
        }
        Command::Forget { hunt_id } => {
            api.forget(hunt_id).await;
            println!("Forgot {hunt_id}");
        }
        Command::Scan { payload } => {
            let link = DeepLink::parse(&payload).context("Not a treasure hunt code")?;
            match api.visit(link).await.context("Failed to open scanned link")? {
                ScanTarget::Hunt(hunt) => {
                    print_hunt_line(&hunt);
                    for (i, clue) in hunt.clues.iter().enumerate() {
                        println!("  {}. {}", i + 1, clue.text);
                    }
                }
                ScanTarget::Clue(view) => {
                    println!("{} - clue {} of {}", view.hunt_name, view.step, view.total);
                    println!("{}", view.clue.text);
                    if !view.clue.hint.is_empty() {
                        println!("Hint: {}", view.clue.hint);
                    }
                    if let Some(media) = &view.clue.media_url {
                        println!("Media: {media}");
                    }
                    if view.is_last {
                        println!("This is the last clue. Its code leads to the finish.");
                    }
                }
                ScanTarget::Complete(hunt) => {
                    println!("Congratulations! You completed {}.", hunt.title());
                }
            }
        }
        Command::Prefetch { hunt_id } => {
            let cache = media_cache(&config, http).await?;
            let hunt = api.get_hunt(hunt_id).await.context("Failed to load hunt")?;
            let paths: Vec<String> = hunt
                .stored_media_paths()
                .into_iter()
                .map(str::to_string)
                .collect();
            let count = paths.len();
            cache
                .prefetch(paths)
                .await
                .context("Prefetch task failed")?;
            println!("Prefetched {count} media file(s) for {}", hunt.title());
        }
        Command::Upload {
            hunt_id,
            clue_id,
            file,
        } => {
            let previous = api
                .get_clue(hunt_id, clue_id)
                .await
                .context("Failed to load clue")?
                .clue
                .media_url;
            let clue = api
                .upload_file(hunt_id, clue_id, &file)
                .await
                .context("Upload failed")?;

            if let Some(previous) = previous {
                let cache = media_cache(&config, http).await?;
                cache
                    .invalidate(&previous)
                    .await
                    .context("Failed to invalidate cached media")?;
            }
            println!(
                "Attached {} to clue {}",
                clue.media_url.unwrap_or_default(),
                clue.id
            );
        }
        Command::Cache {
            command: CacheCommand::Clear,
        } => {
            let cache = media_cache(&config, http).await?;
            let removed = cache.clear().await.context("Failed to clear media cache")?;
            println!("Removed {removed} cached file(s)");
        }
    }

    Ok(())
}

async fn media_cache(config: &ClientConfig, http: reqwest::Client) -> anyhow::Result<MediaCache> {
    let local = FilesystemBlobStore::new(config.cache_dir.clone(), MAX_CACHED_BLOB)
        .await
        .with_context(|| format!("Failed to open media cache at {}", config.cache_dir.display()))?;
    let remote = HttpRemoteMedia::new(http, &config.api_url);
    Ok(MediaCache::new(Arc::new(remote), Arc::new(local))
        .with_batch_size(config.prefetch_batch_size))
}

fn print_hunt_line(hunt: &Hunt) {
    println!("{}  {} ({} clues)", hunt.id, hunt.title(), hunt.clues.len());
}
