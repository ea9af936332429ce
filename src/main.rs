use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use marquee::app::{App, AppEvent};
use marquee::catalog::Catalog;
use marquee::config::Config;
use marquee::storage::{Database, DatabaseError, WatchlistStore, WATCHLIST_KEY};
use marquee::ui;

/// Get the config directory path (~/.config/marquee/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("marquee");
    Ok(config_dir)
}

/// Atomically write `content` to `dst` using write-to-temp-then-rename.
/// The destination is never left in a partial state.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    // Randomized temp filename so the path cannot be predicted and pre-created
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true); // Fails if the file exists (prevents symlink race)
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut temp_file = options.open(&temp_path).with_context(|| {
        format!(
            "Failed to create temporary file '{}': check directory permissions or disk space",
            temp_path.display()
        )
    })?;

    temp_file.write_all(content).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to write to temporary file '{}': disk may be full",
            temp_path.display()
        )
    })?;

    temp_file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to sync temporary file '{}' to disk: disk may be full",
            temp_path.display()
        )
    })?;

    drop(temp_file);

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst).with_context(|| {
            let _ = std::fs::remove_file(&temp_path);
            format!(
                "Failed to remove existing '{}' before atomic replace",
                dst.display()
            )
        })?;
    }

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}': check permissions",
            temp_path.display(),
            dst.display()
        )
    })?;

    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "marquee",
    version,
    about = "Terminal movie and TV discovery with a local watchlist"
)]
struct Args {
    /// Config file (default: ~/.config/marquee/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Delete the saved watchlist before starting
    #[arg(long)]
    reset_watchlist: bool,

    /// Print the watchlist and exit
    #[arg(long)]
    list: bool,

    /// Write the watchlist JSON to FILE and exit
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

/// Print the watchlist in insertion order.
fn print_watchlist(watchlist: &WatchlistStore) {
    if watchlist.is_empty() {
        println!("Watchlist is empty.");
        return;
    }

    for item in watchlist.items() {
        let marker = if item.watched { "[x]" } else { "[ ]" };
        let year = item.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        println!(
            "{} {}{} | {} | added {}",
            marker,
            marquee::util::strip_control_chars(item.display_title()),
            year,
            item.media_type.label(),
            item.added_at.format("%Y-%m-%d")
        );
    }
    println!(
        "{} titles, {} to watch, {} watched",
        watchlist.len(),
        watchlist.count_unwatched(),
        watchlist.count_watched()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never land in the alternate screen
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // User-only access: the directory holds the watchlist and API keys
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::info!(path = %config_path.display(), ?config, "Config loaded");

    // Open database
    let db_path = config_dir.join("marquee.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of marquee appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    if args.reset_watchlist {
        let removed = db
            .delete_slot(WATCHLIST_KEY)
            .await
            .context("Failed to reset watchlist")?;
        if removed {
            println!("Watchlist reset.");
        }
    }

    if let Some(export_path) = &args.export {
        let raw = db
            .get_slot(WATCHLIST_KEY)
            .await
            .context("Failed to read watchlist")?
            .unwrap_or_else(|| "[]".to_string());
        atomic_write(export_path, raw.as_bytes())
            .with_context(|| format!("Failed to export watchlist to {}", export_path.display()))?;
        println!("Exported watchlist to {}", export_path.display());
        db.close().await;
        return Ok(());
    }

    let watchlist = WatchlistStore::initialize(db.clone())
        .await
        .context("Failed to load watchlist")?;

    if args.list {
        print_watchlist(&watchlist);
        db.close().await;
        return Ok(());
    }

    let catalog = Catalog::from_config(&config).context("Failed to set up metadata clients")?;

    let mut app = App::new(db.clone(), catalog, watchlist, &config);
    app.load_theme_preference().await;

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    let result = ui::run(&mut app, event_tx, event_rx).await;
    db.close().await;
    result
}
