/// Cadence - music player host process
use anyhow::Context;
use cadence_desktop::{run_session, AppConfig, Library, RodioDevice, ToastSink};
use cadence_metadata::LibraryScanner;
use cadence_playback::{PlaybackController, PlayerConfig, PlayerServices};
use cadence_storage::{
    SqliteConfigStore, SqlitePlayerStateStore, SqlitePlaylistStore, TrackDatabase,
};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence music player host", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to ./cadence.toml when present)
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL, overrides the configuration
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan folders into the library
    Scan {
        /// Folders or files to scan (defaults to the configured music folders)
        paths: Vec<PathBuf>,

        /// Remove library tracks that were not found by this scan
        #[arg(long)]
        prune: bool,
    },
    /// Host the player, controlled by JSON lines on stdin
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_url = database;
    }
    config.validate()?;

    // Logs go to stderr, stdout carries the control channel
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(config.log_filter()))
                .context("invalid log filter")?,
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Scan { paths, prune } => scan(&config, paths, prune).await,
        Commands::Run => run(&config).await,
    }
}

async fn open_database(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let pool = cadence_storage::create_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    cadence_storage::run_migrations(&pool).await?;
    Ok(pool)
}

async fn scan(config: &AppConfig, paths: Vec<PathBuf>, prune: bool) -> anyhow::Result<()> {
    let paths = if paths.is_empty() {
        config.music_folders.clone()
    } else {
        paths
    };
    anyhow::ensure!(
        !paths.is_empty(),
        "nothing to scan: pass a path or set music_folders in the configuration"
    );

    let library = TrackDatabase::new(open_database(config).await?);
    let scanner = LibraryScanner::new();
    let mut found = Vec::new();

    for path in &paths {
        let outcome = scanner
            .scan(path, None)
            .await
            .with_context(|| format!("failed to scan {}", path.display()))?;

        for (file, error) in &outcome.stats.errors {
            tracing::warn!("Skipped {}: {}", file.display(), error);
        }

        let written = library.upsert_tracks(&outcome.tracks).await?;
        tracing::info!(
            "{}: {} files, {} tracks written, {} errors",
            path.display(),
            outcome.stats.files_discovered,
            written,
            outcome.stats.errors.len()
        );
        found.extend(outcome.seen_paths());
    }

    if prune {
        let removed = library.remove_missing(&found).await?;
        tracing::info!("Removed {} missing tracks", removed);
    }

    tracing::info!("Library now holds {} tracks", library.count().await?);
    Ok(())
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Cadence");

    let pool = open_database(config).await?;
    let repository = Arc::new(TrackDatabase::new(pool.clone()));
    let library = Library {
        tracks: repository.clone(),
        playlists: Arc::new(SqlitePlaylistStore::new(pool.clone())),
    };
    let (toast_sink, toasts) = ToastSink::new();

    let services = PlayerServices {
        repository,
        config: Arc::new(SqliteConfigStore::new(pool.clone())),
        notifications: Arc::new(toast_sink),
        state_store: Some(Arc::new(SqlitePlayerStateStore::new(pool))),
    };

    let device = RodioDevice::open().await?;
    let mut controller = PlaybackController::new(device, services, PlayerConfig::default());
    controller.load_settings().await;
    controller.rehydrate().await;
    tracing::info!(
        "Player ready, {} tracks in queue",
        controller.queue().len()
    );

    run_session(
        controller,
        library,
        toasts,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    tracing::info!("Cadence stopped");
    Ok(())
}
