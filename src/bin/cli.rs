//! Gallery sync CLI
//!
//! Local entry point: one-off syncs, the scheduler daemon and cached reads.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gallery_sync::{
    cache::TtlCache,
    error::Result,
    models::{Config, SyncSummary},
    pipeline::{self, ScheduleOptions, SyncEngine, ThrottlePolicy},
    services::{CachedRead, Catalog, DEFAULT_PAGE_SIZE, GalleryClient},
    storage::{ItemStore, SqliteItemStore},
    utils::report,
};

/// gallery-sync - incremental mirror of a remote photo gallery
#[derive(Parser, Debug)]
#[command(
    name = "gallery-sync",
    version,
    about = "Mirror a remote photo gallery into SQLite"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Gallery user whose posts are mirrored (overrides the config file)
    #[arg(long, env = "GALLERY_USER_ID")]
    user_id: Option<String>,

    /// SQLite database path (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one synchronization pass and print its summary
    Sync,

    /// Sync periodically until Ctrl-C
    Run,

    /// List stored items, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },

    /// Show one stored item with its image URLs
    Show {
        /// Post identifier
        id: String,
    },

    /// Validate configuration and open the database
    Validate,
}

/// Initialize logging. `--verbose` wins over the configured level; `RUST_LOG`
/// wins over both.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is configured from the file, so a load failure is reported
    // once the logger exists.
    let (mut config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(cli.verbose, &config.logging.level);

    match load_error {
        Some(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
        None => log::info!("Loaded configuration from {}", cli.config.display()),
    }

    if let Some(user_id) = cli.user_id {
        config.remote.user_id = user_id;
    }
    if let Some(database) = cli.database {
        config.storage.database = database;
    }

    match cli.command {
        Command::Sync => {
            config.validate()?;
            let engine = build_engine(&config)?;

            report::header("Gallery sync");
            let summary = engine.sync().await?;
            report::summary("Sync run", &summary.rows());
            for id in &summary.failed_ids {
                report::sub_item(&format!("failed: {id}"));
            }
        }

        Command::Run => {
            config.validate()?;
            let store = open_store(&config)?;
            let engine = Arc::new(build_engine_with(&config, Arc::clone(&store))?);

            let cache = Arc::new(TtlCache::<CachedRead>::new());
            let sweeper = cache.start_sweeper(config.cache.sweep_interval());
            let catalog = Arc::new(Catalog::new(store, cache, &config.cache));

            let hook: pipeline::RunHook = {
                let catalog = Arc::clone(&catalog);
                Box::new(move |summary: &SyncSummary| {
                    report::summary("Scheduled sync", &summary.rows());
                    if summary.persisted > 0 {
                        catalog.invalidate();
                    }
                })
            };

            let scheduler = pipeline::start_scheduler(
                engine,
                ScheduleOptions::from_config(&config.sync),
                Some(hook),
            );

            log::info!("Running; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down...");

            scheduler.stop().await;
            sweeper.stop().await;
        }

        Command::List { page, page_size } => {
            let catalog = build_catalog(&config)?;
            let listing = catalog.list_items(page, page_size).await?.value;

            log::info!(
                "Page {}/{} ({} items total)",
                listing.page,
                listing.page_count(),
                listing.total
            );
            for item in &listing.items {
                report::sub_item(&format!(
                    "{}  {}  [{} images]  by {}  ({})",
                    item.id,
                    item.title,
                    item.image_count,
                    item.user_nick,
                    item.created_at.to_rfc3339()
                ));
            }
        }

        Command::Show { id } => {
            let catalog = build_catalog(&config)?;
            let item = catalog.get_item(&id).await?.value;

            report::summary(
                &item.id,
                &[
                    ("Title", item.title.clone()),
                    ("Description", item.description.clone()),
                    ("Author", item.user_nick.clone()),
                    ("Signature", item.signature.clone()),
                    ("Images", item.image_count().to_string()),
                    ("Stored at", item.created_at.to_rfc3339()),
                ],
            );
            for url in &item.images {
                report::sub_item(url);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let store = open_store(&config)?;
            log::info!(
                "✓ Database OK: {} ({} items)",
                config.storage.database.display(),
                store.count().await?
            );

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<dyn ItemStore>> {
    let store = SqliteItemStore::open(&config.storage.database)?;
    Ok(Arc::new(store))
}

fn build_engine(config: &Config) -> Result<SyncEngine> {
    build_engine_with(config, open_store(config)?)
}

fn build_engine_with(config: &Config, store: Arc<dyn ItemStore>) -> Result<SyncEngine> {
    let gallery = GalleryClient::new(&config.remote)?;
    Ok(SyncEngine::new(
        Arc::new(gallery),
        store,
        ThrottlePolicy::from_config(&config.sync),
    ))
}

fn build_catalog(config: &Config) -> Result<Catalog> {
    let store = open_store(config)?;
    Ok(Catalog::new(
        store,
        Arc::new(TtlCache::<CachedRead>::new()),
        &config.cache,
    ))
}
