mod cli;

use overseer::{
    availability::{EmbyProbe, PlexProbe, ProbeSet},
    config::{self, Config, ConfigStore},
    engine::{cancellable, AnnotatedMediaItem, EngineOptions, ReconciliationEngine},
    metadata::{providers::TmdbProvider, Category},
    requests::SqliteRequestStore,
};
use overseer_common::MediaId;
use overseer_db::pool::init_pool;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "overseer=trace,overseer_db=debug,overseer_common=debug".to_string()
        } else {
            "overseer=info,overseer_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let query = match cli.command {
        Commands::Search { query } => Query::Search(query.join(" ")),
        Commands::Popular => Query::Category(Category::Popular),
        Commands::TopRated => Query::Category(Category::TopRated),
        Commands::Upcoming => Query::Category(Category::Upcoming),
        Commands::NowPlaying => Query::Category(Category::NowPlaying),
        Commands::Details { ids } => Query::Details(ids.into_iter().map(MediaId::new).collect()),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            return validate_config(path.as_deref());
        }
        Commands::Version => {
            println!("overseer {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(query, cli.config.as_deref(), cli.json))
}

/// What the user asked for, before an engine exists.
enum Query {
    Search(String),
    Category(Category),
    Details(Vec<MediaId>),
}

fn build_engine(config: &Config) -> Result<ReconciliationEngine> {
    let provider = TmdbProvider::from_config(&config.tmdb);

    let db_path = config.database.path.to_string_lossy();
    tracing::debug!("Opening request database at {}", db_path);
    let pool = init_pool(&db_path)?;
    let requests = SqliteRequestStore::new(pool);

    let settings = Arc::new(ConfigStore::new(config));
    let probes = ProbeSet::new()
        .with(Arc::new(PlexProbe::new(settings.clone())))
        .with(Arc::new(EmbyProbe::new(settings)));

    Ok(
        ReconciliationEngine::new(Arc::new(provider), Arc::new(requests), probes)
            .with_options(EngineOptions::from(&config.reconcile)),
    )
}

async fn run(query: Query, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let engine = build_engine(&config)?;

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let items = match query {
        Query::Search(text) => cancellable(&token, engine.search(&text)).await?,
        Query::Category(category) => {
            cancellable(&token, engine.discover(&category.into())).await?
        }
        Query::Details(ids) => cancellable(&token, engine.lookup_details(&ids)).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print_items(&items);
    }

    Ok(())
}

fn print_items(items: &[AnnotatedMediaItem]) {
    if items.is_empty() {
        println!("No results.");
        return;
    }

    for entry in items {
        let item = &entry.item;
        let mut flags = String::new();
        if entry.requested {
            flags.push_str(if entry.approved { " [approved]" } else { " [requested]" });
        }
        if entry.available {
            flags.push_str(" [available]");
        }

        match item.release_year {
            Some(year) => println!("{:>8}  {} ({}){}", item.id.get(), item.title, year, flags),
            None => println!("{:>8}  {}{}", item.id.get(), item.title, flags),
        }
        if let Some(ref link) = entry.availability_link {
            println!("          {}", link);
        }
    }

    println!();
    println!(
        "{} results, {} requested, {} available",
        items.len(),
        items.iter().filter(|i| i.requested).count(),
        items.iter().filter(|i| i.available).count()
    );
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!(
        "  TMDB: {} ({})",
        if config.tmdb.api_key.is_empty() { "no API key" } else { "configured" },
        config.tmdb.language
    );
    println!("  Plex enabled: {}", config.plex.enabled);
    println!("  Emby enabled: {}", config.emby.enabled);
    println!("  Database: {}", config.database.path.display());
    println!(
        "  Probes: {} concurrent, {}s timeout",
        config.reconcile.max_concurrent_probes, config.reconcile.probe_timeout_secs
    );
    println!("  Detail lookups: {} concurrent", config.reconcile.max_concurrent_details);
    println!("  Duplicates: {:?}", config.reconcile.duplicate_policy);

    Ok(())
}
