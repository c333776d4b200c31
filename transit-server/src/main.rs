use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transit_server::config::ServerConfig;
use transit_server::feed::FeedFile;
use transit_server::store::{FeedItem, SubscriberError, TransitStore};
use transit_server::web::{AppState, create_router};

/// Routes come last so the route list goes out once everything is loaded.
const PRELOAD_ORDER: [FeedFile; 4] = [
    FeedFile::Stops,
    FeedFile::Trips,
    FeedFile::StopTimes,
    FeedFile::Routes,
];

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

/// Import every supported file present in `dir`.
///
/// Failures are logged and the remaining files still load.
fn preload(store: &mut TransitStore, dir: &Path) {
    for kind in PRELOAD_ORDER {
        let path = dir.join(kind.file_name());
        if !path.is_file() {
            continue;
        }
        if let Err(e) = store.import_file(&path) {
            warn!(error = %e, "could not preload feed file");
        }
    }
}

/// Logs each notification the store sends.
fn log_changes(items: &[FeedItem]) -> Result<(), SubscriberError> {
    let heading = items.iter().find_map(|item| match item {
        FeedItem::Section(label) => Some(label.as_str()),
        _ => None,
    });
    info!(items = items.len(), heading = heading.unwrap_or("-"), "feed changed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let config = ServerConfig::from_env()?;

    let mut store = TransitStore::new();
    store.subscribe(log_changes);
    preload(&mut store, &config.data_dir);

    let addr = config.bind_addr;
    let app = create_router(AppState::new(store, config));

    info!("Transit feed server listening on http://{addr}");
    info!("API Endpoints:");
    info!("  GET   /health                - Health check");
    info!("  GET   /summary               - Tables and map centre");
    info!("  POST  /import                - Import a feed file");
    info!("  POST  /export                - Export all tables");
    info!("  GET   /stops/:id/search      - Routes and next trips at a stop");
    info!("  GET   /routes/:id/search     - Stops and remaining trips of a route");
    info!("  PATCH /routes/:id etc.       - Edit one field of a record");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
