mod api;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strembox_core::{
    load_config, validate_config, CacheStore, HttpTorrentManager, JackettClient, JackettScraper,
    SearchFn, StreamPipeline, TmdbConfig, TmdbProvider, TorBoxClient, TorBoxConfig,
    TrendingFeeder, TrendingFeederConfig, WorkerPool, WorkerPoolConfig,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file; everything can come from the environment.
    let config_path = std::env::var("STREMBOX_CONFIG").map(PathBuf::from).ok();
    let config = load_config(config_path.as_deref()).context("failed to load configuration")?;
    validate_config(&config).context("configuration validation failed")?;
    info!("configuration loaded");

    // One stop signal fans out to every long-lived task.
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let cache = Arc::new(CacheStore::open(&config.cache.snapshot_path).await);
    cache.start_maintenance(&shutdown_tx);
    let stats = cache.stats().await;
    info!(
        entries = stats.total_entries,
        permanent = stats.permanent_entries,
        "cache ready"
    );

    let indexer = Arc::new(JackettClient::new(
        config.jackett.url.clone(),
        config.jackett.api_key.clone(),
    ));
    let scraper = Arc::new(JackettScraper::new(
        indexer,
        Arc::clone(&cache),
        config.cache.search_ttl(),
    ));
    let torrent_manager: Arc<dyn strembox_core::TorrentManager> =
        Arc::new(HttpTorrentManager::new());

    let debrid: Arc<dyn strembox_core::DebridClient> = Arc::new(
        TorBoxClient::new(TorBoxConfig {
            api_key: config.torbox.api_key.clone(),
            check_ttl: config.cache.debrid_check_ttl(),
            ..Default::default()
        })
        .context("failed to create TorBox client")?
        .with_cache(Arc::clone(&cache)),
    );

    let metadata: Arc<dyn strembox_core::MetadataProvider> = Arc::new(
        TmdbProvider::new(TmdbConfig {
            api_key: config.tmdb.api_key.clone(),
            cache_ttl: config.cache.metadata_ttl(),
            ..Default::default()
        })
        .context("failed to create TMDB provider")?
        .with_cache(Arc::clone(&cache)),
    );

    // The worker pool gets the search entry point as a closure; the
    // pipeline gets the pool handle afterwards.
    let search: SearchFn = {
        let scraper = Arc::clone(&scraper);
        let manager = Arc::clone(&torrent_manager);
        Arc::new(move |request| {
            let scraper = Arc::clone(&scraper);
            let manager = Arc::clone(&manager);
            async move { scraper.scrape(&request, manager.as_ref()).await }.boxed()
        })
    };

    let worker = WorkerPool::new(search, WorkerPoolConfig::default());
    worker.start_maintenance(&shutdown_tx);

    TrendingFeeder::new(
        Arc::clone(&worker),
        Arc::clone(&metadata),
        TrendingFeederConfig::default(),
    )
    .start(&shutdown_tx);

    let pipeline = Arc::new(
        StreamPipeline::new(
            scraper,
            torrent_manager,
            debrid,
            Arc::clone(&metadata),
        )
        .with_worker(Arc::clone(&worker)),
    );

    let app_state = Arc::new(AppState::new(pipeline, Arc::clone(&cache), Arc::clone(&worker)));
    let app = create_router(app_state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(%addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Shutdown order: stop the timers and loops, stop the workers, then
    // flush the cache so the snapshot reflects the final state.
    info!("starting graceful shutdown");
    let _ = shutdown_tx.send(());
    worker.shutdown().await;
    if let Err(e) = cache.flush().await {
        error!(error = %e, "failed to flush cache on shutdown");
    } else {
        info!("cache flushed");
    }
    info!("graceful shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
