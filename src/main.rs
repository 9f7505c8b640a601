use mimalloc::MiMalloc;
use opsdesk::config::CONFIG;
use opsdesk::db::Store;
use opsdesk::functions::HttpFunctions;
use opsdesk::pages::Pages;
use opsdesk::realtime::ChangeFeed;
use opsdesk::server::{AppState, opsdesk_router};
use opsdesk::storage::LocalObjectStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &*CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        storage_root = %cfg.storage.root.display(),
        feed_capacity = cfg.realtime.feed_capacity,
        "Config loaded"
    );
    if cfg.functions.api_key.is_none() {
        warn!("functions.api_key is not set; remote functions are called without a bearer key");
    }

    let feed = ChangeFeed::new(cfg.realtime.feed_capacity);
    let db = opsdesk::db::spawn(&cfg.basic.database_url, feed.clone()).await?;
    let store = Store::new(Arc::new(db.clone()));
    let functions = Arc::new(HttpFunctions::new(&cfg.functions)?);
    let storage = Arc::new(LocalObjectStore::new(&cfg.storage));
    let pages = Pages::new(store, functions, storage, Arc::new(cfg.functions.clone()));

    let state = AppState::new(pages, feed, cfg.realtime.clone());
    let app = opsdesk_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.stop();
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
