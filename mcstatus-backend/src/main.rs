use mcstatus_backend::blocklist::BlockedServers;
use mcstatus_backend::config::Config;
use mcstatus_backend::create_app;
use mcstatus_backend::ping::McPingClient;
use mcstatus_backend::resolver::Resolver;
use mcstatus_cache::MemoryCache;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging, RUST_LOG overrides the level
    #[cfg(debug_assertions)]
    let log_level = "debug";
    #[cfg(not(debug_assertions))]
    let log_level = "info";

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting status server...");
    // Load configuration from environment variables or use defaults
    let config = Config::from_env();
    tracing::info!(
        "Configuration: port={}, timeout={}s, query_timeout={}ms, cache_max_entries={}",
        config.port,
        config.request_timeout.as_secs(),
        config.query_timeout.as_millis(),
        config.cache_max_entries
    );
    tracing::info!(
        "Cache TTLs: java={}s, bedrock={}s, icon={}s",
        config.java_cache_ttl.as_secs(),
        config.bedrock_cache_ttl.as_secs(),
        config.icon_cache_ttl.as_secs()
    );

    let cache = Arc::new(MemoryCache::with_capacity(config.cache_max_entries));
    let blocked = Arc::new(BlockedServers::new());

    {
        let cache = Arc::clone(&cache);
        let period = config.cache_purge_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                cache.purge_expired().await;
            }
        });
    }

    match config.blocklist_url.clone() {
        Some(url) => {
            let blocked = Arc::clone(&blocked);
            let period = config.blocklist_refresh;
            tokio::spawn(async move {
                let client = reqwest::Client::new();
                let mut interval = tokio::time::interval(period);
                loop {
                    interval.tick().await;
                    if let Err(error) = blocked.refresh(&client, &url).await {
                        tracing::warn!(%error, "Failed to refresh blocked server list, keeping previous list");
                    }
                }
            });
        }
        None => tracing::info!("Blocked server list disabled"),
    }

    let resolver = Resolver::new(
        Arc::clone(&cache),
        McPingClient::new(config.query_timeout),
        Arc::clone(&blocked),
        config.cache_ttl(),
    );
    let app = create_app(resolver, config.request_timeout, config.rate_limit());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
            if let Err(e) = result {
                tracing::error!("Axum server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
