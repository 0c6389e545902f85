// src/main.rs
use env_logger::Builder;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use stocks_portfolio::config::{AppConfig, StoreBackend};
use stocks_portfolio::db::{self, ScyllaTradeStore};
use stocks_portfolio::memory::InMemoryTradeStore;
use stocks_portfolio::{api, Dispatcher, TradeStore};

async fn build_store(
    config: &AppConfig,
) -> Result<Arc<dyn TradeStore>, Box<dyn std::error::Error>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory trade store.");
            let store: Arc<dyn TradeStore> = Arc::new(InMemoryTradeStore::new());
            Ok(store)
        }
        StoreBackend::Scylla => {
            let session = Arc::new(db::connect(&config.scylla_node).await?);
            let store = ScyllaTradeStore::new(session, &config.keyspace)?;
            store.init().await?;
            let store: Arc<dyn TradeStore> = Arc::new(store);
            Ok(store)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    Builder::new()
        .filter_level(config.log_level)
        .format_timestamp_secs()
        .parse_default_env()
        .init();

    info!("Starting the stocks portfolio service...");
    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize trade store: {}", e);
            return Err(e);
        }
    };

    let dispatcher = Dispatcher::with_page_size(store, config.page_size);
    let api = api::routes(dispatcher);

    let addr: SocketAddr = config.socket_addr().parse()?;
    info!("Server running on http://{}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
