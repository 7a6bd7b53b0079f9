use aegis::{api::routes, db::StoreProvider, utils::config::Config, AppState, UserStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let provider = match &config.database.path {
        Some(path) => StoreProvider::SQLite { path: path.clone() },
        None => StoreProvider::Memory,
    };
    tracing::info!(?provider, "initializing user store");
    let store: Arc<dyn UserStore> = Arc::from(provider.create_store().await?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
