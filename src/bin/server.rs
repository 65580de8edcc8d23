use name_match::config;
use name_match::server::router;
use name_match::MatchEngine;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "name_match=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = config::config_path();
    let app_config = config::load_or_create(&config_path)?;
    tracing::info!("Server will listen on {}", app_config.bind_address());

    let data_dir = app_config.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    // Loading re-derives every record; keep it off the async workers.
    let engine = {
        let app_config = app_config.clone();
        tokio::task::spawn_blocking(move || MatchEngine::from_app_config(&app_config)).await??
    };
    tracing::info!("{} records indexed", engine.len());

    let app = router(Arc::new(engine));
    let bind_addr = app_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
