use paperframe::prelude::*;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

mod infrastructure;
mod modules;

use infrastructure::memory::MemoryDriver;
use modules::widget::repository::WidgetRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Starting Widget Server...");

    // SERVER_COLLECTIONS, SERVER_MODULES and DATABASE_DRIVER come from the
    // environment; the defaults below only fill in what is unset.
    let config = ConfigService::new();
    for (key, value) in [
        ("SERVER_COLLECTIONS", "widget"),
        ("SERVER_MODULES", "widget,audit"),
        ("DATABASE_DRIVER", "memory"),
    ] {
        if config.get(key).is_none() {
            config.set(key, value);
        }
    }

    let mut router = Router::builder()
        .config(config)
        .database_driver("memory", DriverFactory::of::<MemoryDriver>())
        .collection("widget", WidgetRepository::blueprint())
        .module(modules::widget::module())
        .module(modules::audit::module())
        .build()?;
    router.initialize().await?;

    let app = router.app()?.layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("✅ Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("🛑 Initiating graceful shutdown...");
        })
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
