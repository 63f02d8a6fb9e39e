use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use gaggle_api::{AppStateInner, router};
use gaggle_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaggle=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("GAGGLE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let host = std::env::var("GAGGLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("GAGGLE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let static_dir = PathBuf::from(
        std::env::var("GAGGLE_STATIC_DIR").unwrap_or_else(|_| "static".into()),
    );
    let base_url = std::env::var("GAGGLE_BASE_URL")
        .unwrap_or_else(|_| format!("http://localhost:{port}"));

    // Profile photos land here; ServeDir exposes it at /static
    std::fs::create_dir_all(&static_dir)?;

    // All state is in memory; a restart starts the platform empty.
    let state = Arc::new(AppStateInner {
        store: Store::new(),
        jwt_secret,
        base_url,
        static_dir,
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gaggle server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
