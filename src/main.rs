use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qrverse::auth::NoAuth;
use qrverse::config::Config;
use qrverse::landing::create_landing_router;
use qrverse::store::{HttpQrStore, QrStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("qrverse=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Resolution is public; the landing server never signs in.
    let store: Arc<dyn QrStore> = Arc::new(HttpQrStore::new(&config.store, Arc::new(NoAuth))?);
    info!("Resolving short ids against {}", config.store.base_url);

    let router = create_landing_router(store);

    let addr = format!(
        "{}:{}",
        config.landing_server.host, config.landing_server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind landing server to {addr}"))?;
    info!("🚀 Landing server listening on http://{}", addr);
    info!("   - Landing pages available at http://{}/landing/{{shortId}}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
