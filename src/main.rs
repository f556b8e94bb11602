use dotenvy::dotenv;
use std::sync::Arc;
use storefront_sync::{
    api::HttpTransport,
    app::Storefront,
    config::{api::ApiConfig, database, settings},
    core::{clock::SystemClock, notice::TracingNotifier},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Settings and backend location
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    let api_config = ApiConfig::from_env()?;
    info!(base_url = %api_config.base_url, "Using storefront API");

    // 4. Local storage
    let storage_url = database::get_storage_url();
    database::ensure_storage_dir(&storage_url)?;
    let db = database::create_connection(&storage_url)
        .await
        .inspect_err(|e| error!("Failed to open local storage: {}", e))?;
    database::create_tables(&db).await?;
    info!("Local storage initialized successfully.");

    // 5. Build and start the storefront
    let transport = Arc::new(HttpTransport::new(&api_config)?);
    let storefront = Storefront::new(
        transport,
        db,
        Arc::new(SystemClock),
        Arc::new(TracingNotifier),
        settings.session,
    );
    let state = storefront.start().await?;
    let identity = storefront.session().identity().await;
    let cart = storefront.shop().cart_count().await;
    let wishlist = storefront.shop().wishlist_count().await;
    info!(
        ?state,
        user = identity.as_ref().and_then(|i| i.name.as_deref()).unwrap_or("-"),
        cart,
        wishlist,
        "Storefront ready"
    );

    // 6. Keep the session timer running until interrupted
    tokio::signal::ctrl_c().await?;
    storefront.shutdown().await;
    info!("Storefront stopped.");

    Ok(())
}
