use anyhow::Context;

use stockroom_api::app::{self, AppServices};
use stockroom_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    stockroom_observability::init_with_format(config.log.format);

    let store = app::services::connect_store(&config.database)
        .await
        .context("failed to open the ledger store")?;
    let services = AppServices::new(store, config.forecast.clone());
    let router = app::build_app(services, config.jwt_secret());

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
