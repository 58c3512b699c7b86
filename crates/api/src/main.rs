use anyhow::Context;
use tracing::info;

use shopbooks_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopbooks_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let office = config
        .back_office()
        .await
        .context("failed to open the store")?;
    info!(
        backend = office.backend_name(),
        oversell = office.oversell_policy().as_str(),
        "store opened"
    );

    let app = shopbooks_api::app::build_app(office, config.backup_dir.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
