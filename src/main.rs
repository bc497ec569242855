use anyhow::Result;
use house_search::{HouseSearchConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = HouseSearchConfig::load()?;
    telemetry::init(&config.logging)?;

    tracing::debug!("Loaded configuration: {:?}", config);
    web::run(config).await
}
