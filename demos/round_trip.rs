/// Example: full request/response round trip over a scratch folder
///
/// Starts the bridge service, drives it through the bundled client, and
/// prints both responses.
///
/// Run with: cargo run --example round_trip
use std::time::Duration;

use filebridge::client;
use filebridge::service::{Service, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let folder = std::env::temp_dir().join("filebridge-demo");
    let config = ServiceConfig::default()
        .with_base_path(&folder)
        .with_poll_interval(Duration::from_millis(100));

    let service = Service::new(config);
    service.start()?;
    tracing::info!("service polling {}", folder.display());

    let pong = client::ping(&folder).await?;
    tracing::info!("ping -> {}", serde_json::to_string(&pong)?);

    let response = client::execute_script(&folder, r#"printf '{"sum": 2}'"#).await?;
    tracing::info!("script -> {}", serde_json::to_string_pretty(&response)?);

    service.stop().await;
    Ok(())
}
