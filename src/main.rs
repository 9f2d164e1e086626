use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use steer::lifecycle::{signals, Proxy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steer=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "steer.toml".to_string());
    tracing::info!(config = %config_path, "steer starting");

    let proxy = Proxy::new(&config_path)?;

    if proxy.observability().metrics_enabled {
        match proxy.observability().metrics_address.parse() {
            Ok(addr) => steer::observability::metrics::init_metrics(addr),
            Err(err) => {
                tracing::error!(
                    address = %proxy.observability().metrics_address,
                    error = %err,
                    "invalid metrics address, exporter disabled"
                );
            }
        }
    }

    let signal_handler = proxy.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        signal_handler.shut_down().await;
    });

    proxy.start().await?;

    tracing::info!("shutdown complete");
    Ok(())
}
