//! Topic Producer - publishes synthetic order records.
//!
//! Publishes one order to the topic every few seconds until interrupted, then
//! reports how many messages went out and closes the bus connection.

use anyhow::Result;
use tracing::{error, info};

use sbdemo::model::iso_timestamp;
use sbdemo::producer;
use sbdemo::util::{init_logging, shutdown_signal};
use sbdemo::{BusConnection, Config, Destination, OrderRecord};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env();

    info!(topic = %config.topic_name, "🚀 Starting mock data sender to topic: {}", config.topic_name);

    let settings = config.loop_settings();
    info!(
        connection_url_set = !config.connection_url.is_empty(),
        send_interval_ms = config.send_interval_ms,
        retry = ?settings.retry,
        "config_loaded"
    );

    let connection = match BusConnection::open(&config.connection_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!(error = %e, "❌ Failed to connect to Service Bus: {e:#}");
            return Err(e);
        }
    };
    info!("✅ Connected to Service Bus");

    let result = async {
        let sender = connection.sender(Destination::Topic(config.topic_name.clone())).await?;
        producer::run(
            &sender,
            || OrderRecord::generate(&mut rand::thread_rng(), iso_timestamp()),
            &settings,
            shutdown_signal(),
        )
        .await
    }
    .await;

    connection.close().await;

    let summary = result?;
    info!(sent = summary.sent, failed = summary.failed, "topic_producer_exited");
    Ok(())
}
