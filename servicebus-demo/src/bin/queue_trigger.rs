//! Queue Trigger - handles IoT sensor readings delivered from the queue.
//!
//! Each delivery is parsed and logged by the sensor handler; successful
//! messages are acknowledged, undecodable ones are rejected to the bus.

use anyhow::Result;
use tracing::info;

use sbdemo::bus::declare_queue;
use sbdemo::trigger;
use sbdemo::util::{init_logging, shutdown_signal};
use sbdemo::{handle_sensor_message, BusConnection, Config, TriggerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("queue_trigger_starting");

    let config = Config::from_env();
    info!(
        connection_url_set = !config.connection_url.is_empty(),
        queue = %config.queue_name,
        prefetch = config.trigger_prefetch,
        "config_loaded"
    );

    let connection = BusConnection::open(&config.connection_url).await?;

    let settings = TriggerSettings {
        source: config.queue_name.clone(),
        consumer_tag: "sbdemo-queue-trigger".to_string(),
        prefetch: config.trigger_prefetch,
    };

    let result = async {
        declare_queue(connection.channel(), &settings.source).await?;
        trigger::run(
            connection.channel(),
            &settings,
            handle_sensor_message,
            shutdown_signal(),
        )
        .await
    }
    .await;

    connection.close().await;
    result
}
