//! Topic Trigger - handles orders delivered through a topic subscription.
//!
//! The subscription queue is bound to the topic with a filter on the
//! `priority` application property, so only matching orders arrive here.

use anyhow::Result;
use tracing::info;

use sbdemo::bus::{declare_subscription, SubscriptionFilter};
use sbdemo::trigger;
use sbdemo::util::{init_logging, shutdown_signal};
use sbdemo::{handle_order_message, BusConnection, Config, TriggerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("topic_trigger_starting");

    let config = Config::from_env();
    info!(
        connection_url_set = !config.connection_url.is_empty(),
        topic = %config.topic_name,
        subscription = %config.subscription_name,
        priorities = ?config.subscription_priorities,
        prefetch = config.trigger_prefetch,
        "config_loaded"
    );

    let connection = BusConnection::open(&config.connection_url).await?;

    let filter = SubscriptionFilter::new("priority", config.subscription_priorities.clone());
    let settings = TriggerSettings {
        source: config.subscription_name.clone(),
        consumer_tag: "sbdemo-topic-trigger".to_string(),
        prefetch: config.trigger_prefetch,
    };

    let result = async {
        declare_subscription(
            connection.channel(),
            &config.topic_name,
            &settings.source,
            &filter,
        )
        .await?;
        trigger::run(
            connection.channel(),
            &settings,
            handle_order_message,
            shutdown_signal(),
        )
        .await
    }
    .await;

    connection.close().await;
    result
}
