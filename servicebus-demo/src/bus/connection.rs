//! Scoped AMQP connection and the queue/topic topology built on it.
//!
//! A `BusConnection` is opened once at process start, handed out by reference
//! to whatever needs a channel, and closed explicitly on shutdown.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{
        BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable, LongString, ShortString},
    Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tracing::{info, warn};

use super::message::OutgoingMessage;
use crate::producer::MessageSink;

/// Where a sender publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Point-to-point queue, reached through the default exchange.
    Queue(String),
    /// Publish-subscribe topic, a headers exchange.
    Topic(String),
}

impl Destination {
    pub fn name(&self) -> &str {
        match self {
            Destination::Queue(name) | Destination::Topic(name) => name.as_str(),
        }
    }

    /// Exchange and routing key used by `basic_publish`.
    fn route(&self) -> (&str, &str) {
        match self {
            Destination::Queue(name) => ("", name.as_str()),
            Destination::Topic(name) => (name.as_str(), ""),
        }
    }
}

/// Subscription filter on one application property.
///
/// A message matches when the property equals any of `values`; an empty list
/// matches every message published to the topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub property: String,
    pub values: Vec<String>,
}

impl SubscriptionFilter {
    pub fn new(property: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            property: property.into(),
            values,
        }
    }

    /// Binding arguments for the headers exchange, one table per binding.
    pub fn bindings(&self) -> Vec<FieldTable> {
        if self.values.is_empty() {
            return vec![match_table(None)];
        }

        self.values
            .iter()
            .map(|value| match_table(Some((self.property.as_str(), value.as_str()))))
            .collect()
    }
}

fn match_table(header: Option<(&str, &str)>) -> FieldTable {
    let mut table = FieldTable::default();
    table.insert(
        ShortString::from("x-match"),
        AMQPValue::LongString(LongString::from("all")),
    );
    if let Some((key, value)) = header {
        table.insert(
            ShortString::from(key.to_string()),
            AMQPValue::LongString(LongString::from(value.to_string())),
        );
    }
    table
}

/// One connection and one channel to the bus.
pub struct BusConnection {
    connection: Connection,
    channel: Channel,
}

impl BusConnection {
    /// Connect to the bus and open a channel.
    pub async fn open(url: &str) -> Result<Self> {
        info!(url_length = url.len(), "rabbitmq_connecting");

        // Connect to RabbitMQ
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_connected");

        // Create a channel
        let channel = connection
            .create_channel()
            .await
            .context("Failed to create channel")?;

        info!("rabbitmq_channel_created");

        Ok(Self { connection, channel })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Declare `destination` and return a sender bound to it.
    pub async fn sender(&self, destination: Destination) -> Result<BusSender> {
        // Declare the destination
        match &destination {
            Destination::Queue(name) => declare_queue(&self.channel, name).await?,
            Destination::Topic(name) => declare_topic(&self.channel, name).await?,
        }

        Ok(BusSender {
            channel: self.channel.clone(),
            destination,
        })
    }

    /// Close the channel and then the connection.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(200, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_channel_close_error");
        }

        if let Err(e) = self.connection.close(200, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }

        info!("🔌 Bus connection closed");
    }
}

/// Declare a durable queue (idempotent).
pub async fn declare_queue(channel: &Channel, name: &str) -> Result<()> {
    channel
        .queue_declare(
            name,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .with_context(|| format!("Failed to declare queue {name}"))?;

    info!(queue = name, "rabbitmq_queue_declared");
    Ok(())
}

/// Declare a durable headers exchange acting as a topic (idempotent).
pub async fn declare_topic(channel: &Channel, name: &str) -> Result<()> {
    channel
        .exchange_declare(
            name,
            ExchangeKind::Headers,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .with_context(|| format!("Failed to declare topic {name}"))?;

    info!(topic = name, "rabbitmq_topic_declared");
    Ok(())
}

/// Declare a subscription queue on `topic` and bind it through `filter`.
pub async fn declare_subscription(
    channel: &Channel,
    topic: &str,
    subscription: &str,
    filter: &SubscriptionFilter,
) -> Result<()> {
    declare_topic(channel, topic).await?;
    declare_queue(channel, subscription).await?;

    // One binding per accepted value; any match routes the message
    for arguments in filter.bindings() {
        channel
            .queue_bind(subscription, topic, "", QueueBindOptions::default(), arguments)
            .await
            .with_context(|| format!("Failed to bind {subscription} to {topic}"))?;
    }

    info!(
        topic = topic,
        subscription = subscription,
        filter_property = %filter.property,
        filter_values = ?filter.values,
        "rabbitmq_subscription_declared"
    );
    Ok(())
}

/// Publishes encoded messages to one destination.
#[derive(Clone)]
pub struct BusSender {
    channel: Channel,
    destination: Destination,
}

impl BusSender {
    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

#[async_trait]
impl MessageSink for BusSender {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let (exchange, routing_key) = self.destination.route();

        // Publish and wait for the broker confirmation
        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &message.body,
                message.amqp_properties(),
            )
            .await
            .with_context(|| format!("Failed to publish to {}", self.destination.name()))?
            .await
            .context("Failed to confirm publish")?;

        info!(
            destination = self.destination.name(),
            message_id = %message.message_id,
            body_length = message.body.len(),
            "rabbitmq_message_published"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_route() {
        let queue = Destination::Queue("demo_queue".to_string());
        let topic = Destination::Topic("demo-topic".to_string());

        assert_eq!(queue.route(), ("", "demo_queue"));
        assert_eq!(topic.route(), ("demo-topic", ""));
        assert_eq!(topic.name(), "demo-topic");
    }

    #[test]
    fn test_filter_binds_each_value() {
        let filter = SubscriptionFilter::new("priority", vec!["high".to_string(), "urgent".to_string()]);
        let bindings = filter.bindings();

        assert_eq!(bindings.len(), 2);
        let first = crate::bus::headers_to_properties(&bindings[0]);
        assert_eq!(first["x-match"], "all");
        assert_eq!(first["priority"], "high");
        let second = crate::bus::headers_to_properties(&bindings[1]);
        assert_eq!(second["priority"], "urgent");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = SubscriptionFilter::new("priority", Vec::new());
        let bindings = filter.bindings();

        assert_eq!(bindings.len(), 1);
        let only = crate::bus::headers_to_properties(&bindings[0]);
        assert_eq!(only.len(), 1);
        assert_eq!(only["x-match"], "all");
    }
}
