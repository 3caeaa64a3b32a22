//! Trigger runtime and message handlers.
//!
//! The runtime consumes a queue, hands each delivery to a handler and settles
//! it: acknowledged when the handler succeeds, rejected without requeue when
//! it fails, leaving redelivery and dead-lettering to the bus.
//!
//! Handlers are stateless functions from a message to the notices they
//! logged, so concurrent deliveries never share anything.

pub mod queue;
pub mod topic;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::{
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions},
    message::Delivery,
    types::FieldTable,
    Channel,
};
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tracing::{error, info, warn, Level};

use crate::bus::InboundMessage;
use crate::error::HandlerError;

pub use queue::{handle_sensor_message, ReceivedReading};
pub use topic::{handle_order_message, ReceivedOrder};

/// One line a handler logged about a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::INFO,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: Level::WARN,
            text: text.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == Level::WARN
    }

    fn emit(&self, message_id: &str) {
        if self.is_warning() {
            warn!(message_id = message_id, "{}", self.text);
        } else {
            info!(message_id = message_id, "{}", self.text);
        }
    }
}

/// Log every notice against `message`.
pub(crate) fn emit_all(message: &InboundMessage, notices: &[Notice]) {
    for notice in notices {
        notice.emit(message.id());
    }
}

/// Decode a message body as UTF-8 JSON into `T`.
///
/// Every failure mode is logged here with the offending body before the
/// error is returned. Well-formed JSON whose fields have the wrong type is
/// reported separately from JSON that does not parse at all.
pub(crate) fn decode_body<T: DeserializeOwned>(message: &InboundMessage) -> Result<T, HandlerError> {
    let body = std::str::from_utf8(&message.body).map_err(|e| {
        error!(
            message_id = message.id(),
            body_length = message.body.len(),
            error = %e,
            "Message body is not valid UTF-8"
        );
        HandlerError::from(e)
    })?;

    serde_json::from_str(body).map_err(|source| {
        let body = body.to_string();
        if source.is_data() {
            error!(
                message_id = message.id(),
                error = %source,
                "Unexpected field type in message: {body}"
            );
            HandlerError::FieldType { body, source }
        } else {
            error!(
                message_id = message.id(),
                error = %source,
                "Failed to parse JSON message: {body}"
            );
            HandlerError::Decode { body, source }
        }
    })
}

/// Log the application properties attached by the sender, one line per key.
pub(crate) fn log_properties(message: &InboundMessage) {
    if message.application_properties.is_empty() {
        return;
    }

    info!(message_id = message.id(), "Message properties from sender:");
    for (key, value) in &message.application_properties {
        info!(message_id = message.id(), "   {key}: {value}");
    }
}

/// Log the application properties as a single line.
pub(crate) fn log_properties_inline(message: &InboundMessage) {
    if message.application_properties.is_empty() {
        return;
    }

    info!(
        message_id = message.id(),
        "Message properties: {:?}",
        message.application_properties
    );
}

/// What the runtime tells the bus about a handled delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Remove the message from the queue
    Ack,
    /// Reject without requeue; the bus dead-letters it if configured to
    Reject,
}

/// Map a handler outcome to the settlement sent to the bus.
pub fn settlement(outcome: &Result<Vec<Notice>, HandlerError>) -> Settle {
    match outcome {
        Ok(_) => Settle::Ack,
        Err(_) => Settle::Reject,
    }
}

/// Where and how a trigger consumes.
#[derive(Debug, Clone)]
pub struct TriggerSettings {
    /// Queue (or subscription queue) to consume from
    pub source: String,
    pub consumer_tag: String,
    /// Maximum unacknowledged deliveries in flight
    pub prefetch: u16,
}

/// Consume `settings.source` until `shutdown` resolves or the consumer closes.
///
/// Deliveries still being handled when the loop stops are awaited before
/// returning, so their settlements reach the bus before the caller closes the
/// connection.
pub async fn run<H, F>(
    channel: &Channel,
    settings: &TriggerSettings,
    handler: H,
    shutdown: F,
) -> Result<()>
where
    H: Fn(&InboundMessage) -> Result<Vec<Notice>, HandlerError> + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    let handler = Arc::new(handler);
    let source = settings.source.as_str();

    // Bound the deliveries handled concurrently
    channel
        .basic_qos(settings.prefetch, BasicQosOptions::default())
        .await
        .context("Failed to set QoS")?;

    info!(prefetch_count = settings.prefetch, "rabbitmq_qos_set");

    // Start consuming messages
    let mut consumer = channel
        .basic_consume(
            source,
            &settings.consumer_tag,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .context("Failed to start consumer")?;

    info!(queue = source, "rabbitmq_consumer_started");
    info!("trigger_ready");

    // Pin the shutdown future
    tokio::pin!(shutdown);

    // Deliveries being handled, awaited before returning
    let mut in_flight = JoinSet::new();

    // Process messages until shutdown
    loop {
        tokio::select! {
            // Check for shutdown signal
            _ = &mut shutdown => {
                info!("trigger_stopping");
                break;
            }

            // Reap finished deliveries
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "delivery_task_failed");
                }
            }

            // Process next message
            delivery = consumer.next() => {
                match delivery {
                    Some(Ok(delivery)) => {
                        // Clone resources for the spawned task
                        let handler = Arc::clone(&handler);
                        let channel = channel.clone();
                        let source = source.to_string();

                        // Spawn a task to process this message
                        in_flight.spawn(async move {
                            handle_delivery(&channel, &source, &delivery, handler.as_ref()).await;
                        });
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "rabbitmq_delivery_error");
                    }
                    None => {
                        warn!("rabbitmq_consumer_closed");
                        break;
                    }
                }
            }
        }
    }

    let drained = drain_in_flight(&mut in_flight).await;
    info!(drained = drained, "trigger_shutdown_complete");
    Ok(())
}

/// Run the handler on one delivery and settle it with the bus.
async fn handle_delivery<H>(channel: &Channel, source: &str, delivery: &Delivery, handler: &H)
where
    H: Fn(&InboundMessage) -> Result<Vec<Notice>, HandlerError>,
{
    let delivery_tag = delivery.delivery_tag;
    let message = InboundMessage::from_delivery(delivery);

    info!(
        queue = source,
        message_id = message.id(),
        delivery_tag = delivery_tag,
        redelivered = delivery.redelivered,
        "rabbitmq_message_received"
    );

    let outcome = handler(&message);
    if let Err(e) = &outcome {
        error!(
            message_id = message.id(),
            error_kind = e.kind(),
            "❌ Error processing Service Bus message: {e}"
        );
    }

    match settlement(&outcome) {
        // Acknowledge the message
        Settle::Ack => {
            if let Err(e) = channel
                .basic_ack(delivery_tag, BasicAckOptions::default())
                .await
            {
                error!(delivery_tag = delivery_tag, error = %e, "rabbitmq_ack_failed");
                return;
            }

            let warnings = outcome
                .as_ref()
                .map(|notices| notices.iter().filter(|n| n.is_warning()).count())
                .unwrap_or_default();
            info!(
                queue = source,
                message_id = message.id(),
                warnings = warnings,
                "rabbitmq_message_completed"
            );
        }

        // Reject without requeue so the bus can dead-letter it
        Settle::Reject => {
            if let Err(e) = channel
                .basic_nack(
                    delivery_tag,
                    BasicNackOptions {
                        requeue: false,
                        ..Default::default()
                    },
                )
                .await
            {
                error!(delivery_tag = delivery_tag, error = %e, "rabbitmq_nack_failed");
            }
        }
    }
}

/// Wait for every spawned delivery task. Returns how many were awaited.
async fn drain_in_flight(tasks: &mut JoinSet<()>) -> usize {
    if !tasks.is_empty() {
        info!(in_flight = tasks.len(), "waiting_for_in_flight_deliveries");
    }

    let mut drained = 0;
    while let Some(joined) = tasks.join_next().await {
        drained += 1;
        if let Err(e) = joined {
            error!(error = %e, "delivery_task_failed");
        }
    }
    drained
}
