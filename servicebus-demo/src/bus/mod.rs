//! Bus module for AMQP operations.
//!
//! This module provides:
//! - Message envelopes for producers (`OutgoingMessage`) and triggers (`InboundMessage`)
//! - A scoped connection with queue, topic and subscription declarations
//! - A sender that publishes to a queue or a topic
//!
//! ## Topology
//!
//! ```text
//! Queue Producer → demo_queue → Queue Trigger
//! Topic Producer → demo-topic (headers) → High-Priority-Sub → Topic Trigger
//! ```

pub mod connection;
pub mod message;

pub use connection::{
    declare_queue, declare_subscription, declare_topic, BusConnection, BusSender, Destination,
    SubscriptionFilter,
};
pub use message::{
    headers_to_properties, properties_to_headers, InboundMessage, OutgoingMessage, Publishable,
};
