//! ServiceBus demo - queue and topic/subscription messaging examples.
//!
//! This library provides shared modules for the four demo binaries:
//! - `sbdemo-queue-producer`: Publishes synthetic IoT sensor readings to a queue
//! - `sbdemo-queue-trigger`: Handles each sensor reading delivered from the queue
//! - `sbdemo-topic-producer`: Publishes synthetic orders to a topic
//! - `sbdemo-topic-trigger`: Handles orders delivered through a filtered subscription
//!
//! ## Architecture
//!
//! ```text
//! Queue Producer → demo_queue → Queue Trigger
//! Topic Producer → demo-topic → High-Priority-Sub → Topic Trigger
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod model;
pub mod producer;
pub mod trigger;
pub mod util;

// Re-export commonly used types
pub use bus::{BusConnection, Destination, InboundMessage, OutgoingMessage, Publishable};
pub use config::Config;
pub use error::HandlerError;
pub use model::{OrderRecord, SensorReading};
pub use producer::{LoopSettings, MessageSink, ProducerSummary, RetryPolicy};
pub use trigger::{handle_order_message, handle_sensor_message, Notice, TriggerSettings};
