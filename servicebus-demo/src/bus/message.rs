//! Message envelopes exchanged with the bus.
//!
//! A message is a JSON body plus a small amount of metadata: a human readable
//! subject, a message id and string-valued application properties. On AMQP the
//! subject travels as the `type` property and application properties travel
//! as message headers, which is what headers exchanges filter on.

use std::collections::BTreeMap;

use lapin::{
    message::Delivery,
    types::{AMQPValue, FieldTable, LongString, ShortString},
    BasicProperties,
};
use serde::Serialize;

/// A payload that can be published on the bus.
pub trait Publishable: Serialize {
    /// Human readable subject attached to every message of this kind.
    fn subject(&self) -> &'static str;

    fn message_id(&self) -> String;

    /// Key-value metadata used by the bus for routing and filtering.
    fn application_properties(&self) -> BTreeMap<String, String>;

    /// Short description for the "sent" log line.
    fn summary(&self) -> String;
}

/// An encoded message ready to be handed to a sender.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub message_id: String,
    pub subject: String,
    pub body: Vec<u8>,
    pub application_properties: BTreeMap<String, String>,
}

impl OutgoingMessage {
    /// Serialize `payload` as indented JSON and collect its metadata.
    pub fn encode<P: Publishable>(payload: &P) -> Result<Self, serde_json::Error> {
        Ok(Self {
            message_id: payload.message_id(),
            subject: payload.subject().to_string(),
            body: serde_json::to_vec_pretty(payload)?,
            application_properties: payload.application_properties(),
        })
    }

    /// AMQP basic properties carrying this message's metadata.
    pub fn amqp_properties(&self) -> BasicProperties {
        BasicProperties::default()
            .with_delivery_mode(2) // Persistent
            .with_content_type("application/json".into())
            .with_message_id(self.message_id.clone().into())
            .with_kind(self.subject.clone().into())
            .with_headers(properties_to_headers(&self.application_properties))
    }
}

/// A message as seen by a trigger handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundMessage {
    pub message_id: Option<String>,
    pub subject: Option<String>,
    pub body: Vec<u8>,
    pub application_properties: BTreeMap<String, String>,
}

impl InboundMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.application_properties.insert(key.into(), value.into());
        self
    }

    /// Build from an AMQP delivery.
    pub fn from_delivery(delivery: &Delivery) -> Self {
        let properties = &delivery.properties;
        Self {
            message_id: properties.message_id().as_ref().map(|s| s.to_string()),
            subject: properties.kind().as_ref().map(|s| s.to_string()),
            body: delivery.data.clone(),
            application_properties: properties
                .headers()
                .as_ref()
                .map(headers_to_properties)
                .unwrap_or_default(),
        }
    }

    /// Message id for logging, `"unknown"` when the sender set none.
    pub fn id(&self) -> &str {
        self.message_id.as_deref().unwrap_or("unknown")
    }
}

/// Encode application properties as AMQP headers with long-string values.
pub fn properties_to_headers(properties: &BTreeMap<String, String>) -> FieldTable {
    let mut headers = FieldTable::default();
    for (key, value) in properties {
        headers.insert(
            ShortString::from(key.clone()),
            AMQPValue::LongString(LongString::from(value.clone())),
        );
    }
    headers
}

/// Decode AMQP headers into string application properties.
pub fn headers_to_properties(headers: &FieldTable) -> BTreeMap<String, String> {
    headers
        .inner()
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), header_text(value)))
        .collect()
}

fn header_text(value: &AMQPValue) -> String {
    match value {
        AMQPValue::LongString(s) => String::from_utf8_lossy(s.as_bytes()).into_owned(),
        AMQPValue::ShortString(s) => s.as_str().to_string(),
        AMQPValue::Boolean(b) => b.to_string(),
        AMQPValue::LongLongInt(n) => n.to_string(),
        AMQPValue::LongInt(n) => n.to_string(),
        AMQPValue::Double(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}
