//! Subscription trigger handler for order records.

use serde::Deserialize;
use tracing::info;

use super::{decode_body, emit_all, log_properties, Notice};
use crate::bus::InboundMessage;
use crate::error::HandlerError;

const PRIORITY_LINES: &[(&str, &str)] = &[
    ("urgent", "⚡ Urgent order - processing immediately"),
    ("high", "🔥 High priority order - fast processing"),
    ("medium", "📋 Medium priority order - standard processing"),
];

const DEFAULT_PRIORITY_LINE: &str = "🐌 Low priority order - normal processing";

const REGION_BUCKETS: &[(&[&str], &str)] = &[(&["north", "south"], "🌍"), (&["east", "west"], "🌎")];

const DEFAULT_REGION_MARK: &str = "🌏";

/// Order record as read by the subscription trigger.
///
/// Text fields default to `"unknown"`. `quantity` and `orderAmount` stay
/// empty when absent and print as `unknown`. `customerEmail` is not sent by
/// the producer but is shown when present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceivedOrder {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub region: String,
    pub priority: String,
    pub product: String,
    pub quantity: Option<u32>,
    pub order_amount: Option<f64>,
    pub payment_method: String,
    pub status: String,
    pub order_date: String,
}

impl Default for ReceivedOrder {
    fn default() -> Self {
        let unknown = || "unknown".to_string();
        Self {
            order_id: unknown(),
            customer_name: unknown(),
            customer_email: unknown(),
            region: unknown(),
            priority: unknown(),
            product: unknown(),
            quantity: None,
            order_amount: None,
            payment_method: unknown(),
            status: unknown(),
            order_date: unknown(),
        }
    }
}

impl ReceivedOrder {
    fn summary(&self) -> Vec<Notice> {
        let quantity = self
            .quantity
            .map(|q| q.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let amount = self
            .order_amount
            .map(|a| format!("{a:.2}"))
            .unwrap_or_else(|| "unknown".to_string());

        vec![
            Notice::info(format!("🛒 Processing Order: {}", self.order_id)),
            Notice::info(format!("   Customer: {} ({})", self.customer_name, self.customer_email)),
            Notice::info(format!("   Product: {} x {}", self.product, quantity)),
            Notice::info(format!("   Amount: ${amount}")),
            Notice::info(format!("   Region: {}", self.region)),
            Notice::info(format!("   Priority: {}", self.priority)),
            Notice::info(format!("   Payment: {}", self.payment_method)),
            Notice::info(format!("   Status: {}", self.status)),
            Notice::info(format!("   Date: {}", self.order_date)),
        ]
    }

    fn priority_notice(&self) -> Notice {
        let line = PRIORITY_LINES
            .iter()
            .find(|(priority, _)| *priority == self.priority)
            .map(|(_, line)| *line)
            .unwrap_or(DEFAULT_PRIORITY_LINE);
        Notice::info(line)
    }

    fn region_notice(&self) -> Notice {
        let mark = REGION_BUCKETS
            .iter()
            .find(|(regions, _)| regions.contains(&self.region.as_str()))
            .map(|(_, mark)| *mark)
            .unwrap_or(DEFAULT_REGION_MARK);
        Notice::info(format!("{mark} Processing {} region order", self.region))
    }
}

/// Handle one order delivered through the subscription.
pub fn handle_order_message(message: &InboundMessage) -> Result<Vec<Notice>, HandlerError> {
    info!(
        message_id = message.id(),
        "Processing Service Bus message: {}",
        message.id()
    );
    info!(
        message_id = message.id(),
        "Message Subject: {}",
        message.subject.as_deref().unwrap_or("none")
    );

    let order: ReceivedOrder = decode_body(message)?;
    info!(message_id = message.id(), "Parsed order data: {order:?}");

    let mut notices = order.summary();
    notices.push(order.priority_notice());
    notices.push(order.region_notice());

    emit_all(message, &notices);
    log_properties(message);

    info!(
        message_id = message.id(),
        order_id = %order.order_id,
        "✅ Successfully processed order message: {}",
        message.id()
    );

    Ok(notices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json(priority: &str, region: &str) -> String {
        format!(
            r#"{{
                "orderID": "ORD-12345",
                "customerName": "Bob Johnson",
                "region": "{region}",
                "priority": "{priority}",
                "product": "Tablet",
                "quantity": 2,
                "orderAmount": 349.9,
                "orderDate": "2025-01-31T12:00:00.000000",
                "paymentMethod": "Paypal",
                "status": "pending"
            }}"#
        )
    }

    fn handle(body: String) -> Vec<Notice> {
        let message = InboundMessage::new(body)
            .with_message_id("ORD-12345")
            .with_subject("Order Message")
            .with_property("priority", "urgent");
        handle_order_message(&message).unwrap()
    }

    fn has_line(notices: &[Notice], text: &str) -> bool {
        notices.iter().any(|n| n.text == text)
    }

    #[test]
    fn test_urgent_processed_immediately() {
        let notices = handle(order_json("urgent", "north"));
        assert!(has_line(&notices, "⚡ Urgent order - processing immediately"));
        assert!(!has_line(&notices, DEFAULT_PRIORITY_LINE));
    }

    #[test]
    fn test_priority_tiers() {
        let notices = handle(order_json("high", "north"));
        assert!(has_line(&notices, "🔥 High priority order - fast processing"));

        let notices = handle(order_json("medium", "north"));
        assert!(has_line(&notices, "📋 Medium priority order - standard processing"));
    }

    #[test]
    fn test_low_and_unrecognized_priorities_use_normal_processing() {
        for priority in ["low", "whenever"] {
            let notices = handle(order_json(priority, "east"));
            assert!(has_line(&notices, "🐌 Low priority order - normal processing"));
        }
    }

    #[test]
    fn test_region_buckets() {
        let cases = [
            ("north", "🌍 Processing north region order"),
            ("south", "🌍 Processing south region order"),
            ("east", "🌎 Processing east region order"),
            ("west", "🌎 Processing west region order"),
            ("central", "🌏 Processing central region order"),
        ];

        for (region, expected) in cases {
            let notices = handle(order_json("low", region));
            assert!(has_line(&notices, expected), "missing {expected:?}");
        }
    }

    #[test]
    fn test_order_summary_lines() {
        let notices = handle(order_json("urgent", "west"));
        assert!(has_line(&notices, "🛒 Processing Order: ORD-12345"));
        assert!(has_line(&notices, "   Customer: Bob Johnson (unknown)"));
        assert!(has_line(&notices, "   Product: Tablet x 2"));
        assert!(has_line(&notices, "   Amount: $349.90"));
        assert!(has_line(&notices, "   Date: 2025-01-31T12:00:00.000000"));
        assert!(notices.iter().all(|n| !n.is_warning()));
    }

    #[test]
    fn test_missing_fields_fall_back_to_unknown() {
        let notices = handle(r#"{"orderID": "ORD-55555", "priority": "high"}"#.to_string());

        assert!(has_line(&notices, "   Product: unknown x unknown"));
        assert!(has_line(&notices, "   Amount: $unknown"));
        assert!(has_line(&notices, "   Date: unknown"));
        assert!(has_line(&notices, "🌏 Processing unknown region order"));
    }

    #[test]
    fn test_malformed_body_fails() {
        let message = InboundMessage::new("<order/>").with_message_id("bad");
        let err = handle_order_message(&message).unwrap_err();
        assert!(matches!(err, HandlerError::Decode { .. }));
    }

    #[test]
    fn test_quantity_as_string_is_a_field_type_error() {
        let message = InboundMessage::new(r#"{"orderID": "ORD-20000", "quantity": "2"}"#);
        let err = handle_order_message(&message).unwrap_err();
        assert!(matches!(err, HandlerError::FieldType { .. }));
        assert_eq!(err.kind(), "field_type");
    }

    #[test]
    fn test_generated_order_is_accepted() {
        use crate::bus::{OutgoingMessage, Publishable};
        use crate::model::OrderRecord;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(5);
        let order = OrderRecord::generate(&mut rng, "2025-01-31T12:00:00.000000".to_string());
        let outgoing = OutgoingMessage::encode(&order).unwrap();

        let mut message = InboundMessage::new(outgoing.body).with_message_id(order.message_id());
        message.application_properties = outgoing.application_properties;

        let notices = handle_order_message(&message).unwrap();
        assert!(has_line(&notices, &format!("🛒 Processing Order: {}", order.order_id)));
        assert!(has_line(
            &notices,
            &format!("   Amount: ${:.2}", order.order_amount)
        ));
    }
}
