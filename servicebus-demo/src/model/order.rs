//! Synthetic order records for the topic producer.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::round2;
use crate::bus::Publishable;

const CUSTOMERS: &[&str] = &[
    "John Deo",
    "Jame Smith",
    "Alica Brown",
    "Bob Johnson",
    "Charlie Wilson",
    "Caremen Deszous",
];

const PRODUCTS: &[&str] = &["Laptop", "Smartphone", "Tablet", "Headphone", "Camera"];

/// Sales region, used by subscriptions for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "north",
            Region::South => "south",
            Region::East => "east",
            Region::West => "west",
            Region::Central => "central",
        }
    }
}

/// Order priority, used by subscriptions for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Paypal")]
    Paypal,
}

impl PaymentMethod {
    const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Paypal,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
}

impl OrderStatus {
    const ALL: [OrderStatus; 3] = [OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Shipped];
}

/// A customer order as published on the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// `ORD-` followed by a five digit number
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub customer_name: String,
    pub region: Region,
    pub priority: Priority,
    pub product: String,
    pub quantity: u32,
    pub order_amount: f64,
    pub order_date: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
}

impl OrderRecord {
    /// Generate a random order placed at `order_date`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, order_date: String) -> Self {
        OrderRecord {
            order_id: format!("ORD-{}", rng.gen_range(10_000..=99_999)),
            customer_name: CUSTOMERS.choose(rng).copied().unwrap_or(CUSTOMERS[0]).to_string(),
            region: Region::ALL[rng.gen_range(0..Region::ALL.len())],
            priority: Priority::ALL[rng.gen_range(0..Priority::ALL.len())],
            product: PRODUCTS.choose(rng).copied().unwrap_or(PRODUCTS[0]).to_string(),
            quantity: rng.gen_range(1..=5),
            order_amount: round2(rng.gen_range(100.0..=2000.0)),
            order_date,
            payment_method: PaymentMethod::ALL[rng.gen_range(0..PaymentMethod::ALL.len())],
            status: OrderStatus::ALL[rng.gen_range(0..OrderStatus::ALL.len())],
        }
    }
}

impl Publishable for OrderRecord {
    fn subject(&self) -> &'static str {
        "Order Message"
    }

    fn message_id(&self) -> String {
        self.order_id.clone()
    }

    fn application_properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("region".to_string(), self.region.as_str().to_string()),
            ("priority".to_string(), self.priority.as_str().to_string()),
            ("orderID".to_string(), self.order_id.clone()),
            ("timestamp".to_string(), self.order_date.clone()),
        ])
    }

    fn summary(&self) -> String {
        format!(
            "message: Order {} - {} - ${:.2}",
            self.order_id, self.customer_name, self.order_amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_values_within_ranges() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..2000 {
            let order = OrderRecord::generate(&mut rng, "2025-01-31T12:00:00.000000".to_string());

            assert!((1..=5).contains(&order.quantity));
            assert!((100.0..=2000.0).contains(&order.order_amount));
            assert_eq!(round2(order.order_amount), order.order_amount);

            let digits = order.order_id.strip_prefix("ORD-").unwrap();
            assert_eq!(digits.len(), 5);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));

            assert!(CUSTOMERS.contains(&order.customer_name.as_str()));
            assert!(PRODUCTS.contains(&order.product.as_str()));
        }
    }

    #[test]
    fn test_json_field_names() {
        let mut rng = StdRng::seed_from_u64(1);
        let order = OrderRecord {
            payment_method: PaymentMethod::CreditCard,
            ..OrderRecord::generate(&mut rng, "2025-01-31T12:00:00.000000".to_string())
        };
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["orderID"], order.order_id.as_str());
        assert_eq!(json["paymentMethod"], "Credit Card");
        assert_eq!(json["orderDate"], "2025-01-31T12:00:00.000000");
        assert!(json.get("customerName").is_some());
        assert!(json.get("orderAmount").is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let mut rng = StdRng::seed_from_u64(2024);
        let order = OrderRecord::generate(&mut rng, "2025-01-31T12:00:00.000000".to_string());
        let json = serde_json::to_string_pretty(&order).unwrap();
        let parsed: OrderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, order);
    }

    #[test]
    fn test_application_properties() {
        let mut rng = StdRng::seed_from_u64(8);
        let order = OrderRecord::generate(&mut rng, "2025-01-31T12:00:00.000000".to_string());
        let props = order.application_properties();

        assert_eq!(props["region"], order.region.as_str());
        assert_eq!(props["priority"], order.priority.as_str());
        assert_eq!(props["orderID"], order.order_id);
        assert_eq!(props["timestamp"], order.order_date);
        assert_eq!(order.message_id(), order.order_id);
        assert_eq!(order.subject(), "Order Message");
    }
}
