//! Payload types published by the demo producers.
//!
//! - `SensorReading`: synthetic IoT telemetry sent to the queue
//! - `OrderRecord`: synthetic orders published to the topic
//!
//! Both are plain value objects: generated, serialized, sent, discarded.

pub mod order;
pub mod sensor;

pub use order::{OrderRecord, OrderStatus, PaymentMethod, Priority, Region};
pub use sensor::{DeviceStatus, DeviceType, SensorReading};

/// Current local time as an ISO-8601 string with microsecond precision.
pub fn iso_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_shape() {
        let ts = iso_timestamp();
        // 2025-01-31T12:34:56.123456
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345678), 12.35);
        assert_eq!(round2(100.0), 100.0);
    }
}
