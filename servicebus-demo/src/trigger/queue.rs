//! Queue trigger handler for IoT sensor readings.

use serde::Deserialize;
use tracing::info;

use super::{decode_body, emit_all, log_properties_inline, Notice};
use crate::bus::InboundMessage;
use crate::error::HandlerError;

/// Batteries below this level (percent) raise a warning.
pub const LOW_BATTERY_THRESHOLD: f64 = 20.0;

/// Informational line per known device type.
const DEVICE_TEMPLATES: &[(&str, &str)] = &[
    ("temperature_sensor", "🌡️ Temperature sensor: {value}°C at {location}"),
    ("humidity_sensor", "💧 Humidity sensor: {value}% at {location}"),
    ("pressure_sensor", "📊 Pressure sensor: {value} hPa at {location}"),
    ("light_sensor", "💡 Light sensor: {value} lux at {location}"),
];

const MOTION_DETECTED: &str = "🚨 Motion detected at {location}";
const NO_MOTION: &str = "✅ No motion at {location}";
const UNKNOWN_DEVICE: &str = "📱 Unknown device type: {device_type}";

/// Sensor reading as read by the trigger.
///
/// Every field is optional on the wire. Missing text fields read as
/// `"unknown"` and missing numbers as `0`; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceivedReading {
    pub device_id: String,
    pub device_type: String,
    pub location: String,
    pub sensor_value: f64,
    pub unit: String,
    pub battery_level: f64,
    pub status: String,
}

impl Default for ReceivedReading {
    fn default() -> Self {
        Self {
            device_id: "unknown".to_string(),
            device_type: "unknown".to_string(),
            location: "unknown".to_string(),
            sensor_value: 0.0,
            unit: "unknown".to_string(),
            battery_level: 0.0,
            status: "unknown".to_string(),
        }
    }
}

impl ReceivedReading {
    pub fn motion_detected(&self) -> bool {
        self.device_type == "motion_sensor" && self.sensor_value == 1.0
    }

    fn fill(&self, template: &str) -> String {
        template
            .replace("{value}", &self.sensor_value.to_string())
            .replace("{location}", &self.location)
            .replace("{device_type}", &self.device_type)
    }

    fn summary(&self) -> Vec<Notice> {
        vec![
            Notice::info(format!("📡 Processing IoT Device: {}", self.device_id)),
            Notice::info(format!("   Device Type: {}", self.device_type)),
            Notice::info(format!("   Location: {}", self.location)),
            Notice::info(format!("   Sensor Reading: {} {}", self.sensor_value, self.unit)),
            Notice::info(format!("   Battery Level: {}%", self.battery_level)),
            Notice::info(format!("   Status: {}", self.status)),
        ]
    }

    /// The per-device-type line; motion readings are warnings when motion is detected.
    fn device_notice(&self) -> Notice {
        if self.device_type == "motion_sensor" {
            return if self.motion_detected() {
                Notice::warn(self.fill(MOTION_DETECTED))
            } else {
                Notice::info(self.fill(NO_MOTION))
            };
        }

        match DEVICE_TEMPLATES.iter().find(|(kind, _)| *kind == self.device_type) {
            Some((_, template)) => Notice::info(self.fill(template)),
            None => Notice::info(self.fill(UNKNOWN_DEVICE)),
        }
    }

    /// At most one alert: an error status takes precedence over a low battery.
    fn alert(&self) -> Option<Notice> {
        if self.status == "error" {
            Some(Notice::warn(format!(
                "⚠️ Device {} has error status",
                self.device_id
            )))
        } else if self.battery_level < LOW_BATTERY_THRESHOLD {
            Some(Notice::warn(format!(
                "🔋 Low battery for device {}: {}%",
                self.device_id, self.battery_level
            )))
        } else {
            None
        }
    }
}

/// Handle one sensor reading delivered from the queue.
///
/// Returns the notices that were logged, or an error when the body cannot be
/// decoded.
pub fn handle_sensor_message(message: &InboundMessage) -> Result<Vec<Notice>, HandlerError> {
    info!(
        message_id = message.id(),
        "Processing Service Bus queue message: {}",
        message.id()
    );

    let reading: ReceivedReading = decode_body(message)?;
    info!(message_id = message.id(), "Parsed IoT data: {reading:?}");

    let mut notices = reading.summary();
    notices.push(reading.device_notice());
    notices.extend(reading.alert());

    emit_all(message, &notices);
    log_properties_inline(message);

    info!(
        message_id = message.id(),
        device_id = %reading.device_id,
        "✅ Successfully processed IoT message: {}",
        message.id()
    );

    Ok(notices)
}
