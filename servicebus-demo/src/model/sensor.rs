//! Synthetic IoT sensor readings for the queue producer.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::round2;
use crate::bus::Publishable;

const LOCATIONS: &[&str] = &[
    "building_a_floor_1",
    "building_a_floor_2",
    "building_b_floor_1",
    "warehouse_1",
    "warehouse_2",
];

/// Weighted so that most devices report as online.
const STATUS_POOL: &[DeviceStatus] = &[
    DeviceStatus::Online,
    DeviceStatus::Online,
    DeviceStatus::Online,
    DeviceStatus::Warning,
    DeviceStatus::Error,
];

/// Kind of device that produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    TemperatureSensor,
    HumiditySensor,
    PressureSensor,
    MotionSensor,
    LightSensor,
}

impl DeviceType {
    pub const ALL: [DeviceType; 5] = [
        DeviceType::TemperatureSensor,
        DeviceType::HumiditySensor,
        DeviceType::PressureSensor,
        DeviceType::MotionSensor,
        DeviceType::LightSensor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::TemperatureSensor => "temperature_sensor",
            DeviceType::HumiditySensor => "humidity_sensor",
            DeviceType::PressureSensor => "pressure_sensor",
            DeviceType::MotionSensor => "motion_sensor",
            DeviceType::LightSensor => "light_sensor",
        }
    }

    /// Range of `sensorValue` this device type reports.
    ///
    /// Motion sensors report either `0` (no motion) or `1` (motion detected).
    pub fn value_range(&self) -> RangeInclusive<f64> {
        match self {
            DeviceType::TemperatureSensor => 15.0..=40.0,
            DeviceType::HumiditySensor => 20.0..=80.0,
            DeviceType::PressureSensor => 950.0..=1050.0,
            DeviceType::MotionSensor => 0.0..=1.0,
            DeviceType::LightSensor => 0.0..=1000.0,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            DeviceType::TemperatureSensor => "°C",
            DeviceType::HumiditySensor => "%",
            DeviceType::PressureSensor => "hPa",
            DeviceType::MotionSensor => "binary",
            DeviceType::LightSensor => "lux",
        }
    }

    fn sample_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            DeviceType::MotionSensor => f64::from(rng.gen_range(0u8..=1)),
            _ => round2(rng.gen_range(self.value_range())),
        }
    }
}

/// Health status reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Warning,
    Error,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Warning => "warning",
            DeviceStatus::Error => "error",
        }
    }
}

/// One telemetry sample from a simulated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub device_id: String,
    pub device_type: DeviceType,
    pub location: String,
    pub sensor_value: f64,
    pub unit: String,
    /// Ambient temperature in °C
    pub temperature: f64,
    /// Ambient relative humidity in %
    pub humidity: f64,
    pub battery_level: f64,
    /// Signal strength in dBm
    pub signal_strength: i32,
    pub timestamp: String,
    pub status: DeviceStatus,
    pub firmware_version: String,
}

impl SensorReading {
    /// Generate a random reading stamped with `timestamp`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, timestamp: String) -> Self {
        let device_type = DeviceType::ALL[rng.gen_range(0..DeviceType::ALL.len())];
        let location = LOCATIONS.choose(rng).copied().unwrap_or(LOCATIONS[0]);
        let status = STATUS_POOL.choose(rng).copied().unwrap_or(DeviceStatus::Online);

        SensorReading {
            device_id: format!("device_{}", rng.gen_range(1..=100)),
            device_type,
            location: location.to_string(),
            sensor_value: device_type.sample_value(rng),
            unit: device_type.unit().to_string(),
            temperature: round2(rng.gen_range(18.0..=28.0)),
            humidity: round2(rng.gen_range(30.0..=70.0)),
            battery_level: round2(rng.gen_range(15.0..=100.0)),
            signal_strength: rng.gen_range(-100..=-30),
            timestamp,
            status,
            firmware_version: format!(
                "v{}.{}.{}",
                rng.gen_range(1..=3),
                rng.gen_range(0..=9),
                rng.gen_range(0..=9)
            ),
        }
    }
}

impl Publishable for SensorReading {
    fn subject(&self) -> &'static str {
        "IoT Sensor Data"
    }

    fn message_id(&self) -> String {
        format!("{}-{}", self.device_id, self.timestamp)
    }

    fn application_properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("deviceId".to_string(), self.device_id.clone()),
            ("deviceType".to_string(), self.device_type.as_str().to_string()),
            ("location".to_string(), self.location.clone()),
            ("status".to_string(), self.status.as_str().to_string()),
            ("timestamp".to_string(), self.timestamp.clone()),
        ])
    }

    fn summary(&self) -> String {
        format!(
            "IoT message: {} - {} - {}{}",
            self.device_id,
            self.device_type.as_str(),
            self.sensor_value,
            self.unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample(seed: u64) -> SensorReading {
        let mut rng = StdRng::seed_from_u64(seed);
        SensorReading::generate(&mut rng, "2025-01-31T12:00:00.000000".to_string())
    }

    #[test]
    fn test_generated_values_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let reading = SensorReading::generate(&mut rng, "t".to_string());
            let range = reading.device_type.value_range();
            assert!(range.contains(&reading.sensor_value), "{reading:?}");
            assert_eq!(reading.unit, reading.device_type.unit());
            assert!((15.0..=100.0).contains(&reading.battery_level));
            assert!((18.0..=28.0).contains(&reading.temperature));
            assert!((30.0..=70.0).contains(&reading.humidity));
            assert!((-100..=-30).contains(&reading.signal_strength));
            assert!(LOCATIONS.contains(&reading.location.as_str()));

            let id: u32 = reading.device_id.trim_start_matches("device_").parse().unwrap();
            assert!((1..=100).contains(&id));

            if reading.device_type == DeviceType::MotionSensor {
                assert!(reading.sensor_value == 0.0 || reading.sensor_value == 1.0);
            }
        }
    }

    #[test]
    fn test_generated_values_have_two_decimals() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let reading = SensorReading::generate(&mut rng, "t".to_string());
            for value in [reading.sensor_value, reading.battery_level, reading.temperature] {
                assert_eq!(round2(value), value);
            }
        }
    }

    #[test]
    fn test_firmware_version_format() {
        let reading = sample(3);
        let parts: Vec<&str> = reading.firmware_version.trim_start_matches('v').split('.').collect();
        assert!(reading.firmware_version.starts_with('v'));
        assert_eq!(parts.len(), 3);
        let major: u8 = parts[0].parse().unwrap();
        assert!((1..=3).contains(&major));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample(1)).unwrap();
        for key in [
            "deviceId",
            "deviceType",
            "location",
            "sensorValue",
            "unit",
            "temperature",
            "humidity",
            "batteryLevel",
            "signalStrength",
            "timestamp",
            "status",
            "firmwareVersion",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["deviceType"].as_str().unwrap().ends_with("_sensor"));
    }

    #[test]
    fn test_json_round_trip() {
        let reading = sample(42);
        let json = serde_json::to_string_pretty(&reading).unwrap();
        let parsed: SensorReading = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reading);
    }

    #[test]
    fn test_application_properties() {
        let reading = sample(5);
        let props = reading.application_properties();
        assert_eq!(props.len(), 5);
        assert_eq!(props["deviceId"], reading.device_id);
        assert_eq!(props["deviceType"], reading.device_type.as_str());
        assert_eq!(props["timestamp"], reading.timestamp);
        assert_eq!(reading.subject(), "IoT Sensor Data");
        assert_eq!(
            reading.message_id(),
            format!("{}-2025-01-31T12:00:00.000000", reading.device_id)
        );
    }
}
