use serde::{Deserialize, Serialize};

pub mod sim;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrivingMode {
    Traffic,
    Highway,
    Depot,
}

impl DrivingMode {
    pub fn label(self) -> &'static str {
        match self {
            DrivingMode::Traffic => "traffic",
            DrivingMode::Highway => "highway",
            DrivingMode::Depot => "depot",
        }
    }
}

/// One snapshot of the four simulated channels plus driving mode. Replaced
/// wholesale on every update; never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub left_clearance_cm: f64,
    pub right_clearance_cm: f64,
    pub closing_speed_mps: f64,
    pub vehicle_speed_kmh: f64,
    pub driving_mode: DrivingMode,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            left_clearance_cm: 120.0,
            right_clearance_cm: 115.0,
            closing_speed_mps: 0.5,
            vehicle_speed_kmh: 45.0,
            driving_mode: DrivingMode::Traffic,
        }
    }
}

/// A single-channel edit from the operator console, e.g.
/// `{"field": "closing_speed_mps", "value": 3.2}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    LeftClearanceCm(f64),
    RightClearanceCm(f64),
    ClosingSpeedMps(f64),
    VehicleSpeedKmh(f64),
    DrivingMode(DrivingMode),
}

impl SensorReading {
    /// Replace exactly one channel, leaving the others untouched. Manual
    /// values are trusted as-is; only the simulation driver clamps.
    pub fn with_field(mut self, update: FieldUpdate) -> SensorReading {
        match update {
            FieldUpdate::LeftClearanceCm(value) => self.left_clearance_cm = value,
            FieldUpdate::RightClearanceCm(value) => self.right_clearance_cm = value,
            FieldUpdate::ClosingSpeedMps(value) => self.closing_speed_mps = value,
            FieldUpdate::VehicleSpeedKmh(value) => self.vehicle_speed_kmh = value,
            FieldUpdate::DrivingMode(mode) => self.driving_mode = mode,
        }
        self
    }
}
