use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use super::codes::{self, UNKNOWN};
use super::schedule::Schedule;

/// A vendor code together with its text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CodeState {
    pub code: i32,
    pub description: &'static str,
}

impl CodeState {
    pub fn status(code: i32) -> Self {
        CodeState {
            code,
            description: codes::status_description(code),
        }
    }

    pub fn error(code: i32) -> Self {
        CodeState {
            code,
            description: codes::error_description(code),
        }
    }
}

impl Default for CodeState {
    fn default() -> Self {
        CodeState {
            code: -1,
            description: UNKNOWN,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Battery {
    pub temperature: Option<f64>,
    pub voltage: Option<f64>,
    pub percent: Option<u8>,
    pub charging: bool,
    pub charge_cycles: Option<u32>,
    pub maintenance: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub blade_time_minutes: Option<u64>,
    pub blade_time_since_reset_minutes: Option<i64>,
    pub distance_metres: Option<u64>,
    pub work_time_minutes: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rain {
    /// Configured delay after rain, minutes
    pub delay_minutes: Option<u32>,
    pub remaining_minutes: Option<u32>,
    pub triggered: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Zones {
    /// Index into `rotation` the mower is currently working on
    pub index: usize,
    /// Zone at `rotation[index]`
    pub current: Option<u8>,
    /// Starting point of each zone, metres along the wire
    pub starting_points: Vec<u32>,
    pub rotation: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OffLimits {
    pub enabled: bool,
    pub shortcuts: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Ultrasonic {
    pub enabled: bool,
    pub status: Option<String>,
}

/// Features the mower has advertised through its telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub party_mode: bool,
    pub one_time_schedule: bool,
    pub secondary_schedule: bool,
    pub torque: bool,
    pub gps: bool,
    pub off_limits: bool,
    pub ultrasonic: bool,
}

/// Decoded device state, overwritten piecewise by each telemetry envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MowerState {
    pub serial_number: Option<String>,
    pub mac_address: Option<String>,
    pub firmware: Option<String>,
    pub connection: Option<String>,
    pub wifi_rssi: Option<i32>,
    pub status: CodeState,
    pub error: CodeState,
    pub locked: bool,
    pub battery: Battery,
    pub orientation: Orientation,
    pub statistics: Statistics,
    pub rain: Rain,
    pub zones: Zones,
    pub schedule: Schedule,
    pub torque: Option<i32>,
    pub language: Option<String>,
    pub location: Option<Location>,
    pub off_limits: Option<OffLimits>,
    pub ultrasonic: Option<Ultrasonic>,
    pub capabilities: Capabilities,
    /// Device-local clock at the time of the last `cfg` block
    pub device_clock: Option<NaiveDateTime>,
    pub updated: Option<DateTime<Utc>>,
}

impl MowerState {
    pub fn is_mowing(&self) -> bool {
        matches!(self.status.code, 7 | 32)
    }

    pub fn is_home(&self) -> bool {
        self.status.code == 1
    }

    pub fn has_error(&self) -> bool {
        self.error.code > 0
    }
}
