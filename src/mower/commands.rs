//! Outbound command payloads.
//!
//! Every command is a small JSON object published to the device's
//! `command_in` topic. Payloads are rendered compactly with sorted keys so the
//! same command always yields the same bytes.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};
use thiserror::Error;

use crate::helpers::RateLimitExceeded;
use crate::interfaces::mqtt::MqttError;

use super::schedule::{ScheduleError, Week};

pub const ZONE_COUNT: u8 = 4;
pub const MAX_OTS_MINUTES: u32 = 1440;
pub const MAX_RAIN_DELAY_MINUTES: u32 = 300;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("mower {0} does not support party mode")]
    NoPartymode(String),
    #[error("mower {0} does not support one-time schedules")]
    NoOneTimeSchedule(String),
    #[error("mower {serial} does not support {feature}")]
    Unsupported {
        serial: String,
        feature: &'static str,
    },
    #[error("poll rejected: {0}")]
    RateLimited(#[from] RateLimitExceeded),
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("zone {0} is not part of the current zone rotation")]
    ZoneNotInRotation(u8),
    #[error("the mower has not reported its zone rotation yet")]
    NoZoneRotation,
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Mqtt(#[from] MqttError),
}

/// Single-code actions sent as `{"cmd": <code>}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Start = 1,
    Pause = 2,
    Home = 3,
    ZoneTraining = 4,
    Lock = 5,
    Unlock = 6,
    Restart = 7,
    PauseOverBorder = 8,
    SafeHome = 9,
}

impl Action {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn payload(self) -> String {
        render(json!({ "cmd": self.code() }))
    }
}

impl FromStr for Action {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "home" => Ok(Self::Home),
            "zone-training" => Ok(Self::ZoneTraining),
            "lock" => Ok(Self::Lock),
            "unlock" => Ok(Self::Unlock),
            "restart" => Ok(Self::Restart),
            "pause-over-border" => Ok(Self::PauseOverBorder),
            "safe-home" => Ok(Self::SafeHome),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Home => "home",
            Self::ZoneTraining => "zone-training",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Restart => "restart",
            Self::PauseOverBorder => "pause-over-border",
            Self::SafeHome => "safe-home",
        };
        f.write_str(name)
    }
}

fn render(value: Value) -> String {
    value.to_string()
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<(), CommandError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CommandError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Ask the mower to publish its current state.
pub fn poll() -> String {
    render(json!({}))
}

pub fn party_mode(enabled: bool) -> String {
    let m = if enabled { 2 } else { 1 };
    render(json!({ "sc": { "m": m, "distm": 0 } }))
}

pub fn schedule_enabled(enabled: bool) -> String {
    render(json!({ "sc": { "m": u8::from(enabled) } }))
}

pub fn time_variation(percent: i32) -> Result<String, CommandError> {
    check_range("time variation", percent.into(), -100, 100)?;
    Ok(render(json!({ "sc": { "p": percent } })))
}

pub fn one_time_schedule(boundary: bool, minutes: u32) -> Result<String, CommandError> {
    check_range("runtime", minutes.into(), 1, MAX_OTS_MINUTES.into())?;
    Ok(render(
        json!({ "sc": { "ots": { "bc": u8::from(boundary), "wtm": minutes } } }),
    ))
}

pub fn edge_cut() -> String {
    render(json!({ "sc": { "ots": { "bc": 1, "wtm": 0 } } }))
}

pub fn schedule(primary: &Week, secondary: Option<&Week>) -> String {
    let mut sc = json!({ "d": primary.to_raw() });
    if let Some(week) = secondary {
        sc["dd"] = json!(week.to_raw());
    }
    render(json!({ "sc": sc }))
}

pub fn rain_delay(minutes: u32) -> Result<String, CommandError> {
    check_range("rain delay", minutes.into(), 0, MAX_RAIN_DELAY_MINUTES.into())?;
    Ok(render(json!({ "rd": minutes })))
}

pub fn torque(percent: i32) -> Result<String, CommandError> {
    check_range("torque", percent.into(), -50, 50)?;
    Ok(render(json!({ "tq": percent })))
}

/// Rotate the ten-slot zone rotation left until slot `index` holds `zone`,
/// so that the mower heads for `zone` next.
pub fn zone_rotation(rotation: &[u8], index: usize, zone: u8) -> Result<String, CommandError> {
    check_range("zone", zone.into(), 0, i64::from(ZONE_COUNT) - 1)?;
    if rotation.is_empty() {
        return Err(CommandError::NoZoneRotation);
    }
    let index = index % rotation.len();
    let mut rotated = rotation.to_vec();
    for _ in 0..rotation.len() {
        if rotated[index] == zone {
            return Ok(render(json!({ "mzv": rotated })));
        }
        rotated.rotate_left(1);
    }
    Err(CommandError::ZoneNotInRotation(zone))
}
