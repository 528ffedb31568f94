//! Wire types for the vendor's compact telemetry envelope.
//!
//! The same document arrives on the device's `command_out` MQTT topic and
//! from the REST `product-items/<serial>/status` endpoint. Every field is
//! optional: mower models and firmware revisions report different subsets,
//! and unknown tags are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed telemetry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("telemetry message is empty")]
    Empty,
}

/// One schedule slot as sent on the wire: `["HH:MM", minutes, boundary]`.
pub type RawSlot = (String, u32, u8);

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Envelope {
    pub dat: Option<LiveData>,
    pub cfg: Option<ConfigData>,
}

impl Envelope {
    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_slice(raw)?)
    }
}

/// Firmware is a bare number on older models and a string on newer ones.
/// Numbers keep their wire text, so `3.30` is not shortened to `3.3`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Firmware {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for Firmware {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => Ok(Self::Number(n)),
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            other => Err(serde::de::Error::custom(format!(
                "expected firmware version, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// `dat`: live status.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LiveData {
    pub mac: Option<String>,
    pub fw: Option<Firmware>,
    /// Wi-Fi RSSI
    pub rsi: Option<i32>,
    /// Status code
    pub ls: Option<i32>,
    /// Error code
    pub le: Option<i32>,
    /// Index into `cfg.mzv` of the zone being mowed
    pub lz: Option<usize>,
    pub lk: Option<u8>,
    pub conn: Option<String>,
    pub bt: Option<BatteryData>,
    /// Pitch, roll, yaw in degrees
    pub dmp: Option<Vec<f64>>,
    pub st: Option<StatsData>,
    pub rain: Option<RainData>,
    pub modules: Option<LiveModules>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct BatteryData {
    pub t: Option<f64>,
    pub v: Option<f64>,
    pub p: Option<u8>,
    pub nr: Option<u32>,
    pub c: Option<u8>,
    pub m: Option<u8>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct StatsData {
    /// Blade time, minutes
    pub b: Option<u64>,
    /// Distance, metres
    pub d: Option<u64>,
    /// Work time, minutes
    pub wt: Option<u64>,
    /// Blade time since last reset, minutes
    pub bl: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RainData {
    pub s: Option<u8>,
    pub cnt: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LiveModules {
    #[serde(rename = "4G")]
    pub four_g: Option<FourGData>,
    #[serde(rename = "DF")]
    pub off_limits: Option<OffLimitsData>,
    #[serde(rename = "US")]
    pub ultrasonic: Option<UltrasonicData>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FourGData {
    pub gps: Option<GpsData>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GpsData {
    #[serde(default)]
    pub coo: Vec<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct OffLimitsData {
    pub cut: Option<u8>,
    pub fh: Option<u8>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct UltrasonicData {
    pub enabled: Option<u8>,
    pub stat: Option<String>,
}

/// `cfg`: configuration and schedule.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ConfigData {
    pub id: Option<u64>,
    pub lg: Option<String>,
    pub tm: Option<String>,
    pub dt: Option<String>,
    pub sn: Option<String>,
    /// Rain delay, minutes
    pub rd: Option<u32>,
    pub tq: Option<i32>,
    /// Zone starting points, metres along the wire
    pub mz: Option<Vec<u32>>,
    /// Ten-slot zone rotation
    pub mzv: Option<Vec<u8>>,
    pub sc: Option<ScheduleData>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ScheduleData {
    pub m: Option<u8>,
    pub distm: Option<u8>,
    pub ots: Option<OtsData>,
    pub p: Option<i32>,
    pub d: Option<Vec<RawSlot>>,
    pub dd: Option<Vec<RawSlot>>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct OtsData {
    pub bc: Option<u8>,
    pub wtm: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_envelope() {
        let env = Envelope::parse(br#"{"dat":{"ls":7,"le":0,"fw":3.26}}"#).unwrap();
        let dat = env.dat.unwrap();
        assert_eq!(dat.ls, Some(7));
        assert_eq!(dat.fw.unwrap().to_string(), "3.26");
        assert!(env.cfg.is_none());
    }

    #[test]
    fn numeric_firmware_keeps_trailing_zero() {
        let env = Envelope::parse(br#"{"dat":{"fw":3.30}}"#).unwrap();
        let fw = env.dat.unwrap().fw.unwrap();
        assert_eq!(fw.to_string(), "3.30");
        assert_eq!(serde_json::to_string(&fw).unwrap(), "3.30");

        assert!(Envelope::parse(br#"{"dat":{"fw":[3,30]}}"#).is_err());
    }

    #[test]
    fn ignores_unknown_tags() {
        let env = Envelope::parse(br#"{"cfg":{"sn":"X","new_tag":[1,2]},"extra":true}"#).unwrap();
        assert_eq!(env.cfg.unwrap().sn.as_deref(), Some("X"));
    }

    #[test]
    fn firmware_as_text() {
        let env = Envelope::parse(br#"{"dat":{"fw":"3.30.0+1"}}"#).unwrap();
        assert_eq!(env.dat.unwrap().fw, Some(Firmware::Text("3.30.0+1".into())));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(Envelope::parse(b"  "), Err(DecodeError::Empty)));
        assert!(matches!(Envelope::parse(b"{\"dat\":"), Err(DecodeError::Json(_))));
        assert!(matches!(
            Envelope::parse(br#"{"cfg":{"sc":{"d":[["10:00","thirty",0]]}}}"#),
            Err(DecodeError::Json(_))
        ));
    }
}
