use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::SystemTime;

const DEVICE_CLOCK_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub fn now_iso() -> String {
    let now: DateTime<Utc> = SystemTime::now().into();
    now.to_rfc3339()
}

/// Combine the mower's `dt` (DD/MM/YYYY) and `tm` (HH:MM:SS) fields.
/// The device reports local time without an offset.
pub fn parse_device_clock(date: &str, time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), DEVICE_CLOCK_FORMAT).ok()
}
