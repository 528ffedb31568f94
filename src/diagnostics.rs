//! Shareable diagnostics dump with identifying fields masked.

use serde_json::{json, Map, Value};

use crate::constants::defaults;
use crate::helpers::now_iso;
use crate::interfaces::http_api::Product;
use crate::mower::MowerState;

const SENSITIVE_KEYS: [&str; 13] = [
    "serial_number",
    "mac_address",
    "mac",
    "sn",
    "serial",
    "command_in",
    "command_out",
    "latitude",
    "longitude",
    "email",
    "access_token",
    "refresh_token",
    "pkcs12",
];

pub fn report(product: &Product, state: &MowerState) -> Result<Value, serde_json::Error> {
    let mut doc = json!({
        "generated": now_iso(),
        "product": serde_json::to_value(product)?,
        "state": serde_json::to_value(state)?,
    });
    redact(&mut doc);
    Ok(doc)
}

/// Replace the value of every sensitive key, at any depth, with the redaction marker.
/// Null values stay null so absent data is still visible as absent.
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => redact_map(map),
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn redact_map(map: &mut Map<String, Value>) {
    for (key, value) in map.iter_mut() {
        if SENSITIVE_KEYS.contains(&key.as_str()) && !value.is_null() {
            *value = Value::String(defaults::REDACTED.to_string());
        } else {
            redact(value);
        }
    }
}
