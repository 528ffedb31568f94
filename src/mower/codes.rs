use std::collections::BTreeMap;

use once_cell::sync::Lazy;

pub const UNKNOWN: &str = "Unknown";

pub static STATUS_CODES: Lazy<BTreeMap<i32, &str>> = Lazy::new(|| {
    BTreeMap::from([
        (0, "Idle"),
        (1, "Home"),
        (2, "Start sequence"),
        (3, "Leaving home"),
        (4, "Follow wire"),
        (5, "Searching home"),
        (6, "Searching wire"),
        (7, "Mowing"),
        (8, "Lifted"),
        (9, "Trapped"),
        (10, "Blade blocked"),
        (11, "Debug"),
        (12, "Remote control"),
        (13, "Digital fence escape"),
        (30, "Going home"),
        (31, "Zone training"),
        (32, "Border cut"),
        (33, "Searching zone"),
        (34, "Pause"),
        (103, "Searching zone"),
        (104, "Searching home"),
        (110, "Border crossing"),
        (111, "Exploring lawn"),
    ])
});

pub static ERROR_CODES: Lazy<BTreeMap<i32, &str>> = Lazy::new(|| {
    BTreeMap::from([
        (0, "No error"),
        (1, "Trapped"),
        (2, "Lifted"),
        (3, "Wire missing"),
        (4, "Outside wire"),
        (5, "Rain delay"),
        (6, "Close door to mow"),
        (7, "Close door to go home"),
        (8, "Blade motor blocked"),
        (9, "Wheel motor blocked"),
        (10, "Trapped timeout"),
        (11, "Upside down"),
        (12, "Battery low"),
        (13, "Reverse wire"),
        (14, "Charge error"),
        (15, "Timeout finding home"),
        (16, "Mower locked"),
        (17, "Battery over temperature"),
        (18, "Dummy model"),
        (19, "Battery trunk open timeout"),
        (20, "Wire sync"),
        (21, "Msg num"),
        (100, "Charging station docking error"),
        (101, "HBI error"),
        (102, "OTA upgrade error"),
        (103, "Map error"),
        (104, "Excessive slope"),
        (105, "Unreachable zone"),
        (106, "Unreachable charging station"),
        (108, "Insufficient sensor data"),
        (109, "Training start disallowed"),
        (110, "Camera error"),
        (111, "Mapping exploration required"),
        (112, "Mapping exploration failed"),
        (113, "RFID reader error"),
        (114, "Headlight error"),
        (115, "Missing charging station"),
        (116, "Blade height adjustment blocked"),
    ])
});

pub fn status_description(code: i32) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or(UNKNOWN)
}

pub fn error_description(code: i32) -> &'static str {
    ERROR_CODES.get(&code).copied().unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status_codes() {
        assert_eq!(status_description(0), "Idle");
        assert_eq!(status_description(1), "Home");
        assert_eq!(status_description(7), "Mowing");
        assert_eq!(status_description(34), "Pause");
        assert_eq!(status_description(111), "Exploring lawn");
    }

    #[test]
    fn known_error_codes() {
        assert_eq!(error_description(0), "No error");
        assert_eq!(error_description(5), "Rain delay");
        assert_eq!(error_description(16), "Mower locked");
        assert_eq!(error_description(116), "Blade height adjustment blocked");
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(status_description(-1), UNKNOWN);
        assert_eq!(status_description(35), UNKNOWN);
        assert_eq!(error_description(22), UNKNOWN);
        assert_eq!(error_description(107), UNKNOWN);
    }
}
