use chrono::{NaiveTime, Timelike, Weekday};
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use super::payload::RawSlot;

const MINUTES_PER_DAY: u32 = 24 * 60;
const SLOT_TIME_FORMAT: &str = "%H:%M";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid start time '{0}', expected HH:MM")]
    StartTime(String),
    #[error("slot starting {start} for {duration} min runs past midnight")]
    PastMidnight { start: String, duration: u32 },
    #[error("a week needs 7 slots, got {0}")]
    WeekLength(usize),
}

/// One day's mowing window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    #[serde(serialize_with = "serialize_hhmm")]
    pub start: NaiveTime,
    /// Minutes; zero disables the slot
    pub duration: u32,
    /// Cut the boundary wire first
    pub boundary: bool,
}

impl ScheduleSlot {
    pub fn new(start: NaiveTime, duration: u32, boundary: bool) -> Result<Self, ScheduleError> {
        let start_minute = start.hour() * 60 + start.minute();
        if start_minute + duration > MINUTES_PER_DAY {
            return Err(ScheduleError::PastMidnight {
                start: start.format(SLOT_TIME_FORMAT).to_string(),
                duration,
            });
        }
        Ok(ScheduleSlot {
            start,
            duration,
            boundary,
        })
    }

    pub fn parse(start: &str, duration: u32, boundary: bool) -> Result<Self, ScheduleError> {
        let start = NaiveTime::parse_from_str(start, SLOT_TIME_FORMAT)
            .map_err(|_| ScheduleError::StartTime(start.to_string()))?;
        Self::new(start, duration, boundary)
    }

    pub fn disabled() -> Self {
        ScheduleSlot {
            start: NaiveTime::default(),
            duration: 0,
            boundary: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.duration > 0
    }

    pub fn from_raw(raw: &RawSlot) -> Result<Self, ScheduleError> {
        Self::parse(&raw.0, raw.1, raw.2 != 0)
    }

    pub fn to_raw(&self) -> RawSlot {
        (
            self.start.format(SLOT_TIME_FORMAT).to_string(),
            self.duration,
            u8::from(self.boundary),
        )
    }
}

impl Default for ScheduleSlot {
    fn default() -> Self {
        Self::disabled()
    }
}

fn serialize_hhmm<S: serde::Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&time.format(SLOT_TIME_FORMAT))
}

/// Seven slots, Sunday first, matching the wire order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Week(pub [ScheduleSlot; 7]);

impl Week {
    pub fn from_raw(raw: &[RawSlot]) -> Result<Self, ScheduleError> {
        if raw.len() != 7 {
            return Err(ScheduleError::WeekLength(raw.len()));
        }
        let mut week = Week::default();
        for (slot, raw_slot) in week.0.iter_mut().zip(raw) {
            *slot = ScheduleSlot::from_raw(raw_slot)?;
        }
        Ok(week)
    }

    pub fn to_raw(&self) -> Vec<RawSlot> {
        self.0.iter().map(ScheduleSlot::to_raw).collect()
    }

    pub fn day(&self, day: Weekday) -> &ScheduleSlot {
        &self.0[day.num_days_from_sunday() as usize]
    }

    pub fn set_day(&mut self, day: Weekday, slot: ScheduleSlot) {
        self.0[day.num_days_from_sunday() as usize] = slot;
    }

    /// Human readable summary, e.g. `Mon 10:00+60 | Wed 09:30+90(b)`.
    pub fn summary(&self) -> String {
        let days = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];
        let enabled = days
            .iter()
            .zip(self.0.iter())
            .filter(|(_, slot)| slot.is_enabled())
            .map(|(day, slot)| {
                format!(
                    "{day} {}+{}{}",
                    slot.start.format(SLOT_TIME_FORMAT),
                    slot.duration,
                    if slot.boundary { "(b)" } else { "" }
                )
            })
            .join(" | ");
        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub active: bool,
    pub party_mode: bool,
    /// Percent, -100..=100
    pub time_variation: i32,
    pub primary: Week,
    pub secondary: Option<Week>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(start: &str, duration: u32, boundary: u8) -> RawSlot {
        (start.to_string(), duration, boundary)
    }

    #[test]
    fn slot_validation() {
        assert!(ScheduleSlot::parse("23:00", 60, false).is_ok());
        assert_eq!(
            ScheduleSlot::parse("23:00", 61, false),
            Err(ScheduleError::PastMidnight {
                start: "23:00".into(),
                duration: 61
            })
        );
        assert_eq!(
            ScheduleSlot::parse("7am", 30, false),
            Err(ScheduleError::StartTime("7am".into()))
        );
    }

    #[test]
    fn week_from_wire() {
        let wire = vec![
            raw("00:00", 0, 0),
            raw("10:00", 60, 1),
            raw("00:00", 0, 0),
            raw("09:30", 90, 0),
            raw("00:00", 0, 0),
            raw("00:00", 0, 0),
            raw("00:00", 0, 0),
        ];
        let week = Week::from_raw(&wire).unwrap();
        assert!(week.day(Weekday::Mon).boundary);
        assert_eq!(week.day(Weekday::Wed).duration, 90);
        assert_eq!(week.summary(), "Mon 10:00+60(b) | Wed 09:30+90");
        assert_eq!(week.to_raw(), wire);

        assert_eq!(
            Week::from_raw(&wire[..6]),
            Err(ScheduleError::WeekLength(6))
        );
    }

    #[test]
    fn set_day_replaces_only_that_day() {
        let mut week = Week::default();
        week.set_day(
            Weekday::Sat,
            ScheduleSlot::parse("08:15", 45, true).unwrap(),
        );
        assert_eq!(week.0[6].to_raw(), raw("08:15", 45, 1));
        assert_eq!(week.summary(), "Sat 08:15+45(b)");
        assert!(!week.day(Weekday::Fri).is_enabled());
    }
}
