use chrono::Weekday;
use landroid::mower::Action;

pub struct SerialArgs {
    pub serial: String,
}

pub struct WatchArgs {
    pub serial: String,
    /// Stop after this many updates
    pub count: Option<usize>,
}

pub struct ActionArgs {
    pub serial: String,
    pub action: Action,
}

pub struct SettingArgs<T> {
    pub serial: String,
    pub value: T,
}

pub struct SwitchArgs {
    pub serial: String,
    pub enabled: bool,
}

pub struct OtsArgs {
    pub serial: String,
    pub minutes: u32,
    pub boundary: bool,
}

pub struct ScheduleSetArgs {
    pub serial: String,
    pub day: Weekday,
    pub start: String,
    pub minutes: u32,
    pub boundary: bool,
    pub secondary: bool,
}
