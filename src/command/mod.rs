mod account;
mod control;
mod status;
mod watch;

use anyhow::Result;
use landroid::mower::Mower;
use landroid::{CloudClient, Config};

pub use account::{devices, login, logout};
pub use control::{
    action, edge_cut, one_time_schedule, party_mode, poll, rain_delay, schedule_enabled,
    schedule_set, time_variation, torque, zone,
};
pub use status::{codes, diagnostics, status};
pub use watch::watch;

fn cloud_client() -> Result<CloudClient> {
    let config = Config::from_env()?;
    log::debug!(
        "Using {} cloud at {}",
        config.cloud.brand,
        config.api_url
    );
    Ok(CloudClient::new(config)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn summary(mower: &Mower) -> String {
    let state = mower.state();
    let mut line = format!(
        "{} [{}]: {} | error: {}",
        mower.name(),
        if mower.is_connected() { "online" } else { "offline" },
        state.status.description,
        state.error.description
    );
    if let Some(percent) = state.battery.percent {
        line.push_str(&format!(" | battery {percent}%"));
        if state.battery.charging {
            line.push_str(" (charging)");
        }
    }
    if let Some(zone) = state.zones.current {
        line.push_str(&format!(" | zone {}", zone + 1));
    }
    if state.locked {
        line.push_str(" | locked");
    }
    line
}
