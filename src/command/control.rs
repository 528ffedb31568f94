use anyhow::{bail, Result};

use landroid::constants::defaults;
use landroid::mower::{CommandError, Mower, ScheduleSlot};

use super::{cloud_client, summary};
use crate::argsets::{ActionArgs, OtsArgs, ScheduleSetArgs, SerialArgs, SettingArgs, SwitchArgs};

/// Connect, send one command and report the state the mower answers with.
fn on_mower(
    serial: &str,
    send: impl FnOnce(&mut Mower) -> Result<(), CommandError>,
) -> Result<()> {
    let mut cloud = cloud_client()?;
    let mut mower = cloud.connect(serial)?;
    let timeout = defaults::COMMAND_RESPONSE_TIMEOUT;
    if !mower.wait_for_connection(timeout)? {
        bail!("Could not reach the MQTT broker within {}s", timeout.as_secs());
    }
    mower.process_pending();

    send(&mut mower)?;

    if mower.wait_for_update(timeout)? {
        println!("{}", summary(&mower));
    } else {
        log::warn!(
            "Command sent but {} did not report back within {}s",
            mower.name(),
            timeout.as_secs()
        );
    }
    Ok(())
}

pub fn action(args: ActionArgs) -> Result<()> {
    on_mower(&args.serial, |m| m.perform(args.action))
}

pub fn poll(args: SerialArgs) -> Result<()> {
    on_mower(&args.serial, Mower::poll)
}

pub fn zone(args: SettingArgs<u8>) -> Result<()> {
    on_mower(&args.serial, |m| m.set_zone(args.value))
}

pub fn rain_delay(args: SettingArgs<u32>) -> Result<()> {
    on_mower(&args.serial, |m| m.set_rain_delay(args.value))
}

pub fn torque(args: SettingArgs<i32>) -> Result<()> {
    on_mower(&args.serial, |m| m.set_torque(args.value))
}

pub fn time_variation(args: SettingArgs<i32>) -> Result<()> {
    on_mower(&args.serial, |m| m.set_time_variation(args.value))
}

pub fn party_mode(args: SwitchArgs) -> Result<()> {
    on_mower(&args.serial, |m| m.set_party_mode(args.enabled))
}

pub fn schedule_enabled(args: SwitchArgs) -> Result<()> {
    on_mower(&args.serial, |m| m.set_schedule_enabled(args.enabled))
}

pub fn one_time_schedule(args: OtsArgs) -> Result<()> {
    on_mower(&args.serial, |m| m.one_time_schedule(args.boundary, args.minutes))
}

pub fn edge_cut(args: SerialArgs) -> Result<()> {
    on_mower(&args.serial, Mower::edge_cut)
}

pub fn schedule_set(args: ScheduleSetArgs) -> Result<()> {
    // validate before connecting
    let slot = ScheduleSlot::parse(&args.start, args.minutes, args.boundary)?;
    on_mower(&args.serial, |m| m.set_schedule_slot(args.day, slot, args.secondary))
}
