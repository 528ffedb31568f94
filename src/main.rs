mod argsets;
mod command;

use std::str::FromStr;

use anyhow::{anyhow, Result};
use env_logger::Env;
use pico_args::Arguments;

use landroid::constants::{defaults, envvars};
use landroid::helpers::load_dotenv;
use landroid::mower::Action;

use argsets::{
    ActionArgs, OtsArgs, ScheduleSetArgs, SerialArgs, SettingArgs, SwitchArgs, WatchArgs,
};

const CMD_LOGIN: &str = "login";
const CMD_LOGOUT: &str = "logout";
const CMD_DEVICES: &str = "devices";
const CMD_STATUS: &str = "status";
const CMD_WATCH: &str = "watch";
const CMD_DIAGNOSTICS: &str = "diagnostics";
const CMD_CODES: &str = "codes";
const CMD_POLL: &str = "poll";
const CMD_ZONE: &str = "zone";
const CMD_RAIN_DELAY: &str = "rain-delay";
const CMD_TORQUE: &str = "torque";
const CMD_TIME_VARIATION: &str = "time-variation";
const CMD_PARTYMODE: &str = "partymode";
const CMD_SCHEDULE: &str = "schedule";
const CMD_OTS: &str = "ots";
const CMD_EDGECUT: &str = "edgecut";
const CMD_SCHEDULE_SET: &str = "schedule-set";

const USAGE: &str = "\
Usage: landroid <command> [args]

Account:
  login | logout | devices | codes
Mower:
  status <serial>            last state known to the cloud
  watch <serial> [--count N] stream live updates
  diagnostics <serial>       state dump with identifying fields redacted
  start | pause | home | zone-training | restart | safe-home |
  lock | unlock | pause-over-border | poll <serial>
  zone <serial> <0-3>
  rain-delay <serial> <minutes>
  torque <serial> <-50..50>
  time-variation <serial> <-100..100>
  partymode <serial> on|off
  schedule <serial> on|off
  ots <serial> <minutes> [--boundary]
  edgecut <serial>
  schedule-set <serial> <day> <HH:MM> <minutes> [--boundary] [--secondary]";

fn main() -> Result<()> {
    load_dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(envvars::LOG_LEVEL, defaults::LOG_LEVEL))
        .init();

    let mut args = Arguments::from_env();
    let subcommand = args.subcommand()?;
    let result = match subcommand.as_deref() {
        Some(CMD_LOGIN) => command::login(),
        Some(CMD_LOGOUT) => command::logout(),
        Some(CMD_DEVICES) => command::devices(),
        Some(CMD_CODES) => command::codes(),
        Some(CMD_STATUS) => command::status(serial_args(&mut args)?),
        Some(CMD_DIAGNOSTICS) => command::diagnostics(serial_args(&mut args)?),
        Some(CMD_WATCH) => command::watch(WatchArgs {
            count: args.opt_value_from_str("--count")?,
            serial: args.free_from_str()?,
        }),
        Some(CMD_POLL) => command::poll(serial_args(&mut args)?),
        Some(CMD_ZONE) => command::zone(setting_args(&mut args)?),
        Some(CMD_RAIN_DELAY) => command::rain_delay(setting_args(&mut args)?),
        Some(CMD_TORQUE) => command::torque(setting_args(&mut args)?),
        Some(CMD_TIME_VARIATION) => command::time_variation(setting_args(&mut args)?),
        Some(CMD_PARTYMODE) => command::party_mode(switch_args(&mut args)?),
        Some(CMD_SCHEDULE) => command::schedule_enabled(switch_args(&mut args)?),
        Some(CMD_OTS) => command::one_time_schedule(OtsArgs {
            boundary: args.contains("--boundary"),
            serial: args.free_from_str()?,
            minutes: args.free_from_str()?,
        }),
        Some(CMD_EDGECUT) => command::edge_cut(serial_args(&mut args)?),
        Some(CMD_SCHEDULE_SET) => command::schedule_set(ScheduleSetArgs {
            boundary: args.contains("--boundary"),
            secondary: args.contains("--secondary"),
            serial: args.free_from_str()?,
            day: args.free_from_str()?,
            start: args.free_from_str()?,
            minutes: args.free_from_str()?,
        }),
        Some(name) => match Action::from_str(name) {
            Ok(action) => command::action(ActionArgs {
                action,
                serial: args.free_from_str()?,
            }),
            Err(_) => Err(anyhow!("Unknown command '{name}'\n\n{USAGE}")),
        },
        None => Err(anyhow!("{USAGE}")),
    };

    let leftover = args.finish();
    if !leftover.is_empty() {
        log::warn!("Ignored arguments: {:?}", leftover);
    }
    result
}

fn serial_args(args: &mut Arguments) -> Result<SerialArgs> {
    Ok(SerialArgs {
        serial: args.free_from_str()?,
    })
}

fn setting_args<T>(args: &mut Arguments) -> Result<SettingArgs<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(SettingArgs {
        serial: args.free_from_str()?,
        value: args.free_from_str()?,
    })
}

fn switch_args(args: &mut Arguments) -> Result<SwitchArgs> {
    let serial = args.free_from_str()?;
    let enabled = match args.free_from_str::<String>()?.as_str() {
        "on" => true,
        "off" => false,
        other => return Err(anyhow!("Expected 'on' or 'off', got '{other}'")),
    };
    Ok(SwitchArgs { serial, enabled })
}
