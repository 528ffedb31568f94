use std::time::Duration;

use anyhow::{bail, Result};

use landroid::constants::defaults;

use super::{cloud_client, summary};
use crate::argsets::WatchArgs;

const IDLE_NOTICE: Duration = Duration::from_secs(300);

pub fn watch(args: WatchArgs) -> Result<()> {
    let mut cloud = cloud_client()?;
    let mut mower = cloud.connect(&args.serial)?;
    println!("{}", summary(&mower));

    if !mower.wait_for_connection(defaults::COMMAND_RESPONSE_TIMEOUT)? {
        bail!("Could not reach the MQTT broker");
    }
    if let Err(e) = mower.poll() {
        log::warn!("Initial poll skipped: {e}");
    }

    let mut updates = 0;
    while args.count.map_or(true, |max| updates < max) {
        if mower.wait_for_update(IDLE_NOTICE)? {
            updates += 1;
            println!("{}", summary(&mower));
        } else {
            log::info!("No update from {} in {}s", mower.name(), IDLE_NOTICE.as_secs());
        }
    }
    Ok(())
}
