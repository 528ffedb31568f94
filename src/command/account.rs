use anyhow::Result;
use serde_json::json;

use super::{cloud_client, print_json};

pub fn login() -> Result<()> {
    let mut cloud = cloud_client()?;
    let token = cloud.authenticate()?;
    log::info!(
        "Logged in to {}; session valid until {}",
        cloud.config().cloud.brand,
        token.expires_at
    );
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut cloud = cloud_client()?;
    if cloud.logout()? {
        log::info!("Stored session removed");
    } else {
        log::info!("No stored session");
    }
    Ok(())
}

pub fn devices() -> Result<()> {
    let mut cloud = cloud_client()?;
    let listing: Vec<_> = cloud
        .devices()?
        .into_iter()
        .map(|p| {
            json!({
                "serial_number": p.serial_number,
                "name": p.name,
                "online": p.online,
                "firmware": p.firmware_version.map(|fw| fw.to_string()),
            })
        })
        .collect();
    print_json(&listing)
}
