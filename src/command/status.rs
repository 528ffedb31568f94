use anyhow::Result;
use serde_json::json;

use landroid::diagnostics;
use landroid::mower::codes::{ERROR_CODES, STATUS_CODES};

use super::{cloud_client, print_json};
use crate::argsets::SerialArgs;

pub fn status(args: SerialArgs) -> Result<()> {
    let mut cloud = cloud_client()?;
    let (_, state) = cloud.status(&args.serial)?;
    print_json(&state)
}

pub fn diagnostics(args: SerialArgs) -> Result<()> {
    let mut cloud = cloud_client()?;
    let (product, state) = cloud.status(&args.serial)?;
    print_json(&diagnostics::report(&product, &state)?)
}

pub fn codes() -> Result<()> {
    print_json(&json!({
        "status": &*STATUS_CODES,
        "error": &*ERROR_CODES,
    }))
}
