pub mod cloud;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod helpers;
pub mod interfaces;
pub mod mower;

pub use cloud::{CloudClient, CloudError};
pub use config::Config;
