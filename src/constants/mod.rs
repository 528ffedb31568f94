pub mod clouds;
pub mod defaults;
pub mod envvars;
pub mod keys;

pub use clouds::{CloudEndpoints, CLOUDS};
