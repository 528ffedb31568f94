//! Mower model: telemetry decoding, state, schedules and command payloads.

pub mod codes;
pub mod commands;
mod decode;
pub mod device;
pub mod payload;
pub mod schedule;
pub mod state;

pub use commands::{Action, CommandError};
pub use device::Mower;
pub use payload::Envelope;
pub use schedule::{Schedule, ScheduleSlot, Week};
pub use state::MowerState;
