use std::time::{Duration, Instant};

use chrono::{Utc, Weekday};

use crate::helpers::RateLimiter;
use crate::interfaces::http_api::Product;
use crate::interfaces::mqtt::{CommandSink, MqttError, MqttEvent};

use super::commands::{self, Action, CommandError};
use super::payload::Envelope;
use super::schedule::{Schedule, ScheduleSlot};
use super::state::MowerState;

/// One mower: its cloud identity, decoded state and command channel.
///
/// Telemetry arrives on the network thread and is applied only when the
/// caller drains it, so the state never changes underneath a `&self` borrow.
pub struct Mower {
    product: Product,
    state: MowerState,
    sink: Box<dyn CommandSink>,
    events: flume::Receiver<MqttEvent>,
    poll_limiter: RateLimiter,
    connected: bool,
}

impl Mower {
    pub fn new(
        product: Product,
        state: MowerState,
        sink: Box<dyn CommandSink>,
        events: flume::Receiver<MqttEvent>,
        poll_limiter: RateLimiter,
    ) -> Self {
        Mower {
            product,
            state,
            sink,
            events,
            poll_limiter,
            connected: false,
        }
    }

    pub fn serial(&self) -> &str {
        &self.product.serial_number
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn state(&self) -> &MowerState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Apply every event already queued; returns how many telemetry updates were applied.
    pub fn process_pending(&mut self) -> usize {
        let pending: Vec<MqttEvent> = self.events.try_iter().collect();
        pending
            .into_iter()
            .filter(|event| self.handle_event(event))
            .count()
    }

    /// Block until a telemetry update is applied or `timeout` passes.
    /// Returns `Ok(false)` on timeout.
    pub fn wait_for_update(&mut self, timeout: Duration) -> Result<bool, MqttError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.events.recv_deadline(deadline) {
                Ok(event) => {
                    if self.handle_event(&event) {
                        return Ok(true);
                    }
                }
                Err(flume::RecvTimeoutError::Timeout) => return Ok(false),
                Err(flume::RecvTimeoutError::Disconnected) => return Err(MqttError::Closed),
            }
        }
    }

    /// Block until the broker accepts the connection or `timeout` passes.
    pub fn wait_for_connection(&mut self, timeout: Duration) -> Result<bool, MqttError> {
        let deadline = Instant::now() + timeout;
        while !self.connected {
            match self.events.recv_deadline(deadline) {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(flume::RecvTimeoutError::Timeout) => return Ok(false),
                Err(flume::RecvTimeoutError::Disconnected) => return Err(MqttError::Closed),
            }
        }
        Ok(true)
    }

    /// Returns whether the event carried a telemetry update.
    fn handle_event(&mut self, event: &MqttEvent) -> bool {
        match event {
            MqttEvent::Connected => {
                log::info!("{} online via MQTT", self.serial());
                self.connected = true;
                false
            }
            MqttEvent::Disconnected(reason) => {
                if self.connected {
                    log::warn!("{} lost MQTT connection: {reason}", self.serial());
                }
                self.connected = false;
                false
            }
            MqttEvent::Message(msg) if msg.topic == self.product.mqtt_topics.command_out => {
                match Envelope::parse(&msg.payload) {
                    Ok(envelope) => {
                        self.apply(&envelope);
                        true
                    }
                    Err(e) => {
                        log::warn!("Discarding telemetry from {}: {e}", self.serial());
                        false
                    }
                }
            }
            MqttEvent::Message(msg) => {
                log::debug!("Ignoring message on unexpected topic {}", msg.topic);
                false
            }
        }
    }

    pub fn apply(&mut self, envelope: &Envelope) {
        self.state.apply(envelope, Utc::now());
        log::debug!(
            "{} status: {} / error: {}",
            self.serial(),
            self.state.status.description,
            self.state.error.description
        );
    }

    fn send(&mut self, payload: &str) -> Result<(), CommandError> {
        let topic = self.product.mqtt_topics.command_in.clone();
        self.sink.publish(&topic, payload)?;
        Ok(())
    }

    pub fn perform(&mut self, action: Action) -> Result<(), CommandError> {
        log::info!("Sending {action} to {}", self.serial());
        self.send(&action.payload())
    }

    pub fn start(&mut self) -> Result<(), CommandError> {
        self.perform(Action::Start)
    }

    pub fn pause(&mut self) -> Result<(), CommandError> {
        self.perform(Action::Pause)
    }

    pub fn home(&mut self) -> Result<(), CommandError> {
        self.perform(Action::Home)
    }

    pub fn set_locked(&mut self, locked: bool) -> Result<(), CommandError> {
        self.perform(if locked { Action::Lock } else { Action::Unlock })
    }

    /// Request fresh telemetry; limited to the configured poll rate.
    pub fn poll(&mut self) -> Result<(), CommandError> {
        self.poll_limiter.try_acquire()?;
        log::debug!("Polling {}", self.serial());
        self.send(&commands::poll())
    }

    pub fn set_zone(&mut self, zone: u8) -> Result<(), CommandError> {
        let payload = commands::zone_rotation(&self.state.zones.rotation, self.state.zones.index, zone)?;
        log::info!("Selecting zone {zone} on {}", self.serial());
        self.send(&payload)
    }

    pub fn set_rain_delay(&mut self, minutes: u32) -> Result<(), CommandError> {
        self.send(&commands::rain_delay(minutes)?)
    }

    pub fn set_torque(&mut self, percent: i32) -> Result<(), CommandError> {
        if !self.state.capabilities.torque {
            return Err(CommandError::Unsupported {
                serial: self.serial().to_string(),
                feature: "torque adjustment",
            });
        }
        self.send(&commands::torque(percent)?)
    }

    pub fn set_time_variation(&mut self, percent: i32) -> Result<(), CommandError> {
        self.send(&commands::time_variation(percent)?)
    }

    pub fn set_schedule_enabled(&mut self, enabled: bool) -> Result<(), CommandError> {
        self.send(&commands::schedule_enabled(enabled))
    }

    pub fn set_party_mode(&mut self, enabled: bool) -> Result<(), CommandError> {
        if !self.state.capabilities.party_mode {
            return Err(CommandError::NoPartymode(self.serial().to_string()));
        }
        self.send(&commands::party_mode(enabled))
    }

    pub fn one_time_schedule(&mut self, boundary: bool, minutes: u32) -> Result<(), CommandError> {
        if !self.state.capabilities.one_time_schedule {
            return Err(CommandError::NoOneTimeSchedule(self.serial().to_string()));
        }
        self.send(&commands::one_time_schedule(boundary, minutes)?)
    }

    pub fn edge_cut(&mut self) -> Result<(), CommandError> {
        if !self.state.capabilities.one_time_schedule {
            return Err(CommandError::NoOneTimeSchedule(self.serial().to_string()));
        }
        self.send(&commands::edge_cut())
    }

    /// Replace the weekly schedule(s) on the mower.
    pub fn set_schedule(&mut self, schedule: &Schedule) -> Result<(), CommandError> {
        if schedule.secondary.is_some() && !self.state.capabilities.secondary_schedule {
            return Err(CommandError::Unsupported {
                serial: self.serial().to_string(),
                feature: "a secondary schedule",
            });
        }
        self.send(&commands::schedule(
            &schedule.primary,
            schedule.secondary.as_ref(),
        ))
    }

    /// Change a single day of the current schedule, keeping everything else.
    pub fn set_schedule_slot(
        &mut self,
        day: Weekday,
        slot: ScheduleSlot,
        secondary: bool,
    ) -> Result<(), CommandError> {
        let mut schedule = self.state.schedule.clone();
        if secondary {
            if !self.state.capabilities.secondary_schedule {
                return Err(CommandError::Unsupported {
                    serial: self.serial().to_string(),
                    feature: "a secondary schedule",
                });
            }
            schedule
                .secondary
                .get_or_insert_with(Default::default)
                .set_day(day, slot);
        } else {
            schedule.primary.set_day(day, slot);
        }
        self.set_schedule(&schedule)
    }
}
