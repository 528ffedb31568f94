//! Applies telemetry envelopes onto [`MowerState`].
//!
//! Each present section overwrites the matching part of the state; sections
//! the mower did not send are left as they were.

use chrono::{DateTime, Utc};

use crate::helpers::parse_device_clock;

use super::payload::{ConfigData, Envelope, LiveData, LiveModules, ScheduleData};
use super::schedule::Week;
use super::state::{CodeState, Location, MowerState, OffLimits, Orientation, Ultrasonic};

impl MowerState {
    pub fn apply(&mut self, envelope: &Envelope, received: DateTime<Utc>) {
        if let Some(dat) = &envelope.dat {
            self.apply_live(dat);
        }
        if let Some(cfg) = &envelope.cfg {
            self.apply_config(cfg);
        }
        if envelope.dat.is_some() || envelope.cfg.is_some() {
            self.updated = Some(received);
        }
    }

    fn apply_live(&mut self, dat: &LiveData) {
        if let Some(mac) = &dat.mac {
            self.mac_address = Some(mac.clone());
        }
        if let Some(fw) = &dat.fw {
            self.firmware = Some(fw.to_string());
        }
        if let Some(conn) = &dat.conn {
            self.connection = Some(conn.clone());
        }
        if dat.rsi.is_some() {
            self.wifi_rssi = dat.rsi;
        }
        if let Some(ls) = dat.ls {
            self.status = CodeState::status(ls);
        }
        if let Some(le) = dat.le {
            self.error = CodeState::error(le);
        }
        if let Some(lk) = dat.lk {
            self.locked = lk != 0;
        }
        if let Some(lz) = dat.lz {
            self.zones.index = lz;
            self.refresh_current_zone();
        }

        if let Some(bt) = &dat.bt {
            self.battery.temperature = bt.t;
            self.battery.voltage = bt.v;
            self.battery.percent = bt.p;
            self.battery.charge_cycles = bt.nr;
            self.battery.charging = bt.c.is_some_and(|c| c != 0);
            self.battery.maintenance = bt.m;
        }

        if let Some(dmp) = &dat.dmp {
            if let [pitch, roll, yaw, ..] = dmp.as_slice() {
                self.orientation = Orientation {
                    pitch: *pitch,
                    roll: *roll,
                    yaw: *yaw,
                };
            } else {
                log::warn!("Ignoring orientation with {} values", dmp.len());
            }
        }

        if let Some(st) = &dat.st {
            self.statistics.blade_time_minutes = st.b;
            self.statistics.blade_time_since_reset_minutes = st.bl;
            self.statistics.distance_metres = st.d;
            self.statistics.work_time_minutes = st.wt;
        }

        if let Some(rain) = &dat.rain {
            self.rain.remaining_minutes = rain.cnt;
            self.rain.triggered = rain.s.is_some_and(|s| s != 0);
        }

        if let Some(modules) = &dat.modules {
            self.apply_modules(modules);
        }
    }

    fn apply_modules(&mut self, modules: &LiveModules) {
        if let Some(four_g) = &modules.four_g {
            self.capabilities.gps = true;
            self.location = match four_g.gps.as_ref().map(|g| &g.coo[..]) {
                Some([latitude, longitude, ..]) => Some(Location {
                    latitude: *latitude,
                    longitude: *longitude,
                }),
                _ => None,
            };
        }
        if let Some(df) = &modules.off_limits {
            self.capabilities.off_limits = true;
            self.off_limits = Some(OffLimits {
                enabled: df.cut.is_some_and(|v| v != 0),
                shortcuts: df.fh.is_some_and(|v| v != 0),
            });
        }
        if let Some(us) = &modules.ultrasonic {
            self.capabilities.ultrasonic = true;
            self.ultrasonic = Some(Ultrasonic {
                enabled: us.enabled.is_some_and(|v| v != 0),
                status: us.stat.clone(),
            });
        }
    }

    fn apply_config(&mut self, cfg: &ConfigData) {
        if let Some(sn) = &cfg.sn {
            self.serial_number = Some(sn.clone());
        }
        if let Some(lg) = &cfg.lg {
            self.language = Some(lg.clone());
        }
        if let (Some(dt), Some(tm)) = (&cfg.dt, &cfg.tm) {
            self.device_clock = parse_device_clock(dt, tm);
            if self.device_clock.is_none() {
                log::warn!("Unparseable device clock '{dt} {tm}'");
            }
        }
        if cfg.rd.is_some() {
            self.rain.delay_minutes = cfg.rd;
        }
        if let Some(tq) = cfg.tq {
            self.torque = Some(tq);
            self.capabilities.torque = true;
        }
        if let Some(mz) = &cfg.mz {
            self.zones.starting_points = mz.clone();
        }
        if let Some(mzv) = &cfg.mzv {
            self.zones.rotation = mzv.clone();
            self.refresh_current_zone();
        }
        if let Some(sc) = &cfg.sc {
            self.apply_schedule(sc);
        }
    }

    fn apply_schedule(&mut self, sc: &ScheduleData) {
        // Capabilities are only ever learned; a partial echo that omits a tag
        // says nothing about the model.
        if sc.distm.is_some() {
            self.capabilities.party_mode = true;
        }
        if sc.ots.is_some() {
            self.capabilities.one_time_schedule = true;
        }
        if sc.dd.is_some() {
            self.capabilities.secondary_schedule = true;
        }

        if let Some(m) = sc.m {
            // m: 0 = off, 1 = on, 2 = on with party mode. Party mode pauses
            // the schedule without disabling it, so the schedule stays active.
            self.schedule.active = m != 0;
            self.schedule.party_mode = m == 2 || sc.distm.is_some_and(|d| d != 0);
        } else if let Some(distm) = sc.distm {
            self.schedule.party_mode = distm != 0;
        }
        if let Some(p) = sc.p {
            self.schedule.time_variation = p;
        }
        if let Some(d) = &sc.d {
            match Week::from_raw(d) {
                Ok(week) => self.schedule.primary = week,
                Err(e) => log::warn!("Ignoring primary schedule: {e}"),
            }
        }
        if let Some(dd) = &sc.dd {
            match Week::from_raw(dd) {
                Ok(week) => self.schedule.secondary = Some(week),
                Err(e) => log::warn!("Ignoring secondary schedule: {e}"),
            }
        }
    }

    fn refresh_current_zone(&mut self) {
        self.zones.current = self.zones.rotation.get(self.zones.index).copied();
    }
}
