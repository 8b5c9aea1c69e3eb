//! `From` implementations bridging `vwcar_config` types to `vwcar_core` types.

use crate::button_emulator::ButtonEmulatorCfg;
use crate::lead::LeadDistanceCfg;
use crate::params::{CarParams, ControllerParams, NetworkLocation, Platform, RadarMode, Transmission};
use crate::util::MPH_TO_KPH;

// ── Enums ────────────────────────────────────────────────────────────────────

impl From<&vwcar_config::Platform> for Platform {
    fn from(p: &vwcar_config::Platform) -> Self {
        match p {
            vwcar_config::Platform::Mqb => Self::Mqb,
            vwcar_config::Platform::Pq => Self::Pq,
            vwcar_config::Platform::Meb => Self::Meb,
        }
    }
}

impl From<&vwcar_config::Transmission> for Transmission {
    fn from(t: &vwcar_config::Transmission) -> Self {
        match t {
            vwcar_config::Transmission::Automatic => Self::Automatic,
            vwcar_config::Transmission::Manual => Self::Manual,
            vwcar_config::Transmission::Direct => Self::Direct,
        }
    }
}

impl From<&vwcar_config::NetworkLocation> for NetworkLocation {
    fn from(n: &vwcar_config::NetworkLocation) -> Self {
        match n {
            vwcar_config::NetworkLocation::FwdCamera => Self::FwdCamera,
            vwcar_config::NetworkLocation::Gateway => Self::Gateway,
        }
    }
}

impl From<&vwcar_config::RadarMode> for RadarMode {
    fn from(r: &vwcar_config::RadarMode) -> Self {
        match r {
            vwcar_config::RadarMode::Acc => Self::Acc,
            vwcar_config::RadarMode::CruiseOnly => Self::CruiseOnly,
            vwcar_config::RadarMode::CruiseOnlyNoRadar => Self::CruiseOnlyNoRadar,
        }
    }
}

// ── CarParams ────────────────────────────────────────────────────────────────

impl From<&vwcar_config::CarCfg> for CarParams {
    fn from(c: &vwcar_config::CarCfg) -> Self {
        Self {
            platform: Platform::from(&c.platform),
            transmission: Transmission::from(&c.transmission),
            network_location: NetworkLocation::from(&c.network_location),
            radar: RadarMode::from(&c.radar),
            enable_bsm: c.enable_bsm,
            openpilot_longitudinal: c.openpilot_longitudinal,
            pcm_cruise: c.pcm_cruise,
            pcm_cruise_speed: c.pcm_cruise_speed,
            stock_hca_present: c.stock_hca_present,
            v_ego_stopping: f64::from(c.v_ego_stopping),
        }
    }
}

// ── ControllerParams ─────────────────────────────────────────────────────────

impl ControllerParams {
    /// Apply the optional `[limits]` overrides on top of platform defaults.
    pub fn with_overrides(mut self, l: &vwcar_config::LimitsCfg) -> Self {
        if let Some(v) = l.accel_max {
            self.accel_max = f64::from(v);
        }
        if let Some(v) = l.accel_min {
            self.accel_min = f64::from(v);
        }
        if let Some(v) = l.steer_max {
            self.steer.steer_max = v;
        }
        if let Some(v) = l.steer_delta_up {
            self.steer.delta_up = v;
        }
        if let Some(v) = l.steer_delta_down {
            self.steer.delta_down = v;
        }
        if let Some(v) = l.steer_driver_allowance {
            self.steer.driver_allowance = v;
        }
        if let Some(v) = l.steer_time_stuck_torque_s {
            self.steer.time_stuck_torque_s = f64::from(v);
        }
        if let Some(v) = l.steer_time_alert_s {
            self.steer.time_alert_s = f64::from(v);
        }
        self
    }
}

// ── ButtonEmulatorCfg ────────────────────────────────────────────────────────

impl From<&vwcar_config::ButtonsCfg> for ButtonEmulatorCfg {
    fn from(c: &vwcar_config::ButtonsCfg) -> Self {
        Self {
            press_cap: c.press_cap,
            hold_interval: c.hold_interval,
            large_step: f64::from(c.large_step),
            min_streak: c.min_streak,
            unresponsive_sends: c.unresponsive_sends,
            debounce_frames: c.debounce_frames,
            gap_debounce_frames: c.gap_debounce_frames,
            curve_hysteresis_kph: f64::from(c.curve_hysteresis_mph) * MPH_TO_KPH,
            curve_offset_kph: f64::from(c.curve_offset_mph) * MPH_TO_KPH,
        }
    }
}

// ── LeadDistanceCfg ──────────────────────────────────────────────────────────

impl From<&vwcar_config::LeadCfg> for LeadDistanceCfg {
    fn from(c: &vwcar_config::LeadCfg) -> Self {
        Self {
            upscaled_marker: c.upscaled_marker,
            marker: c.marker,
            max_distance_m: f64::from(c.max_distance_m),
            ..Self::default()
        }
    }
}
