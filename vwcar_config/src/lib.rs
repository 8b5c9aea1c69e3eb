#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Session configuration schema for the VW translation layer.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Everything here is fixed for a session; nothing is reloaded per tick.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mqb,
    Pq,
    Meb,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    #[default]
    Automatic,
    Manual,
    Direct,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkLocation {
    #[default]
    FwdCamera,
    Gateway,
}

/// Which radar the car carries and whether it runs ACC.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RadarMode {
    #[default]
    Acc,
    /// Radar fitted but the car only offers plain cruise control.
    CruiseOnly,
    /// No radar at all, plain cruise control.
    CruiseOnlyNoRadar,
}

#[derive(Debug, Deserialize)]
pub struct CarCfg {
    pub platform: Platform,
    #[serde(default)]
    pub transmission: Transmission,
    #[serde(default)]
    pub network_location: NetworkLocation,
    #[serde(default)]
    pub radar: RadarMode,
    #[serde(default)]
    pub enable_bsm: bool,
    /// This layer owns longitudinal control (sends ACC_06/ACC_07 or MEB_ACC_02).
    #[serde(default)]
    pub openpilot_longitudinal: bool,
    /// The car's own cruise controller engages and regulates speed.
    #[serde(default = "default_true")]
    pub pcm_cruise: bool,
    /// The car's cruise set-speed is owned by the car; when false the
    /// stock-button emulator moves it.
    #[serde(default = "default_true")]
    pub pcm_cruise_speed: bool,
    /// Factory lane assist camera present (HCA_01 on the camera bus).
    #[serde(default)]
    pub stock_hca_present: bool,
    /// Speed below which a Pid phase is treated as starting (m/s).
    #[serde(default = "default_v_ego_stopping")]
    pub v_ego_stopping: f32,
}

fn default_true() -> bool {
    true
}

fn default_v_ego_stopping() -> f32 {
    0.5
}

/// Optional overrides of the platform limit tables.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LimitsCfg {
    pub accel_max: Option<f32>,
    pub accel_min: Option<f32>,
    pub steer_max: Option<i32>,
    pub steer_delta_up: Option<i32>,
    pub steer_delta_down: Option<i32>,
    pub steer_driver_allowance: Option<i32>,
    /// Seconds of unchanged torque before the stuck-torque nudge.
    pub steer_time_stuck_torque_s: Option<f32>,
    /// Seconds of uninterrupted assist before the soft-disable advisory.
    pub steer_time_alert_s: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ButtonsCfg {
    /// Presses per Increase/Decrease cycle before forcing Hold.
    pub press_cap: u32,
    /// Emulator cycles spent in Hold before re-evaluating.
    pub hold_interval: u32,
    /// Display-unit jump per press that identifies resume/set style stalks.
    pub large_step: u32,
    /// Consecutive presses needed before inferring the stalk type.
    pub min_streak: u32,
    /// Sends without any set-speed movement before trying resume/set codes.
    pub unresponsive_sends: u32,
    /// Frames the emulator stays quiet after a real cruise button press.
    pub debounce_frames: u32,
    /// Same, after the distance/gap button.
    pub gap_debounce_frames: u32,
    pub curve_hysteresis_mph: f32,
    pub curve_offset_mph: f32,
}

impl Default for ButtonsCfg {
    fn default() -> Self {
        Self {
            press_cap: 5,
            hold_interval: 7,
            large_step: 10,
            min_streak: 2,
            unresponsive_sends: 10,
            debounce_frames: 40,
            gap_debounce_frames: 300,
            curve_hysteresis_mph: 0.75,
            curve_offset_mph: 2.0,
        }
    }
}

/// Cluster display constants for the lead marker.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LeadCfg {
    /// Marker value for digital clusters (`KBI_Variante` set).
    pub upscaled_marker: u32,
    pub marker: u32,
    /// Largest distance the MEB cluster can draw (m).
    pub max_distance_m: f32,
}

impl Default for LeadCfg {
    fn default() -> Self {
        Self {
            upscaled_marker: 512,
            marker: 8,
            max_distance_m: 140.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub car: CarCfg,
    #[serde(default)]
    pub limits: LimitsCfg,
    #[serde(default)]
    pub buttons: ButtonsCfg,
    #[serde(default)]
    pub lead: LeadCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Car
        if !(self.car.v_ego_stopping.is_finite() && self.car.v_ego_stopping >= 0.0) {
            eyre::bail!("car.v_ego_stopping must be >= 0.0");
        }
        if self.car.v_ego_stopping > 5.0 {
            eyre::bail!("car.v_ego_stopping is unreasonably large (>5 m/s)");
        }
        if self.car.platform == Platform::Pq && self.car.transmission == Transmission::Direct {
            eyre::bail!("car.transmission = \"direct\" is not available on PQ");
        }
        if self.car.platform == Platform::Meb && self.car.transmission != Transmission::Automatic {
            eyre::bail!("car.transmission must be \"automatic\" on MEB");
        }
        if !self.car.pcm_cruise_speed && !self.car.pcm_cruise {
            eyre::bail!("car.pcm_cruise_speed = false requires car.pcm_cruise = true");
        }

        // Limits
        if let Some(v) = self.limits.accel_max
            && !(v.is_finite() && v > 0.0 && v <= 4.0)
        {
            eyre::bail!("limits.accel_max must be in (0.0, 4.0]");
        }
        if let Some(v) = self.limits.accel_min
            && !(v.is_finite() && (-5.0..0.0).contains(&v))
        {
            eyre::bail!("limits.accel_min must be in [-5.0, 0.0)");
        }
        if let Some(v) = self.limits.steer_max
            && !(1..=1023).contains(&v)
        {
            eyre::bail!("limits.steer_max must be in [1, 1023]");
        }
        for (name, v) in [
            ("limits.steer_delta_up", self.limits.steer_delta_up),
            ("limits.steer_delta_down", self.limits.steer_delta_down),
            ("limits.steer_driver_allowance", self.limits.steer_driver_allowance),
        ] {
            if let Some(v) = v
                && v <= 0
            {
                eyre::bail!("{name} must be > 0");
            }
        }
        if let Some(v) = self.limits.steer_time_stuck_torque_s
            && !(v.is_finite() && v > 0.0)
        {
            eyre::bail!("limits.steer_time_stuck_torque_s must be > 0");
        }
        if let Some(v) = self.limits.steer_time_alert_s
            && !(v.is_finite() && v > 0.0)
        {
            eyre::bail!("limits.steer_time_alert_s must be > 0");
        }

        // Buttons
        if self.buttons.press_cap == 0 {
            eyre::bail!("buttons.press_cap must be >= 1");
        }
        if self.buttons.hold_interval == 0 {
            eyre::bail!("buttons.hold_interval must be >= 1");
        }
        if self.buttons.large_step == 0 {
            eyre::bail!("buttons.large_step must be >= 1");
        }
        if self.buttons.min_streak == 0 {
            eyre::bail!("buttons.min_streak must be >= 1");
        }
        if !(self.buttons.curve_hysteresis_mph.is_finite()
            && self.buttons.curve_hysteresis_mph >= 0.0)
        {
            eyre::bail!("buttons.curve_hysteresis_mph must be >= 0.0");
        }
        if !self.buttons.curve_offset_mph.is_finite() {
            eyre::bail!("buttons.curve_offset_mph must be finite");
        }

        // Lead display
        if !(self.lead.max_distance_m.is_finite() && self.lead.max_distance_m > 0.0) {
            eyre::bail!("lead.max_distance_m must be > 0.0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
