//! Session parameters and per-platform controller limit tables.
//!
//! `CarParams` is fixed for a session. `ControllerParams` carries the limit
//! tables the actuation limiter and the control law run against; defaults come
//! from [`ControllerParams::for_platform`] and can be overridden from config.

use vwcar_traits::Bus;

/// Vehicle platform generation. Selects codec table, decode and encode routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Mqb,
    Pq,
    Meb,
}

impl Platform {
    pub const fn name(self) -> &'static str {
        match self {
            Platform::Mqb => "mqb",
            Platform::Pq => "pq",
            Platform::Meb => "meb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transmission {
    #[default]
    Automatic,
    Manual,
    Direct,
}

/// Where the harness sits: behind the forward camera or at the CAN gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkLocation {
    #[default]
    FwdCamera,
    Gateway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadarMode {
    #[default]
    Acc,
    CruiseOnly,
    CruiseOnlyNoRadar,
}

impl RadarMode {
    pub const fn has_radar(self) -> bool {
        !matches!(self, RadarMode::CruiseOnlyNoRadar)
    }
}

/// Session configuration supplied at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CarParams {
    pub platform: Platform,
    pub transmission: Transmission,
    pub network_location: NetworkLocation,
    pub radar: RadarMode,
    pub enable_bsm: bool,
    pub openpilot_longitudinal: bool,
    pub pcm_cruise: bool,
    pub pcm_cruise_speed: bool,
    pub stock_hca_present: bool,
    pub v_ego_stopping: f64,
}

impl CarParams {
    /// Defaults for a stock-longitudinal car with an ACC radar.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            transmission: Transmission::Automatic,
            network_location: NetworkLocation::FwdCamera,
            radar: RadarMode::Acc,
            enable_bsm: false,
            openpilot_longitudinal: false,
            pcm_cruise: true,
            pcm_cruise_speed: true,
            stock_hca_present: false,
            v_ego_stopping: 0.5,
        }
    }

    /// Bus carrying the radar, BSM and the GRA stalk we forward to.
    pub const fn ext_bus(&self) -> Bus {
        match self.network_location {
            NetworkLocation::FwdCamera => Bus::Pt,
            NetworkLocation::Gateway => Bus::Cam,
        }
    }
}

/// Torque limits for the MQB/PQ racks.
#[derive(Debug, Clone, PartialEq)]
pub struct SteerLimits {
    pub steer_max: i32,
    pub delta_up: i32,
    pub delta_down: i32,
    pub driver_allowance: i32,
    pub driver_multiplier: i32,
    pub driver_factor: i32,
    /// Unchanged torque for longer than this gets nudged toward zero.
    pub time_stuck_torque_s: f64,
    /// Continuous assist longer than this raises the soft-disable advisory.
    pub time_alert_s: f64,
}

/// Speed-interpolated curvature rate table (1/m per steer frame).
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub speed_bp: Vec<f64>,
    pub rate_v: Vec<f64>,
}

/// Curvature and steering power limits for the MEB rack.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvatureLimits {
    pub curvature_max: f64,
    pub curvature_error: f64,
    pub rate_up: RateTable,
    pub rate_down: RateTable,
    pub power_max: i32,
    pub power_min: i32,
    pub power_step: i32,
    /// Speed (m/s) at which the minimum power floor reaches `power_max`.
    pub power_max_by_speed: f64,
    pub curvature_power_factor: f64,
}

/// Cadences and limits the control law runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerParams {
    pub steer_step: u64,
    pub acc_control_step: u64,
    pub acc_hud_step: u64,
    pub ldw_step: u64,
    pub btn_step: u64,
    pub accel_max: f64,
    pub accel_min: f64,
    pub steer: SteerLimits,
    pub curvature: CurvatureLimits,
    /// LDW text code for "take over steering".
    pub ldw_take_over_code: f64,
}

impl ControllerParams {
    pub fn for_platform(platform: Platform) -> Self {
        let delta_up = match platform {
            Platform::Pq => 6,
            Platform::Mqb | Platform::Meb => 4,
        };
        Self {
            steer_step: 2,
            acc_control_step: 2,
            acc_hud_step: 4,
            ldw_step: 10,
            btn_step: 3,
            accel_max: 2.0,
            accel_min: -3.5,
            steer: SteerLimits {
                steer_max: 300,
                delta_up,
                delta_down: 10,
                driver_allowance: 80,
                driver_multiplier: 3,
                driver_factor: 1,
                time_stuck_torque_s: 6.0,
                time_alert_s: 350.0,
            },
            curvature: CurvatureLimits {
                curvature_max: 0.195,
                curvature_error: 0.002,
                rate_up: RateTable {
                    speed_bp: vec![0.0, 5.0, 25.0],
                    rate_v: vec![0.0012, 0.0003, 0.00005],
                },
                rate_down: RateTable {
                    speed_bp: vec![0.0, 5.0, 25.0],
                    rate_v: vec![0.0014, 0.0004, 0.0001],
                },
                power_max: 125,
                power_min: 30,
                power_step: 5,
                power_max_by_speed: 20.0,
                curvature_power_factor: 1000.0,
            },
            ldw_take_over_code: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pq_rises_faster() {
        assert_eq!(ControllerParams::for_platform(Platform::Pq).steer.delta_up, 6);
        assert_eq!(ControllerParams::for_platform(Platform::Mqb).steer.delta_up, 4);
    }

    #[test]
    fn ext_bus_follows_network_location() {
        let mut cp = CarParams::new(Platform::Mqb);
        assert_eq!(cp.ext_bus(), Bus::Pt);
        cp.network_location = NetworkLocation::Gateway;
        assert_eq!(cp.ext_bus(), Bus::Cam);
    }
}
