//! Actuation limiter: torque (MQB/PQ), curvature and steering power (MEB).
//!
//! The free functions are pure. The state structs own the counters that
//! have to persist between steer frames and document when they reset.

use crate::params::{CurvatureLimits, SteerLimits};
use crate::util::{clip, finite_or_zero, frames_for, interp};

/// Lowest speed used when turning yaw rate into curvature.
const MIN_CURVATURE_SPEED: f64 = 0.1;

/// Curvature the car is currently driving, 1/m.
#[inline]
pub fn current_curvature(yaw_rate: f64, v_ego_raw: f64) -> f64 {
    -finite_or_zero(yaw_rate) / v_ego_raw.max(MIN_CURVATURE_SPEED)
}

// ── Torque ───────────────────────────────────────────────────────────────────

/// Driver-override window, then asymmetric rate limit. Result is rounded
/// half-to-even.
pub fn apply_driver_steer_torque_limits(
    apply_torque: i32,
    apply_torque_last: i32,
    driver_torque: f64,
    lim: &SteerLimits,
) -> i32 {
    let steer_max = f64::from(lim.steer_max);
    let allowance = f64::from(lim.driver_allowance);
    let factor = f64::from(lim.driver_factor);
    let mult = f64::from(lim.driver_multiplier);
    let up = f64::from(lim.delta_up);
    let down = f64::from(lim.delta_down);
    let last = f64::from(apply_torque_last);
    let driver = finite_or_zero(driver_torque);

    let driver_max = steer_max + (allowance + driver * factor) * mult;
    let driver_min = -steer_max + (-allowance + driver * factor) * mult;
    let max_allowed = steer_max.min(driver_max).max(0.0);
    let min_allowed = (-steer_max).max(driver_min).min(0.0);

    let mut torque = clip(f64::from(apply_torque), min_allowed, max_allowed);
    torque = if apply_torque_last > 0 {
        clip(torque, (last - down).max(-up), last + up)
    } else {
        clip(torque, last - up, (last + down).min(up))
    };
    torque.round_ties_even() as i32
}

/// Result of one torque steer frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TorqueCommand {
    pub apply_steer: i32,
    pub hca_enabled: bool,
    /// Continuous assist is close to the rack's hard limit.
    pub soft_disable_alert: bool,
}

/// Persistent torque limiter counters. Everything resets when assist is
/// not active; `active_frames` also resets on any zero-torque frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SteeringLimiterState {
    pub last_torque: i32,
    pub same_torque_frames: u64,
    pub active_frames: u64,
}

impl SteeringLimiterState {
    /// `steer` is the planner's normalized request in [-1, 1].
    pub fn step(
        &mut self,
        lat_active: bool,
        steer: f64,
        driver_torque: f64,
        lim: &SteerLimits,
        steer_step: u64,
    ) -> TorqueCommand {
        let mut apply = 0;
        if lat_active {
            let requested =
                (clip(finite_or_zero(steer), -1.0, 1.0) * f64::from(lim.steer_max)).round_ties_even()
                    as i32;
            apply = apply_driver_steer_torque_limits(requested, self.last_torque, driver_torque, lim);
            self.active_frames += steer_step;
            if apply == self.last_torque {
                self.same_torque_frames += steer_step;
                if self.same_torque_frames > frames_for(lim.time_stuck_torque_s) {
                    apply -= apply.signum();
                    self.same_torque_frames = 0;
                    tracing::debug!(apply, "stuck torque nudge");
                }
            } else {
                self.same_torque_frames = 0;
            }
        } else {
            self.same_torque_frames = 0;
        }

        let hca_enabled = apply != 0;
        if !hca_enabled {
            // the rack restarts its own timer after one frame of HCA off
            self.active_frames = 0;
        }
        self.last_torque = apply;
        TorqueCommand {
            apply_steer: apply,
            hca_enabled,
            soft_disable_alert: self.active_frames > frames_for(lim.time_alert_s),
        }
    }
}

// ── Curvature ────────────────────────────────────────────────────────────────

/// Speed-interpolated rate limit: the wind-up table when the request grows
/// away from zero on the same side, the wind-down table otherwise.
pub fn apply_std_steer_angle_limits(
    apply: f64,
    apply_last: f64,
    v_ego_raw: f64,
    lim: &CurvatureLimits,
) -> f64 {
    let apply = finite_or_zero(apply);
    let steer_up = apply_last * apply >= 0.0 && apply.abs() > apply_last.abs();
    let table = if steer_up { &lim.rate_up } else { &lim.rate_down };
    let rate = interp(v_ego_raw, &table.speed_bp, &table.rate_v);
    clip(apply, apply_last - rate, apply_last + rate)
}

/// Ramps the EPS assist authority. Never moves more than `power_step` per
/// steer frame; after deactivation it only decreases until it reaches 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SteeringPowerState {
    pub last_power: i32,
}

impl SteeringPowerState {
    /// Speed and curvature-error dependent target, clipped to the power range.
    pub fn target(apply_curvature: f64, current: f64, v_ego_raw: f64, lim: &CurvatureLimits) -> i32 {
        let min = f64::from(lim.power_min);
        let max = f64::from(lim.power_max);
        let floor = interp(v_ego_raw, &[0.0, lim.power_max_by_speed], &[min, max]);
        let error = (apply_curvature - current).abs() + apply_curvature.abs();
        clip(floor + lim.curvature_power_factor * error, min, max).round() as i32
    }

    pub fn step(
        &mut self,
        lat_active: bool,
        apply_curvature: f64,
        current: f64,
        v_ego_raw: f64,
        steering_pressed: bool,
        lim: &CurvatureLimits,
    ) -> i32 {
        let prev = self.last_power;
        let step = lim.power_step;
        let power = if lat_active {
            let target = Self::target(apply_curvature, current, v_ego_raw, lim);
            if prev < lim.power_min {
                // just activated
                (prev + step).min(lim.power_min)
            } else if steering_pressed && prev > lim.power_min {
                (prev - step).max(lim.power_min)
            } else if prev < target {
                (prev + step).min(target)
            } else {
                (prev - step).max(target)
            }
        } else {
            (prev - step).max(0)
        };
        self.last_power = power;
        power
    }
}

/// Result of one curvature steer frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurvatureCommand {
    pub apply_curvature: f64,
    pub hca_enabled: bool,
    pub power: i32,
    pub power_boost: bool,
}

/// MEB lateral state. `last_curvature` follows whatever was sent, so it
/// tracks the measured curvature while power ramps out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurvatureLimiterState {
    pub last_curvature: f64,
    pub power: SteeringPowerState,
}

impl CurvatureLimiterState {
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        lat_active: bool,
        desired: f64,
        v_ego_raw: f64,
        yaw_rate: f64,
        steering_pressed: bool,
        lim: &CurvatureLimits,
    ) -> CurvatureCommand {
        let current = current_curvature(yaw_rate, v_ego_raw);
        let max = lim.curvature_max;
        let (apply, hca_enabled) = if lat_active {
            let mut c = apply_std_steer_angle_limits(desired, self.last_curvature, v_ego_raw, lim);
            c = clip(c, -max, max);
            if steering_pressed {
                // roughly follow the driver
                c = clip(c, current - lim.curvature_error, current + lim.curvature_error);
                c = clip(c, -max, max);
            }
            (c, true)
        } else if self.power.last_power > 0 {
            // keep HCA alive and synced to the wheel until power is gone
            (clip(current, -max, max), true)
        } else {
            (0.0, false)
        };

        let power = self
            .power
            .step(lat_active, apply, current, v_ego_raw, steering_pressed, lim);
        self.last_curvature = apply;
        CurvatureCommand {
            apply_curvature: apply,
            hca_enabled,
            power,
            power_boost: power == lim.power_max,
        }
    }
}
