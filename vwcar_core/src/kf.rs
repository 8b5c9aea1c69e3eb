//! Constant-gain Kalman smoother for vehicle speed.
//!
//! State is `x = [v, a]`. The gain was computed offline for the 100 Hz loop,
//! so there is no covariance update at runtime.

use vwcar_traits::SpeedFilter;

use crate::util::DT_CTRL;

/// Steady-state gain for `R = 1e3`, `Q = diag(10, 100)` at `DT_CTRL`.
const GAIN: [f64; 2] = [0.174_060_39, 1.659_256_47];

/// Raw speed jump (m/s) that resets the filter instead of smoothing.
const RESET_JUMP: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct KalmanSpeedFilter {
    x: [f64; 2],
    dt: f64,
}

impl Default for KalmanSpeedFilter {
    fn default() -> Self {
        Self::new(DT_CTRL)
    }
}

impl KalmanSpeedFilter {
    pub const fn new(dt: f64) -> Self {
        Self { x: [0.0, 0.0], dt }
    }

    pub const fn state(&self) -> (f64, f64) {
        (self.x[0], self.x[1])
    }
}

impl SpeedFilter for KalmanSpeedFilter {
    fn update(&mut self, v_ego_raw: f64) -> (f64, f64) {
        if (v_ego_raw - self.x[0]).abs() > RESET_JUMP {
            self.x = [v_ego_raw, 0.0];
        }
        // predict
        let v = self.x[0] + self.dt * self.x[1];
        let a = self.x[1];
        // correct
        let innovation = v_ego_raw - v;
        self.x = [v + GAIN[0] * innovation, a + GAIN[1] * innovation];
        (self.x[0], self.x[1])
    }
}
