//! Type-state builder for [`Session`].
//!
//! `build()` only exists once car params are provided; `try_build()` is
//! always available and reports what is missing at runtime.

use std::marker::PhantomData;

use vwcar_traits::SpeedFilter;

use crate::button_emulator::ButtonEmulatorCfg;
use crate::carstate::CarState;
use crate::codec::subscriptions;
use crate::controller::CarController;
use crate::error::{BuildError, Result};
use crate::lead::LeadDistanceCfg;
use crate::params::{CarParams, ControllerParams, Platform, Transmission};
use crate::radar::MebRadarInterface;
use crate::session::Session;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct SessionBuilder<C> {
    car: Option<CarParams>,
    controller: Option<ControllerParams>,
    lead: Option<LeadDistanceCfg>,
    buttons: Option<ButtonEmulatorCfg>,
    speed_filter: Option<Box<dyn SpeedFilter>>,
    _c: PhantomData<C>,
}

impl Default for SessionBuilder<Missing> {
    fn default() -> Self {
        Self {
            car: None,
            controller: None,
            lead: None,
            buttons: None,
            speed_filter: None,
            _c: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Single place where session parameters are checked and the parts wired up.
fn validate_and_build(
    cp: CarParams,
    ccp: ControllerParams,
    lead: LeadDistanceCfg,
    buttons: ButtonEmulatorCfg,
    speed_filter: Option<Box<dyn SpeedFilter>>,
) -> Result<Session> {
    // ── Car ──────────────────────────────────────────────────────────────────
    if cp.stock_hca_present && cp.platform != Platform::Mqb {
        return Err(invalid("stock_hca_present is only supported on MQB"));
    }
    if cp.platform == Platform::Pq && cp.transmission == Transmission::Direct {
        return Err(invalid("PQ has no direct-drive transmission"));
    }
    if cp.platform == Platform::Meb && cp.transmission != Transmission::Automatic {
        return Err(invalid("MEB transmission must be automatic"));
    }
    if !cp.pcm_cruise_speed && !cp.pcm_cruise {
        return Err(invalid("button emulation requires pcm_cruise"));
    }
    if !(cp.v_ego_stopping.is_finite() && cp.v_ego_stopping >= 0.0) {
        return Err(invalid("v_ego_stopping must be >= 0"));
    }

    // ── Controller ───────────────────────────────────────────────────────────
    if [
        ccp.steer_step,
        ccp.acc_control_step,
        ccp.acc_hud_step,
        ccp.ldw_step,
        ccp.btn_step,
    ]
    .contains(&0)
    {
        return Err(invalid("message steps must be >= 1"));
    }
    if !(ccp.accel_max.is_finite() && ccp.accel_max > 0.0) {
        return Err(invalid("accel_max must be > 0"));
    }
    if !(ccp.accel_min.is_finite() && ccp.accel_min < 0.0) {
        return Err(invalid("accel_min must be < 0"));
    }
    let s = &ccp.steer;
    if s.steer_max <= 0 || s.delta_up <= 0 || s.delta_down <= 0 {
        return Err(invalid("steer_max and steer deltas must be > 0"));
    }
    if s.driver_allowance < 0 || s.driver_multiplier <= 0 || s.driver_factor <= 0 {
        return Err(invalid("driver torque limits must be positive"));
    }
    if !(s.time_stuck_torque_s > 0.0 && s.time_alert_s > 0.0) {
        return Err(invalid("steer timers must be > 0"));
    }
    let c = &ccp.curvature;
    if !(c.curvature_max.is_finite() && c.curvature_max > 0.0) {
        return Err(invalid("curvature_max must be > 0"));
    }
    if c.power_step <= 0 || c.power_min < 0 || c.power_min > c.power_max {
        return Err(invalid("steering power range is inconsistent"));
    }
    for table in [&c.rate_up, &c.rate_down] {
        if table.speed_bp.is_empty() || table.speed_bp.len() != table.rate_v.len() {
            return Err(invalid("curvature rate table is malformed"));
        }
        if table.speed_bp.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("curvature rate breakpoints must ascend"));
        }
    }

    // ── Emulator ─────────────────────────────────────────────────────────────
    if buttons.press_cap == 0 || buttons.hold_interval == 0 {
        return Err(invalid("press_cap and hold_interval must be >= 1"));
    }
    if !(buttons.large_step.is_finite() && buttons.large_step > 0.0) {
        return Err(invalid("large_step must be > 0"));
    }

    // ── Wire up ──────────────────────────────────────────────────────────────
    let subscriptions = subscriptions(&cp);
    let radar = (cp.platform == Platform::Meb && cp.radar.has_radar())
        .then(MebRadarInterface::new);
    let car_state = match speed_filter {
        Some(f) => CarState::with_speed_filter(cp.clone(), f),
        None => CarState::new(cp.clone()),
    };
    tracing::debug!(
        platform = cp.platform.name(),
        long = cp.openpilot_longitudinal,
        emulate_buttons = !cp.pcm_cruise_speed,
        "session built"
    );
    let controller = CarController::new(cp, ccp, lead, buttons);
    Ok(Session {
        car_state,
        controller,
        radar,
        subscriptions,
    })
}

impl<C> SessionBuilder<C> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Session> {
        let cp = self
            .car
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCarParams))?;
        let ccp = self
            .controller
            .unwrap_or_else(|| ControllerParams::for_platform(cp.platform));
        validate_and_build(
            cp,
            ccp,
            self.lead.unwrap_or_default(),
            self.buttons.unwrap_or_default(),
            self.speed_filter,
        )
    }

    /// Override the platform's limit tables.
    pub fn with_controller_params(mut self, ccp: ControllerParams) -> Self {
        self.controller = Some(ccp);
        self
    }

    pub fn with_lead(mut self, lead: LeadDistanceCfg) -> Self {
        self.lead = Some(lead);
        self
    }

    pub fn with_buttons(mut self, buttons: ButtonEmulatorCfg) -> Self {
        self.buttons = Some(buttons);
        self
    }

    /// Replace the default Kalman speed smoother.
    pub fn with_speed_filter(mut self, f: Box<dyn SpeedFilter>) -> Self {
        self.speed_filter = Some(f);
        self
    }
}

impl SessionBuilder<Missing> {
    pub fn with_car_params(self, cp: CarParams) -> SessionBuilder<Set> {
        SessionBuilder {
            car: Some(cp),
            controller: self.controller,
            lead: self.lead,
            buttons: self.buttons,
            speed_filter: self.speed_filter,
            _c: PhantomData,
        }
    }
}

impl SessionBuilder<Set> {
    pub fn build(self) -> Result<Session> {
        self.try_build()
    }
}

impl Session {
    /// Build a session from a validated config file.
    pub fn from_config(cfg: &vwcar_config::Config) -> Result<Session> {
        let cp = CarParams::from(&cfg.car);
        let ccp = ControllerParams::for_platform(cp.platform).with_overrides(&cfg.limits);
        Session::builder()
            .with_car_params(cp)
            .with_controller_params(ccp)
            .with_lead(LeadDistanceCfg::from(&cfg.lead))
            .with_buttons(ButtonEmulatorCfg::from(&cfg.buttons))
            .build()
    }
}
