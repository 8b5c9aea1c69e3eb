//! Per-frame control law: planner request + vehicle state in, CAN frames out.
//!
//! Every cadence is a multiple of the 100 Hz control frame. Nothing here
//! blocks; the planner side-channel is polled and the last snapshot reused
//! when nothing fresh arrived.

use vwcar_traits::{Bus, LongitudinalPlanSp, ParamKey, ParamStore, PlanSource};

use crate::button_emulator::{ButtonEmulator, ButtonEmulatorCfg, EmulatorInput, SpeedLimitArbiter};
use crate::carstate::{GearShifter, VehicleState};
use crate::codec::{ButtonRequest, CanMessage, LaneHud, StockValues, meb, mqb, pq};
use crate::lead::{DistanceBarTimer, LeadDistanceCfg, calculate_lead_distance};
use crate::limits::{CurvatureLimiterState, SteeringLimiterState};
use crate::params::{CarParams, ControllerParams, Platform};
use crate::util::{MS_TO_KPH, clip, finite_or_zero};

/// Planner and radar snapshots are refreshed this often with openpilot
/// longitudinal control.
const PLAN_POLL_STEP: u64 = 5;

// ── Planner request ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LongControlState {
    #[default]
    Off,
    Pid,
    Stopping,
    Starting,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Actuators {
    /// Normalized torque request, [-1, 1].
    pub steer: f64,
    /// 1/m
    pub curvature: f64,
    /// m/s²
    pub accel: f64,
    pub long_control_state: LongControlState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisualAlert {
    #[default]
    None,
    Fcw,
    SteerRequired,
    BrakePressed,
    WrongGear,
    SeatbeltUnbuckled,
    SpeedTooHigh,
    Ldw,
}

impl VisualAlert {
    /// Alerts that map to the lane-assist "take over" text.
    pub const fn wants_take_over(self) -> bool {
        matches!(self, VisualAlert::SteerRequired | VisualAlert::Ldw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HudControl {
    pub visual_alert: VisualAlert,
    pub lead_visible: bool,
    pub lead_distance_bars: u8,
    /// m/s
    pub set_speed: f64,
    pub lanes: LaneHud,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CruiseControl {
    pub cancel: bool,
    pub resume: bool,
    pub override_: bool,
}

/// What the planner asks for this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarControl {
    pub enabled: bool,
    pub lat_active: bool,
    pub long_active: bool,
    pub actuators: Actuators,
    pub hud: HudControl,
    pub cruise_control: CruiseControl,
    /// Desired cruise speed, kph.
    pub v_cruise_kph: f64,
}

// ── Output ───────────────────────────────────────────────────────────────────

/// The actuator values actually sent, for the planner's feedback loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActuatorEcho {
    pub steer: f64,
    pub steer_output_can: i32,
    pub curvature: f64,
    pub accel: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingCommand {
    pub messages: Vec<CanMessage>,
    pub echo: ActuatorEcho,
    /// Uninterrupted torque assist is nearing the rack's time limit.
    pub soft_disable_alert: bool,
}

impl OutgoingCommand {
    pub fn find(&self, name: &str) -> Option<&CanMessage> {
        self.messages.iter().find(|m| m.name == name)
    }
}

// ── Controller ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CarController {
    cp: CarParams,
    ccp: ControllerParams,
    lead_cfg: LeadDistanceCfg,
    frame: u64,

    torque: SteeringLimiterState,
    curvature: CurvatureLimiterState,
    soft_disable_alert: bool,
    accel_last: f64,
    lat_active_last: bool,

    plan: LongitudinalPlanSp,
    lead_distance: f64,
    bar_timer: DistanceBarTimer,
    gra_counter_last: Option<f64>,

    slc: SpeedLimitArbiter,
    slc_active: bool,
    emulator: ButtonEmulator,
}

impl CarController {
    pub fn new(
        cp: CarParams,
        ccp: ControllerParams,
        lead_cfg: LeadDistanceCfg,
        buttons: ButtonEmulatorCfg,
    ) -> Self {
        Self {
            cp,
            ccp,
            lead_cfg,
            frame: 0,
            torque: SteeringLimiterState::default(),
            curvature: CurvatureLimiterState::default(),
            soft_disable_alert: false,
            accel_last: 0.0,
            lat_active_last: false,
            plan: LongitudinalPlanSp::default(),
            lead_distance: 0.0,
            bar_timer: DistanceBarTimer::new(),
            gra_counter_last: None,
            slc: SpeedLimitArbiter::new(),
            slc_active: false,
            emulator: ButtonEmulator::new(buttons),
        }
    }

    pub const fn frame(&self) -> u64 {
        self.frame
    }

    pub const fn params(&self) -> &ControllerParams {
        &self.ccp
    }

    pub const fn plan(&self) -> &LongitudinalPlanSp {
        &self.plan
    }

    pub const fn lead_distance(&self) -> f64 {
        self.lead_distance
    }

    pub const fn emulator(&self) -> &ButtonEmulator {
        &self.emulator
    }

    pub fn update(
        &mut self,
        cc: &CarControl,
        cs: &VehicleState,
        plan_src: &mut dyn PlanSource,
        params: &mut dyn ParamStore,
    ) -> OutgoingCommand {
        let frame = self.frame;
        let op_long = self.cp.openpilot_longitudinal;
        let mut messages = Vec::new();

        // ── Side channel ─────────────────────────────────────────────────────
        let mut radar = None;
        if !self.cp.pcm_cruise_speed || (op_long && frame % PLAN_POLL_STEP == 0) {
            if let Some(plan) = plan_src.poll_plan() {
                self.plan = plan;
            }
            if op_long {
                radar = plan_src.poll_radar();
            }
        }
        let is_metric = params.get_bool(ParamKey::IsMetric);
        if !self.cp.pcm_cruise_speed {
            self.slc_active = self
                .slc
                .update(frame, params, self.plan.speed_limit_control_state);
        }

        // ── Steering ─────────────────────────────────────────────────────────
        if frame % self.ccp.steer_step == 0 {
            let lat_active = cc.lat_active
                && !cs.steer_fault_temporary
                && !cs.steer_fault_permanent
                && cs.can_valid;
            if lat_active != self.lat_active_last {
                tracing::debug!(frame, lat_active, "lateral control");
                self.lat_active_last = lat_active;
            }
            messages.push(self.steering_message(cc, cs, lat_active));
            // Only MQB cameras watch LH_EPS_03; PQ and MEB have no equivalent frame.
            if self.cp.stock_hca_present && self.cp.platform == Platform::Mqb {
                messages.push(self.eps_pacification(cs));
            }
        }

        // ── Longitudinal ─────────────────────────────────────────────────────
        if op_long && frame % self.ccp.acc_control_step == 0 {
            messages.extend(self.accel_messages(cc, cs));
        }

        // ── HUD ──────────────────────────────────────────────────────────────
        if frame % self.ccp.ldw_step == 0 {
            messages.push(self.lane_hud(cc, cs));
        }
        if let Some(r) = radar
            && frame % PLAN_POLL_STEP == 0
        {
            self.lead_distance = calculate_lead_distance(&r, cc.hud.lead_visible);
        }
        let bars_changed = self.bar_timer.update(frame, cc.hud.lead_distance_bars);
        if op_long && frame % self.ccp.acc_hud_step == 0 {
            messages.push(self.acc_hud(cc, cs, bars_changed));
        }

        // ── Stock buttons ────────────────────────────────────────────────────
        let counter_signal = match self.cp.platform {
            Platform::Pq => pq::GRA_COUNTER,
            Platform::Mqb | Platform::Meb => mqb::GRA_COUNTER,
        };
        let stock_counter = cs.gra_stock.get(counter_signal);
        let ccl = cc.cruise_control;
        let gra_send_ready = self.cp.pcm_cruise && self.gra_counter_last != Some(stock_counter);
        if gra_send_ready && (ccl.cancel || ccl.resume) {
            let req = ButtonRequest {
                cancel: ccl.cancel,
                resume: ccl.resume,
                press: None,
            };
            let counter = (stock_counter as u8).wrapping_add(1) % 16;
            messages.push(self.buttons_message(&cs.gra_stock, counter, req));
        }

        if !self.cp.pcm_cruise_speed {
            self.emulator
                .observe(&cs.button_events, cs.cruise_state.enabled);
            if !(ccl.cancel || ccl.resume)
                && cs.cruise_state.enabled
                && frame % self.ccp.btn_step == 0
            {
                let input = EmulatorInput {
                    v_cruise_kph: cc.v_cruise_kph,
                    cruise_speed: cs.cruise_state.speed,
                    is_metric,
                    plan: &self.plan,
                    slc_active: self.slc_active,
                };
                if let Some(press) = self.emulator.step(&input) {
                    let req = ButtonRequest {
                        press: Some(press),
                        ..ButtonRequest::default()
                    };
                    let counter = ((frame / self.ccp.btn_step + 1) % 16) as u8;
                    tracing::trace!(frame, ?press, "emulated stock button");
                    messages.push(self.buttons_message(&cs.gra_stock, counter, req));
                }
            }
        }
        self.gra_counter_last = Some(stock_counter);

        let steer_max = f64::from(self.ccp.steer.steer_max);
        let echo = ActuatorEcho {
            steer: f64::from(self.torque.last_torque) / steer_max,
            steer_output_can: self.torque.last_torque,
            curvature: self.curvature.last_curvature,
            accel: self.accel_last,
        };
        tracing::trace!(frame, sent = messages.len(), "control frame");
        self.frame += 1;

        OutgoingCommand {
            messages,
            echo,
            soft_disable_alert: self.soft_disable_alert,
        }
    }

    fn steering_message(&mut self, cc: &CarControl, cs: &VehicleState, lat_active: bool) -> CanMessage {
        match self.cp.platform {
            Platform::Meb => {
                let cmd = self.curvature.step(
                    lat_active,
                    cc.actuators.curvature,
                    cs.v_ego_raw,
                    cs.yaw_rate,
                    cs.steering_pressed,
                    &self.ccp.curvature,
                );
                meb::create_steering_control(
                    Bus::Pt,
                    cmd.apply_curvature,
                    cmd.hca_enabled,
                    cmd.power,
                    cmd.power_boost,
                )
            }
            Platform::Mqb | Platform::Pq => {
                let cmd = self.torque.step(
                    lat_active,
                    cc.actuators.steer,
                    cs.steering_torque,
                    &self.ccp.steer,
                    self.ccp.steer_step,
                );
                self.soft_disable_alert = cmd.soft_disable_alert;
                if self.cp.platform == Platform::Pq {
                    pq::create_steering_control(Bus::Pt, cmd.apply_steer, cmd.hca_enabled)
                } else {
                    mqb::create_steering_control(Bus::Pt, cmd.apply_steer, cmd.hca_enabled)
                }
            }
        }
    }

    /// Show the camera's inactivity monitor at least twice our own torque so
    /// Emergency Assist does not fire while we steer on a straight road.
    fn eps_pacification(&self, cs: &VehicleState) -> CanMessage {
        let steer_max = f64::from(self.ccp.steer.steer_max);
        let mut simulated = clip(f64::from(self.torque.last_torque) * 2.0, -steer_max, steer_max);
        if cs.steering_torque.abs() > simulated.abs() {
            simulated = cs.steering_torque;
        }
        mqb::create_eps_update(Bus::Cam, &cs.eps_stock, simulated)
    }

    fn accel_messages(&mut self, cc: &CarControl, cs: &VehicleState) -> Vec<CanMessage> {
        // An invalid bus tick commands nothing and reports ACC inactive.
        let acc_enabled = cc.enabled && cs.cruise_state.enabled && cs.can_valid;
        let long_active = cc.long_active && cs.can_valid;
        let accel = if acc_enabled && !cs.acc_faulted {
            clip(
                finite_or_zero(cc.actuators.accel),
                self.ccp.accel_min,
                self.ccp.accel_max,
            )
        } else {
            0.0
        };
        self.accel_last = accel;
        let phase = cc.actuators.long_control_state;
        let stopping = phase == LongControlState::Stopping;
        let starting = phase == LongControlState::Pid
            && (cs.esp_hold_confirmation || cs.v_ego < self.cp.v_ego_stopping);
        let main_switch = cs.cruise_state.available;

        match self.cp.platform {
            Platform::Meb => {
                let override_ = cc.cruise_control.override_ || cs.gas_pressed;
                let required_jerk = ((accel - cs.a_ego).abs() * 50.0).min(3.0);
                let (lower_jerk, upper_jerk) = if cs.a_ego < accel {
                    (0.0, required_jerk)
                } else {
                    (required_jerk, 0.0)
                };
                let a = meb::MebAccel {
                    acc_type: cs.acc_type,
                    acc_enabled,
                    accel,
                    acc_control: meb::acc_control_value(
                        main_switch,
                        cs.acc_faulted,
                        acc_enabled,
                        override_,
                    ),
                    hold_type: meb::acc_hold_type(
                        cs.acc_faulted,
                        acc_enabled,
                        starting,
                        stopping,
                        cs.esp_hold_confirmation,
                        override_,
                    ),
                    stopping,
                    starting,
                    lower_jerk,
                    upper_jerk,
                    override_,
                    speed_kph: cs.v_ego * MS_TO_KPH,
                    reversing: cs.gear_shifter == GearShifter::Reverse,
                    travel_assist_available: cs.travel_assist_available,
                };
                meb::create_acc_accel_control(Bus::Pt, &a)
            }
            Platform::Mqb => {
                let acc_control = mqb::acc_control_value(main_switch, cs.acc_faulted, long_active);
                mqb::create_acc_accel_control(
                    Bus::Pt,
                    cs.acc_type,
                    long_active,
                    accel,
                    acc_control,
                    stopping,
                    starting,
                    cs.esp_hold_confirmation,
                )
            }
            Platform::Pq => {
                let acc_control = pq::acc_control_value(main_switch, cs.acc_faulted, long_active);
                pq::create_acc_accel_control(Bus::Pt, cs.acc_type, accel, acc_control, stopping)
            }
        }
    }

    fn lane_hud(&self, cc: &CarControl, cs: &VehicleState) -> CanMessage {
        let take_over = cc.hud.visual_alert.wants_take_over();
        let hud_alert = if take_over { self.ccp.ldw_take_over_code } else { 0.0 };
        let lanes = &cc.hud.lanes;
        match self.cp.platform {
            Platform::Meb => meb::create_lka_hud_control(
                Bus::Pt,
                &cs.ldw_stock,
                cc.lat_active,
                cs.steering_pressed,
                hud_alert,
                lanes,
                take_over,
            ),
            Platform::Mqb => mqb::create_lka_hud_control(
                Bus::Pt,
                &cs.ldw_stock,
                cc.lat_active,
                cs.steering_pressed,
                hud_alert,
                lanes,
            ),
            Platform::Pq => pq::create_lka_hud_control(
                Bus::Pt,
                &cs.ldw_stock,
                cc.lat_active,
                cs.steering_pressed,
                hud_alert,
                lanes,
            ),
        }
    }

    fn acc_hud(&self, cc: &CarControl, cs: &VehicleState, bars_changed: bool) -> CanMessage {
        let hud = &cc.hud;
        let set_speed_kph = finite_or_zero(hud.set_speed) * MS_TO_KPH;
        let main_switch = cs.cruise_state.available;
        let long_active = cc.long_active && cs.can_valid;
        match self.cp.platform {
            Platform::Meb => {
                let override_ = cc.cruise_control.override_ || cs.gas_pressed;
                let h = meb::MebAccHud {
                    acc_status: meb::acc_hud_status_value(
                        main_switch,
                        cs.acc_faulted,
                        cc.enabled && cs.cruise_state.enabled && cs.can_valid,
                        override_,
                    ),
                    set_speed_kph,
                    lead_visible: hud.lead_visible,
                    distance_bars: hud.lead_distance_bars,
                    show_distance_bars: bars_changed,
                    desired_gap: (cs.v_ego * meb::t_follow(hud.lead_distance_bars)).max(1.0),
                    lead_distance: self.lead_cfg.cap_distance(self.lead_distance),
                    esp_hold: cs.esp_hold_confirmation,
                };
                meb::create_acc_hud_control(Bus::Pt, &h)
            }
            Platform::Mqb => {
                let marker = self.lead_cfg.hud_marker(
                    hud.lead_visible,
                    self.frame,
                    cs.upscale_lead_car_signal,
                    true,
                );
                let status = mqb::acc_hud_status_value(main_switch, cs.acc_faulted, long_active);
                mqb::create_acc_hud_control(Bus::Pt, status, set_speed_kph, marker, hud.lead_distance_bars)
            }
            Platform::Pq => {
                let marker = self.lead_cfg.hud_marker(
                    hud.lead_visible,
                    self.frame,
                    cs.upscale_lead_car_signal,
                    false,
                );
                let status = pq::acc_hud_status_value(main_switch, cs.acc_faulted, long_active);
                pq::create_acc_hud_control(Bus::Pt, status, set_speed_kph, marker, hud.lead_distance_bars)
            }
        }
    }

    fn buttons_message(&self, gra_stock: &StockValues, counter: u8, req: ButtonRequest) -> CanMessage {
        let bus = self.cp.ext_bus();
        match self.cp.platform {
            Platform::Pq => pq::create_acc_buttons_control(bus, gra_stock, counter, req),
            Platform::Mqb | Platform::Meb => {
                mqb::create_acc_buttons_control(bus, gra_stock, counter, req)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carstate::CruiseState;
    use crate::mocks::{MemoryParams, NoPlan, ScriptedPlan};
    use vwcar_traits::{LeadData, RadarState};

    fn controller(cp: CarParams) -> CarController {
        let ccp = ControllerParams::for_platform(cp.platform);
        CarController::new(cp, ccp, LeadDistanceCfg::default(), ButtonEmulatorCfg::default())
    }

    fn state() -> VehicleState {
        VehicleState {
            can_valid: true,
            ..VehicleState::default()
        }
    }

    #[test]
    fn steer_and_ldw_cadence() {
        let mut c = controller(CarParams::new(Platform::Mqb));
        let cs = state();
        let cc = CarControl::default();
        let mut params = MemoryParams::default();
        let mut hca = 0;
        let mut ldw = 0;
        for _ in 0..20 {
            let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
            hca += usize::from(out.find("HCA_01").is_some());
            ldw += usize::from(out.find("LDW_02").is_some());
            assert!(out.find("ACC_06").is_none());
        }
        assert_eq!(hca, 10);
        assert_eq!(ldw, 2);
    }

    #[test]
    fn steer_fault_suppresses_torque() {
        let mut c = controller(CarParams::new(Platform::Mqb));
        let mut cs = state();
        cs.steer_fault_temporary = true;
        let cc = CarControl {
            lat_active: true,
            actuators: Actuators {
                steer: 1.0,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &cs, &mut NoPlan, &mut MemoryParams::default());
        let hca = out.find("HCA_01").map(|m| m.get("HCA_01_LM_Offset"));
        assert_eq!(hca, Some(Some(0.0)));
        assert_eq!(out.echo.steer_output_can, 0);
    }

    #[test]
    fn torque_echo_follows_applied() {
        let mut c = controller(CarParams::new(Platform::Mqb));
        let cs = state();
        let cc = CarControl {
            lat_active: true,
            actuators: Actuators {
                steer: 1.0,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &cs, &mut NoPlan, &mut MemoryParams::default());
        assert_eq!(out.echo.steer_output_can, 4);
        assert!((out.echo.steer - 4.0 / 300.0).abs() < 1e-12);
    }

    #[test]
    fn ea_pacification_doubles_torque_on_camera_bus() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.stock_hca_present = true;
        let mut c = controller(cp);
        let mut cs = state();
        cs.steering_torque = 5.0;
        let cc = CarControl {
            lat_active: true,
            actuators: Actuators {
                steer: 1.0,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &cs, &mut NoPlan, &mut MemoryParams::default());
        let eps = out.find("LH_EPS_03");
        assert_eq!(eps.map(|m| m.bus), Some(Bus::Cam));
        assert_eq!(eps.and_then(|m| m.get("EPS_Lenkmoment")), Some(8.0));
    }

    #[test]
    fn accel_clamped_to_limits() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.openpilot_longitudinal = true;
        let mut c = controller(cp);
        let mut cs = state();
        cs.cruise_state = CruiseState {
            available: true,
            enabled: true,
            ..CruiseState::default()
        };
        let cc = CarControl {
            enabled: true,
            long_active: true,
            actuators: Actuators {
                accel: 5.0,
                long_control_state: LongControlState::Pid,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &cs, &mut NoPlan, &mut MemoryParams::default());
        assert_eq!(out.echo.accel, 2.0);
        let acc = out.find("ACC_06");
        assert_eq!(acc.and_then(|m| m.get("ACC_Sollbeschleunigung_02")), Some(2.0));
    }

    #[test]
    fn accel_zero_when_acc_faulted() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.openpilot_longitudinal = true;
        let mut c = controller(cp);
        let mut cs = state();
        cs.cruise_state.enabled = true;
        cs.acc_faulted = true;
        let cc = CarControl {
            enabled: true,
            actuators: Actuators {
                accel: -2.0,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &cs, &mut NoPlan, &mut MemoryParams::default());
        assert_eq!(out.echo.accel, 0.0);
    }

    #[test]
    fn accel_zero_and_inactive_while_bus_invalid() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.openpilot_longitudinal = true;
        let mut c = controller(cp);
        let mut cs = state();
        cs.can_valid = false;
        cs.cruise_state = CruiseState {
            available: true,
            enabled: true,
            ..CruiseState::default()
        };
        let cc = CarControl {
            enabled: true,
            lat_active: true,
            long_active: true,
            actuators: Actuators {
                steer: 1.0,
                accel: 1.5,
                long_control_state: LongControlState::Pid,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &cs, &mut NoPlan, &mut MemoryParams::default());
        assert_eq!(out.echo.steer_output_can, 0);
        assert_eq!(out.echo.accel, 0.0);
        let acc = out.find("ACC_06").unwrap();
        // Inactive: the no-request value and main-switch-only status.
        assert_eq!(acc.get("ACC_Sollbeschleunigung_02"), Some(3.01));
        assert_eq!(acc.get("ACC_Status_ACC"), Some(2.0));
    }

    #[test]
    fn accel_stays_clamped_over_many_ticks() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.openpilot_longitudinal = true;
        let mut c = controller(cp);
        let mut cs = state();
        cs.cruise_state = CruiseState {
            available: true,
            enabled: true,
            ..CruiseState::default()
        };
        let mut params = MemoryParams::default();
        for (i, accel) in [9.0, -9.0, 1.0, f64::NAN, -3.6, 2.01, 0.0, -100.0].iter().enumerate() {
            let cc = CarControl {
                enabled: true,
                long_active: true,
                actuators: Actuators {
                    accel: *accel,
                    long_control_state: LongControlState::Pid,
                    ..Actuators::default()
                },
                ..CarControl::default()
            };
            // ACC_06 goes out every second frame; run both frames per sample.
            for _ in 0..2 {
                let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
                assert!((-3.5..=2.0).contains(&out.echo.accel), "sample {i}: {}", out.echo.accel);
                if let Some(v) = out.find("ACC_06").and_then(|m| m.get("ACC_Sollbeschleunigung_02")) {
                    assert!((-3.5..=2.0).contains(&v), "sample {i}: sent {v}");
                }
            }
        }
    }

    #[test]
    fn cancel_forwarded_once_per_stock_counter() {
        let mut c = controller(CarParams::new(Platform::Mqb));
        let mut cs = state();
        cs.gra_stock.values.insert("COUNTER", 14.0);
        let cc = CarControl {
            cruise_control: CruiseControl {
                cancel: true,
                ..CruiseControl::default()
            },
            ..CarControl::default()
        };
        let mut params = MemoryParams::default();
        let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
        let gra = out.find("GRA_ACC_01");
        assert_eq!(gra.and_then(|m| m.get("GRA_Abbrechen")), Some(1.0));
        assert_eq!(gra.and_then(|m| m.get("COUNTER")), Some(15.0));
        // same stock counter: nothing new to piggyback on
        let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
        assert!(out.find("GRA_ACC_01").is_none());
        cs.gra_stock.values.insert("COUNTER", 15.0);
        let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
        assert_eq!(
            out.find("GRA_ACC_01").and_then(|m| m.get("COUNTER")),
            Some(0.0)
        );
    }

    #[test]
    fn gateway_buttons_go_to_camera_bus() {
        let mut cp = CarParams::new(Platform::Meb);
        cp.network_location = crate::params::NetworkLocation::Gateway;
        let mut c = controller(cp);
        let cc = CarControl {
            cruise_control: CruiseControl {
                resume: true,
                ..CruiseControl::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &state(), &mut NoPlan, &mut MemoryParams::default());
        assert_eq!(out.find("GRA_ACC_01").map(|m| m.bus), Some(Bus::Cam));
    }

    #[test]
    fn emulator_presses_when_set_speed_below_desired() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.pcm_cruise_speed = false;
        let mut c = controller(cp);
        let mut cs = state();
        cs.cruise_state.enabled = true;
        cs.cruise_state.speed = 80.0 / MS_TO_KPH;
        let cc = CarControl {
            v_cruise_kph: 100.0,
            ..CarControl::default()
        };
        let mut params = MemoryParams::default().with(ParamKey::IsMetric, true);
        let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
        let gra = out.find("GRA_ACC_01");
        assert_eq!(gra.and_then(|m| m.get("GRA_Tip_Hoch")), Some(1.0));
        assert_eq!(gra.and_then(|m| m.get("COUNTER")), Some(1.0));
        // not a button frame
        let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
        assert!(out.find("GRA_ACC_01").is_none());
    }

    #[test]
    fn emulator_idle_while_cruise_disengaged() {
        let mut cp = CarParams::new(Platform::Mqb);
        cp.pcm_cruise_speed = false;
        let mut c = controller(cp);
        let mut cs = state();
        cs.cruise_state.speed = 80.0 / MS_TO_KPH;
        let cc = CarControl {
            v_cruise_kph: 100.0,
            ..CarControl::default()
        };
        let mut params = MemoryParams::default().with(ParamKey::IsMetric, true);
        for _ in 0..30 {
            let out = c.update(&cc, &cs, &mut NoPlan, &mut params);
            assert!(out.find("GRA_ACC_01").is_none());
        }
        assert_eq!(
            c.emulator().phase(),
            crate::button_emulator::ButtonPhase::Idle
        );
    }

    #[test]
    fn plan_polled_every_fifth_frame_with_long_control() {
        let mut cp = CarParams::new(Platform::Meb);
        cp.openpilot_longitudinal = true;
        let mut c = controller(cp);
        let mut plan = ScriptedPlan::default();
        plan.push_radar(RadarState {
            lead_one: LeadData {
                status: true,
                d_rel: 42.0,
                v_rel: 0.0,
            },
            ..RadarState::default()
        });
        let cs = state();
        let cc = CarControl::default();
        let mut params = MemoryParams::default();
        for _ in 0..10 {
            c.update(&cc, &cs, &mut plan, &mut params);
        }
        assert_eq!(plan.plan_polls, 2);
        assert_eq!(c.lead_distance(), 42.0);
    }

    #[test]
    fn meb_acc_hud_caps_lead_distance() {
        let mut cp = CarParams::new(Platform::Meb);
        cp.openpilot_longitudinal = true;
        let mut c = controller(cp);
        let mut plan = ScriptedPlan::default();
        plan.push_radar(RadarState {
            lead_one: LeadData {
                status: true,
                d_rel: 300.0,
                v_rel: 0.0,
            },
            ..RadarState::default()
        });
        let cc = CarControl {
            hud: HudControl {
                lead_visible: true,
                lead_distance_bars: 2,
                ..HudControl::default()
            },
            ..CarControl::default()
        };
        let out = c.update(&cc, &state(), &mut plan, &mut MemoryParams::default());
        assert_eq!(c.lead_distance(), 300.0);
        let hud = out.find("MEB_ACC_01");
        assert_eq!(hud.and_then(|m| m.get("Lead_Distance")), Some(140.0));
        // v_ego 0: desired gap floors at 1 m in the selected bar's slot
        assert_eq!(hud.and_then(|m| m.get("Zeitluecke_2")), Some(1.0));
        assert_eq!(hud.and_then(|m| m.get("Zeitluecke_1")), Some(0.0));
    }
}
