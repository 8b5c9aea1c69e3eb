//! Stock cruise button emulation for cars whose set speed is owned by the
//! car's own cruise controller.
//!
//! The emulator is stepped once per button frame. It works in display units
//! (kph or mph, whichever the cluster shows) because that is what one press
//! moves.

use vwcar_traits::{LongitudinalPlanSp, ParamKey, ParamStore};

use crate::buttons::{ButtonEvent, ButtonType};
use crate::codec::StockButton;
use crate::util::{KPH_TO_MPH, MPH_TO_KPH, MS_TO_KPH, MS_TO_MPH, frames_for};

/// Lowest set speed the stock cruise accepts, kph.
const V_CRUISE_MIN_METRIC_KPH: f64 = 30.0;
/// Same for imperial clusters: 20 mph, truncated to whole kph.
const V_CRUISE_MIN_IMPERIAL_KPH: f64 = 32.0;

/// A sign tap forces SLC on for this long even if the planner says inactive.
const SIGN_TAP_FORCE_S: f64 = 2.0;

/// Curve speeds at or above this are "no curve limit".
const NO_CURVE_LIMIT_KPH: f64 = 255.0;

/// Lowest set speed in display units.
pub fn v_cruise_min(is_metric: bool) -> f64 {
    if is_metric {
        V_CRUISE_MIN_METRIC_KPH
    } else {
        V_CRUISE_MIN_IMPERIAL_KPH * KPH_TO_MPH
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonEmulatorCfg {
    pub press_cap: u32,
    pub hold_interval: u32,
    /// Display-unit jump per press that identifies a resume/set stalk.
    pub large_step: f64,
    pub min_streak: u32,
    pub unresponsive_sends: u32,
    pub debounce_frames: u32,
    pub gap_debounce_frames: u32,
    pub curve_hysteresis_kph: f64,
    pub curve_offset_kph: f64,
}

impl Default for ButtonEmulatorCfg {
    fn default() -> Self {
        Self {
            press_cap: 5,
            hold_interval: 7,
            large_step: 10.0,
            min_streak: 2,
            unresponsive_sends: 10,
            debounce_frames: 40,
            gap_debounce_frames: 300,
            curve_hysteresis_kph: 0.75 * MPH_TO_KPH,
            curve_offset_kph: 2.0 * MPH_TO_KPH,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonPhase {
    #[default]
    Idle,
    Increase,
    Decrease,
    Hold,
}

/// What the car's stalk does with the logical up/down presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonMapping {
    #[default]
    Unknown,
    /// Tip up/down move the set speed by one unit.
    AccelDecel,
    /// Only resume/set move it, in large steps.
    ResumeSet,
}

impl ButtonMapping {
    fn button(self, up: bool, force_resume_set: bool) -> StockButton {
        let resume_set = match self {
            ButtonMapping::ResumeSet => true,
            ButtonMapping::AccelDecel => false,
            ButtonMapping::Unknown => force_resume_set,
        };
        match (up, resume_set) {
            (true, false) => StockButton::Accel,
            (false, false) => StockButton::Decel,
            (true, true) => StockButton::Resume,
            (false, true) => StockButton::Set,
        }
    }
}

// ── Speed limit arbitration ──────────────────────────────────────────────────

/// Decides whether speed-limit control drives the target this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeedLimitArbiter {
    last_sign_tap: bool,
    force_start: Option<u64>,
}

impl SpeedLimitArbiter {
    pub const fn new() -> Self {
        Self {
            last_sign_tap: false,
            force_start: None,
        }
    }

    /// Called every frame. A rising edge of the sign-tap flag opens the force
    /// window and clears the flag in the store.
    pub fn update(&mut self, frame: u64, params: &mut dyn ParamStore, slc_state: u8) -> bool {
        let tap = params.get_bool(ParamKey::LastSpeedLimitSignTap);
        if tap && !self.last_sign_tap {
            self.force_start = Some(frame);
            params.put_bool(ParamKey::LastSpeedLimitSignTap, false);
            tracing::debug!(frame, "speed limit sign tap");
        }
        self.last_sign_tap = tap;

        let enabled = params.get_bool(ParamKey::SpeedLimitControl);
        let forced = enabled
            && self
                .force_start
                .is_some_and(|start| frame < start + frames_for(SIGN_TAP_FORCE_S));
        let inactive = !forced && (!enabled || slc_state == 0);
        let temp_inactive = !forced && enabled && slc_state == 1;
        !inactive && !temp_inactive
    }
}

// ── Curve speed ──────────────────────────────────────────────────────────────

/// One-sided hysteresis: rises immediately, drops only once the input falls
/// more than `hysteresis` below the held value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurveSpeedHysteresis {
    steady: f64,
}

impl CurveSpeedHysteresis {
    pub fn update(&mut self, speed: f64, hysteresis: f64) -> f64 {
        if speed > self.steady || speed < self.steady - hysteresis {
            self.steady = speed;
        }
        self.steady
    }

    pub const fn steady(&self) -> f64 {
        self.steady
    }
}

/// Per-step inputs.
#[derive(Debug, Clone, Copy)]
pub struct EmulatorInput<'a> {
    /// Planner's desired cruise speed, kph.
    pub v_cruise_kph: f64,
    /// Car's current set speed, m/s.
    pub cruise_speed: f64,
    pub is_metric: bool,
    pub plan: &'a LongitudinalPlanSp,
    pub slc_active: bool,
}

// ── Emulator ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ButtonEmulator {
    cfg: ButtonEmulatorCfg,
    phase: ButtonPhase,
    count: u32,
    debounce: u32,
    mapping: ButtonMapping,
    press_streak: u32,
    unanswered: u32,
    last_v_set_dis: Option<f64>,
    curve: CurveSpeedHysteresis,
}

impl ButtonEmulator {
    pub fn new(cfg: ButtonEmulatorCfg) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub const fn phase(&self) -> ButtonPhase {
        self.phase
    }

    pub const fn mapping(&self) -> ButtonMapping {
        self.mapping
    }

    pub const fn debounce(&self) -> u32 {
        self.debounce
    }

    fn reset(&mut self) {
        self.phase = ButtonPhase::Idle;
        self.count = 0;
        self.press_streak = 0;
    }

    /// Called every frame with the decoded stalk events.
    pub fn observe(&mut self, events: &[ButtonEvent], cruise_enabled: bool) {
        let mut pressed = None;
        for ev in events.iter().filter(|e| e.pressed) {
            let window = match ev.kind {
                ButtonType::AccelCruise
                | ButtonType::DecelCruise
                | ButtonType::ResumeCruise
                | ButtonType::SetCruise => self.cfg.debounce_frames,
                ButtonType::GapAdjustCruise => self.cfg.gap_debounce_frames,
                ButtonType::Cancel => continue,
            };
            pressed = Some(pressed.map_or(window, |w: u32| w.max(window)));
        }

        if let Some(window) = pressed {
            self.debounce = window;
            self.reset();
            tracing::debug!(window, "driver pressed a cruise button");
        } else if !cruise_enabled {
            if self.phase != ButtonPhase::Idle {
                tracing::debug!("cruise disengaged, emulator reset");
            }
            self.reset();
        } else {
            self.debounce = self.debounce.saturating_sub(1);
        }
    }

    /// Target in display units, after SLC and curve caps.
    pub fn target_display_speed(&mut self, input: &EmulatorInput<'_>) -> f64 {
        let plan = input.plan;
        let v_cruise = input.v_cruise_kph;

        let set_speed_kph = if plan.speed_limit_control_state > 1 && input.slc_active {
            (plan.speed_limit + plan.speed_limit_offset) * MS_TO_KPH
        } else {
            v_cruise
        };
        let mut target = if plan.speed_limit_control_state > 1 {
            set_speed_kph
        } else {
            v_cruise.min(set_speed_kph)
        };

        if plan.vision_turn_controller_state != 0 || plan.turn_speed_control_state > 1 {
            let mut vision = NO_CURVE_LIMIT_KPH;
            if plan.vision_turn_controller_state != 0 {
                vision = plan.vision_turn_speed * MS_TO_KPH;
                if vision.trunc() == v_cruise.trunc() {
                    vision = NO_CURVE_LIMIT_KPH;
                }
            }
            let mut map = NO_CURVE_LIMIT_KPH;
            if plan.turn_speed_control_state > 1 {
                map = plan.turn_speed * MS_TO_KPH;
                if map.trunc() == 0.0 {
                    map = NO_CURVE_LIMIT_KPH;
                }
            }
            let curve = self.curve.update(
                vision.min(map) + self.cfg.curve_offset_kph,
                self.cfg.curve_hysteresis_kph,
            );
            target = target.min(curve);
        }

        let unit = if input.is_metric { 1.0 } else { KPH_TO_MPH };
        (target.min(v_cruise) * unit).round()
    }

    /// One button frame. Returns the stock button to press, if any.
    pub fn step(&mut self, input: &EmulatorInput<'_>) -> Option<StockButton> {
        if self.debounce > 0 {
            return None;
        }

        let target = self.target_display_speed(input);
        let unit = if input.is_metric { MS_TO_KPH } else { MS_TO_MPH };
        let v_set_dis = (input.cruise_speed * unit).round();
        self.infer_mapping(v_set_dis);

        let press = self.advance(target, v_set_dis, v_cruise_min(input.is_metric));
        match press {
            Some(up) => {
                self.press_streak += 1;
                self.unanswered += 1;
                let force = self.unanswered >= self.cfg.unresponsive_sends;
                Some(self.mapping.button(up, force))
            }
            None => {
                self.press_streak = 0;
                None
            }
        }
    }

    fn infer_mapping(&mut self, v_set_dis: f64) {
        let Some(prev) = self.last_v_set_dis.replace(v_set_dis) else {
            return;
        };
        if prev == v_set_dis {
            return;
        }
        self.unanswered = 0;
        if self.mapping == ButtonMapping::Unknown && self.press_streak >= self.cfg.min_streak {
            self.mapping = if (v_set_dis - prev).abs() >= self.cfg.large_step {
                ButtonMapping::ResumeSet
            } else {
                ButtonMapping::AccelDecel
            };
            tracing::debug!(mapping = ?self.mapping, "stalk type inferred");
        }
    }

    /// Phase transition. `Some(true)` presses up, `Some(false)` down.
    fn advance(&mut self, target: f64, v_set_dis: f64, v_min: f64) -> Option<bool> {
        match self.phase {
            ButtonPhase::Idle => {
                self.count = 0;
                if target > v_set_dis {
                    self.phase = ButtonPhase::Increase;
                } else if target < v_set_dis && v_set_dis > v_min {
                    self.phase = ButtonPhase::Decrease;
                } else {
                    return None;
                }
                self.advance(target, v_set_dis, v_min)
            }
            ButtonPhase::Increase => {
                if target <= v_set_dis {
                    self.hold();
                    return None;
                }
                self.press();
                Some(true)
            }
            ButtonPhase::Decrease => {
                if target >= v_set_dis || v_set_dis <= v_min {
                    self.hold();
                    return None;
                }
                self.press();
                Some(false)
            }
            ButtonPhase::Hold => {
                self.count += 1;
                if self.count >= self.cfg.hold_interval {
                    self.phase = ButtonPhase::Idle;
                    self.count = 0;
                }
                None
            }
        }
    }

    fn hold(&mut self) {
        self.phase = ButtonPhase::Hold;
        self.count = 0;
    }

    /// Count one press; enter Hold once the cap is reached.
    fn press(&mut self) {
        self.count += 1;
        if self.count >= self.cfg.press_cap {
            self.hold();
        }
    }
}
