//! MEB message encoders and ACC status helpers.

use vwcar_traits::Bus;

use super::{CanMessage, LDW_PASSTHROUGH, LaneHud, StockValues};
use crate::util::RAD_TO_DEG;

pub use super::mqb::create_acc_buttons_control;

pub const ACC_CTRL_ERROR: u8 = 6;
pub const ACC_CTRL_OVERRIDE: u8 = 4;
pub const ACC_CTRL_ACTIVE: u8 = 3;
pub const ACC_CTRL_ENABLED: u8 = 2;
pub const ACC_CTRL_DISABLED: u8 = 0;

pub const ACC_HMS_RELEASE: u8 = 4;
pub const ACC_HMS_HOLD: u8 = 1;
pub const ACC_HMS_NO_REQUEST: u8 = 0;

pub const ACC_HUD_ERROR: u8 = 6;
pub const ACC_HUD_OVERRIDE: u8 = 4;
pub const ACC_HUD_ACTIVE: u8 = 3;
pub const ACC_HUD_ENABLED: u8 = 2;
pub const ACC_HUD_DISABLED: u8 = 0;

/// Distance bars the MEB cluster can show.
pub const DISTANCE_BARS: u8 = 5;

/// HCA_03 curvature request. Curvature goes out in deg/m with a separate sign.
pub fn create_steering_control(
    bus: Bus,
    apply_curvature: f64,
    hca_enabled: bool,
    power: i32,
    power_boost: bool,
) -> CanMessage {
    CanMessage::new("HCA_03", bus)
        .with("Curvature", apply_curvature.abs() * RAD_TO_DEG)
        .with_flag("VZ", apply_curvature > 0.0 && hca_enabled)
        .with("Power", if hca_enabled { f64::from(power) } else { 0.0 })
        .with_flag("Power_Boost", power_boost && hca_enabled)
        .with_flag("Active", hca_enabled)
        .with_flag("Request", hca_enabled)
        .with_flag("Standby", !hca_enabled)
}

#[allow(clippy::too_many_arguments)]
pub fn create_lka_hud_control(
    bus: Bus,
    ldw_stock: &StockValues,
    lat_active: bool,
    steering_pressed: bool,
    hud_alert: f64,
    lanes: &LaneHud,
    sound_alert: bool,
) -> CanMessage {
    let display_mode = u8::from(lat_active);
    CanMessage::new("LDW_02", bus)
        .with_stock(&ldw_stock.pick(&LDW_PASSTHROUGH))
        .with_flag("LDW_Gong", sound_alert)
        .with_flag("LDW_Status_LED_gelb", lat_active && steering_pressed)
        .with_flag("LDW_Status_LED_gruen", lat_active && !steering_pressed)
        .with(
            "LDW_Lernmodus_links",
            LaneHud::lane_mode(lanes.left_lane_depart, lanes.left_lane_visible, display_mode),
        )
        .with(
            "LDW_Lernmodus_rechts",
            LaneHud::lane_mode(lanes.right_lane_depart, lanes.right_lane_visible, display_mode),
        )
        .with("LDW_Texte", hud_alert)
}

pub fn acc_control_value(
    main_switch_on: bool,
    acc_faulted: bool,
    long_active: bool,
    override_: bool,
) -> u8 {
    if acc_faulted {
        ACC_CTRL_ERROR
    } else if long_active {
        if override_ {
            ACC_CTRL_OVERRIDE
        } else {
            ACC_CTRL_ACTIVE
        }
    } else if main_switch_on {
        ACC_CTRL_ENABLED
    } else {
        ACC_CTRL_DISABLED
    }
}

/// Hold manager request. The car reacts to this even with long control off.
pub fn acc_hold_type(
    acc_faulted: bool,
    long_active: bool,
    starting: bool,
    stopping: bool,
    esp_hold: bool,
    override_: bool,
) -> u8 {
    if acc_faulted || !long_active || override_ {
        ACC_HMS_NO_REQUEST
    } else if starting {
        ACC_HMS_RELEASE
    } else if stopping || esp_hold {
        ACC_HMS_HOLD
    } else {
        ACC_HMS_NO_REQUEST
    }
}

pub fn acc_hud_status_value(
    main_switch_on: bool,
    acc_faulted: bool,
    long_active: bool,
    override_: bool,
) -> u8 {
    if acc_faulted {
        ACC_HUD_ERROR
    } else if long_active {
        if override_ {
            ACC_HUD_OVERRIDE
        } else {
            ACC_HUD_ACTIVE
        }
    } else if main_switch_on {
        ACC_HUD_ENABLED
    } else {
        ACC_HUD_DISABLED
    }
}

/// Desired gap goes only into the `Zeitluecke_n` slot of the selected bar.
pub fn get_desired_gap(distance_bars: u8, desired_gap: f64, slot: u8) -> f64 {
    if distance_bars == slot { desired_gap } else { 0.0 }
}

/// Fields of the MEB_ACC_02 longitudinal request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MebAccel {
    pub acc_type: f64,
    pub acc_enabled: bool,
    pub accel: f64,
    pub acc_control: u8,
    pub hold_type: u8,
    pub stopping: bool,
    pub starting: bool,
    pub lower_jerk: f64,
    pub upper_jerk: f64,
    pub override_: bool,
    pub speed_kph: f64,
    pub reversing: bool,
    pub travel_assist_available: bool,
}

pub fn create_acc_accel_control(bus: Bus, a: &MebAccel) -> Vec<CanMessage> {
    let acceleration = match (a.acc_enabled, a.override_) {
        (false, _) => 3.01,
        // the car expects a non-inactive accel while overriding
        (true, true) => 0.0,
        (true, false) => a.accel,
    };
    let active = a.acc_control == ACC_CTRL_ACTIVE;
    let when_active = |v: f64| if active { v } else { 0.0 };

    let mut out = vec![
        CanMessage::new("MEB_ACC_02", bus)
            .with("ACC_Typ", a.acc_type)
            .with("ACC_Status_ACC", f64::from(a.acc_control))
            .with_flag("ACC_StartStopp_Info", a.acc_enabled)
            .with("ACC_Sollbeschleunigung_02", acceleration)
            .with("ACC_zul_Regelabw_unten", when_active(a.lower_jerk.max(0.05)))
            .with("ACC_zul_Regelabw_oben", when_active(a.upper_jerk.min(3.0)))
            .with("ACC_neg_Sollbeschl_Grad_02", when_active(4.0))
            .with("ACC_pos_Sollbeschl_Grad_02", when_active(4.0))
            .with_flag("ACC_Anfahren", a.starting)
            .with_flag("ACC_Anhalten", a.stopping)
            .with("ACC_Anhalteweg", 20.46)
            .with("ACC_Anforderung_HMS", f64::from(a.hold_type))
            .with_flag("ACC_AKTIV_regelt", active)
            .with("Speed", a.speed_kph)
            .with_flag("Reversing", a.reversing)
            .with("SET_ME_0XFE", 254.0)
            .with("SET_ME_0X1", 1.0)
            .with("SET_ME_0X9", 9.0),
    ];

    if a.travel_assist_available {
        // keeps the Travel Assist button from raising an error
        out.push(
            CanMessage::new("MEB_Travel_Assist_01", bus)
                .with("Travel_Assist_Status", if a.acc_enabled { 4.0 } else { 2.0 })
                .with("Travel_Assist_Request", 0.0)
                .with("Travel_Assist_Available", 1.0),
        );
    }
    out
}

/// Fields of the MEB_ACC_01 cluster display.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MebAccHud {
    pub acc_status: u8,
    pub set_speed_kph: f64,
    pub lead_visible: bool,
    pub distance_bars: u8,
    pub show_distance_bars: bool,
    pub desired_gap: f64,
    pub lead_distance: f64,
    pub esp_hold: bool,
}

const ZEITLUECKE: [&str; DISTANCE_BARS as usize] = [
    "Zeitluecke_1",
    "Zeitluecke_2",
    "Zeitluecke_3",
    "Zeitluecke_4",
    "Zeitluecke_5",
];

pub fn create_acc_hud_control(bus: Bus, h: &MebAccHud) -> CanMessage {
    let active = h.acc_status == ACC_HUD_ACTIVE;
    let mut msg = CanMessage::new("MEB_ACC_01", bus)
        .with("ACC_Status_ACC", f64::from(h.acc_status))
        .with(
            "ACC_Wunschgeschw_02",
            if h.set_speed_kph < 250.0 { h.set_speed_kph } else { 327.36 },
        )
        .with("ACC_Gesetzte_Zeitluecke", f64::from(h.distance_bars))
        .with("ACC_Display_Prio", 1.0)
        .with("ACC_Abstandsindex_02", 569.0)
        .with_flag("ACC_EGO_Fahrzeug", active)
        .with_flag("Lead_Type_Detected", h.lead_visible)
        .with("Lead_Type", if h.lead_visible { 3.0 } else { 0.0 })
        .with("Lead_Distance", if h.lead_visible { h.lead_distance } else { 0.0 })
        .with_flag("ACC_Enabled", active)
        .with_flag("ACC_Standby_Override", !active)
        .with_flag("ACC_AKTIV_regelt", active)
        .with("Lead_Brightness", if active { 3.0 } else { 0.0 })
        .with("ACC_Events", if h.esp_hold && active { 3.0 } else { 0.0 })
        .with_flag(
            "ACC_Anzeige_Zeitluecke",
            h.show_distance_bars && h.acc_status != ACC_HUD_DISABLED,
        )
        .with_flag(
            "Zeitluecke_Farbe",
            matches!(
                h.acc_status,
                ACC_HUD_ENABLED | ACC_HUD_ACTIVE | ACC_HUD_OVERRIDE
            ),
        )
        .with("SET_ME_0X1", 1.0)
        .with("SET_ME_0X6A", 106.0)
        .with("SET_ME_0X3FF", 1023.0)
        .with("SET_ME_0XFFFF", 65535.0)
        .with("SET_ME_0X7FFF", 32767.0);
    for (i, name) in ZEITLUECKE.iter().enumerate() {
        let slot = (i + 1) as u8;
        msg = msg.with(name, get_desired_gap(h.distance_bars, h.desired_gap, slot));
    }
    msg
}

/// Following time for a distance-bar setting, seconds.
pub fn t_follow(distance_bars: u8) -> f64 {
    match distance_bars {
        1 => 1.25,
        3 => 1.75,
        _ => 1.45,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DEG_TO_RAD;

    #[test]
    fn curvature_sign_only_when_enabled() {
        let m = create_steering_control(Bus::Pt, 0.01, true, 50, false);
        assert_eq!(m.get("VZ"), Some(1.0));
        assert!((m.get("Curvature").unwrap_or(0.0) * DEG_TO_RAD - 0.01).abs() < 1e-12);
        let m = create_steering_control(Bus::Pt, 0.01, false, 50, true);
        assert_eq!(m.get("VZ"), Some(0.0));
        assert_eq!(m.get("Power"), Some(0.0));
        assert_eq!(m.get("Power_Boost"), Some(0.0));
        assert_eq!(m.get("Standby"), Some(1.0));
    }

    #[test]
    fn control_and_hold_priorities() {
        assert_eq!(acc_control_value(true, true, true, false), ACC_CTRL_ERROR);
        assert_eq!(acc_control_value(true, false, true, true), ACC_CTRL_OVERRIDE);
        assert_eq!(acc_control_value(false, false, true, false), ACC_CTRL_ACTIVE);
        assert_eq!(acc_control_value(true, false, false, false), ACC_CTRL_ENABLED);
        assert_eq!(acc_control_value(false, false, false, false), ACC_CTRL_DISABLED);

        assert_eq!(acc_hold_type(false, true, true, true, true, false), ACC_HMS_RELEASE);
        assert_eq!(acc_hold_type(false, true, false, false, true, false), ACC_HMS_HOLD);
        assert_eq!(acc_hold_type(false, true, false, true, false, false), ACC_HMS_HOLD);
        assert_eq!(acc_hold_type(false, true, true, false, false, true), ACC_HMS_NO_REQUEST);
        assert_eq!(acc_hold_type(true, true, true, false, false, false), ACC_HMS_NO_REQUEST);
    }

    #[test]
    fn desired_gap_lands_in_selected_bar_only() {
        let h = MebAccHud {
            acc_status: ACC_HUD_ACTIVE,
            distance_bars: 2,
            desired_gap: 33.0,
            ..MebAccHud::default()
        };
        let m = create_acc_hud_control(Bus::Pt, &h);
        assert_eq!(m.get("Zeitluecke_2"), Some(33.0));
        for other in ["Zeitluecke_1", "Zeitluecke_3", "Zeitluecke_4", "Zeitluecke_5"] {
            assert_eq!(m.get(other), Some(0.0));
        }
    }

    #[test]
    fn override_sends_zero_accel_and_travel_assist_companion() {
        let a = MebAccel {
            acc_enabled: true,
            override_: true,
            accel: 1.5,
            acc_control: ACC_CTRL_OVERRIDE,
            travel_assist_available: true,
            ..MebAccel::default()
        };
        let msgs = create_acc_accel_control(Bus::Pt, &a);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].get("ACC_Sollbeschleunigung_02"), Some(0.0));
        assert_eq!(msgs[0].get("ACC_zul_Regelabw_oben"), Some(0.0));
        assert_eq!(msgs[1].get("Travel_Assist_Status"), Some(4.0));
    }

    #[test]
    fn jerk_band_only_while_active() {
        let a = MebAccel {
            acc_enabled: true,
            accel: 1.0,
            acc_control: ACC_CTRL_ACTIVE,
            lower_jerk: 0.0,
            upper_jerk: 5.0,
            ..MebAccel::default()
        };
        let m = &create_acc_accel_control(Bus::Pt, &a)[0];
        assert_eq!(m.get("ACC_zul_Regelabw_unten"), Some(0.05));
        assert_eq!(m.get("ACC_zul_Regelabw_oben"), Some(3.0));
        assert_eq!(m.get("ACC_AKTIV_regelt"), Some(1.0));
    }

    #[test]
    fn following_time_by_bars() {
        assert_eq!(t_follow(1), 1.25);
        assert_eq!(t_follow(2), 1.45);
        assert_eq!(t_follow(3), 1.75);
    }
}
