//! MQB message encoders.

use vwcar_traits::Bus;

use super::{ButtonRequest, CanMessage, LDW_PASSTHROUGH, LaneHud, StockButton, StockValues, flag};

/// Stock GRA_ACC_01 fields we copy through untouched.
pub const GRA_PASSTHROUGH: [&str; 5] = [
    "GRA_Hauptschalter",
    "GRA_Typ_Hauptschalter",
    "GRA_Codierung",
    "GRA_Tip_Stufe_2",
    "GRA_ButtonTypeInfo",
];

/// Stock LH_EPS_03 fields kept when rewriting the driver torque echo.
pub const EPS_PASSTHROUGH: [&str; 4] = [
    "COUNTER",
    "EPS_Berechneter_LW",
    "EPS_VZ_BLW",
    "EPS_HCA_Status",
];

pub const GRA_COUNTER: &str = "COUNTER";

pub fn create_steering_control(bus: Bus, apply_steer: i32, hca_enabled: bool) -> CanMessage {
    let (mag, sign) = super::split_signed(f64::from(apply_steer));
    CanMessage::new("HCA_01", bus)
        .with_flag("HCA_01_Sendestatus", hca_enabled)
        .with("HCA_01_LM_Offset", mag)
        .with("HCA_01_LM_OffSign", sign)
        .with("HCA_01_Vib_Freq", 18.0)
        .with("EA_ACC_Wunschgeschwindigkeit", 327.36)
}

/// Rewrite the EPS driver torque seen by the camera's inactivity monitor.
pub fn create_eps_update(bus: Bus, eps_stock: &StockValues, simulated_torque: f64) -> CanMessage {
    let (mag, sign) = super::split_signed(simulated_torque);
    CanMessage::new("LH_EPS_03", bus)
        .with_stock(&eps_stock.pick(&EPS_PASSTHROUGH))
        .with("EPS_Lenkmoment", mag)
        .with("EPS_VZ_Lenkmoment", sign)
}

pub fn create_lka_hud_control(
    bus: Bus,
    ldw_stock: &StockValues,
    lat_active: bool,
    steering_pressed: bool,
    hud_alert: f64,
    lanes: &LaneHud,
) -> CanMessage {
    CanMessage::new("LDW_02", bus)
        .with_stock(&ldw_stock.pick(&LDW_PASSTHROUGH))
        .with_flag("LDW_Status_LED_gelb", lat_active && steering_pressed)
        .with_flag("LDW_Status_LED_gruen", lat_active && !steering_pressed)
        .with(
            "LDW_Lernmodus_links",
            LaneHud::lane_mode(lanes.left_lane_depart, lanes.left_lane_visible, 0),
        )
        .with(
            "LDW_Lernmodus_rechts",
            LaneHud::lane_mode(lanes.right_lane_depart, lanes.right_lane_visible, 0),
        )
        .with("LDW_Texte", hud_alert)
}

/// GRA_ACC_01 frame, shared by MQB and MEB.
///
/// `counter` is the value to put on the wire; callers derive it either from
/// the stock counter (forwarding) or from the frame index (emulation).
pub fn create_acc_buttons_control(
    bus: Bus,
    gra_stock: &StockValues,
    counter: u8,
    req: ButtonRequest,
) -> CanMessage {
    let pressed = |b: StockButton| req.press == Some(b);
    CanMessage::new("GRA_ACC_01", bus)
        .with_stock(&gra_stock.pick(&GRA_PASSTHROUGH))
        .with(GRA_COUNTER, f64::from(counter % 16))
        .with_flag("GRA_Abbrechen", req.cancel)
        .with_flag(
            "GRA_Tip_Wiederaufnahme",
            req.resume || pressed(StockButton::Resume),
        )
        .with_flag("GRA_Tip_Setzen", pressed(StockButton::Set))
        .with_flag("GRA_Tip_Runter", pressed(StockButton::Decel))
        .with_flag("GRA_Tip_Hoch", pressed(StockButton::Accel))
}

pub fn acc_control_value(main_switch_on: bool, acc_faulted: bool, long_active: bool) -> u8 {
    if acc_faulted {
        6
    } else if long_active {
        3
    } else if main_switch_on {
        2
    } else {
        0
    }
}

pub fn acc_hud_status_value(main_switch_on: bool, acc_faulted: bool, long_active: bool) -> u8 {
    acc_control_value(main_switch_on, acc_faulted, long_active)
}

/// ACC_06 + ACC_07 longitudinal request.
#[allow(clippy::too_many_arguments)]
pub fn create_acc_accel_control(
    bus: Bus,
    acc_type: f64,
    acc_enabled: bool,
    accel: f64,
    acc_control: u8,
    stopping: bool,
    starting: bool,
    esp_hold: bool,
) -> Vec<CanMessage> {
    let request = if acc_enabled { accel } else { 3.01 };
    let grad = if acc_enabled { 4.0 } else { 0.0 };
    let acc_06 = CanMessage::new("ACC_06", bus)
        .with("ACC_Typ", acc_type)
        .with("ACC_Status_ACC", f64::from(acc_control))
        .with_flag("ACC_StartStopp_Info", acc_enabled)
        .with("ACC_Sollbeschleunigung_02", request)
        .with("ACC_zul_Regelabw_unten", 0.2)
        .with("ACC_zul_Regelabw_oben", 0.2)
        .with("ACC_neg_Sollbeschl_Grad_02", grad)
        .with("ACC_pos_Sollbeschl_Grad_02", grad)
        .with_flag("ACC_Anfahren", starting)
        .with_flag("ACC_Anhalten", stopping);

    let hold = if starting {
        4.0
    } else if esp_hold {
        3.0
    } else if stopping {
        1.0
    } else {
        0.0
    };
    let acc_07 = CanMessage::new("ACC_07", bus)
        .with("ACC_Anhalteweg", if stopping { 0.3 } else { 20.46 })
        .with("ACC_Freilauf_Info", if acc_enabled { 2.0 } else { 0.0 })
        .with("ACC_Folgebeschl", 3.02)
        .with("ACC_Sollbeschleunigung_02", request)
        .with("ACC_Anforderung_HMS", hold)
        .with_flag("ACC_Anfahren", starting)
        .with_flag("ACC_Anhalten", stopping);

    vec![acc_06, acc_07]
}

/// ACC_02 cluster display.
pub fn create_acc_hud_control(
    bus: Bus,
    acc_hud_status: u8,
    set_speed_kph: f64,
    lead_marker: u32,
    distance_bars: u8,
) -> CanMessage {
    CanMessage::new("ACC_02", bus)
        .with("ACC_Status_Anzeige", f64::from(acc_hud_status))
        .with(
            "ACC_Wunschgeschw_02",
            if set_speed_kph < 250.0 { set_speed_kph } else { 327.36 },
        )
        .with("ACC_Gesetzte_Zeitluecke", f64::from(distance_bars) + 2.0)
        .with("ACC_Display_Prio", 3.0)
        .with("ACC_Abstandsindex", f64::from(lead_marker))
}
