//! PQ message encoders.

use vwcar_traits::Bus;

use super::{ButtonRequest, CanMessage, LDW_PASSTHROUGH, LaneHud, StockButton, StockValues};

pub const GRA_PASSTHROUGH: [&str; 4] = [
    "GRA_Hauptschalt",
    "GRA_Typ_Hauptschalt",
    "GRA_Kodierinfo",
    "GRA_Sender",
];

pub const GRA_COUNTER: &str = "GRA_Neu_Zaehler";

pub fn create_steering_control(bus: Bus, apply_steer: i32, hca_enabled: bool) -> CanMessage {
    let (mag, sign) = super::split_signed(f64::from(apply_steer));
    let status = if hca_enabled && apply_steer != 0 { 5.0 } else { 3.0 };
    CanMessage::new("HCA_1", bus)
        .with("LM_Offset", mag)
        .with("LM_OffSign", sign)
        .with("HCA_Status", status)
        .with("Vib_Freq", 16.0)
}

pub fn create_lka_hud_control(
    bus: Bus,
    ldw_stock: &StockValues,
    lat_active: bool,
    steering_pressed: bool,
    hud_alert: f64,
    lanes: &LaneHud,
) -> CanMessage {
    CanMessage::new("LDW_Status", bus)
        .with_stock(&ldw_stock.pick(&LDW_PASSTHROUGH))
        .with_flag("LDW_Lampe_gelb", lat_active && steering_pressed)
        .with_flag("LDW_Lampe_gruen", lat_active && !steering_pressed)
        .with(
            "LDW_Lernmodus_links",
            LaneHud::lane_mode(lanes.left_lane_depart, lanes.left_lane_visible, 0),
        )
        .with(
            "LDW_Lernmodus_rechts",
            LaneHud::lane_mode(lanes.right_lane_depart, lanes.right_lane_visible, 0),
        )
        .with("LDW_Textbits", hud_alert)
}

pub fn create_acc_buttons_control(
    bus: Bus,
    gra_stock: &StockValues,
    counter: u8,
    req: ButtonRequest,
) -> CanMessage {
    let pressed = |b: StockButton| req.press == Some(b);
    CanMessage::new("GRA_Neu", bus)
        .with_stock(&gra_stock.pick(&GRA_PASSTHROUGH))
        .with(GRA_COUNTER, f64::from(counter % 16))
        .with_flag("GRA_Abbrechen", req.cancel)
        .with_flag("GRA_Recall", req.resume || pressed(StockButton::Resume))
        .with_flag("GRA_Neu_Setzen", pressed(StockButton::Set))
        .with_flag("GRA_Down_kurz", pressed(StockButton::Decel))
        .with_flag("GRA_Up_kurz", pressed(StockButton::Accel))
}

/// `ACS_Sta_ADR` value.
pub fn acc_control_value(main_switch_on: bool, acc_faulted: bool, long_active: bool) -> u8 {
    if acc_faulted {
        6
    } else if long_active {
        1
    } else if main_switch_on {
        2
    } else {
        0
    }
}

pub fn acc_hud_status_value(main_switch_on: bool, acc_faulted: bool, long_active: bool) -> u8 {
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

/// ACC_System longitudinal request. PQ carries no separate hold message.
pub fn create_acc_accel_control(
    bus: Bus,
    acc_type: f64,
    accel: f64,
    acc_control: u8,
    stopping: bool,
) -> Vec<CanMessage> {
    let regulating = acc_control == 1;
    let msg = CanMessage::new("ACC_System", bus)
        .with("ACS_Sta_ADR", f64::from(acc_control))
        .with_flag("ACS_StSt_Info", !regulating)
        .with("ACS_Typ_ACC", acc_type)
        .with_flag("ACS_Anhaltewunsch", acc_type == 1.0 && stopping)
        .with_flag("ACS_FreigSollB", regulating)
        .with("ACS_Sollbeschl", if regulating { accel } else { 3.01 })
        .with("ACS_zul_Regelabw", if regulating { 0.2 } else { 1.27 })
        .with("ACS_max_AendGrad", if regulating { 3.0 } else { 5.08 });
    vec![msg]
}

pub fn create_acc_hud_control(
    bus: Bus,
    acc_hud_status: u8,
    set_speed_kph: f64,
    lead_marker: u32,
    distance_bars: u8,
) -> CanMessage {
    CanMessage::new("ACC_GRA_Anzeige", bus)
        .with("ACA_StaACC", f64::from(acc_hud_status))
        .with("ACA_Zeitluecke", f64::from(distance_bars) + 1.0)
        .with("ACA_V_Wunsch", set_speed_kph)
        .with("ACA_gemZeitl", f64::from(lead_marker))
        .with("ACA_PrioDisp", 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hca_status_active_only_with_torque() {
        let m = create_steering_control(Bus::Pt, 0, true);
        assert_eq!(m.get("HCA_Status"), Some(3.0));
        let m = create_steering_control(Bus::Pt, -12, true);
        assert_eq!(m.get("HCA_Status"), Some(5.0));
        assert_eq!(m.get("LM_Offset"), Some(12.0));
        assert_eq!(m.get("LM_OffSign"), Some(1.0));
    }

    #[test]
    fn buttons_use_pq_names() {
        let mut stock = StockValues::default();
        stock.values.insert("GRA_Hauptschalt", 1.0);
        let req = ButtonRequest {
            cancel: true,
            ..ButtonRequest::default()
        };
        let m = create_acc_buttons_control(Bus::Pt, &stock, 3, req);
        assert_eq!(m.name, "GRA_Neu");
        assert_eq!(m.get("GRA_Hauptschalt"), Some(1.0));
        assert_eq!(m.get("GRA_Neu_Zaehler"), Some(3.0));
        assert_eq!(m.get("GRA_Abbrechen"), Some(1.0));
        assert_eq!(m.get("GRA_Recall"), Some(0.0));
    }

    #[test]
    fn accel_sentinel_when_not_regulating() {
        let m = &create_acc_accel_control(Bus::Pt, 1.0, 1.2, 2, true)[0];
        assert_eq!(m.get("ACS_Sollbeschl"), Some(3.01));
        assert_eq!(m.get("ACS_Anhaltewunsch"), Some(1.0));
        let m = &create_acc_accel_control(Bus::Pt, 0.0, 1.2, 1, false)[0];
        assert_eq!(m.get("ACS_Sollbeschl"), Some(1.2));
        assert_eq!(m.get("ACS_StSt_Info"), Some(0.0));
    }
}
