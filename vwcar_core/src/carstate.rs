//! Per-frame decode of the platform's CAN signals into a [`VehicleState`].
//!
//! `CarState` owns everything that must persist across frames: the HCA
//! init latch, the speed smoother, button history, the PSD_06 permission
//! flag and the PQ blinker stalk timers. The returned `VehicleState` is a
//! plain snapshot; nothing downstream mutates it.

use vwcar_traits::{Bus, SignalSource, SpeedFilter};

use crate::buttons::{ButtonEvent, ButtonTracker};
use crate::codec::{LDW_PASSTHROUGH, StockValues, mqb, pq, read_signed};
use crate::hca::{HcaFaultState, HcaStatus};
use crate::kf::KalmanSpeedFilter;
use crate::params::{CarParams, NetworkLocation, Platform, RadarMode, Transmission};
use crate::speed_limit::{Psd06, SpeedLimitDecoder};
use crate::util::{DEG_TO_RAD, KPH_TO_MS, finite_or_zero};

/// Driver torque above which the wheel counts as held.
pub const STEER_DRIVER_ALLOWANCE: f64 = 80.0;

/// PQ stalk blinkers stay lit this many frames after a rising edge.
const PQ_BLINKER_HOLD_FRAMES: u32 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

impl WheelSpeeds {
    /// From bus values in kph; negative or non-finite readings become 0.
    pub fn from_kph(fl: f64, fr: f64, rl: f64, rr: f64) -> Self {
        let ms = |kph: f64| (finite_or_zero(kph) * KPH_TO_MS).max(0.0);
        Self {
            fl: ms(fl),
            fr: ms(fr),
            rl: ms(rl),
            rr: ms(rr),
        }
    }

    pub fn mean(&self) -> f64 {
        (self.fl + self.fr + self.rl + self.rr) / 4.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Reverse,
    Neutral,
    Drive,
    Sport,
    Eco,
    Manumatic,
}

impl GearShifter {
    /// `GE_Fahrstufe` (Getriebe_11, MQB and MEB).
    pub fn from_getriebe_11(raw: f64) -> Self {
        match raw as i64 {
            5 => Self::Park,
            6 => Self::Reverse,
            7 => Self::Neutral,
            8 => Self::Drive,
            9 => Self::Sport,
            10 => Self::Eco,
            14 => Self::Manumatic,
            _ => Self::Unknown,
        }
    }

    /// `GearPosition` (EV_Gearshift, MQB direct drive).
    pub fn from_ev_gearshift(raw: f64) -> Self {
        match raw as i64 {
            2 => Self::Park,
            3 => Self::Reverse,
            4 => Self::Neutral,
            5 => Self::Drive,
            _ => Self::Unknown,
        }
    }

    /// `Waehlhebelposition__Getriebe_1_` (PQ automatic).
    pub fn from_getriebe_1(raw: f64) -> Self {
        match raw as i64 {
            8 => Self::Park,
            7 => Self::Reverse,
            6 => Self::Neutral,
            5 => Self::Drive,
            12 => Self::Sport,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CruiseState {
    pub available: bool,
    pub enabled: bool,
    pub standstill: bool,
    /// Set speed in m/s, 0 when unset.
    pub speed: f64,
    pub non_adaptive: bool,
    /// Traffic-sign limit in m/s (MEB), 0 when unknown.
    pub speed_limit: f64,
}

/// One frame of decoded vehicle state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    pub frame: u64,
    pub wheel_speeds: WheelSpeeds,
    pub v_ego_raw: f64,
    pub v_ego: f64,
    pub a_ego: f64,
    pub standstill: bool,

    pub steering_angle_deg: f64,
    pub steering_rate_deg: f64,
    pub steering_torque: f64,
    pub steering_pressed: bool,
    /// rad/s
    pub yaw_rate: f64,

    pub gas: f64,
    pub gas_pressed: bool,
    pub brake: f64,
    pub brake_pressed: bool,
    pub parking_brake: bool,
    pub gear_shifter: GearShifter,
    pub clutch_pressed: bool,
    pub door_open: bool,
    pub seatbelt_unlatched: bool,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub stock_fcw: bool,
    pub stock_aeb: bool,

    pub cruise_state: CruiseState,
    pub acc_faulted: bool,
    pub esp_disabled: bool,
    pub esp_active: bool,
    pub fuel_gauge: f64,
    pub acc_type: f64,
    pub esp_hold_confirmation: bool,
    pub upscale_lead_car_signal: bool,
    pub travel_assist_available: bool,

    pub hca_status: Option<HcaStatus>,
    pub steer_fault_temporary: bool,
    pub steer_fault_permanent: bool,
    pub car_faulted_non_critical: bool,

    pub button_events: Vec<ButtonEvent>,
    pub gra_stock: StockValues,
    pub eps_stock: StockValues,
    pub ldw_stock: StockValues,

    pub can_valid: bool,
}

/// Read helper bound to one snapshot; non-finite values read as 0.
struct Reader<'a> {
    src: &'a dyn SignalSource,
    ext: Bus,
}

impl Reader<'_> {
    fn get(&self, bus: Bus, message: &str, signal: &str) -> f64 {
        finite_or_zero(self.src.get(bus, message, signal))
    }

    fn pt(&self, message: &str, signal: &str) -> f64 {
        self.get(Bus::Pt, message, signal)
    }

    fn cam(&self, message: &str, signal: &str) -> f64 {
        self.get(Bus::Cam, message, signal)
    }

    fn ext(&self, message: &str, signal: &str) -> f64 {
        self.get(self.ext, message, signal)
    }

    fn pt_on(&self, message: &str, signal: &str) -> bool {
        self.pt(message, signal) != 0.0
    }

    fn ext_on(&self, message: &str, signal: &str) -> bool {
        self.ext(message, signal) != 0.0
    }

    fn signed(&self, bus: Bus, message: &str, magnitude: &str, sign: &str) -> f64 {
        finite_or_zero(read_signed(self.src, bus, message, magnitude, sign))
    }
}

/// Stalk-driven blinker with a minimum on-time.
#[derive(Debug, Clone, Copy, Default)]
struct StalkBlinkers {
    left_cnt: u32,
    right_cnt: u32,
    left_prev: bool,
    right_prev: bool,
}

impl StalkBlinkers {
    fn update(&mut self, hold: u32, left: bool, right: bool) -> (bool, bool) {
        if left {
            self.right_cnt = 0;
            if !self.left_prev {
                self.left_cnt = hold;
            }
        }
        if right {
            self.left_cnt = 0;
            if !self.right_prev {
                self.right_cnt = hold;
            }
        }
        self.left_cnt = self.left_cnt.saturating_sub(1);
        self.right_cnt = self.right_cnt.saturating_sub(1);
        self.left_prev = left;
        self.right_prev = right;
        (left || self.left_cnt > 0, right || self.right_cnt > 0)
    }
}

const fn ext_has_radar(cp: &CarParams) -> bool {
    cp.radar.has_radar()
}

/// TSK status: 2 ready, 3 regulating, 4 override, 5 brake only, 6/7 fault.
fn tsk_cruise(status: f64) -> (bool, bool, bool) {
    let s = status as i64;
    (
        (2..=5).contains(&s),
        (3..=5).contains(&s),
        matches!(s, 6 | 7),
    )
}

pub struct CarState {
    cp: CarParams,
    frame: u64,
    hca: HcaFaultState,
    speed_filter: Box<dyn SpeedFilter>,
    buttons: ButtonTracker,
    speed_limit: SpeedLimitDecoder,
    blinkers: StalkBlinkers,
    acc_type: f64,
    was_can_valid: bool,
}

impl core::fmt::Debug for CarState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CarState")
            .field("platform", &self.cp.platform)
            .field("frame", &self.frame)
            .field("eps_init_complete", &self.hca.eps_init_complete())
            .finish_non_exhaustive()
    }
}

impl CarState {
    pub fn new(cp: CarParams) -> Self {
        Self::with_speed_filter(cp, Box::new(KalmanSpeedFilter::default()))
    }

    pub fn with_speed_filter(cp: CarParams, speed_filter: Box<dyn SpeedFilter>) -> Self {
        let buttons = ButtonTracker::new(cp.platform);
        Self {
            cp,
            frame: 0,
            hca: HcaFaultState::new(),
            speed_filter,
            buttons,
            speed_limit: SpeedLimitDecoder::new(),
            blinkers: StalkBlinkers::default(),
            acc_type: 0.0,
            was_can_valid: true,
        }
    }

    pub const fn car_params(&self) -> &CarParams {
        &self.cp
    }

    pub const fn frame(&self) -> u64 {
        self.frame
    }

    pub const fn eps_init_complete(&self) -> bool {
        self.hca.eps_init_complete()
    }

    pub fn update(&mut self, src: &dyn SignalSource) -> VehicleState {
        let r = Reader {
            src,
            ext: self.cp.ext_bus(),
        };
        let mut cs = VehicleState {
            frame: self.frame,
            ..VehicleState::default()
        };

        let hca_raw = match self.cp.platform {
            Platform::Mqb => self.decode_mqb(&r, &mut cs),
            Platform::Pq => self.decode_pq(&r, &mut cs),
            Platform::Meb => self.decode_meb(&r, &mut cs),
        };

        let (v_ego, a_ego) = self.speed_filter.update(cs.v_ego_raw);
        cs.v_ego = finite_or_zero(v_ego).max(0.0);
        cs.a_ego = finite_or_zero(a_ego);
        cs.standstill = cs.v_ego_raw == 0.0;
        cs.steering_pressed = cs.steering_torque.abs() > STEER_DRIVER_ALLOWANCE;

        cs.hca_status = HcaStatus::from_raw(hca_raw);
        let faults = self.hca.update(cs.hca_status, self.frame);
        cs.steer_fault_temporary = faults.temporary;
        cs.steer_fault_permanent = faults.permanent;

        cs.acc_type = self.acc_type;
        cs.button_events = self.buttons.update(src, Bus::Pt);
        cs.ldw_stock = self.capture_ldw(src);

        cs.can_valid = src.can_valid(Bus::Pt) && src.can_valid(Bus::Cam);
        if cs.can_valid != self.was_can_valid {
            if cs.can_valid {
                tracing::info!(frame = self.frame, "can bus valid again");
            } else {
                tracing::warn!(
                    frame = self.frame,
                    pt = src.can_valid(Bus::Pt),
                    cam = src.can_valid(Bus::Cam),
                    "can bus invalid"
                );
            }
            self.was_can_valid = cs.can_valid;
        }

        tracing::trace!(
            frame = self.frame,
            v_ego = cs.v_ego,
            steering_torque = cs.steering_torque,
            cruise_enabled = cs.cruise_state.enabled,
            "decoded"
        );

        self.frame += 1;
        cs
    }

    fn capture_ldw(&self, src: &dyn SignalSource) -> StockValues {
        if self.cp.network_location != NetworkLocation::FwdCamera {
            return StockValues::default();
        }
        let message = match self.cp.platform {
            Platform::Pq => "LDW_Status",
            Platform::Mqb | Platform::Meb => "LDW_02",
        };
        StockValues::capture(src, Bus::Cam, message, &LDW_PASSTHROUGH)
    }

    fn update_acc_type(&mut self, r: &Reader<'_>, message: &str, signal: &str) {
        self.acc_type = match self.cp.radar {
            RadarMode::Acc => r.ext(message, signal),
            RadarMode::CruiseOnly => 0.0,
            // no radar to ask; keep whatever we had
            RadarMode::CruiseOnlyNoRadar => self.acc_type,
        };
    }

    // ── MQB ──────────────────────────────────────────────────────────────────

    fn decode_mqb(&mut self, r: &Reader<'_>, cs: &mut VehicleState) -> f64 {
        let cp = &self.cp;
        cs.wheel_speeds = WheelSpeeds::from_kph(
            r.pt("ESP_19", "ESP_VL_Radgeschw_02"),
            r.pt("ESP_19", "ESP_VR_Radgeschw_02"),
            r.pt("ESP_19", "ESP_HL_Radgeschw_02"),
            r.pt("ESP_19", "ESP_HR_Radgeschw_02"),
        );
        cs.v_ego_raw = cs.wheel_speeds.mean();

        cs.steering_angle_deg =
            r.signed(Bus::Pt, "LWI_01", "LWI_Lenkradwinkel", "LWI_VZ_Lenkradwinkel");
        cs.steering_rate_deg =
            r.signed(Bus::Pt, "LWI_01", "LWI_Lenkradw_Geschw", "LWI_VZ_Lenkradw_Geschw");
        cs.steering_torque =
            r.signed(Bus::Pt, "LH_EPS_03", "EPS_Lenkmoment", "EPS_VZ_Lenkmoment");
        cs.yaw_rate =
            r.signed(Bus::Pt, "ESP_02", "ESP_Gierrate", "ESP_VZ_Gierrate") * DEG_TO_RAD;

        cs.eps_stock = StockValues::capture(r.src, Bus::Pt, "LH_EPS_03", &mqb::EPS_PASSTHROUGH);
        if cp.stock_hca_present {
            cs.car_faulted_non_critical = r.cam("HCA_01", "EA_Ruckfreigabe") != 0.0
                || r.cam("HCA_01", "EA_ACC_Sollstatus") > 0.0;
        }

        cs.gas = r.pt("Motor_20", "MO_Fahrpedalrohwert_01") / 100.0;
        cs.gas_pressed = cs.gas > 0.0;
        cs.brake = r.pt("ESP_05", "ESP_Bremsdruck") / 250.0;
        cs.brake_pressed =
            r.pt_on("Motor_14", "MO_Fahrer_bremst") || r.pt_on("ESP_05", "ESP_Fahrer_bremst");
        cs.parking_brake = r.pt_on("Kombi_01", "KBI_Handbremse");

        match cp.transmission {
            Transmission::Automatic => {
                cs.gear_shifter = GearShifter::from_getriebe_11(r.pt("Getriebe_11", "GE_Fahrstufe"));
            }
            Transmission::Direct => {
                cs.gear_shifter =
                    GearShifter::from_ev_gearshift(r.pt("EV_Gearshift", "GearPosition"));
            }
            Transmission::Manual => {
                cs.clutch_pressed = !r.pt_on("Motor_14", "MO_Kuppl_schalter");
                cs.gear_shifter = if r.pt_on("Gateway_72", "BCM1_Rueckfahrlicht_Schalter") {
                    GearShifter::Reverse
                } else {
                    GearShifter::Drive
                };
            }
        }

        cs.door_open = [
            "ZV_FT_offen",
            "ZV_BT_offen",
            "ZV_HFS_offen",
            "ZV_HBFS_offen",
            "ZV_HD_offen",
        ]
        .iter()
        .any(|s| r.pt_on("Gateway_72", s));
        cs.seatbelt_unlatched = r.pt("Airbag_02", "AB_Gurtschloss_FA") != 3.0;

        if cp.enable_bsm {
            cs.left_blindspot = r.ext_on("SWA_01", "SWA_Infostufe_SWA_li")
                || r.ext_on("SWA_01", "SWA_Warnung_SWA_li");
            cs.right_blindspot = r.ext_on("SWA_01", "SWA_Infostufe_SWA_re")
                || r.ext_on("SWA_01", "SWA_Warnung_SWA_re");
        }

        let has_radar = ext_has_radar(cp);
        if has_radar {
            cs.stock_fcw = r.ext_on("ACC_10", "AWV2_Freigabe");
            cs.stock_aeb = r.ext_on("ACC_10", "ANB_Teilbremsung_Freigabe")
                || r.ext_on("ACC_10", "ANB_Zielbremsung_Freigabe");
        }

        let (available, enabled, faulted) = tsk_cruise(r.pt("TSK_06", "TSK_Status"));
        cs.cruise_state.available = available;
        cs.cruise_state.enabled = enabled;
        cs.acc_faulted = faulted;
        let radar_cruise = cp.pcm_cruise && has_radar;
        cs.cruise_state.non_adaptive = if radar_cruise {
            r.ext("ACC_02", "ACC_Gesetzte_Zeitluecke") == 0.0
        } else {
            r.pt_on("TSK_06", "TSK_Limiter_ausgewaehlt")
        };

        cs.esp_hold_confirmation = r.pt_on("ESP_21", "ESP_Haltebestaetigung");
        cs.cruise_state.standstill = cp.pcm_cruise && cs.esp_hold_confirmation;
        if radar_cruise {
            let speed = r.ext("ACC_02", "ACC_Wunschgeschw_02") * KPH_TO_MS;
            cs.cruise_state.speed = if speed > 90.0 { 0.0 } else { speed.max(0.0) };
        }

        cs.left_blinker = r.pt_on("Blinkmodi_02", "Comfort_Signal_Left");
        cs.right_blinker = r.pt_on("Blinkmodi_02", "Comfort_Signal_Right");
        cs.gra_stock = capture_gra(r.src, &mqb::GRA_PASSTHROUGH, mqb::GRA_COUNTER, "GRA_ACC_01");
        cs.esp_disabled = r.pt("ESP_21", "ESP_Tastung_passiv") != 0.0;
        cs.upscale_lead_car_signal = r.pt_on("Kombi_03", "KBI_Variante");

        self.update_acc_type(r, "ACC_06", "ACC_Typ");
        r.pt("LH_EPS_03", "EPS_HCA_Status")
    }

    // ── PQ ───────────────────────────────────────────────────────────────────

    fn decode_pq(&mut self, r: &Reader<'_>, cs: &mut VehicleState) -> f64 {
        let cp = &self.cp;
        cs.wheel_speeds = WheelSpeeds::from_kph(
            r.pt("Bremse_3", "Radgeschw__VL_4_1"),
            r.pt("Bremse_3", "Radgeschw__VR_4_1"),
            r.pt("Bremse_3", "Radgeschw__HL_4_1"),
            r.pt("Bremse_3", "Radgeschw__HR_4_1"),
        );
        // Bremse_3 is missing on some cars; Bremse_1 always carries speed
        cs.v_ego_raw = (r.pt("Bremse_1", "Geschwindigkeit_neu__Bremse_1_") * KPH_TO_MS).max(0.0);

        cs.steering_angle_deg = r.signed(Bus::Pt, "Lenkhilfe_3", "LH3_BLW", "LH3_BLWSign");
        cs.steering_rate_deg = r.signed(
            Bus::Pt,
            "Lenkwinkel_1",
            "Lenkradwinkel_Geschwindigkeit",
            "Lenkradwinkel_Geschwindigkeit_S",
        );
        cs.steering_torque = r.signed(Bus::Pt, "Lenkhilfe_3", "LH3_LM", "LH3_LMSign");
        cs.yaw_rate = r.signed(
            Bus::Pt,
            "Bremse_5",
            "Giergeschwindigkeit",
            "Vorzeichen_der_Giergeschwindigk",
        ) * DEG_TO_RAD;

        cs.gas = r.pt("Motor_3", "Fahrpedal_Rohsignal") / 100.0;
        cs.gas_pressed = cs.gas > 0.0;
        cs.brake = r.pt("Bremse_5", "Bremsdruck") / 250.0;
        cs.brake_pressed = r.pt_on("Motor_2", "Bremslichtschalter");
        cs.parking_brake = r.pt_on("Kombi_1", "Bremsinfo");

        match cp.transmission {
            Transmission::Automatic => {
                cs.gear_shifter = GearShifter::from_getriebe_1(
                    r.pt("Getriebe_1", "Waehlhebelposition__Getriebe_1_"),
                );
            }
            Transmission::Manual => {
                cs.clutch_pressed = !r.pt_on("Motor_1", "Kupplungsschalter");
                cs.gear_shifter = if r.pt_on("Gate_Komf_1", "GK1_Rueckfahr") {
                    GearShifter::Reverse
                } else {
                    GearShifter::Drive
                };
            }
            // rejected at build time
            Transmission::Direct => {}
        }

        cs.door_open = [
            "GK1_Fa_Tuerkont",
            "BSK_BT_geoeffnet",
            "BSK_HL_geoeffnet",
            "BSK_HR_geoeffnet",
            "BSK_HD_Hauptraste",
        ]
        .iter()
        .any(|s| r.pt_on("Gate_Komf_1", s));
        cs.seatbelt_unlatched = !r.pt_on("Airbag_1", "Gurtschalter_Fahrer");

        if cp.enable_bsm {
            cs.left_blindspot = r.ext_on("SWA_1", "SWA_Infostufe_SWA_li")
                || r.ext_on("SWA_1", "SWA_Warnung_SWA_li");
            cs.right_blindspot = r.ext_on("SWA_1", "SWA_Infostufe_SWA_re")
                || r.ext_on("SWA_1", "SWA_Warnung_SWA_re");
        }

        cs.cruise_state.available = r.pt_on("Motor_5", "GRA_Hauptschalter");
        let gra_status = r.pt("Motor_2", "GRA_Status") as i64;
        cs.cruise_state.enabled = matches!(gra_status, 1 | 2);
        cs.acc_faulted = if cp.pcm_cruise {
            matches!(r.ext("ACC_GRA_Anzeige", "ACA_StaACC") as i64, 6 | 7)
        } else {
            gra_status == 3
        };
        // 255 kph means no setpoint yet
        let speed = r.ext("ACC_GRA_Anzeige", "ACA_V_Wunsch") * KPH_TO_MS;
        cs.cruise_state.speed = if speed > 70.0 { 0.0 } else { speed.max(0.0) };

        let (left, right) = self.blinkers.update(
            PQ_BLINKER_HOLD_FRAMES,
            r.pt_on("Gate_Komf_1", "GK1_Blinker_li"),
            r.pt_on("Gate_Komf_1", "GK1_Blinker_re"),
        );
        cs.left_blinker = left;
        cs.right_blinker = right;
        cs.gra_stock = capture_gra(r.src, &pq::GRA_PASSTHROUGH, pq::GRA_COUNTER, "GRA_Neu");
        cs.esp_disabled = r.pt_on("Bremse_1", "ESP_Passiv_getastet");

        // PQ radars always report their type
        self.acc_type = r.ext("ACC_System", "ACS_Typ_ACC");
        r.pt("Lenkhilfe_2", "LH2_Sta_HCA")
    }

    // ── MEB ──────────────────────────────────────────────────────────────────

    fn decode_meb(&mut self, r: &Reader<'_>, cs: &mut VehicleState) -> f64 {
        let cp = &self.cp;
        cs.wheel_speeds = WheelSpeeds::from_kph(
            r.pt("MEB_ESP_01", "VL_Radgeschw"),
            r.pt("MEB_ESP_01", "VR_Radgeschw"),
            r.pt("MEB_ESP_01", "HL_Radgeschw"),
            r.pt("MEB_ESP_01", "HR_Radgeschw"),
        );
        cs.v_ego_raw = cs.wheel_speeds.mean();

        cs.steering_angle_deg =
            r.signed(Bus::Pt, "LH_EPS_03", "EPS_Berechneter_LW", "EPS_VZ_BLW");
        cs.steering_rate_deg =
            r.signed(Bus::Pt, "LWI_01", "LWI_Lenkradw_Geschw", "LWI_VZ_Lenkradw_Geschw");
        cs.steering_torque =
            r.signed(Bus::Pt, "LH_EPS_03", "EPS_Lenkmoment", "EPS_VZ_Lenkmoment");
        cs.yaw_rate = r.signed(Bus::Pt, "MEB_ESP_04", "Yaw_Rate", "Yaw_Rate_Sign") * DEG_TO_RAD;
        cs.eps_stock = StockValues::capture(r.src, Bus::Pt, "LH_EPS_03", &mqb::EPS_PASSTHROUGH);

        cs.gas = r.pt("MEB_ESP_03", "Accelerator_Pressure");
        cs.gas_pressed = cs.gas > 0.0;
        // includes driver-requested regen
        cs.brake_pressed = r.pt_on("Motor_14", "MO_Fahrer_bremst");
        cs.brake = r.pt("MEB_ESP_01", "Brake_Pressure");
        // EPB closing or closed
        cs.parking_brake = matches!(r.pt("MEB_EPB_01", "EPB_Status") as i64, 1 | 4);
        cs.gear_shifter = GearShifter::from_getriebe_11(r.pt("Getriebe_11", "GE_Fahrstufe"));

        cs.door_open = [
            "ZV_FT_offen",
            "ZV_BT_offen",
            "ZV_HFS_offen",
            "ZV_HBFS_offen",
            "ZV_HD_offen",
        ]
        .iter()
        .any(|s| r.pt_on("ZV_02", s));
        cs.seatbelt_unlatched = r.pt("Airbag_02", "AB_Gurtschloss_FA") != 3.0;

        if cp.enable_bsm {
            cs.left_blindspot = r.ext("MEB_Side_Assist_01", "Blind_Spot_Left") > 0.0;
            cs.right_blindspot = r.ext("MEB_Side_Assist_01", "Blind_Spot_Right") > 0.0;
        }

        let has_radar = ext_has_radar(cp);
        if has_radar {
            cs.stock_fcw = r.pt_on("MEB_ESP_05", "FCW_Active");
            cs.stock_aeb = r.pt_on("MEB_ESP_05", "AEB_Active");
        }
        cs.travel_assist_available =
            r.ext_on("MEB_Travel_Assist_01", "Travel_Assist_Available");

        let (available, enabled, faulted) = tsk_cruise(r.pt("MEB_Motor_01", "TSK_Status"));
        cs.cruise_state.available = available;
        cs.cruise_state.enabled = enabled;
        cs.acc_faulted = faulted;
        let radar_cruise = cp.pcm_cruise && has_radar;
        cs.cruise_state.non_adaptive = if radar_cruise {
            r.ext_on("MEB_ACC_01", "ACC_Limiter_Mode")
        } else {
            r.pt_on("MEB_Motor_01", "TSK_Limiter_ausgewaehlt")
        };

        cs.esp_hold_confirmation = r.pt_on("MEB_ESP_05", "ESP_Hold");
        cs.cruise_state.standstill = cp.pcm_cruise && cs.esp_hold_confirmation;
        if radar_cruise {
            let speed = r.ext("MEB_ACC_01", "ACC_Wunschgeschw_02").round() * KPH_TO_MS;
            cs.cruise_state.speed = if speed > 90.0 { 0.0 } else { speed.max(0.0) };
        }

        let psd = Psd06 {
            mux: r.pt("PSD_06", "PSD_06_Mux") as u8,
            unit: r.pt("PSD_06", "PSD_Sys_Geschwindigkeit_Einheit"),
            quality: r.pt("PSD_06", "PSD_Sys_Quali_Tempolimits"),
            raw_speed: r.pt("PSD_06", "PSD_Ges_Geschwindigkeit"),
            kind: r.pt("PSD_06", "PSD_Ges_Typ"),
            category: r.pt("PSD_06", "PSD_Ges_Gesetzlich_Kategorie"),
        };
        cs.cruise_state.speed_limit = self.speed_limit.update(&psd);

        cs.left_blinker = r.pt_on("Blinkmodi_02", "BM_links");
        cs.right_blinker = r.pt_on("Blinkmodi_02", "BM_rechts");
        cs.gra_stock = capture_gra(r.src, &mqb::GRA_PASSTHROUGH, mqb::GRA_COUNTER, "GRA_ACC_01");
        // also set in ESC sport mode
        cs.esp_disabled = r.pt_on("ESP_21", "ESP_Tastung_passiv");
        cs.esp_active = r.pt_on("ESP_21", "ESP_Eingriff");
        cs.fuel_gauge = r.pt("Motor_16", "MO_Energieinhalt_BMS");

        self.update_acc_type(r, "MEB_ACC_02", "ACC_Typ");
        r.pt("MEB_EPS_01", "LatCon_HCA_Status")
    }
}

fn capture_gra(
    src: &dyn SignalSource,
    passthrough: &[&'static str],
    counter: &'static str,
    message: &str,
) -> StockValues {
    let mut stock = StockValues::capture(src, Bus::Pt, message, passthrough);
    stock
        .values
        .insert(counter, finite_or_zero(src.get(Bus::Pt, message, counter)));
    stock
}
