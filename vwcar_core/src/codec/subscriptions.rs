//! Which messages each platform listens to, at which nominal rate, on which bus.

use vwcar_traits::Bus;

use crate::params::{CarParams, NetworkLocation, Platform, RadarMode, Transmission};

/// `(message, expected frequency in Hz)`. A frequency of 0 marks messages that
/// may be absent on older cars and are not checked for staleness.
pub type Subscription = (&'static str, u32);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    pub pt: Vec<Subscription>,
    pub cam: Vec<Subscription>,
}

impl Subscriptions {
    pub fn on(&self, bus: Bus) -> &[Subscription] {
        match bus {
            Bus::Pt => &self.pt,
            Bus::Cam => &self.cam,
        }
    }

    pub fn contains(&self, bus: Bus, message: &str) -> bool {
        self.on(bus).iter().any(|(m, _)| *m == message)
    }
}

// ── MQB ──────────────────────────────────────────────────────────────────────

const MQB_PT: &[Subscription] = &[
    ("LWI_01", 100),
    ("LH_EPS_03", 100),
    ("ESP_19", 100),
    ("ESP_05", 50),
    ("ESP_21", 50),
    ("Motor_20", 50),
    ("TSK_06", 50),
    ("ESP_02", 50),
    ("GRA_ACC_01", 33),
    ("Gateway_72", 10),
    ("Motor_14", 10),
    ("Airbag_02", 5),
    ("Kombi_01", 2),
    ("Blinkmodi_02", 1),
    ("Kombi_03", 0),
];
const MQB_RADAR: &[Subscription] = &[("ACC_06", 50), ("ACC_10", 50), ("ACC_02", 17)];
const MQB_BSM: &[Subscription] = &[("SWA_01", 20)];

// ── PQ ───────────────────────────────────────────────────────────────────────

const PQ_PT: &[Subscription] = &[
    ("Bremse_1", 100),
    ("Bremse_3", 100),
    ("Lenkhilfe_3", 100),
    ("Lenkwinkel_1", 100),
    ("Motor_3", 100),
    ("Airbag_1", 50),
    ("Bremse_5", 50),
    ("GRA_Neu", 50),
    ("Kombi_1", 50),
    ("Motor_2", 50),
    ("Motor_5", 50),
    ("Lenkhilfe_2", 20),
    ("Gate_Komf_1", 10),
];
const PQ_RADAR: &[Subscription] = &[("ACC_System", 50), ("ACC_GRA_Anzeige", 25)];
const PQ_BSM: &[Subscription] = &[("SWA_1", 20)];

// ── MEB ──────────────────────────────────────────────────────────────────────

const MEB_PT: &[Subscription] = &[
    ("LWI_01", 100),
    ("GRA_ACC_01", 33),
    ("Airbag_02", 5),
    ("Motor_14", 10),
    ("Motor_16", 2),
    ("Blinkmodi_02", 2),
    ("LH_EPS_03", 100),
    ("Getriebe_11", 100),
    ("ZV_02", 5),
    ("MEB_EPS_01", 100),
    ("ESP_21", 50),
    ("MEB_ABS_01", 50),
    ("MEB_ESP_01", 100),
    ("MEB_ESP_03", 10),
    ("MEB_ESP_04", 50),
    ("MEB_ESP_05", 50),
    ("MEB_EPB_01", 20),
    ("MEB_Light_01", 5),
    ("MEB_Motor_01", 50),
    ("PSD_06", 7),
];
const MEB_RADAR: &[Subscription] = &[
    ("MEB_ACC_01", 17),
    ("MEB_ACC_02", 50),
    ("MEB_Travel_Assist_01", 10),
];
const MEB_BSM: &[Subscription] = &[("MEB_Side_Assist_01", 20)];

/// Radar message dropped when the car only offers plain cruise control.
const fn acc_control_message(platform: Platform) -> &'static str {
    match platform {
        Platform::Mqb => "ACC_06",
        Platform::Meb => "MEB_ACC_02",
        Platform::Pq => "ACC_System",
    }
}

fn radar_messages(cp: &CarParams) -> Vec<Subscription> {
    let (radar, bsm) = match cp.platform {
        Platform::Mqb => (MQB_RADAR, MQB_BSM),
        Platform::Pq => (PQ_RADAR, PQ_BSM),
        Platform::Meb => (MEB_RADAR, MEB_BSM),
    };
    let mut out = Vec::new();
    // PQ radars are always listened to; the cruise-only variants are MQB/MEB only.
    let with_radar = cp.platform == Platform::Pq || cp.radar.has_radar();
    if with_radar {
        let drop = (cp.platform != Platform::Pq && cp.radar == RadarMode::CruiseOnly)
            .then(|| acc_control_message(cp.platform));
        out.extend(radar.iter().filter(|(m, _)| Some(*m) != drop).copied());
    }
    if cp.enable_bsm {
        out.extend_from_slice(bsm);
    }
    out
}

/// Build the subscription tables for a session.
pub fn subscriptions(cp: &CarParams) -> Subscriptions {
    let mut pt: Vec<Subscription> = match cp.platform {
        Platform::Mqb => MQB_PT.to_vec(),
        Platform::Pq => PQ_PT.to_vec(),
        Platform::Meb => MEB_PT.to_vec(),
    };
    let mut cam: Vec<Subscription> = Vec::new();

    match (cp.platform, cp.transmission) {
        (Platform::Mqb, Transmission::Automatic) => pt.push(("Getriebe_11", 20)),
        (Platform::Mqb, Transmission::Direct) => pt.push(("EV_Gearshift", 10)),
        (Platform::Pq, Transmission::Automatic) => pt.push(("Getriebe_1", 100)),
        (Platform::Pq, Transmission::Manual) => pt.push(("Motor_1", 100)),
        // MEB reads Getriebe_11 unconditionally; MQB manual uses Motor_14/Gateway_72.
        _ => {}
    }

    if cp.platform == Platform::Mqb && cp.stock_hca_present {
        cam.push(("HCA_01", 1));
    }

    let ext = radar_messages(cp);
    match cp.network_location {
        NetworkLocation::FwdCamera => {
            let ldw = match cp.platform {
                Platform::Pq => "LDW_Status",
                Platform::Mqb | Platform::Meb => "LDW_02",
            };
            cam.push((ldw, 10));
            pt.extend(ext);
        }
        NetworkLocation::Gateway => cam.extend(ext),
    }

    Subscriptions { pt, cam }
}

/// Radar point parser subscriptions, where the platform exposes raw objects.
pub fn radar_subscriptions(cp: &CarParams) -> Option<Vec<Subscription>> {
    match cp.platform {
        Platform::Meb if cp.radar.has_radar() => Some(vec![("MEB_Distance_01", 25)]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cp(platform: Platform) -> CarParams {
        CarParams::new(platform)
    }

    #[test]
    fn mqb_fwd_camera_puts_radar_on_pt() {
        let s = subscriptions(&cp(Platform::Mqb));
        assert!(s.contains(Bus::Pt, "ACC_06"));
        assert!(s.contains(Bus::Pt, "ACC_02"));
        assert!(s.contains(Bus::Pt, "Getriebe_11"));
        assert!(s.contains(Bus::Cam, "LDW_02"));
        assert!(!s.contains(Bus::Cam, "ACC_06"));
        assert!(!s.contains(Bus::Cam, "HCA_01"));
    }

    #[test]
    fn gateway_moves_radar_and_bsm_to_cam() {
        let mut p = cp(Platform::Meb);
        p.network_location = NetworkLocation::Gateway;
        p.enable_bsm = true;
        let s = subscriptions(&p);
        assert!(s.contains(Bus::Cam, "MEB_ACC_02"));
        assert!(s.contains(Bus::Cam, "MEB_Side_Assist_01"));
        assert!(!s.contains(Bus::Cam, "LDW_02"));
        assert!(!s.contains(Bus::Pt, "MEB_ACC_01"));
    }

    #[rstest]
    #[case(Platform::Mqb, "ACC_06", "ACC_02")]
    #[case(Platform::Meb, "MEB_ACC_02", "MEB_ACC_01")]
    fn cruise_only_drops_acc_control(
        #[case] platform: Platform,
        #[case] dropped: &str,
        #[case] kept: &str,
    ) {
        let mut p = cp(platform);
        p.radar = RadarMode::CruiseOnly;
        let s = subscriptions(&p);
        assert!(!s.contains(Bus::Pt, dropped));
        assert!(s.contains(Bus::Pt, kept));
    }

    #[test]
    fn no_radar_drops_all_radar_messages_but_keeps_bsm() {
        let mut p = cp(Platform::Mqb);
        p.radar = RadarMode::CruiseOnlyNoRadar;
        p.enable_bsm = true;
        let s = subscriptions(&p);
        for m in ["ACC_06", "ACC_10", "ACC_02"] {
            assert!(!s.contains(Bus::Pt, m));
        }
        assert!(s.contains(Bus::Pt, "SWA_01"));
        assert!(radar_subscriptions(&p).is_none());
    }

    #[rstest]
    #[case(Transmission::Automatic, "Getriebe_1")]
    #[case(Transmission::Manual, "Motor_1")]
    fn pq_gear_message_follows_transmission(#[case] t: Transmission, #[case] msg: &str) {
        let mut p = cp(Platform::Pq);
        p.transmission = t;
        let s = subscriptions(&p);
        assert!(s.contains(Bus::Pt, msg));
        assert!(s.contains(Bus::Cam, "LDW_Status"));
    }

    #[test]
    fn stock_hca_adds_camera_hca() {
        let mut p = cp(Platform::Mqb);
        p.stock_hca_present = true;
        assert!(subscriptions(&p).contains(Bus::Cam, "HCA_01"));
    }

    #[test]
    fn meb_radar_points_on_cam() {
        assert_eq!(
            radar_subscriptions(&cp(Platform::Meb)),
            Some(vec![("MEB_Distance_01", 25)])
        );
        assert!(radar_subscriptions(&cp(Platform::Mqb)).is_none());
    }
}
