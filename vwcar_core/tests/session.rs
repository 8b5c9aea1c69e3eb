//! Whole-tick behaviour through `Session`.

use vwcar_core::controller::{Actuators, CarControl, LongControlState};
use vwcar_core::hca::HcaStatus;
use vwcar_core::mocks::{MemoryParams, NoPlan, SignalSnapshot};
use vwcar_core::params::{CarParams, Platform};
use vwcar_core::{Session, TickOutput};
use vwcar_traits::Bus;

fn mqb_session(op_long: bool) -> Session {
    let mut cp = CarParams::new(Platform::Mqb);
    cp.openpilot_longitudinal = op_long;
    Session::builder()
        .with_car_params(cp)
        .build()
        .expect("valid session")
}

fn steer_request() -> CarControl {
    CarControl {
        lat_active: true,
        actuators: Actuators {
            steer: 1.0,
            ..Actuators::default()
        },
        ..CarControl::default()
    }
}

fn tick(s: &mut Session, src: &SignalSnapshot, cc: &CarControl) -> TickOutput {
    s.tick(src, cc, &mut NoPlan, &mut MemoryParams::default())
}

fn hca_torque(out: &TickOutput) -> Option<f64> {
    out.command
        .find("HCA_01")
        .and_then(|m| m.get("HCA_01_LM_Offset"))
}

#[test]
fn initializing_then_active_clears_temporary_fault() {
    let mut s = mqb_session(false);
    let mut src = SignalSnapshot::default();
    src.set(Bus::Pt, "LH_EPS_03", "EPS_HCA_Status", 1.0);
    let cc = steer_request();

    for _ in 0..50 {
        let out = tick(&mut s, &src, &cc);
        assert_eq!(out.state.hca_status, Some(HcaStatus::Initializing));
        assert!(out.state.steer_fault_temporary);
        assert!(!out.state.steer_fault_permanent);
        if let Some(t) = hca_torque(&out) {
            assert_eq!(t, 0.0);
        }
    }

    src.set(Bus::Pt, "LH_EPS_03", "EPS_HCA_Status", 5.0);
    let out = tick(&mut s, &src, &cc);
    assert!(!out.state.steer_fault_temporary);
    assert!(!out.state.steer_fault_permanent);

    // back to initializing after init completed is a permanent fault
    src.set(Bus::Pt, "LH_EPS_03", "EPS_HCA_Status", 1.0);
    let out = tick(&mut s, &src, &cc);
    assert!(out.state.steer_fault_permanent);
}

#[test]
fn torque_ramps_by_delta_up_per_steer_frame() {
    let mut s = mqb_session(false);
    let src = SignalSnapshot::default().with(Bus::Pt, "LH_EPS_03", "EPS_HCA_Status", 3.0);
    let cc = steer_request();
    let torques: Vec<f64> = (0..8).filter_map(|_| hca_torque(&tick(&mut s, &src, &cc))).collect();
    assert_eq!(torques, vec![4.0, 8.0, 12.0, 16.0]);
}

#[test]
fn invalid_bus_suppresses_lateral() {
    let mut s = mqb_session(false);
    let mut src = SignalSnapshot::default().with(Bus::Pt, "LH_EPS_03", "EPS_HCA_Status", 5.0);
    src.set_can_valid(Bus::Cam, false);
    let out = tick(&mut s, &src, &steer_request());
    assert!(!out.state.can_valid);
    assert_eq!(hca_torque(&out), Some(0.0));
    assert_eq!(out.command.echo.steer_output_can, 0);
}

#[test]
fn accel_request_clamped_to_accel_max() {
    let mut s = mqb_session(true);
    let src = SignalSnapshot::default().with(Bus::Pt, "TSK_06", "TSK_Status", 3.0);
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
    let out = tick(&mut s, &src, &cc);
    assert!(out.state.cruise_state.enabled);
    assert_eq!(out.command.echo.accel, 2.0);
    let acc = out.command.find("ACC_06");
    assert_eq!(acc.and_then(|m| m.get("ACC_Sollbeschleunigung_02")), Some(2.0));
    assert_eq!(acc.and_then(|m| m.get("ACC_Status_ACC")), Some(3.0));
}

#[test]
fn meb_tick_reports_radar_points() {
    let mut s = Session::builder()
        .with_car_params(CarParams::new(Platform::Meb))
        .build()
        .expect("valid session");
    let src = SignalSnapshot::default()
        .with(Bus::Cam, "MEB_Distance_01", "Same_Lane_01_ObjectID", 7.0)
        .with(Bus::Cam, "MEB_Distance_01", "Same_Lane_01_Long_Distance", 35.0);
    let out = tick(&mut s, &src, &CarControl::default());
    let radar = out.radar.expect("MEB with radar parses objects");
    assert_eq!(radar.points.len(), 1);
    assert_eq!(radar.points[0].d_rel, 35.0);
    assert!(out.command.find("HCA_03").is_some());
}

#[test]
fn session_from_toml_config() {
    let text = r#"
        [car]
        platform = "pq"
        transmission = "manual"
        openpilot_longitudinal = true

        [limits]
        accel_max = 1.5
        steer_delta_up = 5

        [buttons]
        press_cap = 3
    "#;
    let cfg: vwcar_config::Config = toml::from_str(text).expect("parse");
    cfg.validate().expect("valid");
    let s = Session::from_config(&cfg).expect("build");
    assert_eq!(s.car_params().platform, Platform::Pq);
    assert!(s.car_params().openpilot_longitudinal);
    let ccp = s.controller().params();
    assert_eq!(ccp.accel_max, 1.5);
    assert_eq!(ccp.steer.delta_up, 5);
    assert!(s.subscriptions().contains(Bus::Pt, "Motor_1"));
}
