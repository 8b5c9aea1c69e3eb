use rstest::rstest;
use vwcar_core::Session;
use vwcar_core::error::BuildError;
use vwcar_core::params::{CarParams, ControllerParams, Platform, Transmission};

fn build(cp: CarParams) -> eyre::Result<Session> {
    Session::builder().with_car_params(cp).build()
}

#[rstest]
fn missing_car_params_yields_typed_build_error() {
    let err = Session::builder()
        .try_build()
        .expect_err("should fail with MissingCarParams");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingCarParams) => {}
        other => panic!("expected MissingCarParams, got: {other:?}"),
    }
}

#[rstest]
#[case::stock_hca_on_meb(Platform::Meb, Transmission::Automatic, true)]
#[case::stock_hca_on_pq(Platform::Pq, Transmission::Automatic, true)]
#[case::pq_direct(Platform::Pq, Transmission::Direct, false)]
#[case::meb_manual(Platform::Meb, Transmission::Manual, false)]
fn unsupported_car_combinations_rejected(
    #[case] platform: Platform,
    #[case] transmission: Transmission,
    #[case] stock_hca: bool,
) {
    let mut cp = CarParams::new(platform);
    cp.transmission = transmission;
    cp.stock_hca_present = stock_hca;
    let err = build(cp).expect_err("combination must be rejected");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn button_emulation_needs_pcm_cruise() {
    let mut cp = CarParams::new(Platform::Mqb);
    cp.pcm_cruise = false;
    cp.pcm_cruise_speed = false;
    let err = build(cp).expect_err("must be rejected");
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::InvalidConfig("button emulation requires pcm_cruise"))
    );
}

#[rstest]
#[case(0.0, -3.5)]
#[case(2.0, 0.5)]
#[case(f64::NAN, -3.5)]
fn accel_bounds_must_straddle_zero(#[case] max: f64, #[case] min: f64) {
    let mut ccp = ControllerParams::for_platform(Platform::Mqb);
    ccp.accel_max = max;
    ccp.accel_min = min;
    let err = Session::builder()
        .with_car_params(CarParams::new(Platform::Mqb))
        .with_controller_params(ccp)
        .build()
        .expect_err("must be rejected");
    assert!(err.downcast_ref::<BuildError>().is_some());
}

#[rstest]
fn power_range_checked() {
    let mut ccp = ControllerParams::for_platform(Platform::Meb);
    ccp.curvature.power_min = 200;
    let err = Session::builder()
        .with_car_params(CarParams::new(Platform::Meb))
        .with_controller_params(ccp)
        .build()
        .expect_err("must be rejected");
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::InvalidConfig("steering power range is inconsistent"))
    );
}

#[rstest]
#[case(Platform::Mqb)]
#[case(Platform::Pq)]
#[case(Platform::Meb)]
fn platform_defaults_build(#[case] platform: Platform) {
    let s = build(CarParams::new(platform)).expect("defaults are valid");
    assert_eq!(s.car_params().platform, platform);
    assert_eq!(s.frame(), 0);
}
