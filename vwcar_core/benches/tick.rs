use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vwcar_core::Session;
use vwcar_core::controller::{Actuators, CarControl, LongControlState};
use vwcar_core::mocks::{MemoryParams, NoPlan, SignalSnapshot};
use vwcar_core::params::{CarParams, Platform};
use vwcar_traits::Bus;

// A plausible cruising snapshot: 25 m/s, EPS ready, ACC engaged.
fn cruising_snapshot() -> SignalSnapshot {
    let mut s = SignalSnapshot::default();
    for w in [
        "ESP_VL_Radgeschw_02",
        "ESP_VR_Radgeschw_02",
        "ESP_HL_Radgeschw_02",
        "ESP_HR_Radgeschw_02",
    ] {
        s.set(Bus::Pt, "ESP_19", w, 90.0);
    }
    s.set(Bus::Pt, "LH_EPS_03", "EPS_HCA_Status", 5.0);
    s.set(Bus::Pt, "LH_EPS_03", "EPS_Lenkmoment", 12.0);
    s.set(Bus::Pt, "TSK_06", "TSK_Status", 3.0);
    s.set(Bus::Pt, "GRA_ACC_01", "COUNTER", 4.0);
    s
}

fn session(platform: Platform) -> Option<Session> {
    let mut cp = CarParams::new(platform);
    cp.openpilot_longitudinal = true;
    Session::builder().with_car_params(cp).build().ok()
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("tick");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p vwcar_core --bench tick
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let src = cruising_snapshot();
    let cc = CarControl {
        enabled: true,
        lat_active: true,
        long_active: true,
        actuators: Actuators {
            steer: 0.3,
            curvature: 0.002,
            accel: 0.4,
            long_control_state: LongControlState::Pid,
        },
        v_cruise_kph: 100.0,
        ..CarControl::default()
    };

    for platform in [Platform::Mqb, Platform::Meb] {
        let Some(mut s) = session(platform) else {
            continue;
        };
        let mut params = MemoryParams::default();
        g.bench_function(format!("tick_{}", platform.name()), |b| {
            b.iter(|| {
                let out = s.tick(black_box(&src), black_box(&cc), &mut NoPlan, &mut params);
                black_box(out.command.messages.len());
            })
        });
    }
    g.finish();
}

criterion_group!(tick, bench_tick);
criterion_main!(tick);
