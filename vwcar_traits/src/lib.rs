//! Collaborator seams for the VW translation layer.
//!
//! The core never talks to a CAN parser, a pub/sub bus or a parameter store
//! directly. Everything it reads per tick comes through the traits below so
//! tests and the replay CLI can inject snapshots.

pub mod plan;

pub use plan::{LeadData, LongitudinalPlanSp, RadarState};

/// Physical CAN bus index as seen by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bus {
    /// Powertrain bus (J533 gateway side).
    Pt,
    /// Camera / extended bus behind the camera or gateway harness.
    Cam,
}

impl Bus {
    pub const fn index(self) -> u8 {
        match self {
            Bus::Pt => 0,
            Bus::Cam => 2,
        }
    }

    pub const fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Bus::Pt),
            2 => Some(Bus::Cam),
            _ => None,
        }
    }
}

/// Decoded view of the latest CAN frames.
///
/// Values are already scaled to physical units by the external parser.
pub trait SignalSource {
    /// Latest decoded value, `None` if the message was never seen.
    fn value(&self, bus: Bus, message: &str, signal: &str) -> Option<f64>;

    /// Whether every required message on `bus` is fresh.
    fn can_valid(&self, bus: Bus) -> bool;

    /// Latest value with missing signals read as zero, like a freshly
    /// initialised parser.
    fn get(&self, bus: Bus, message: &str, signal: &str) -> f64 {
        self.value(bus, message, signal).unwrap_or(0.0)
    }
}

/// Speed/acceleration smoother fed with the raw vehicle speed every frame.
pub trait SpeedFilter {
    /// Returns `(v_ego, a_ego)`.
    fn update(&mut self, v_ego_raw: f64) -> (f64, f64);
}

/// Polled side-channel from the planner and radar tracker.
///
/// Each call returns `Some` only when a fresh message arrived since the
/// previous poll. Implementations must never block.
pub trait PlanSource {
    fn poll_plan(&mut self) -> Option<LongitudinalPlanSp>;
    fn poll_radar(&mut self) -> Option<RadarState>;
}

/// Keys read from the persistent parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    SpeedLimitControl,
    IsMetric,
    LastSpeedLimitSignTap,
}

pub trait ParamStore {
    fn get_bool(&self, key: ParamKey) -> bool;
    /// Non-blocking write; failures are the store's concern.
    fn put_bool(&mut self, key: ParamKey, value: bool);
}
