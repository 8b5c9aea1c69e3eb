//! In-memory collaborators for tests, benches and the replay CLI.

use std::collections::{HashMap, HashSet, VecDeque};

use vwcar_traits::{
    Bus, LongitudinalPlanSp, ParamKey, ParamStore, PlanSource, RadarState, SignalSource,
};

/// Latest decoded value per `(bus, message, signal)`.
#[derive(Debug, Clone, Default)]
pub struct SignalSnapshot {
    values: HashMap<(Bus, String, String), f64>,
    invalid: HashSet<Bus>,
}

impl SignalSnapshot {
    pub fn set(&mut self, bus: Bus, message: &str, signal: &str, value: f64) {
        self.values
            .insert((bus, message.to_owned(), signal.to_owned()), value);
    }

    /// Builder-style `set`.
    pub fn with(mut self, bus: Bus, message: &str, signal: &str, value: f64) -> Self {
        self.set(bus, message, signal, value);
        self
    }

    pub fn set_can_valid(&mut self, bus: Bus, valid: bool) {
        if valid {
            self.invalid.remove(&bus);
        } else {
            self.invalid.insert(bus);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SignalSource for SignalSnapshot {
    fn value(&self, bus: Bus, message: &str, signal: &str) -> Option<f64> {
        self.values
            .get(&(bus, message.to_owned(), signal.to_owned()))
            .copied()
    }

    fn can_valid(&self, bus: Bus) -> bool {
        !self.invalid.contains(&bus)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryParams {
    values: HashMap<ParamKey, bool>,
}

impl MemoryParams {
    pub fn with(mut self, key: ParamKey, value: bool) -> Self {
        self.values.insert(key, value);
        self
    }
}

impl ParamStore for MemoryParams {
    fn get_bool(&self, key: ParamKey) -> bool {
        self.values.get(&key).copied().unwrap_or(false)
    }

    fn put_bool(&mut self, key: ParamKey, value: bool) {
        self.values.insert(key, value);
    }
}

/// Planner that never publishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlan;

impl PlanSource for NoPlan {
    fn poll_plan(&mut self) -> Option<LongitudinalPlanSp> {
        None
    }

    fn poll_radar(&mut self) -> Option<RadarState> {
        None
    }
}

/// Planner replaying queued messages, one per poll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlan {
    pub plans: VecDeque<LongitudinalPlanSp>,
    pub radar: VecDeque<RadarState>,
    pub plan_polls: usize,
    pub radar_polls: usize,
}

impl ScriptedPlan {
    pub fn push_plan(&mut self, plan: LongitudinalPlanSp) {
        self.plans.push_back(plan);
    }

    pub fn push_radar(&mut self, radar: RadarState) {
        self.radar.push_back(radar);
    }
}

impl PlanSource for ScriptedPlan {
    fn poll_plan(&mut self) -> Option<LongitudinalPlanSp> {
        self.plan_polls += 1;
        self.plans.pop_front()
    }

    fn poll_radar(&mut self) -> Option<RadarState> {
        self.radar_polls += 1;
        self.radar.pop_front()
    }
}
