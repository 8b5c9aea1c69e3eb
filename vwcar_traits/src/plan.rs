//! Snapshot types delivered by `PlanSource`.

/// Speed-control side-channel published alongside the longitudinal plan.
///
/// Speeds are in m/s. State fields keep the publisher's integer encoding:
/// `0` is inactive for every controller, SLC uses `1` for temporarily
/// inactive and `> 1` for adapting/active, map turn control uses `> 1` for
/// active.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LongitudinalPlanSp {
    pub vision_turn_controller_state: u8,
    pub vision_turn_speed: f64,
    pub turn_speed_control_state: u8,
    pub turn_speed: f64,
    pub speed_limit_control_state: u8,
    pub speed_limit: f64,
    pub speed_limit_offset: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeadData {
    pub status: bool,
    /// Longitudinal distance in metres.
    pub d_rel: f64,
    pub v_rel: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RadarState {
    pub lead_one: LeadData,
    pub lead_two: LeadData,
}
