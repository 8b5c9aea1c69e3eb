//! Lead distance shown in the cluster, and the distance-bar change flag.

use vwcar_traits::RadarState;

use crate::util::DT_CTRL;

/// Distance reported when a lead is visible but no track is available.
pub const VISIBLE_LEAD_FALLBACK_M: f64 = 19.0;

/// Bar-change timer ticks every this many frames.
pub const BAR_TIMER_PERIOD: u64 = 100;

/// Timer values up to this keep the "just changed" flag set.
pub const BAR_TIMER_SHOW: u32 = 3;

/// Cluster constants for the lead marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadDistanceCfg {
    /// Marker value for digital clusters (`KBI_Variante` set).
    pub upscaled_marker: u32,
    pub marker: u32,
    /// Largest distance the MEB cluster can draw, metres.
    pub max_distance_m: f64,
    /// Lead marker is held back until the cluster variant is known.
    pub marker_delay_s: f64,
}

impl Default for LeadDistanceCfg {
    fn default() -> Self {
        Self {
            upscaled_marker: 512,
            marker: 8,
            max_distance_m: 140.0,
            marker_delay_s: 1.0,
        }
    }
}

/// Distance to the closer valid lead; falls back to a fixed value when the
/// planner says a lead is visible but neither track is valid.
pub fn calculate_lead_distance(radar: &RadarState, lead_visible: bool) -> f64 {
    let one = &radar.lead_one;
    let two = &radar.lead_two;
    if one.status && (!two.status || one.d_rel < two.d_rel) {
        return one.d_rel.max(0.0);
    }
    if two.status {
        return two.d_rel.max(0.0);
    }
    if lead_visible { VISIBLE_LEAD_FALLBACK_M } else { 0.0 }
}

impl LeadDistanceCfg {
    /// MQB/PQ `lead marker`. `upscale` is ignored when `can_upscale` is false
    /// (PQ clusters have a single scale).
    pub fn hud_marker(&self, lead_visible: bool, frame: u64, upscale: bool, can_upscale: bool) -> u32 {
        if !lead_visible || (frame as f64) * DT_CTRL <= self.marker_delay_s {
            return 0;
        }
        if upscale && can_upscale {
            self.upscaled_marker
        } else {
            self.marker
        }
    }

    pub fn cap_distance(&self, d: f64) -> f64 {
        d.min(self.max_distance_m)
    }
}

/// Keeps the cluster's distance-bar animation alive for a few display
/// cycles after the driver changes the gap setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistanceBarTimer {
    timer: u32,
    last_bars: Option<u8>,
}

impl DistanceBarTimer {
    pub const fn new() -> Self {
        Self {
            timer: 0,
            last_bars: None,
        }
    }

    /// Called every frame with the planner's current bar setting.
    pub fn update(&mut self, frame: u64, bars: u8) -> bool {
        if frame % BAR_TIMER_PERIOD == 0 && self.timer <= BAR_TIMER_SHOW {
            self.timer += 1;
        }
        if self.last_bars != Some(bars) {
            self.timer = 0;
        }
        self.last_bars = Some(bars);
        self.changed()
    }

    pub const fn changed(&self) -> bool {
        self.timer <= BAR_TIMER_SHOW
    }
}
