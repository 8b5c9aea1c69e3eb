//! Raw object parser for the MEB front radar (`MEB_Distance_01`).
//!
//! The message carries two object slots per lane (same, left, right). Each
//! radar object id gets a stable track id for as long as it stays in any
//! slot.

use std::collections::BTreeMap;

use thiserror::Error;
use vwcar_traits::{Bus, SignalSource};

pub const RADAR_MESSAGE: &str = "MEB_Distance_01";
pub const RADAR_BUS: Bus = Bus::Cam;
const NO_OBJECT: f64 = 0.0;

/// `(object id, long distance, lat distance, rel velocity)` signal names.
type SlotSignals = (&'static str, &'static str, &'static str, &'static str);

const SLOTS: [SlotSignals; 6] = [
    (
        "Same_Lane_01_ObjectID",
        "Same_Lane_01_Long_Distance",
        "Same_Lane_01_Lat_Distance",
        "Same_Lane_01_Rel_Velo",
    ),
    (
        "Same_Lane_02_ObjectID",
        "Same_Lane_02_Long_Distance",
        "Same_Lane_02_Lat_Distance",
        "Same_Lane_02_Rel_Velo",
    ),
    (
        "Left_Lane_01_ObjectID",
        "Left_Lane_01_Long_Distance",
        "Left_Lane_01_Lat_Distance",
        "Left_Lane_01_Rel_Velo",
    ),
    (
        "Left_Lane_02_ObjectID",
        "Left_Lane_02_Long_Distance",
        "Left_Lane_02_Lat_Distance",
        "Left_Lane_02_Rel_Velo",
    ),
    (
        "Right_Lane_01_ObjectID",
        "Right_Lane_01_Long_Distance",
        "Right_Lane_01_Lat_Distance",
        "Right_Lane_01_Rel_Velo",
    ),
    (
        "Right_Lane_02_ObjectID",
        "Right_Lane_02_Long_Distance",
        "Right_Lane_02_Lat_Distance",
        "Right_Lane_02_Rel_Velo",
    ),
];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RadarError {
    #[error("radar bus invalid")]
    CanError,
    #[error("object id {0} reported in two slots")]
    DuplicateObjectId(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarPoint {
    pub track_id: u64,
    pub measured: bool,
    pub d_rel: f64,
    pub y_rel: f64,
    pub v_rel: f64,
    /// Not reported by this radar; always NaN.
    pub a_rel: f64,
    /// Not reported by this radar; always NaN.
    pub yv_rel: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadarData {
    pub points: Vec<RadarPoint>,
    pub errors: Vec<RadarError>,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    d_rel: f64,
    y_rel: f64,
    v_rel: f64,
}

#[derive(Debug, Default)]
pub struct MebRadarInterface {
    pts: BTreeMap<u32, RadarPoint>,
    next_track_id: u64,
}

impl MebRadarInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, src: &dyn SignalSource) -> RadarData {
        if !src.can_valid(RADAR_BUS) {
            return RadarData {
                points: Vec::new(),
                errors: vec![RadarError::CanError],
            };
        }

        let mut active: BTreeMap<u32, Observation> = BTreeMap::new();
        for (id_sig, long_sig, lat_sig, velo_sig) in SLOTS {
            let raw_id = src.get(RADAR_BUS, RADAR_MESSAGE, id_sig);
            if raw_id == NO_OBJECT || !raw_id.is_finite() || raw_id < 0.0 {
                continue;
            }
            let id = raw_id as u32;
            if active.contains_key(&id) {
                tracing::warn!(object_id = id, "duplicate radar object id");
                return RadarData {
                    points: Vec::new(),
                    errors: vec![RadarError::DuplicateObjectId(id)],
                };
            }
            active.insert(
                id,
                Observation {
                    d_rel: src.get(RADAR_BUS, RADAR_MESSAGE, long_sig),
                    y_rel: src.get(RADAR_BUS, RADAR_MESSAGE, lat_sig),
                    v_rel: src.get(RADAR_BUS, RADAR_MESSAGE, velo_sig),
                },
            );
        }

        self.pts.retain(|id, _| active.contains_key(id));
        for (id, obs) in &active {
            let next = &mut self.next_track_id;
            let pt = self.pts.entry(*id).or_insert_with(|| {
                let track_id = *next;
                *next += 1;
                RadarPoint {
                    track_id,
                    measured: true,
                    d_rel: 0.0,
                    y_rel: 0.0,
                    v_rel: 0.0,
                    a_rel: f64::NAN,
                    yv_rel: f64::NAN,
                }
            });
            pt.measured = true;
            pt.d_rel = obs.d_rel;
            pt.y_rel = obs.y_rel;
            pt.v_rel = obs.v_rel;
        }

        let mut points: Vec<RadarPoint> = self.pts.values().copied().collect();
        points.sort_by_key(|p| p.track_id);
        RadarData {
            points,
            errors: Vec::new(),
        }
    }
}
