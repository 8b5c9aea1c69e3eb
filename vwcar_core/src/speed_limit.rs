//! Traffic-sign speed limit from the multiplexed `PSD_06` message (MEB).
//!
//! Mux 0 announces the unit and a quality flag. A quality of 7 grants one
//! reading of mux 2, which carries the limit as a step-table index.

use crate::util::{KPH_TO_MS, MPH_TO_MS};

const MUX_INIT: u8 = 0;
const MUX_LIMIT: u8 = 2;
const QUALITY_OK: f64 = 7.0;

/// Decoded fields of one `PSD_06` frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Psd06 {
    pub mux: u8,
    /// Mux 0: `PSD_Sys_Geschwindigkeit_Einheit`, 0 kph, 1 mph.
    pub unit: f64,
    /// Mux 0: `PSD_Sys_Quali_Tempolimits`.
    pub quality: f64,
    /// Mux 2: `PSD_Ges_Geschwindigkeit`.
    pub raw_speed: f64,
    /// Mux 2: `PSD_Ges_Typ`, 1 is a plausible limit.
    pub kind: f64,
    /// Mux 2: `PSD_Ges_Gesetzlich_Kategorie`, 0 is not street-type specific.
    pub category: f64,
}

/// Map the raw step index to the displayed limit (kph or mph).
pub fn limit_from_raw(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let r = raw.round();
    if (1.0..=10.0).contains(&r) {
        (r - 1.0) * 5.0
    } else if (11.0..=22.0).contains(&r) {
        50.0 + (r - 11.0) * 10.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedLimitDecoder {
    unit_factor: f64,
    receive: bool,
    speed_limit: f64,
}

impl SpeedLimitDecoder {
    pub const fn new() -> Self {
        Self {
            unit_factor: 0.0,
            receive: false,
            speed_limit: 0.0,
        }
    }

    /// Last accepted limit in m/s; 0 while unknown.
    pub const fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    pub fn update(&mut self, frame: &Psd06) -> f64 {
        match frame.mux {
            MUX_INIT => {
                self.unit_factor = if frame.unit == 0.0 {
                    KPH_TO_MS
                } else if frame.unit == 1.0 {
                    MPH_TO_MS
                } else {
                    0.0
                };
                self.receive = frame.quality == QUALITY_OK;
            }
            MUX_LIMIT if self.receive && frame.kind == 1.0 && frame.category == 0.0 => {
                self.speed_limit = limit_from_raw(frame.raw_speed) * self.unit_factor;
                self.receive = false;
            }
            _ => {}
        }
        self.speed_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn init(unit: f64, quality: f64) -> Psd06 {
        Psd06 {
            mux: MUX_INIT,
            unit,
            quality,
            ..Psd06::default()
        }
    }

    fn limit(raw: f64) -> Psd06 {
        Psd06 {
            mux: MUX_LIMIT,
            raw_speed: raw,
            kind: 1.0,
            category: 0.0,
            ..Psd06::default()
        }
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(1.0, 0.0)]
    #[case(2.0, 5.0)]
    #[case(10.0, 45.0)]
    #[case(11.0, 50.0)]
    #[case(22.0, 160.0)]
    #[case(23.0, 0.0)]
    fn step_table(#[case] raw: f64, #[case] expected: f64) {
        assert_eq!(limit_from_raw(raw), expected);
    }

    #[test]
    fn permission_is_one_shot() {
        let mut d = SpeedLimitDecoder::new();
        d.update(&init(0.0, 7.0));
        let v = d.update(&limit(13.0));
        assert!((v - 70.0 / 3.6).abs() < 1e-9);
        // second reading without a fresh init is ignored
        let v = d.update(&limit(15.0));
        assert!((v - 70.0 / 3.6).abs() < 1e-9);
    }

    #[test]
    fn low_quality_denies_reading() {
        let mut d = SpeedLimitDecoder::new();
        d.update(&init(0.0, 6.0));
        assert_eq!(d.update(&limit(13.0)), 0.0);
    }

    #[test]
    fn street_type_limits_are_skipped() {
        let mut d = SpeedLimitDecoder::new();
        d.update(&init(1.0, 7.0));
        let mut f = limit(13.0);
        f.category = 1.0;
        assert_eq!(d.update(&f), 0.0);
        // permission survives the rejected frame
        let v = d.update(&limit(13.0));
        assert!((v - 70.0 * MPH_TO_MS).abs() < 1e-9);
    }

    #[test]
    fn unknown_unit_zeroes_limit() {
        let mut d = SpeedLimitDecoder::new();
        d.update(&init(3.0, 7.0));
        assert_eq!(d.update(&limit(13.0)), 0.0);
    }
}
