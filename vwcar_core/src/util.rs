//! Unit conversions and small numeric helpers shared by decode and control.

/// Control loop period in seconds (100 Hz).
pub const DT_CTRL: f64 = 0.01;

pub const KPH_TO_MS: f64 = 1.0 / 3.6;
pub const MS_TO_KPH: f64 = 3.6;
pub const MPH_TO_KPH: f64 = 1.609344;
pub const KPH_TO_MPH: f64 = 1.0 / MPH_TO_KPH;
pub const MS_TO_MPH: f64 = MS_TO_KPH * KPH_TO_MPH;
pub const MPH_TO_MS: f64 = MPH_TO_KPH * KPH_TO_MS;
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 1.0 / DEG_TO_RAD;

/// Number of control frames covering `seconds`.
#[inline]
pub fn frames_for(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds / DT_CTRL).round() as u64
}

/// Clamp that tolerates `lo > hi` by preferring `lo`, like the numpy helper
/// the limit tables were tuned against.
#[inline]
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(x))
}

/// Piecewise-linear interpolation over ascending breakpoints `xp`, flat
/// outside the table. Empty tables yield 0.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return 0.0;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    for i in 1..n {
        if x <= xp[i] {
            let span = xp[i] - xp[i - 1];
            if span <= 0.0 {
                return fp[i];
            }
            let t = (x - xp[i - 1]) / span;
            return fp[i - 1] + t * (fp[i] - fp[i - 1]);
        }
    }
    fp[n - 1]
}

/// Non-finite inputs read as zero; the tick must always complete.
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}
