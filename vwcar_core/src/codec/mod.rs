//! Signal codec: subscription tables and per-platform message encoders.
//!
//! Encoders are pure functions from typed command fields to a [`CanMessage`]
//! holding physical signal values. Bit packing and checksums belong to the
//! external packer.

pub mod meb;
pub mod mqb;
pub mod pq;
pub mod subscriptions;

use std::collections::BTreeMap;

use vwcar_traits::{Bus, SignalSource};

pub use subscriptions::{Subscriptions, subscriptions};

/// Physical signal values keyed by signal name.
pub type SignalMap = BTreeMap<&'static str, f64>;

/// One outgoing frame, ready for the external packer.
#[derive(Debug, Clone, PartialEq)]
pub struct CanMessage {
    pub name: &'static str,
    pub bus: Bus,
    pub values: SignalMap,
}

impl CanMessage {
    pub fn new(name: &'static str, bus: Bus) -> Self {
        Self {
            name,
            bus,
            values: SignalMap::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, signal: &'static str, value: f64) -> Self {
        self.values.insert(signal, value);
        self
    }

    pub fn with_flag(self, signal: &'static str, on: bool) -> Self {
        self.with(signal, flag(on))
    }

    /// Copy every captured stock value into the message.
    pub fn with_stock(mut self, stock: &StockValues) -> Self {
        self.values
            .extend(stock.values.iter().map(|(k, v)| (*k, *v)));
        self
    }

    pub fn get(&self, signal: &str) -> Option<f64> {
        self.values.get(signal).copied()
    }
}

#[inline]
pub fn flag(on: bool) -> f64 {
    if on { 1.0 } else { 0.0 }
}

/// Split a signed value into the `(magnitude, sign bit)` pair VW sends.
#[inline]
pub fn split_signed(x: f64) -> (f64, f64) {
    (x.abs(), flag(x < 0.0))
}

/// Recombine a magnitude with its separate sign bit.
#[inline]
pub fn join_signed(magnitude: f64, sign: f64) -> f64 {
    if sign != 0.0 { -magnitude } else { magnitude }
}

/// Read a signed signal whose sign travels in a sibling signal.
pub fn read_signed(
    src: &dyn SignalSource,
    bus: Bus,
    message: &str,
    magnitude: &str,
    sign: &str,
) -> f64 {
    join_signed(src.get(bus, message, magnitude), src.get(bus, message, sign))
}

/// Snapshot of a stock message, captured for passthrough on re-encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockValues {
    pub values: SignalMap,
}

impl StockValues {
    /// Capture `signals` of `message` on `bus`. Missing signals read as zero.
    pub fn capture(
        src: &dyn SignalSource,
        bus: Bus,
        message: &str,
        signals: &[&'static str],
    ) -> Self {
        let values = signals
            .iter()
            .map(|s| (*s, src.get(bus, message, s)))
            .collect();
        Self { values }
    }

    pub fn get(&self, signal: &str) -> f64 {
        self.values.get(signal).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Subset of this snapshot, for messages that forward only some fields.
    pub fn pick(&self, signals: &[&'static str]) -> StockValues {
        let values = signals
            .iter()
            .filter_map(|s| self.values.get(s).map(|v| (*s, *v)))
            .collect();
        StockValues { values }
    }
}

/// Lane-assist HUD inputs from the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaneHud {
    pub left_lane_visible: bool,
    pub right_lane_visible: bool,
    pub left_lane_depart: bool,
    pub right_lane_depart: bool,
}

impl LaneHud {
    /// `LDW_Lernmodus_*` value for one side; `display_mode` shifts the
    /// encoding when the travel-assist style lanes are shown.
    pub fn lane_mode(depart: bool, visible: bool, display_mode: u8) -> f64 {
        let base = if depart { 3 } else { 1 + u8::from(visible) };
        f64::from(base + display_mode)
    }
}

/// Stock stalk button codes understood by the GRA encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockButton {
    Accel,
    Decel,
    Resume,
    Set,
}

impl StockButton {
    /// Numeric code used on the wire by the emulator paths (1..=4).
    pub const fn code(self) -> u8 {
        match self {
            StockButton::Accel => 1,
            StockButton::Decel => 2,
            StockButton::Resume => 3,
            StockButton::Set => 4,
        }
    }
}

/// What one GRA frame should press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonRequest {
    pub cancel: bool,
    pub resume: bool,
    pub press: Option<StockButton>,
}

/// Signals forwarded from the LDW camera message to keep side assist fed.
pub const LDW_PASSTHROUGH: [&str; 5] = [
    "LDW_SW_Warnung_links",
    "LDW_SW_Warnung_rechts",
    "LDW_Seite_DLCTLC",
    "LDW_DLC",
    "LDW_TLC",
];
