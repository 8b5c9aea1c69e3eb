//! Edge-triggered cruise stalk events.

use vwcar_traits::{Bus, SignalSource};

use crate::params::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonType {
    SetCruise,
    ResumeCruise,
    AccelCruise,
    DecelCruise,
    Cancel,
    GapAdjustCruise,
}

/// A press (`pressed == true`) or release of one stalk button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub kind: ButtonType,
    pub pressed: bool,
}

/// Where one button lives on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonSpec {
    pub kind: ButtonType,
    pub message: &'static str,
    pub signal: &'static str,
}

const fn button(kind: ButtonType, message: &'static str, signal: &'static str) -> ButtonSpec {
    ButtonSpec {
        kind,
        message,
        signal,
    }
}

const GRA_ACC_01: [ButtonSpec; 6] = [
    button(ButtonType::SetCruise, "GRA_ACC_01", "GRA_Tip_Setzen"),
    button(ButtonType::ResumeCruise, "GRA_ACC_01", "GRA_Tip_Wiederaufnahme"),
    button(ButtonType::AccelCruise, "GRA_ACC_01", "GRA_Tip_Hoch"),
    button(ButtonType::DecelCruise, "GRA_ACC_01", "GRA_Tip_Runter"),
    button(ButtonType::Cancel, "GRA_ACC_01", "GRA_Abbrechen"),
    button(
        ButtonType::GapAdjustCruise,
        "GRA_ACC_01",
        "GRA_Verstellung_Zeitluecke",
    ),
];

const GRA_NEU: [ButtonSpec; 6] = [
    button(ButtonType::SetCruise, "GRA_Neu", "GRA_Neu_Setzen"),
    button(ButtonType::ResumeCruise, "GRA_Neu", "GRA_Recall"),
    button(ButtonType::AccelCruise, "GRA_Neu", "GRA_Up_kurz"),
    button(ButtonType::DecelCruise, "GRA_Neu", "GRA_Down_kurz"),
    button(ButtonType::Cancel, "GRA_Neu", "GRA_Abbrechen"),
    button(ButtonType::GapAdjustCruise, "GRA_Neu", "GRA_Zeitluecke"),
];

pub const fn button_specs(platform: Platform) -> &'static [ButtonSpec] {
    match platform {
        Platform::Mqb | Platform::Meb => &GRA_ACC_01,
        Platform::Pq => &GRA_NEU,
    }
}

/// Remembers the previous bit of each tracked button.
#[derive(Debug, Clone)]
pub struct ButtonTracker {
    specs: &'static [ButtonSpec],
    previous: Vec<bool>,
}

impl ButtonTracker {
    pub fn new(platform: Platform) -> Self {
        let specs = button_specs(platform);
        Self {
            specs,
            previous: vec![false; specs.len()],
        }
    }

    /// Events for buttons whose bit changed since the last call.
    pub fn update(&mut self, src: &dyn SignalSource, bus: Bus) -> Vec<ButtonEvent> {
        let mut events = Vec::new();
        for (spec, prev) in self.specs.iter().zip(self.previous.iter_mut()) {
            let now = src.get(bus, spec.message, spec.signal) != 0.0;
            if now != *prev {
                events.push(ButtonEvent {
                    kind: spec.kind,
                    pressed: now,
                });
            }
            *prev = now;
        }
        events
    }
}
