//! One translation session: decode, control and encode for a single car.

use vwcar_traits::{ParamStore, PlanSource, SignalSource};

use crate::builder::{Missing, SessionBuilder};
use crate::carstate::{CarState, VehicleState};
use crate::codec::Subscriptions;
use crate::controller::{CarControl, CarController, OutgoingCommand};
use crate::params::CarParams;
use crate::radar::{MebRadarInterface, RadarData};

/// Everything one tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub state: VehicleState,
    pub command: OutgoingCommand,
    /// Raw radar objects, on platforms that expose them.
    pub radar: Option<RadarData>,
}

pub struct Session {
    pub(crate) car_state: CarState,
    pub(crate) controller: CarController,
    pub(crate) radar: Option<MebRadarInterface>,
    pub(crate) subscriptions: Subscriptions,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("platform", &self.car_state.car_params().platform)
            .field("frame", &self.controller.frame())
            .field("radar", &self.radar.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder<Missing> {
        SessionBuilder::default()
    }

    pub const fn car_params(&self) -> &CarParams {
        self.car_state.car_params()
    }

    pub const fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub const fn frame(&self) -> u64 {
        self.controller.frame()
    }

    pub const fn controller(&self) -> &CarController {
        &self.controller
    }

    /// Decode, then control, then encode. Never fails: bus problems show up
    /// as `state.can_valid == false` and suppressed actuation.
    pub fn tick(
        &mut self,
        src: &dyn SignalSource,
        cc: &CarControl,
        plan: &mut dyn PlanSource,
        params: &mut dyn ParamStore,
    ) -> TickOutput {
        let state = self.car_state.update(src);
        let radar = self.radar.as_mut().map(|r| r.update(src));
        let command = self.controller.update(cc, &state, plan, params);
        TickOutput {
            state,
            command,
            radar,
        }
    }
}
