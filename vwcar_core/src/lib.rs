#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Volkswagen CAN translation layer (platform-agnostic core).
//!
//! Turns decoded CAN signals into a [`carstate::VehicleState`], runs the
//! control law against the planner's [`controller::CarControl`] and produces
//! the outgoing [`codec::CanMessage`]s. All I/O goes through the
//! `vwcar_traits` seams.
//!
//! ## Architecture
//!
//! - **Codec**: subscription tables and MQB/PQ/MEB encoders (`codec`)
//! - **Vehicle state**: per-platform decode, HCA fault latch (`carstate`, `hca`)
//! - **Limiter**: torque, curvature and steering power limits (`limits`)
//! - **Control law**: cadences, HUD, stock buttons (`controller`)
//! - **Button emulator**: set-speed control via stock stalk (`button_emulator`)
//!
//! One [`session::Session::tick`] runs decode, control and encode in order.
//! The tick itself never fails; only construction returns errors.

pub mod builder;
pub mod button_emulator;
pub mod buttons;
pub mod carstate;
pub mod codec;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod hca;
pub mod kf;
pub mod lead;
pub mod limits;
pub mod mocks;
pub mod params;
pub mod radar;
pub mod session;
pub mod speed_limit;
pub mod util;

pub use builder::SessionBuilder;
pub use carstate::{CarState, VehicleState};
pub use codec::CanMessage;
pub use controller::{Actuators, CarControl, CarController, OutgoingCommand};
pub use error::{BuildError, ReplayError, Result};
pub use params::{CarParams, ControllerParams, Platform};
pub use session::{Session, TickOutput};
