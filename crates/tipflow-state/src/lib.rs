//! Simulated robot state for tipflow.
//!
//! The compiler threads a [`RobotState`] value through every command it
//! emits. This crate defines that value and everything that reads or
//! advances it:
//!
//! ```text
//! RobotState
//! ├── pipettes       mount + nozzle layout
//! ├── labware        slot / module / stacked / off deck
//! ├── modules        slot + ModuleState machine
//! ├── tip_state      tiprack wells, mounted tips, tip sources
//! ├── liquid_state   wells, tips, trash bins and waste chutes
//! └── pipette_locations
//! ```
//!
//! - [`selectors`]: read-only queries (next tip, effective capacity, slot
//!   occupancy, module lookup)
//! - [`get_next_robot_state_and_warnings`]: the command reducer
//! - [`InitialStateBuilder`]: the state a protocol starts from

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod initial;
pub mod module_state;
pub mod reduce;
pub mod selectors;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::StateError;
pub use initial::InitialStateBuilder;
pub use module_state::{
    HeaterShakerModuleState, MagneticModuleState, ModuleState, TemperatureControl,
    TemperatureModuleState, TemperatureStatus, ThermocyclerModuleState,
};
pub use reduce::{get_next_robot_state_and_warnings, RobotStateAndWarnings};
pub use selectors::NextTip;
pub use state::{
    LiquidState, ModuleTemporalProperties, PipetteLocation, PipetteTemporalProperties,
    RobotState, TipState,
};
