//! Compound command creators for tipflow.
//!
//! A compound creator expands one protocol step into a [`Sequence`] of
//! atomic creators and folds it, so every generated command is validated
//! against the state its predecessors leave behind.
//!
//! - [`transfer`], [`consolidate`], [`distribute`], [`mix`]: liquid steps
//! - [`replace_tip`]: drop the current tip and pick up the next one
//! - [`modules`]: temperature, magnet, thermocycler, heater-shaker, pause
//!   and labware-move steps
//! - [`tip_policy`] and [`chunking`]: the planning rules the liquid steps
//!   share
//!
//! [`Sequence`]: tipflow_step::Sequence

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod args;
pub mod chunking;
mod consolidate;
mod decorators;
mod distribute;
mod mix;
pub mod modules;
mod replace_tip;
pub mod target;
pub mod tip_policy;
mod transfer;
mod validate;

pub use args::{
    AirGapOptions, AspirateOptions, BlowoutLocation, BlowoutOptions, ChangeTip, ConsolidateArgs,
    DelayOptions, DispenseOptions, DistributeArgs, HeaterShakerArgs, MagnetStepArgs, MixArgs,
    MixOptions, MoveLabwareStepArgs, PauseArgs, PipettingArgs, TemperatureStepArgs,
    ThermocyclerProfileArgs, ThermocyclerStateArgs, TouchTipOptions, TransferArgs,
};
pub use consolidate::consolidate;
pub use distribute::distribute;
pub use mix::mix;
pub use modules::{
    heater_shaker_step, magnet_step, move_labware_step, pause_step, temperature_step,
    thermocycler_profile_step, thermocycler_state_step,
};
pub use replace_tip::{replace_tip, ReplaceTipArgs};
pub use transfer::transfer;
