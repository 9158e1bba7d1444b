//! Core types for the tipflow liquid-handling compiler.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by every other crate in the workspace: entity ids, the
//! [`Command`] union, the error and warning taxonomy, and the liquid-state
//! algebra ([`split_liquid`], [`merge_liquid`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod id;
pub mod liquid;
pub mod module;
pub mod result;

pub use command::{
    AddressableAreaParams, BlockTemperatureParams, BlowOutInPlaceParams, BlowoutParams, Command,
    ConfigureNozzleLayoutParams, EngageMagnetParams, InPlaceParams, LabwareLocation,
    LiquidHandlingParams, ModuleParams, MoveLabwareParams, MoveLabwareStrategy,
    NozzleConfiguration, PipetteParams, ProfileStep, RunProfileParams, ShakeSpeedParams,
    TemperatureParams, TipParams, WaitForDurationParams, WaitForResumeParams, WellLocation,
    WellOffset, WellOrigin, WellTargetParams,
};
pub use error::{CommandCreatorError, CommandCreatorErrors, CommandCreatorWarning};
pub use id::{
    DeckSlot, EquipmentId, LabwareId, LiquidId, ModuleId, PipetteId, TipIndex, Volume, WellName,
};
pub use liquid::{merge_liquid, split_liquid, LocationLiquidState, SplitLiquid};
pub use module::ModuleType;
pub use result::{fail, CommandCreatorResult, CommandsAndWarnings};
