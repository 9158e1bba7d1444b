//! Deck topology and static definitions for tipflow.
//!
//! This crate owns everything that does not change during a compile:
//!
//! - [`RobotType`] slot naming and N/S/E/W adjacency
//! - [`LabwareDefinition`] well layout and capacities
//! - [`wells_for_tips`] mapping of multi-channel nozzles onto wells
//! - pipette, module and additional-equipment entities
//! - the [`InvariantContext`] that registers them, built through
//!   [`InvariantContextBuilder`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod equipment;
pub mod error;
pub mod geometry;
pub mod labware;
pub mod module;
pub mod pipette;
pub mod slot;

pub use context::{InvariantContext, InvariantContextBuilder, LabwareEntity};
pub use equipment::{AdditionalEquipment, EquipmentKind};
pub use error::DeckError;
pub use geometry::{is_single_well_for_all_tips, well_at, wells_for_tips, NOZZLE_PITCH_MM};
pub use labware::{LabwareDefinition, WellDefinition, WellShape};
pub use module::ModuleEntity;
pub use pipette::{Mount, PipetteEntity, PipetteGeneration, PipetteSpec};
pub use slot::{Direction, RobotType, SlotPosition};
