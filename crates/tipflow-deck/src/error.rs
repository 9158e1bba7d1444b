//! Error types for definitions and invariant-context construction.

use thiserror::Error;

/// Errors arising while building definitions or an invariant context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeckError {
    /// Two entities of the same kind share an id.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Entity kind ("pipette", "labware", ...).
        kind: &'static str,
        /// The repeated id.
        id: String,
    },
    /// A pipette spec is internally inconsistent.
    #[error("invalid pipette '{id}': {reason}")]
    InvalidPipette {
        /// The pipette.
        id: String,
        /// What is wrong.
        reason: String,
    },
    /// A labware definition is internally inconsistent.
    #[error("invalid labware definition '{uri}': {reason}")]
    InvalidLabwareDefinition {
        /// Definition URI.
        uri: String,
        /// What is wrong.
        reason: String,
    },
    /// A slot name is not valid for the robot type.
    #[error("slot '{slot}' does not exist on {robot}")]
    UnknownSlot {
        /// The slot name.
        slot: String,
        /// Robot type description.
        robot: &'static str,
    },
    /// A pipette lists a tiprack definition that is not a tiprack.
    #[error("pipette '{pipette}' lists '{uri}' as a tiprack, but it is not one")]
    NotATiprack {
        /// The pipette.
        pipette: String,
        /// The offending definition URI.
        uri: String,
    },
    /// Equipment is missing a required location or carries an invalid one.
    #[error("invalid equipment '{id}': {reason}")]
    InvalidEquipment {
        /// The equipment id.
        id: String,
        /// What is wrong.
        reason: String,
    },
}
