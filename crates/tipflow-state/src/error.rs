//! Errors raised while building an initial robot state.

use thiserror::Error;

/// Errors arising from [`InitialStateBuilder`](crate::InitialStateBuilder).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StateError {
    /// A placement names an entity the invariant context does not know.
    #[error("unknown {kind} '{id}'")]
    UnknownEntity {
        /// Entity kind.
        kind: &'static str,
        /// The unresolved id.
        id: String,
    },
    /// A liquid placement names a well the labware does not have.
    #[error("labware '{labware}' has no well '{well}'")]
    UnknownWell {
        /// The labware.
        labware: String,
        /// The missing well.
        well: String,
    },
    /// A liquid placement has a negative or non-finite volume.
    #[error("invalid volume {volume} for {labware} {well}")]
    InvalidVolume {
        /// The labware.
        labware: String,
        /// The well.
        well: String,
        /// The offending volume.
        volume: f64,
    },
    /// Two things were placed in the same slot.
    #[error("slot '{slot}' is already occupied by '{occupant}'")]
    SlotOccupied {
        /// The slot.
        slot: String,
        /// What is already there.
        occupant: String,
    },
    /// A slot name is not valid for the robot type.
    #[error("slot '{0}' does not exist on this robot")]
    UnknownSlot(String),
}
