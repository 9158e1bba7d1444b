//! Strongly-typed identifiers for protocol entities.
//!
//! Every entity registered in an invariant context is keyed by a stable
//! string id chosen by the protocol author. Wrapping each kind of id in
//! its own newtype keeps a pipette id from being passed where a labware
//! id is expected.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an id from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_string())
            }
        }

        impl From<String> for $name {
            fn from(v: String) -> Self {
                Self(v)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifies a pipette entity in the invariant context.
    PipetteId
}

string_id! {
    /// Identifies a labware instance (plate, reservoir, tiprack, trash labware).
    LabwareId
}

string_id! {
    /// Identifies a hardware module (temperature, magnetic, thermocycler, heater-shaker).
    ModuleId
}

string_id! {
    /// Identifies an additional equipment entity: trash bin, waste chute,
    /// staging area or gripper.
    EquipmentId
}

string_id! {
    /// Names a well within a labware definition, e.g. `"A1"`.
    WellName
}

string_id! {
    /// Names a deck slot: `"1"`..`"12"` on an OT-2, `"A1"`..`"D4"` on a Flex.
    DeckSlot
}

string_id! {
    /// Identifies a declared liquid. [`LiquidId::air`] is reserved for
    /// aspirated air.
    LiquidId
}

impl LiquidId {
    /// Reserved id of the air pseudo-liquid.
    pub const AIR: &'static str = "__air__";

    /// The air pseudo-liquid, marking empty aspirated volume.
    pub fn air() -> Self {
        Self(Self::AIR.to_string())
    }

    /// Whether this id is the air pseudo-liquid.
    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR
    }
}

/// Index of a tip on a (possibly multi-channel) pipette, `0..channels`.
pub type TipIndex = usize;

/// Volume in microlitres.
pub type Volume = f64;
