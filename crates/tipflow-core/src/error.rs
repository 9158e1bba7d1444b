//! Error and warning taxonomy for command creation.
//!
//! Two tiers: a [`CommandCreatorError`] is hard and aborts the compound
//! operation that produced it; a [`CommandCreatorWarning`] is advisory and
//! compilation continues. Both carry a stable SCREAMING_SNAKE `kind()` for
//! consumers that map them to user-facing copy.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::id::{LabwareId, ModuleId, PipetteId, Volume, WellName};
use crate::module::ModuleType;

// ── Errors ─────────────────────────────────────────────────────────

/// A condition that makes a command or step physically invalid.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandCreatorError {
    /// No tiprack assigned to the pipette has a usable tip (or column/rack).
    #[error("not enough tips to complete this step")]
    InsufficientTips,

    /// The referenced pipette is not in the invariant context.
    #[error("pipette '{pipette}' does not exist")]
    PipetteDoesNotExist {
        /// The missing pipette.
        pipette: PipetteId,
    },

    /// The referenced labware is not in the invariant context.
    #[error("{action}: labware '{labware}' does not exist")]
    LabwareDoesNotExist {
        /// Action that referenced it.
        action: &'static str,
        /// The missing labware.
        labware: LabwareId,
    },

    /// A destination is neither labware nor additional equipment.
    #[error("{action}: equipment '{equipment}' does not exist")]
    EquipmentDoesNotExist {
        /// Action that referenced it.
        action: &'static str,
        /// The unresolved id.
        equipment: String,
    },

    /// The drop-tip destination does not resolve to a trash bin, waste chute or labware.
    #[error("drop tip location '{location}' does not exist")]
    DropTipLocationDoesNotExist {
        /// The unresolved id.
        location: String,
    },

    /// The requested volume exceeds what the pipette can hold.
    #[error("{action}: volume {volume} µL exceeds pipette max volume {max_volume} µL")]
    PipetteVolumeExceeded {
        /// Action that requested it.
        action: &'static str,
        /// Requested volume.
        volume: Volume,
        /// Capacity it was checked against.
        max_volume: Volume,
        /// Disposal volume included in the check (distribute).
        disposal_volume: Option<Volume>,
    },

    /// The requested volume exceeds the mounted tip's capacity.
    #[error("{action}: volume {volume} µL exceeds tip max volume {max_volume} µL")]
    TipVolumeExceeded {
        /// Action that requested it.
        action: &'static str,
        /// Requested volume.
        volume: Volume,
        /// Tip capacity.
        max_volume: Volume,
    },

    /// The action needs a tip but the pipette has none.
    #[error("{action}: no tip on pipette '{pipette}'{}", describe_target(.labware.as_ref(), .well.as_ref()))]
    NoTipOnPipette {
        /// Action that needed the tip.
        action: &'static str,
        /// The pipette.
        pipette: PipetteId,
        /// Labware targeted by the action, if any.
        labware: Option<LabwareId>,
        /// Well targeted by the action, if any.
        well: Option<WellName>,
    },

    /// The referenced module is not present on the deck.
    #[error("module {} is missing", .module.as_ref().map(|m| m.as_str()).unwrap_or("<unspecified>"))]
    MissingModule {
        /// The requested module, if one was named.
        module: Option<ModuleId>,
    },

    /// The module exists but is not the kind the command targets.
    #[error("module '{module}' is a {actual}, expected a {expected}")]
    WrongModuleType {
        /// The module.
        module: ModuleId,
        /// Type the command needs.
        expected: ModuleType,
        /// Type the module has.
        actual: ModuleType,
    },

    /// Awaiting a temperature the module was never set to.
    #[error("module '{module}' was not set to the awaited temperature")]
    MissingTemperatureStep {
        /// The module.
        module: ModuleId,
    },

    /// A GEN1 multi-channel pipette would collide with a module next to the labware.
    #[error("pipette '{pipette}' risks colliding with a module while accessing '{labware}'")]
    ModulePipetteCollisionDanger {
        /// The pipette.
        pipette: PipetteId,
        /// The labware it would access.
        labware: LabwareId,
    },

    /// The labware is inside a thermocycler whose lid is closed.
    #[error("thermocycler '{module}' lid is closed")]
    ThermocyclerLidClosed {
        /// The thermocycler.
        module: ModuleId,
    },

    /// The heater-shaker latch is open.
    #[error("heater-shaker '{module}' latch is open")]
    HeaterShakerLatchOpen {
        /// The heater-shaker.
        module: ModuleId,
    },

    /// The heater-shaker latch is closed but must be open.
    #[error("heater-shaker '{module}' latch is closed")]
    HeaterShakerLatchClosed {
        /// The heater-shaker.
        module: ModuleId,
    },

    /// The heater-shaker is shaking.
    #[error("heater-shaker '{module}' is shaking")]
    HeaterShakerIsShaking {
        /// The heater-shaker.
        module: ModuleId,
    },

    /// The target is adjacent to a shaking heater-shaker.
    #[error("labware is next to heater-shaker '{module}' while it is shaking")]
    HeaterShakerNorthSouthEastWestShaking {
        /// The heater-shaker.
        module: ModuleId,
    },

    /// The target is east or west of a heater-shaker with its latch open.
    #[error("labware is east or west of heater-shaker '{module}' while its latch is open")]
    HeaterShakerEastWestWithLatchOpen {
        /// The heater-shaker.
        module: ModuleId,
    },

    /// A multi-channel pipette would reach north or south of a heater-shaker.
    #[error("multi-channel pipette cannot access labware north or south of heater-shaker '{module}'")]
    HeaterShakerNorthSouthWithMultiChannel {
        /// The heater-shaker.
        module: ModuleId,
    },

    /// The labware is off deck.
    #[error("labware '{labware}' is off deck")]
    LabwareOffDeck {
        /// The labware.
        labware: LabwareId,
    },

    /// The labware definition has no such well.
    #[error("labware '{labware}' has no well '{well}'")]
    WellDoesNotExist {
        /// The labware.
        labware: LabwareId,
        /// The missing well.
        well: WellName,
    },

    /// The pipette's tips do not all land in wells of the labware.
    #[error("pipette '{pipette}' tips do not fit labware '{labware}' at well '{well}'")]
    NoWellsForTips {
        /// The pipette.
        pipette: PipetteId,
        /// The labware.
        labware: LabwareId,
        /// The primary well.
        well: WellName,
    },

    /// Touch-tip or mix was requested at a trash bin or waste chute.
    #[error("{action} is not possible at '{equipment}'")]
    InvalidTrashOrWasteChuteAction {
        /// The disallowed action.
        action: &'static str,
        /// The trash bin or waste chute.
        equipment: String,
    },

    /// A gripper move was requested without a gripper.
    #[error("moving labware with the gripper requires a gripper")]
    GripperRequired,

    /// The destination location already holds labware or a module.
    #[error("location '{location}' is occupied")]
    SlotOccupied {
        /// Description of the location.
        location: String,
    },

    /// Step arguments are semantically invalid.
    #[error("invalid step arguments: {reason}")]
    InvalidStepArgs {
        /// What is wrong.
        reason: String,
    },
}

fn describe_target(labware: Option<&LabwareId>, well: Option<&WellName>) -> String {
    match (labware, well) {
        (Some(l), Some(w)) => format!(" at {l} {w}"),
        (Some(l), None) => format!(" at {l}"),
        _ => String::new(),
    }
}

impl CommandCreatorError {
    /// Stable tag for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientTips => "INSUFFICIENT_TIPS",
            Self::PipetteDoesNotExist { .. } => "PIPETTE_DOES_NOT_EXIST",
            Self::LabwareDoesNotExist { .. } => "LABWARE_DOES_NOT_EXIST",
            Self::EquipmentDoesNotExist { .. } => "EQUIPMENT_DOES_NOT_EXIST",
            Self::DropTipLocationDoesNotExist { .. } => "DROP_TIP_LOCATION_DOES_NOT_EXIST",
            Self::PipetteVolumeExceeded { .. } => "PIPETTE_VOLUME_EXCEEDED",
            Self::TipVolumeExceeded { .. } => "TIP_VOLUME_EXCEEDED",
            Self::NoTipOnPipette { .. } => "NO_TIP_ON_PIPETTE",
            Self::MissingModule { .. } => "MISSING_MODULE",
            Self::WrongModuleType { .. } => "WRONG_MODULE_TYPE",
            Self::MissingTemperatureStep { .. } => "MISSING_TEMPERATURE_STEP",
            Self::ModulePipetteCollisionDanger { .. } => "MODULE_PIPETTE_COLLISION_DANGER",
            Self::ThermocyclerLidClosed { .. } => "THERMOCYCLER_LID_CLOSED",
            Self::HeaterShakerLatchOpen { .. } => "HEATER_SHAKER_LATCH_OPEN",
            Self::HeaterShakerLatchClosed { .. } => "HEATER_SHAKER_LATCH_CLOSED",
            Self::HeaterShakerIsShaking { .. } => "HEATER_SHAKER_IS_SHAKING",
            Self::HeaterShakerNorthSouthEastWestShaking { .. } => {
                "HEATER_SHAKER_NORTH_SOUTH_EAST_WEST_SHAKING"
            }
            Self::HeaterShakerEastWestWithLatchOpen { .. } => {
                "HEATER_SHAKER_EAST_WEST_LATCH_OPEN"
            }
            Self::HeaterShakerNorthSouthWithMultiChannel { .. } => {
                "HEATER_SHAKER_NORTH_SOUTH_MULTI_CHANNEL"
            }
            Self::LabwareOffDeck { .. } => "LABWARE_OFF_DECK",
            Self::WellDoesNotExist { .. } => "WELL_DOES_NOT_EXIST",
            Self::NoWellsForTips { .. } => "NO_WELLS_FOR_TIPS",
            Self::InvalidTrashOrWasteChuteAction { .. } => "INVALID_TRASH_OR_WASTE_CHUTE_ACTION",
            Self::GripperRequired => "GRIPPER_REQUIRED",
            Self::SlotOccupied { .. } => "SLOT_OCCUPIED",
            Self::InvalidStepArgs { .. } => "INVALID_STEP_ARGS",
        }
    }
}

/// The non-empty error list returned by a failed command creator.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandCreatorErrors(pub Vec<CommandCreatorError>);

impl CommandCreatorErrors {
    /// A single-error failure.
    pub fn single(error: CommandCreatorError) -> Self {
        Self(vec![error])
    }

    /// The collected errors.
    pub fn errors(&self) -> &[CommandCreatorError] {
        &self.0
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for errors produced by this crate; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable kinds of all errors, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.0.iter().map(CommandCreatorError::kind).collect()
    }
}

impl From<CommandCreatorError> for CommandCreatorErrors {
    fn from(e: CommandCreatorError) -> Self {
        Self::single(e)
    }
}

impl From<Vec<CommandCreatorError>> for CommandCreatorErrors {
    fn from(errors: Vec<CommandCreatorError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for CommandCreatorErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandCreatorErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.first().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ── Warnings ───────────────────────────────────────────────────────

/// A non-fatal advisory produced while compiling.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandCreatorWarning {
    /// More volume was aspirated than the well holds; air fills the shortfall.
    AspirateMoreThanWellContents {
        /// Source labware.
        labware: LabwareId,
        /// Source well.
        well: WellName,
    },
    /// Aspirated from a well that holds no liquid.
    AspirateFromPristineWell {
        /// Source labware.
        labware: LabwareId,
        /// Source well.
        well: WellName,
    },
    /// The volume is below the pipette's minimum and may be inaccurate.
    BelowPipetteMinimumVolume {
        /// The pipette.
        pipette: PipetteId,
        /// Requested volume.
        volume: Volume,
        /// Pipette minimum volume.
        min_volume: Volume,
    },
    /// A dispense overfilled a well.
    OverMaxWellVolume {
        /// Destination labware.
        labware: LabwareId,
        /// Destination well.
        well: WellName,
    },
    /// A temperature await may never resolve: the module is approaching a
    /// different target.
    PotentiallyUnreachableTemp {
        /// The module.
        module: ModuleId,
    },
    /// A distribute disposal volume is below the pipette minimum.
    BelowMinDisposalVolume {
        /// Disposal volume.
        volume: Volume,
        /// Pipette minimum volume.
        min_volume: Volume,
    },
}

impl CommandCreatorWarning {
    /// Stable tag for this warning kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AspirateMoreThanWellContents { .. } => "ASPIRATE_MORE_THAN_WELL_CONTENTS",
            Self::AspirateFromPristineWell { .. } => "ASPIRATE_FROM_PRISTINE_WELL",
            Self::BelowPipetteMinimumVolume { .. } => "BELOW_PIPETTE_MINIMUM_VOLUME",
            Self::OverMaxWellVolume { .. } => "OVER_MAX_WELL_VOLUME",
            Self::PotentiallyUnreachableTemp { .. } => "POTENTIALLY_UNREACHABLE_TEMP",
            Self::BelowMinDisposalVolume { .. } => "BELOW_MIN_DISPOSAL_VOLUME",
        }
    }
}

impl fmt::Display for CommandCreatorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AspirateMoreThanWellContents { labware, well } => {
                write!(f, "aspirating more than {labware} {well} contains")
            }
            Self::AspirateFromPristineWell { labware, well } => {
                write!(f, "aspirating from {labware} {well}, which holds no liquid")
            }
            Self::BelowPipetteMinimumVolume {
                pipette,
                volume,
                min_volume,
            } => write!(
                f,
                "{volume} µL is below the {min_volume} µL minimum of pipette '{pipette}'"
            ),
            Self::OverMaxWellVolume { labware, well } => {
                write!(f, "dispense overflows {labware} {well}")
            }
            Self::PotentiallyUnreachableTemp { module } => write!(
                f,
                "module '{module}' is approaching a different target; awaited temperature may be unreachable"
            ),
            Self::BelowMinDisposalVolume { volume, min_volume } => write!(
                f,
                "disposal volume {volume} µL is below the {min_volume} µL pipette minimum"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let e = CommandCreatorError::PipetteDoesNotExist {
            pipette: "p".into(),
        };
        assert_eq!(e.kind(), "PIPETTE_DOES_NOT_EXIST");
        assert_eq!(CommandCreatorError::InsufficientTips.kind(), "INSUFFICIENT_TIPS");
    }

    #[test]
    fn no_tip_display_includes_target() {
        let e = CommandCreatorError::NoTipOnPipette {
            action: "touchTip",
            pipette: "p300".into(),
            labware: Some("plate".into()),
            well: Some("A1".into()),
        };
        assert_eq!(e.to_string(), "touchTip: no tip on pipette 'p300' at plate A1");
    }

    #[test]
    fn error_list_display_joins() {
        let errs = CommandCreatorErrors(vec![
            CommandCreatorError::InsufficientTips,
            CommandCreatorError::GripperRequired,
        ]);
        assert_eq!(
            errs.to_string(),
            "not enough tips to complete this step; moving labware with the gripper requires a gripper"
        );
        assert_eq!(errs.kinds(), vec!["INSUFFICIENT_TIPS", "GRIPPER_REQUIRED"]);
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let e = CommandCreatorError::MissingModule { module: None };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "MISSING_MODULE");
    }
}
