//! Where liquid goes: a labware well or a trash bin / waste chute.

use tipflow_core::{CommandCreatorError, EquipmentId, LabwareId, WellName};
use tipflow_deck::InvariantContext;

use crate::args::BlowoutLocation;

/// A resolved liquid destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A well of a labware.
    Well {
        /// The labware.
        labware: LabwareId,
        /// The well.
        well: WellName,
    },
    /// A trash bin or waste chute, which has no wells.
    Disposal(EquipmentId),
}

impl Target {
    /// A labware well.
    pub fn well(labware: impl Into<LabwareId>, well: impl Into<WellName>) -> Self {
        Self::Well {
            labware: labware.into(),
            well: well.into(),
        }
    }

    /// Whether this is a trash bin or waste chute.
    pub fn is_disposal(&self) -> bool {
        matches!(self, Self::Disposal(_))
    }

    /// The well name, empty for disposals.
    pub fn well_name(&self) -> WellName {
        match self {
            Self::Well { well, .. } => well.clone(),
            Self::Disposal(_) => WellName::from(""),
        }
    }
}

/// Resolve an id to a disposal, or to `well` (else the first well) of a
/// labware. `None` if the id names neither.
pub fn resolve(ctx: &InvariantContext, id: &str, well: Option<&WellName>) -> Option<Target> {
    if let Some(equipment) = ctx.disposal(id) {
        return Some(Target::Disposal(equipment.id.clone()));
    }
    let labware = ctx.labware(id)?;
    let well = match well {
        Some(w) => w.clone(),
        None => labware.def.first_well()?.clone(),
    };
    Some(Target::Well {
        labware: labware.id.clone(),
        well,
    })
}

/// Resolve a blow-out location against the wells of the current cycle.
///
/// The source and destination sentinels win; anything else is looked up
/// as a trash bin, waste chute or labware id.
pub fn resolve_blowout(
    ctx: &InvariantContext,
    location: &BlowoutLocation,
    source: &Target,
    dest: &Target,
) -> Result<Target, CommandCreatorError> {
    match location {
        BlowoutLocation::SourceWell => Ok(source.clone()),
        BlowoutLocation::DestWell => Ok(dest.clone()),
        BlowoutLocation::Other(id) => {
            resolve(ctx, id, None).ok_or_else(|| CommandCreatorError::EquipmentDoesNotExist {
                action: "blowout",
                equipment: id.clone(),
            })
        }
    }
}
