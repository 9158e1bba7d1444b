//! Preconditions shared by the liquid-moving compound creators.
//!
//! These run before any chunk planning, and every violation is reported
//! together so the caller sees the whole list at once.

use tipflow_core::{CommandCreatorError, LabwareId, Volume, WellName};
use tipflow_deck::{InvariantContext, PipetteEntity};
use tipflow_state::selectors::{capacity_with_tiprack, effective_capacity, sorted_tipracks};
use tipflow_state::RobotState;
use tipflow_step::hazards::pipette_access_errors;

use crate::args::{ChangeTip, PipettingArgs};
use crate::target::{resolve, Target};

/// Pipette and drop-tip location checks.
pub(crate) fn common<'c>(
    ctx: &'c InvariantContext,
    args: &PipettingArgs,
    errors: &mut Vec<CommandCreatorError>,
) -> Option<&'c PipetteEntity> {
    let pipette = ctx.pipette(args.pipette.as_str());
    if pipette.is_none() {
        errors.push(CommandCreatorError::PipetteDoesNotExist {
            pipette: args.pipette.clone(),
        });
    }
    let drop = args.drop_tip_location.as_str();
    if ctx.disposal(drop).is_none() && ctx.labware(drop).is_none() {
        errors.push(CommandCreatorError::DropTipLocationDoesNotExist {
            location: drop.to_string(),
        });
    }
    pipette
}

/// A labware the pipette will reach into: it exists, every named well
/// exists, and no hazard blocks access.
pub(crate) fn labware_access(
    ctx: &InvariantContext,
    prev: &RobotState,
    pipette: Option<&PipetteEntity>,
    action: &'static str,
    labware: &LabwareId,
    wells: &[WellName],
    errors: &mut Vec<CommandCreatorError>,
) {
    let Some(entity) = ctx.labware(labware.as_str()) else {
        errors.push(CommandCreatorError::LabwareDoesNotExist {
            action,
            labware: labware.clone(),
        });
        return;
    };
    for well in wells {
        if !entity.def.has_well(well.as_str()) {
            errors.push(CommandCreatorError::WellDoesNotExist {
                labware: labware.clone(),
                well: well.clone(),
            });
        }
    }
    if let Some(pipette) = pipette {
        errors.extend(pipette_access_errors(ctx, prev, pipette, labware));
    }
}

/// A destination that may be a labware or a trash bin / waste chute.
///
/// Wells are only checked for labware destinations.
pub(crate) fn destination(
    ctx: &InvariantContext,
    prev: &RobotState,
    pipette: Option<&PipetteEntity>,
    action: &'static str,
    id: &str,
    wells: &[WellName],
    errors: &mut Vec<CommandCreatorError>,
) -> bool {
    if ctx.disposal(id).is_some() {
        return true;
    }
    labware_access(ctx, prev, pipette, action, &LabwareId::from(id), wells, errors);
    false
}

/// Touch-tip, mix and air gaps need well geometry, which disposals lack.
pub(crate) fn no_well_actions_at_disposal(
    target_id: &str,
    requested: &[(&'static str, bool)],
    errors: &mut Vec<CommandCreatorError>,
) {
    for (action, _) in requested.iter().filter(|(_, on)| *on) {
        errors.push(CommandCreatorError::InvalidTrashOrWasteChuteAction {
            action: *action,
            equipment: target_id.to_string(),
        });
    }
}

/// A positive, finite volume.
pub(crate) fn volume(volume: Volume, errors: &mut Vec<CommandCreatorError>) {
    if !volume.is_finite() || volume <= 0.0 {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: format!("volume must be positive, got {volume}"),
        });
    }
}

/// Capacity to plan chunks against: the mounted tip if it will be kept,
/// else the first tiprack the pipette would pick from.
pub(crate) fn planning_capacity(
    ctx: &InvariantContext,
    prev: &RobotState,
    pipette: &PipetteEntity,
    policy: ChangeTip,
) -> Volume {
    if policy == ChangeTip::Never || !prev.pipette_has_tip(pipette.id.as_str()) {
        return effective_capacity(ctx, prev, pipette);
    }
    match sorted_tipracks(ctx, prev, pipette).first() {
        Some(rack) => capacity_with_tiprack(ctx, pipette, rack.id.as_str()),
        None => pipette.spec.max_volume,
    }
}

/// Resolve a destination id and well, reporting a missing one.
pub(crate) fn target(
    ctx: &InvariantContext,
    action: &'static str,
    id: &str,
    well: Option<&WellName>,
) -> Result<Target, CommandCreatorError> {
    resolve(ctx, id, well).ok_or_else(|| CommandCreatorError::LabwareDoesNotExist {
        action,
        labware: LabwareId::from(id),
    })
}
