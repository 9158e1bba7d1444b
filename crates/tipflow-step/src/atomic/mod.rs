//! Atomic command creators: one per primitive robot action.
//!
//! Every atomic creator has the [`CreatorFn`](crate::CreatorFn) shape
//! `(args, ctx, prev) -> CommandCreatorResult`. It validates its
//! preconditions against `prev`, collecting every violation rather than
//! stopping at the first, and on success returns a short fixed sequence
//! of commands. Atomic creators never advance the state themselves; the
//! fold in [`reduce_command_creators`](crate::reduce_command_creators)
//! does that.

mod equipment;
mod labware;
mod modules;
mod pipetting;
mod timing;
mod tips;

pub use equipment::{
    blow_out_in_disposal, dispense_in_disposal, move_to_disposal, BlowOutInDisposalArgs,
    DispenseInDisposalArgs, MoveToDisposalArgs,
};
pub use labware::{move_labware, MoveLabwareArgs};
pub use modules::{
    await_temperature, deactivate_temperature, disengage_magnet, engage_magnet,
    heater_shaker_await_temperature, heater_shaker_close_latch, heater_shaker_deactivate_heater,
    heater_shaker_deactivate_shaker, heater_shaker_open_latch, heater_shaker_set_shake_speed,
    heater_shaker_set_temperature, set_temperature, thermocycler_await_profile_complete,
    thermocycler_close_lid, thermocycler_deactivate_block, thermocycler_deactivate_lid,
    thermocycler_open_lid, thermocycler_run_profile, thermocycler_set_block_temperature,
    thermocycler_set_lid_temperature, thermocycler_wait_for_block_temperature,
    thermocycler_wait_for_lid_temperature,
};
pub use pipetting::{
    air_gap, aspirate, blowout, dispense, move_to_well, touch_tip, AirGapArgs,
};
pub use timing::{delay, pause};
pub use tips::{configure_nozzle_layout, drop_tip, pick_up_tip, DropTipArgs};

use tipflow_core::{
    CommandCreatorError, CommandCreatorErrors, LabwareId, PipetteId, Volume, WellName,
};
use tipflow_deck::{wells_for_tips, InvariantContext, LabwareDefinition, PipetteEntity};
use tipflow_state::selectors::{active_channels, mounted_tip_capacity};
use tipflow_state::RobotState;

/// Look up a pipette, recording an error if it is missing.
pub(crate) fn require_pipette<'c>(
    ctx: &'c InvariantContext,
    id: &PipetteId,
    errors: &mut Vec<CommandCreatorError>,
) -> Option<&'c PipetteEntity> {
    let found = ctx.pipette(id.as_str());
    if found.is_none() {
        errors.push(CommandCreatorError::PipetteDoesNotExist {
            pipette: id.clone(),
        });
    }
    found
}

/// Look up a labware definition, recording an error if it is missing.
pub(crate) fn require_labware<'c>(
    ctx: &'c InvariantContext,
    action: &'static str,
    id: &LabwareId,
    errors: &mut Vec<CommandCreatorError>,
) -> Option<&'c LabwareDefinition> {
    let found = ctx.labware_def(id.as_str());
    if found.is_none() {
        errors.push(CommandCreatorError::LabwareDoesNotExist {
            action,
            labware: id.clone(),
        });
    }
    found
}

pub(crate) fn require_tip(
    state: &RobotState,
    pipette: &PipetteEntity,
    action: &'static str,
    labware: Option<&LabwareId>,
    well: Option<&WellName>,
    errors: &mut Vec<CommandCreatorError>,
) {
    if !state.pipette_has_tip(pipette.id.as_str()) {
        errors.push(CommandCreatorError::NoTipOnPipette {
            action,
            pipette: pipette.id.clone(),
            labware: labware.cloned(),
            well: well.cloned(),
        });
    }
}

/// Pipette capacity first; the mounted tip only if the pipette allows it.
pub(crate) fn check_volume(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
    action: &'static str,
    volume: Volume,
    errors: &mut Vec<CommandCreatorError>,
) {
    if volume > pipette.spec.max_volume {
        errors.push(CommandCreatorError::PipetteVolumeExceeded {
            action,
            volume,
            max_volume: pipette.spec.max_volume,
            disposal_volume: None,
        });
    } else if let Some(tip) = mounted_tip_capacity(ctx, state, pipette) {
        if volume > tip {
            errors.push(CommandCreatorError::TipVolumeExceeded {
                action,
                volume,
                max_volume: tip,
            });
        }
    }
}

/// The well exists and every engaged tip lands in a well.
pub(crate) fn check_well(
    state: &RobotState,
    pipette: &PipetteEntity,
    def: &LabwareDefinition,
    labware: &LabwareId,
    well: &WellName,
    errors: &mut Vec<CommandCreatorError>,
) {
    if !def.has_well(well.as_str()) {
        errors.push(CommandCreatorError::WellDoesNotExist {
            labware: labware.clone(),
            well: well.clone(),
        });
        return;
    }
    let channels = active_channels(state, pipette);
    if wells_for_tips(def, well.as_str(), channels).is_none() {
        errors.push(CommandCreatorError::NoWellsForTips {
            pipette: pipette.id.clone(),
            labware: labware.clone(),
            well: well.clone(),
        });
    }
}

pub(crate) fn finish(errors: Vec<CommandCreatorError>) -> Result<(), CommandCreatorErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CommandCreatorErrors::from(errors))
    }
}
