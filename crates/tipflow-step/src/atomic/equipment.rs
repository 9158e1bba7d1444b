//! Blow-out and dispense into trash bins and waste chutes.
//!
//! Disposal equipment has no wells: the pipette moves to the equipment's
//! addressable area and then acts in place.

use tipflow_core::{
    AddressableAreaParams, BlowOutInPlaceParams, Command, CommandCreatorError,
    CommandCreatorResult, CommandsAndWarnings, EquipmentId, InPlaceParams, PipetteId, Volume,
    WellOffset,
};
use tipflow_deck::{AdditionalEquipment, InvariantContext, PipetteEntity};
use tipflow_state::selectors::active_channels;
use tipflow_state::RobotState;

use super::{check_volume, finish, require_pipette, require_tip};
use crate::python;

/// Arguments for [`move_to_disposal`].
#[derive(Clone, Debug, PartialEq)]
pub struct MoveToDisposalArgs {
    /// Pipette to move.
    pub pipette_id: PipetteId,
    /// Trash bin or waste chute.
    pub equipment_id: EquipmentId,
}

/// Arguments for [`blow_out_in_disposal`].
#[derive(Clone, Debug, PartialEq)]
pub struct BlowOutInDisposalArgs {
    /// Pipette blowing out.
    pub pipette_id: PipetteId,
    /// Trash bin or waste chute.
    pub equipment_id: EquipmentId,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

/// Arguments for [`dispense_in_disposal`].
#[derive(Clone, Debug, PartialEq)]
pub struct DispenseInDisposalArgs {
    /// Pipette dispensing.
    pub pipette_id: PipetteId,
    /// Trash bin or waste chute.
    pub equipment_id: EquipmentId,
    /// Volume in µL.
    pub volume: Volume,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

fn require_disposal<'c>(
    ctx: &'c InvariantContext,
    action: &'static str,
    id: &EquipmentId,
    errors: &mut Vec<CommandCreatorError>,
) -> Option<&'c AdditionalEquipment> {
    let found = ctx.disposal(id.as_str());
    if found.is_none() {
        errors.push(CommandCreatorError::EquipmentDoesNotExist {
            action,
            equipment: id.to_string(),
        });
    }
    found
}

fn move_command(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
    equipment: &AdditionalEquipment,
) -> Result<Command, CommandCreatorError> {
    let channels = active_channels(state, pipette);
    let area = equipment
        .addressable_area_name(ctx.robot_type(), channels)
        .ok_or_else(|| CommandCreatorError::EquipmentDoesNotExist {
            action: "move to addressable area",
            equipment: equipment.id.to_string(),
        })?;
    Ok(Command::MoveToAddressableArea(AddressableAreaParams {
        pipette_id: pipette.id.clone(),
        addressable_area_name: area,
        offset: WellOffset::default(),
    }))
}

/// Move a pipette over a trash bin or waste chute.
pub fn move_to_disposal(
    args: &MoveToDisposalArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let equipment = require_disposal(ctx, "move to addressable area", &args.equipment_id, &mut errors);
    let (Some(pipette), Some(equipment)) = (pipette, equipment) else {
        return Err(errors.into());
    };
    let command = move_command(ctx, prev, pipette, equipment)?;
    let fragment = python::pipette(ctx, args.pipette_id.as_str())
        .zip(python::equipment(ctx, args.equipment_id.as_str()))
        .map(|(p, e)| format!("{p}.move_to({e})"));
    Ok(CommandsAndWarnings {
        commands: vec![command],
        warnings: Vec::new(),
        python: fragment,
    })
}

/// Blow out into a trash bin or waste chute.
pub fn blow_out_in_disposal(
    args: &BlowOutInDisposalArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "blowout";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let equipment = require_disposal(ctx, ACTION, &args.equipment_id, &mut errors);
    if let Some(pipette) = pipette {
        require_tip(prev, pipette, ACTION, None, None, &mut errors);
    }
    finish(errors)?;
    let (Some(pipette), Some(equipment)) = (pipette, equipment) else {
        return Ok(CommandsAndWarnings::empty());
    };

    let fragment = python::pipette(ctx, args.pipette_id.as_str())
        .zip(python::equipment(ctx, args.equipment_id.as_str()))
        .map(|(p, e)| format!("{p}.blow_out({e})"));
    Ok(CommandsAndWarnings {
        commands: vec![
            move_command(ctx, prev, pipette, equipment)?,
            Command::BlowOutInPlace(BlowOutInPlaceParams {
                pipette_id: args.pipette_id.clone(),
                flow_rate: args.flow_rate,
            }),
        ],
        warnings: Vec::new(),
        python: fragment,
    })
}

/// Dispense into a trash bin or waste chute.
pub fn dispense_in_disposal(
    args: &DispenseInDisposalArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "dispense";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let equipment = require_disposal(ctx, ACTION, &args.equipment_id, &mut errors);
    if let Some(pipette) = pipette {
        require_tip(prev, pipette, ACTION, None, None, &mut errors);
        check_volume(ctx, prev, pipette, ACTION, args.volume, &mut errors);
    }
    finish(errors)?;
    let (Some(pipette), Some(equipment)) = (pipette, equipment) else {
        return Ok(CommandsAndWarnings::empty());
    };

    let fragment = python::pipette(ctx, args.pipette_id.as_str())
        .zip(python::equipment(ctx, args.equipment_id.as_str()))
        .map(|(p, e)| format!("{p}.dispense(volume={}, location={e})", python::number(args.volume)));
    Ok(CommandsAndWarnings {
        commands: vec![
            move_command(ctx, prev, pipette, equipment)?,
            Command::DispenseInPlace(InPlaceParams {
                pipette_id: args.pipette_id.clone(),
                volume: args.volume,
                flow_rate: args.flow_rate,
            }),
        ],
        warnings: Vec::new(),
        python: fragment,
    })
}
