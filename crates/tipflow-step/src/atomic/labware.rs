//! Moving labware with the gripper or by hand.

use tipflow_core::{
    Command, CommandCreatorError, CommandCreatorResult, CommandsAndWarnings, LabwareId,
    LabwareLocation, ModuleId, MoveLabwareParams, MoveLabwareStrategy,
};
use tipflow_deck::InvariantContext;
use tipflow_state::selectors::{is_location_occupied, module_state, module_under_labware};
use tipflow_state::{ModuleState, RobotState};

use super::{finish, require_labware};
use crate::python;

/// Arguments for [`move_labware`].
#[derive(Clone, Debug, PartialEq)]
pub struct MoveLabwareArgs {
    /// Labware to move.
    pub labware_id: LabwareId,
    /// Destination.
    pub new_location: LabwareLocation,
    /// Use the gripper rather than pausing for the operator.
    pub use_gripper: bool,
}

/// Errors that block moving labware onto or off a module.
fn module_access_errors(state: &RobotState, module: &ModuleId, errors: &mut Vec<CommandCreatorError>) {
    match module_state(state, module.as_str()) {
        Some(ModuleState::Thermocycler(tc)) if tc.lid_open != Some(true) => {
            errors.push(CommandCreatorError::ThermocyclerLidClosed {
                module: module.clone(),
            });
        }
        Some(ModuleState::HeaterShaker(hs)) => {
            if hs.is_shaking() {
                errors.push(CommandCreatorError::HeaterShakerIsShaking {
                    module: module.clone(),
                });
            }
            if hs.latch_open != Some(true) {
                errors.push(CommandCreatorError::HeaterShakerLatchClosed {
                    module: module.clone(),
                });
            }
        }
        _ => {}
    }
}

fn describe(location: &LabwareLocation) -> String {
    match location {
        LabwareLocation::Slot(slot) => format!("slot {slot}"),
        LabwareLocation::Module(module) => format!("module {module}"),
        LabwareLocation::Labware(labware) => format!("labware {labware}"),
        LabwareLocation::OffDeck => "off deck".to_string(),
    }
}

/// Move a labware to a new location.
///
/// The gripper must be installed when requested, the destination must be
/// free, and modules at either end must be open: thermocycler lid open,
/// heater-shaker not shaking with its latch open.
pub fn move_labware(
    args: &MoveLabwareArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "move labware";
    let mut errors = Vec::new();
    require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if args.use_gripper && !ctx.has_gripper() {
        errors.push(CommandCreatorError::GripperRequired);
    }

    match &args.new_location {
        LabwareLocation::Slot(slot) if !ctx.robot_type().has_slot(slot.as_str()) => {
            errors.push(CommandCreatorError::InvalidStepArgs {
                reason: format!("{} has no slot '{slot}'", ctx.robot_type()),
            });
        }
        LabwareLocation::Module(module) if !prev.modules.contains_key(module) => {
            errors.push(CommandCreatorError::MissingModule {
                module: Some(module.clone()),
            });
        }
        LabwareLocation::Labware(below) if ctx.labware(below.as_str()).is_none() => {
            errors.push(CommandCreatorError::LabwareDoesNotExist {
                action: ACTION,
                labware: below.clone(),
            });
        }
        _ => {}
    }
    if errors.is_empty() && is_location_occupied(ctx, prev, &args.new_location) {
        errors.push(CommandCreatorError::SlotOccupied {
            location: describe(&args.new_location),
        });
    }

    if let Some(module) = module_under_labware(prev, args.labware_id.as_str()) {
        module_access_errors(prev, module, &mut errors);
    }
    if let LabwareLocation::Module(module) = &args.new_location {
        module_access_errors(prev, module, &mut errors);
    }
    finish(errors)?;

    let strategy = if args.use_gripper {
        MoveLabwareStrategy::UsingGripper
    } else {
        MoveLabwareStrategy::ManualMoveWithPause
    };
    Ok(CommandsAndWarnings {
        commands: vec![Command::MoveLabware(MoveLabwareParams {
            labware_id: args.labware_id.clone(),
            new_location: args.new_location.clone(),
            strategy,
        })],
        warnings: Vec::new(),
        python: move_fragment(ctx, args),
    })
}

fn move_fragment(ctx: &InvariantContext, args: &MoveLabwareArgs) -> Option<String> {
    let labware = python::labware(ctx, args.labware_id.as_str())?;
    let location = match &args.new_location {
        LabwareLocation::Slot(slot) => python::string(slot.as_str()),
        LabwareLocation::Module(module) => python::module(ctx, module.as_str())?,
        LabwareLocation::Labware(below) => python::labware(ctx, below.as_str())?,
        LabwareLocation::OffDeck => "protocol_api.OFF_DECK".to_string(),
    };
    let gripper = if args.use_gripper { "True" } else { "False" };
    Some(format!(
        "protocol.move_labware(labware={labware}, new_location={location}, use_gripper={gripper})"
    ))
}
