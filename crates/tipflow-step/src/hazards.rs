//! Physical hazard checks shared by creators that send a pipette to labware.
//!
//! [`pipette_access_errors`] collects every reason a pipette cannot reach a
//! labware in the current state: the labware is off deck, it sits in a
//! closed thermocycler or on a busy heater-shaker, a GEN1 multi-channel
//! pipette would strike a neighbouring module, or the labware is next to a
//! heater-shaker in a way that is unsafe for the move.

use tipflow_core::{CommandCreatorError, LabwareId, ModuleType};
use tipflow_deck::{InvariantContext, PipetteEntity, PipetteGeneration, RobotType};
use tipflow_state::selectors::{
    active_channels, is_off_deck, labware_slot, module_state, module_under_labware,
};
use tipflow_state::{ModuleState, RobotState};

/// OT-2 slots where a GEN1 multi-channel pipette hits an adjacent GEN1
/// temperature or magnetic module.
const COLLISION_SLOTS: [&str; 2] = ["1", "3"];

/// Every hazard that blocks `pipette` from reaching `labware`.
pub fn pipette_access_errors(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
    labware: &LabwareId,
) -> Vec<CommandCreatorError> {
    let mut errors = Vec::new();

    if is_off_deck(state, labware.as_str()) {
        errors.push(CommandCreatorError::LabwareOffDeck {
            labware: labware.clone(),
        });
        return errors;
    }

    if let Some(module) = module_under_labware(state, labware.as_str()) {
        match module_state(state, module.as_str()) {
            Some(ModuleState::Thermocycler(tc)) if tc.lid_open != Some(true) => {
                errors.push(CommandCreatorError::ThermocyclerLidClosed {
                    module: module.clone(),
                });
            }
            Some(ModuleState::HeaterShaker(hs)) => {
                if hs.latch_open == Some(true) {
                    errors.push(CommandCreatorError::HeaterShakerLatchOpen {
                        module: module.clone(),
                    });
                }
                if hs.is_shaking() {
                    errors.push(CommandCreatorError::HeaterShakerIsShaking {
                        module: module.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    if module_pipette_collision(ctx, state, pipette, labware) {
        errors.push(CommandCreatorError::ModulePipetteCollisionDanger {
            pipette: pipette.id.clone(),
            labware: labware.clone(),
        });
    }

    errors.extend(adjacent_heater_shaker_errors(ctx, state, pipette, labware));
    errors
}

/// Whether a GEN1 multi-channel pipette would collide with the GEN1
/// temperature or magnetic module `labware` sits on.
pub fn module_pipette_collision(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
    labware: &LabwareId,
) -> bool {
    if ctx.robot_type() != RobotType::Ot2
        || pipette.spec.generation != PipetteGeneration::Gen1
        || !pipette.spec.is_multi_channel()
    {
        return false;
    }
    let Some(module_id) = module_under_labware(state, labware.as_str()) else {
        return false;
    };
    let Some(module) = ctx.module(module_id.as_str()) else {
        return false;
    };
    let hazardous_type = matches!(
        module.module_type,
        ModuleType::TemperatureModuleType | ModuleType::MagneticModuleType
    );
    let in_collision_slot = state
        .modules
        .get(module_id)
        .is_some_and(|m| COLLISION_SLOTS.contains(&m.slot.as_str()));
    hazardous_type && module.is_gen1() && in_collision_slot
}

/// Hazards from heater-shakers in slots sharing an edge with `labware`.
///
/// Only the OT-2 has the heater-shaker clearance restrictions.
pub fn adjacent_heater_shaker_errors(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
    labware: &LabwareId,
) -> Vec<CommandCreatorError> {
    let robot = ctx.robot_type();
    if robot != RobotType::Ot2 {
        return Vec::new();
    }
    let Some(slot) = labware_slot(state, labware.as_str()) else {
        return Vec::new();
    };
    let is_tiprack = ctx
        .labware_def(labware.as_str())
        .is_some_and(|d| d.is_tiprack);
    let multi_channel = active_channels(state, pipette) > 1;

    let mut errors = Vec::new();
    for (id, module) in &state.modules {
        let ModuleState::HeaterShaker(hs) = &module.state else {
            continue;
        };
        let Some(direction) = robot.adjacency(module.slot.as_str(), slot.as_str()) else {
            continue;
        };
        if hs.is_shaking() {
            errors.push(CommandCreatorError::HeaterShakerNorthSouthEastWestShaking {
                module: id.clone(),
            });
        }
        if direction.is_east_west() && hs.latch_open == Some(true) {
            errors.push(CommandCreatorError::HeaterShakerEastWestWithLatchOpen {
                module: id.clone(),
            });
        }
        if direction.is_north_south() && multi_channel && !is_tiprack {
            errors.push(CommandCreatorError::HeaterShakerNorthSouthWithMultiChannel {
                module: id.clone(),
            });
        }
    }
    errors
}
