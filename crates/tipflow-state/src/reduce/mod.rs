//! State-update reducers.
//!
//! [`get_next_robot_state_and_warnings`] advances a [`RobotState`] over a
//! list of commands, one dedicated updater per command tag. It never
//! fails: a command that references something the context or state does
//! not know is logged at `warn` and skipped, and physical oddities that do
//! not invalidate the command (aspirating from an empty well, overfilling
//! a well) become [`CommandCreatorWarning`]s.

mod liquid;
mod modules;
mod tips;

use tipflow_core::{Command, CommandCreatorWarning, PipetteId};
use tipflow_deck::InvariantContext;
use tracing::{trace, warn};

use crate::state::{PipetteLocation, RobotState};

/// A robot state together with the warnings produced while reaching it.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotStateAndWarnings {
    /// The state after the commands.
    pub robot_state: RobotState,
    /// Warnings raised by the updaters, in command order.
    pub warnings: Vec<CommandCreatorWarning>,
}

/// Apply `commands` in order to a copy of `prev`.
pub fn get_next_robot_state_and_warnings(
    commands: &[Command],
    ctx: &InvariantContext,
    prev: &RobotState,
) -> RobotStateAndWarnings {
    let mut update = StateUpdate {
        state: prev.clone(),
        warnings: Vec::new(),
    };
    for command in commands {
        trace!(command = command.command_type(), "reducing command");
        update.apply(ctx, command);
    }
    RobotStateAndWarnings {
        robot_state: update.state,
        warnings: update.warnings,
    }
}

/// Working copy threaded through the updaters.
pub(crate) struct StateUpdate {
    pub(crate) state: RobotState,
    pub(crate) warnings: Vec<CommandCreatorWarning>,
}

impl StateUpdate {
    fn apply(&mut self, ctx: &InvariantContext, command: &Command) {
        match command {
            Command::Aspirate(p) => liquid::aspirate(ctx, self, p),
            Command::Dispense(p) => liquid::dispense(ctx, self, p),
            Command::AirGapInPlace(p) => liquid::air_gap_in_place(ctx, self, p),
            Command::DispenseInPlace(p) => {
                liquid::expel_in_place(ctx, self, &p.pipette_id, Some(p.volume))
            }
            Command::Blowout(p) => liquid::blowout(ctx, self, p),
            Command::BlowOutInPlace(p) => liquid::expel_in_place(ctx, self, &p.pipette_id, None),
            Command::TouchTip(p) | Command::MoveToWell(p) => {
                self.set_location_well(&p.pipette_id, &p.labware_id, &p.well_name)
            }
            Command::MoveToAddressableArea(p) | Command::MoveToAddressableAreaForDropTip(p) => {
                self.state.pipette_locations.insert(
                    p.pipette_id.clone(),
                    PipetteLocation::AddressableArea {
                        addressable_area_name: p.addressable_area_name.clone(),
                    },
                );
            }
            Command::PickUpTip(p) => tips::pick_up_tip(ctx, self, p),
            Command::DropTip(p) => tips::drop_tip(ctx, self, p),
            Command::DropTipInPlace(p) => tips::drop_tip_in_place(ctx, self, &p.pipette_id),
            Command::ConfigureNozzleLayout(p) => match self.state.pipettes.get_mut(&p.pipette_id) {
                Some(props) => props.nozzles = p.configuration_params,
                None => warn!(pipette = %p.pipette_id, "nozzle layout for unplaced pipette"),
            },
            Command::MoveLabware(p) => {
                if !self.state.labware.contains_key(&p.labware_id) {
                    warn!(labware = %p.labware_id, "moving labware that was never placed");
                }
                self.state
                    .labware
                    .insert(p.labware_id.clone(), p.new_location.clone());
            }
            Command::WaitForDuration(_) | Command::WaitForResume(_) => {}
            other => modules::apply(self, other),
        }
    }

    pub(crate) fn set_location_well(
        &mut self,
        pipette: &PipetteId,
        labware: &tipflow_core::LabwareId,
        well: &tipflow_core::WellName,
    ) {
        self.state.pipette_locations.insert(
            pipette.clone(),
            PipetteLocation::Well {
                labware_id: labware.clone(),
                well_name: well.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests;
