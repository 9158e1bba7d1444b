//! Module command updaters.

use tipflow_core::{Command, ModuleId};
use tracing::warn;

use super::StateUpdate;
use crate::module_state::{
    HeaterShakerModuleState, MagneticModuleState, ModuleState, TemperatureModuleState,
    ThermocyclerModuleState,
};

fn module_mut<'s>(update: &'s mut StateUpdate, module: &ModuleId) -> Option<&'s mut ModuleState> {
    match update.state.modules.get_mut(module) {
        Some(m) => Some(&mut m.state),
        None => {
            warn!(%module, "module command for unplaced module");
            None
        }
    }
}

fn temperature<'s>(update: &'s mut StateUpdate, module: &ModuleId) -> Option<&'s mut TemperatureModuleState> {
    match module_mut(update, module)? {
        ModuleState::Temperature(s) => Some(s),
        other => {
            warn!(%module, actual = %other.module_type(), "expected a temperature module");
            None
        }
    }
}

fn magnetic<'s>(update: &'s mut StateUpdate, module: &ModuleId) -> Option<&'s mut MagneticModuleState> {
    match module_mut(update, module)? {
        ModuleState::Magnetic(s) => Some(s),
        other => {
            warn!(%module, actual = %other.module_type(), "expected a magnetic module");
            None
        }
    }
}

fn thermocycler<'s>(
    update: &'s mut StateUpdate,
    module: &ModuleId,
) -> Option<&'s mut ThermocyclerModuleState> {
    match module_mut(update, module)? {
        ModuleState::Thermocycler(s) => Some(s),
        other => {
            warn!(%module, actual = %other.module_type(), "expected a thermocycler");
            None
        }
    }
}

fn heater_shaker<'s>(
    update: &'s mut StateUpdate,
    module: &ModuleId,
) -> Option<&'s mut HeaterShakerModuleState> {
    match module_mut(update, module)? {
        ModuleState::HeaterShaker(s) => Some(s),
        other => {
            warn!(%module, actual = %other.module_type(), "expected a heater-shaker");
            None
        }
    }
}

pub(super) fn apply(update: &mut StateUpdate, command: &Command) {
    match command {
        Command::TemperatureModuleSetTargetTemperature(p) => {
            if let Some(s) = temperature(update, &p.module_id) {
                s.block.set_target(p.celsius);
            }
        }
        Command::TemperatureModuleWaitForTemperature(p) => {
            if let Some(s) = temperature(update, &p.module_id) {
                s.block.await_target(p.celsius);
            }
        }
        Command::TemperatureModuleDeactivate(p) => {
            if let Some(s) = temperature(update, &p.module_id) {
                s.block.deactivate();
            }
        }

        Command::MagneticModuleEngage(p) => {
            if let Some(s) = magnetic(update, &p.module_id) {
                s.engaged = true;
                s.engage_height = Some(p.height);
            }
        }
        Command::MagneticModuleDisengage(p) => {
            if let Some(s) = magnetic(update, &p.module_id) {
                *s = MagneticModuleState::default();
            }
        }

        Command::ThermocyclerSetTargetBlockTemperature(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.block.set_target(p.celsius);
            }
        }
        Command::ThermocyclerWaitForBlockTemperature(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.block.await_current();
            }
        }
        Command::ThermocyclerSetTargetLidTemperature(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.lid.set_target(p.celsius);
            }
        }
        Command::ThermocyclerWaitForLidTemperature(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.lid.await_current();
            }
        }
        Command::ThermocyclerDeactivateBlock(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.block.deactivate();
            }
        }
        Command::ThermocyclerDeactivateLid(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.lid.deactivate();
            }
        }
        Command::ThermocyclerOpenLid(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.lid_open = Some(true);
            }
        }
        Command::ThermocyclerCloseLid(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.lid_open = Some(false);
            }
        }
        Command::ThermocyclerRunProfile(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.profile_running = true;
                if let Some(last) = p.profile.last() {
                    s.block.set_target(last.celsius);
                }
            }
        }
        Command::ThermocyclerAwaitProfileComplete(p) => {
            if let Some(s) = thermocycler(update, &p.module_id) {
                s.profile_running = false;
                s.block.await_current();
            }
        }

        Command::HeaterShakerSetTargetTemperature(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.heater.set_target(p.celsius);
            }
        }
        Command::HeaterShakerWaitForTemperature(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.heater.await_target(p.celsius);
            }
        }
        Command::HeaterShakerDeactivateHeater(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.heater.deactivate();
            }
        }
        Command::HeaterShakerSetAndWaitForShakeSpeed(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.target_speed = Some(p.rpm);
                s.latch_open = Some(false);
            }
        }
        Command::HeaterShakerDeactivateShaker(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.target_speed = None;
            }
        }
        Command::HeaterShakerOpenLabwareLatch(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.latch_open = Some(true);
            }
        }
        Command::HeaterShakerCloseLabwareLatch(p) => {
            if let Some(s) = heater_shaker(update, &p.module_id) {
                s.latch_open = Some(false);
            }
        }

        other => warn!(command = other.command_type(), "no updater for command"),
    }
}
