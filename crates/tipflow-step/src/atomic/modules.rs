//! Module atomic creators: temperature, magnetic, thermocycler and
//! heater-shaker.
//!
//! Every creator first resolves its module: it must be registered in the
//! context, placed on the deck, and of the kind the command targets.
//! Temperature waits are checked against the module's current target.

use tipflow_core::{
    BlockTemperatureParams, Command, CommandCreatorError, CommandCreatorResult,
    CommandCreatorWarning, CommandsAndWarnings, EngageMagnetParams, ModuleId, ModuleParams,
    ModuleType, RunProfileParams, ShakeSpeedParams, TemperatureParams,
};
use tipflow_deck::InvariantContext;
use tipflow_state::selectors::module_state;
use tipflow_state::{ModuleState, RobotState, TemperatureControl, TemperatureStatus};

use super::finish;
use crate::python;

// ── Resolution ─────────────────────────────────────────────────────

fn require_module<'s>(
    ctx: &InvariantContext,
    prev: &'s RobotState,
    module: &ModuleId,
    expected: ModuleType,
) -> Result<&'s ModuleState, CommandCreatorError> {
    let placed = ctx
        .module(module.as_str())
        .and_then(|_| module_state(prev, module.as_str()));
    let Some(state) = placed else {
        return Err(CommandCreatorError::MissingModule {
            module: Some(module.clone()),
        });
    };
    let actual = state.module_type();
    if actual != expected {
        return Err(CommandCreatorError::WrongModuleType {
            module: module.clone(),
            expected,
            actual,
        });
    }
    Ok(state)
}

/// An await is an error unless the element is heading for or holding
/// `celsius`; heading for a different target only warns.
fn check_await(
    module: &ModuleId,
    control: &TemperatureControl,
    celsius: f64,
) -> Result<Vec<CommandCreatorWarning>, CommandCreatorError> {
    let matches = control.target == Some(celsius);
    match control.status {
        TemperatureStatus::Deactivated => Err(CommandCreatorError::MissingTemperatureStep {
            module: module.clone(),
        }),
        TemperatureStatus::AtTarget if !matches => Err(CommandCreatorError::MissingTemperatureStep {
            module: module.clone(),
        }),
        TemperatureStatus::ApproachingTarget if !matches => {
            Ok(vec![CommandCreatorWarning::PotentiallyUnreachableTemp {
                module: module.clone(),
            }])
        }
        _ => Ok(Vec::new()),
    }
}

/// One command plus an optional `module.method(args)` fragment.
fn emit(
    ctx: &InvariantContext,
    module: &ModuleId,
    command: Command,
    call: Option<String>,
) -> CommandsAndWarnings {
    let python = call.and_then(|call| {
        if call.is_empty() {
            return Some(String::new());
        }
        python::module(ctx, module.as_str()).map(|m| format!("{m}.{call}"))
    });
    CommandsAndWarnings {
        commands: vec![command],
        warnings: Vec::new(),
        python,
    }
}

// ── Temperature module ─────────────────────────────────────────────

/// Start heating or cooling a temperature module.
pub fn set_temperature(
    args: &TemperatureParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_module(ctx, prev, &args.module_id, ModuleType::TemperatureModuleType)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::TemperatureModuleSetTargetTemperature(args.clone()),
        Some(format!("start_set_temperature(celsius={})", python::number(args.celsius))),
    ))
}

/// Block until a temperature module reaches `celsius`.
pub fn await_temperature(
    args: &TemperatureParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let state = require_module(ctx, prev, &args.module_id, ModuleType::TemperatureModuleType)?;
    let ModuleState::Temperature(temp) = state else {
        return Err(CommandCreatorError::MissingModule {
            module: Some(args.module_id.clone()),
        }
        .into());
    };
    let warnings = check_await(&args.module_id, &temp.block, args.celsius)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::TemperatureModuleWaitForTemperature(args.clone()),
        Some(format!("await_temperature(celsius={})", python::number(args.celsius))),
    )
    .with_warnings(warnings))
}

/// Turn a temperature module off.
pub fn deactivate_temperature(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_module(ctx, prev, &args.module_id, ModuleType::TemperatureModuleType)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::TemperatureModuleDeactivate(args.clone()),
        Some("deactivate()".into()),
    ))
}

// ── Magnetic module ────────────────────────────────────────────────

/// Raise the magnets to `height` millimetres above the labware base.
pub fn engage_magnet(
    args: &EngageMagnetParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_module(ctx, prev, &args.module_id, ModuleType::MagneticModuleType)?;
    if !args.height.is_finite() || args.height < 0.0 {
        return Err(CommandCreatorError::InvalidStepArgs {
            reason: format!("magnet height {} is out of range", args.height),
        }
        .into());
    }
    Ok(emit(
        ctx,
        &args.module_id,
        Command::MagneticModuleEngage(args.clone()),
        Some(format!("engage(height_from_base={})", python::number(args.height))),
    ))
}

/// Lower the magnets.
pub fn disengage_magnet(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_module(ctx, prev, &args.module_id, ModuleType::MagneticModuleType)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::MagneticModuleDisengage(args.clone()),
        Some("disengage()".into()),
    ))
}

// ── Thermocycler ───────────────────────────────────────────────────

fn require_thermocycler<'s>(
    ctx: &InvariantContext,
    prev: &'s RobotState,
    module: &ModuleId,
) -> Result<&'s ModuleState, CommandCreatorError> {
    require_module(ctx, prev, module, ModuleType::ThermocyclerModuleType)
}

/// Set the thermocycler block target.
pub fn thermocycler_set_block_temperature(
    args: &BlockTemperatureParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    let call = match args.block_max_volume_ul {
        Some(v) => format!(
            "set_block_temperature(temperature={}, block_max_volume={})",
            python::number(args.celsius),
            python::number(v)
        ),
        None => format!("set_block_temperature(temperature={})", python::number(args.celsius)),
    };
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerSetTargetBlockTemperature(args.clone()),
        Some(call),
    ))
}

/// Wait for the block to reach its target.
///
/// The Python `set_block_temperature` call already blocks, so the
/// fragment is folded into the preceding set.
pub fn thermocycler_wait_for_block_temperature(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let state = require_thermocycler(ctx, prev, &args.module_id)?;
    if let ModuleState::Thermocycler(tc) = state {
        if !tc.block.is_active() {
            return Err(CommandCreatorError::MissingTemperatureStep {
                module: args.module_id.clone(),
            }
            .into());
        }
    }
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerWaitForBlockTemperature(args.clone()),
        Some(String::new()),
    ))
}

/// Set the heated lid target.
pub fn thermocycler_set_lid_temperature(
    args: &TemperatureParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerSetTargetLidTemperature(args.clone()),
        Some(format!("set_lid_temperature(temperature={})", python::number(args.celsius))),
    ))
}

/// Wait for the lid to reach its target.
pub fn thermocycler_wait_for_lid_temperature(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let state = require_thermocycler(ctx, prev, &args.module_id)?;
    if let ModuleState::Thermocycler(tc) = state {
        if !tc.lid.is_active() {
            return Err(CommandCreatorError::MissingTemperatureStep {
                module: args.module_id.clone(),
            }
            .into());
        }
    }
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerWaitForLidTemperature(args.clone()),
        Some(String::new()),
    ))
}

/// Turn the block off.
pub fn thermocycler_deactivate_block(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerDeactivateBlock(args.clone()),
        Some("deactivate_block()".into()),
    ))
}

/// Turn the heated lid off.
pub fn thermocycler_deactivate_lid(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerDeactivateLid(args.clone()),
        Some("deactivate_lid()".into()),
    ))
}

/// Open the lid.
pub fn thermocycler_open_lid(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerOpenLid(args.clone()),
        Some("open_lid()".into()),
    ))
}

/// Close the lid.
pub fn thermocycler_close_lid(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerCloseLid(args.clone()),
        Some("close_lid()".into()),
    ))
}

/// Start a block profile. The lid must be closed.
pub fn thermocycler_run_profile(
    args: &RunProfileParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let state = require_thermocycler(ctx, prev, &args.module_id)?;
    let mut errors = Vec::new();
    if args.profile.is_empty() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: "thermocycler profile has no steps".into(),
        });
    }
    if let ModuleState::Thermocycler(tc) = state {
        if tc.lid_open != Some(false) {
            errors.push(CommandCreatorError::InvalidStepArgs {
                reason: format!("thermocycler '{}' lid must be closed to run a profile", args.module_id),
            });
        }
    }
    finish(errors)?;

    let steps: Vec<String> = args
        .profile
        .iter()
        .map(|s| {
            format!(
                "{{\"temperature\": {}, \"hold_time_seconds\": {}}}",
                python::number(s.celsius),
                python::number(s.hold_seconds)
            )
        })
        .collect();
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerRunProfile(args.clone()),
        Some(format!(
            "execute_profile(steps=[{}], repetitions=1, block_max_volume={})",
            steps.join(", "),
            python::number(args.block_max_volume_ul)
        )),
    ))
}

/// Wait for a running profile to finish.
pub fn thermocycler_await_profile_complete(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    require_thermocycler(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::ThermocyclerAwaitProfileComplete(args.clone()),
        Some(String::new()),
    ))
}

// ── Heater-shaker ──────────────────────────────────────────────────

fn heater_shaker_state<'s>(
    ctx: &InvariantContext,
    prev: &'s RobotState,
    module: &ModuleId,
) -> Result<&'s tipflow_state::HeaterShakerModuleState, CommandCreatorError> {
    match require_module(ctx, prev, module, ModuleType::HeaterShakerModuleType)? {
        ModuleState::HeaterShaker(hs) => Ok(hs),
        other => Err(CommandCreatorError::WrongModuleType {
            module: module.clone(),
            expected: ModuleType::HeaterShakerModuleType,
            actual: other.module_type(),
        }),
    }
}

/// Start heating a heater-shaker.
pub fn heater_shaker_set_temperature(
    args: &TemperatureParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    heater_shaker_state(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerSetTargetTemperature(args.clone()),
        Some(format!("set_target_temperature(celsius={})", python::number(args.celsius))),
    ))
}

/// Block until a heater-shaker reaches `celsius`.
pub fn heater_shaker_await_temperature(
    args: &TemperatureParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let hs = heater_shaker_state(ctx, prev, &args.module_id)?;
    let warnings = check_await(&args.module_id, &hs.heater, args.celsius)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerWaitForTemperature(args.clone()),
        Some("wait_for_temperature()".into()),
    )
    .with_warnings(warnings))
}

/// Turn the heater off.
pub fn heater_shaker_deactivate_heater(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    heater_shaker_state(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerDeactivateHeater(args.clone()),
        Some("deactivate_heater()".into()),
    ))
}

/// Start shaking at `rpm`. The latch must not be open.
pub fn heater_shaker_set_shake_speed(
    args: &ShakeSpeedParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let hs = heater_shaker_state(ctx, prev, &args.module_id)?;
    let mut errors = Vec::new();
    if hs.latch_open == Some(true) {
        errors.push(CommandCreatorError::HeaterShakerLatchOpen {
            module: args.module_id.clone(),
        });
    }
    if !args.rpm.is_finite() || args.rpm <= 0.0 {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: format!("shake speed {} rpm is out of range", args.rpm),
        });
    }
    finish(errors)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerSetAndWaitForShakeSpeed(args.clone()),
        Some(format!("set_and_wait_for_shake_speed(rpm={})", python::number(args.rpm))),
    ))
}

/// Stop shaking.
pub fn heater_shaker_deactivate_shaker(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    heater_shaker_state(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerDeactivateShaker(args.clone()),
        Some("deactivate_shaker()".into()),
    ))
}

/// Open the labware latch. The module must not be shaking.
pub fn heater_shaker_open_latch(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let hs = heater_shaker_state(ctx, prev, &args.module_id)?;
    if hs.is_shaking() {
        return Err(CommandCreatorError::HeaterShakerIsShaking {
            module: args.module_id.clone(),
        }
        .into());
    }
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerOpenLabwareLatch(args.clone()),
        Some("open_labware_latch()".into()),
    ))
}

/// Close the labware latch.
pub fn heater_shaker_close_latch(
    args: &ModuleParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    heater_shaker_state(ctx, prev, &args.module_id)?;
    Ok(emit(
        ctx,
        &args.module_id,
        Command::HeaterShakerCloseLabwareLatch(args.clone()),
        Some("close_labware_latch()".into()),
    ))
}
