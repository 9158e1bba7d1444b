//! Module and timing steps.
//!
//! Each step compares the requested end state with the module's state in
//! `prev` and emits only the atomic commands needed to get there.

use tipflow_core::{
    BlockTemperatureParams, CommandCreatorError, CommandCreatorResult, EngageMagnetParams,
    ModuleId, ModuleParams, ModuleType, RunProfileParams, ShakeSpeedParams, TemperatureParams,
    WaitForDurationParams, WaitForResumeParams,
};
use tipflow_deck::InvariantContext;
use tipflow_state::selectors::module_state;
use tipflow_state::{ModuleState, RobotState, TemperatureControl};
use tipflow_step::atomic::{self, MoveLabwareArgs};
use tipflow_step::Sequence;
use tracing::{instrument, trace};

use crate::args::{
    HeaterShakerArgs, MagnetStepArgs, MoveLabwareStepArgs, PauseArgs, TemperatureStepArgs,
    ThermocyclerProfileArgs, ThermocyclerStateArgs,
};

fn placed<'s>(
    ctx: &InvariantContext,
    prev: &'s RobotState,
    module: &ModuleId,
) -> Result<&'s ModuleState, CommandCreatorError> {
    ctx.module(module.as_str())
        .and_then(|_| module_state(prev, module.as_str()))
        .ok_or_else(|| CommandCreatorError::MissingModule {
            module: Some(module.clone()),
        })
}

fn wrong_type(module: &ModuleId, expected: ModuleType, state: &ModuleState) -> CommandCreatorError {
    CommandCreatorError::WrongModuleType {
        module: module.clone(),
        expected,
        actual: state.module_type(),
    }
}

fn module_params(module: &ModuleId) -> ModuleParams {
    ModuleParams {
        module_id: module.clone(),
    }
}

fn temperature(module: &ModuleId, celsius: f64) -> TemperatureParams {
    TemperatureParams {
        module_id: module.clone(),
        celsius,
    }
}

/// Whether `control` already heads for `target` (`None` meaning off).
fn settled(control: &TemperatureControl, target: Option<f64>) -> bool {
    match target {
        Some(t) => control.is_active() && control.target == Some(t),
        None => !control.is_active(),
    }
}

// ── Temperature and magnetic modules ───────────────────────────────

/// Set a temperature module's target, or deactivate it.
#[instrument(skip_all, fields(module = %args.module))]
pub fn temperature_step(
    args: &TemperatureStepArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let mut seq = Sequence::new();
    match args.target {
        Some(celsius) => seq.atomic(
            "set_temperature",
            atomic::set_temperature,
            temperature(&args.module, celsius),
        ),
        None => seq.atomic(
            "deactivate_temperature",
            atomic::deactivate_temperature,
            module_params(&args.module),
        ),
    };
    seq.reduce(ctx, prev)
}

/// Engage a magnetic module at a height, or disengage it.
#[instrument(skip_all, fields(module = %args.module))]
pub fn magnet_step(
    args: &MagnetStepArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let mut seq = Sequence::new();
    match args.engage_height {
        Some(height) => seq.atomic(
            "engage_magnet",
            atomic::engage_magnet,
            EngageMagnetParams {
                module_id: args.module.clone(),
                height,
            },
        ),
        None => seq.atomic(
            "disengage_magnet",
            atomic::disengage_magnet,
            module_params(&args.module),
        ),
    };
    seq.reduce(ctx, prev)
}

// ── Thermocycler ───────────────────────────────────────────────────

/// Bring a thermocycler's block, lid heater and lid position to a state.
///
/// Block and lid targets are set and awaited only when they differ from
/// the current target; the lid moves only when its position changes.
#[instrument(skip_all, fields(module = %args.module))]
pub fn thermocycler_state_step(
    args: &ThermocyclerStateArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let state = placed(ctx, prev, &args.module)?;
    let ModuleState::Thermocycler(tc) = state else {
        return Err(wrong_type(&args.module, ModuleType::ThermocyclerModuleType, state).into());
    };
    let module = &args.module;
    let mut seq = Sequence::new();

    if !settled(&tc.block, args.block_target) {
        match args.block_target {
            Some(celsius) => {
                seq.atomic(
                    "thermocycler_set_block_temperature",
                    atomic::thermocycler_set_block_temperature,
                    BlockTemperatureParams {
                        module_id: module.clone(),
                        celsius,
                        block_max_volume_ul: None,
                    },
                )
                .atomic(
                    "thermocycler_wait_for_block_temperature",
                    atomic::thermocycler_wait_for_block_temperature,
                    module_params(module),
                );
            }
            None => {
                seq.atomic(
                    "thermocycler_deactivate_block",
                    atomic::thermocycler_deactivate_block,
                    module_params(module),
                );
            }
        }
    }

    if !settled(&tc.lid, args.lid_target) {
        match args.lid_target {
            Some(celsius) => {
                seq.atomic(
                    "thermocycler_set_lid_temperature",
                    atomic::thermocycler_set_lid_temperature,
                    temperature(module, celsius),
                )
                .atomic(
                    "thermocycler_wait_for_lid_temperature",
                    atomic::thermocycler_wait_for_lid_temperature,
                    module_params(module),
                );
            }
            None => {
                seq.atomic(
                    "thermocycler_deactivate_lid",
                    atomic::thermocycler_deactivate_lid,
                    module_params(module),
                );
            }
        }
    }

    if tc.lid_open != Some(args.lid_open) {
        if args.lid_open {
            seq.atomic(
                "thermocycler_open_lid",
                atomic::thermocycler_open_lid,
                module_params(module),
            );
        } else {
            seq.atomic(
                "thermocycler_close_lid",
                atomic::thermocycler_close_lid,
                module_params(module),
            );
        }
    }

    trace!(creators = seq.len(), "thermocycler state");
    seq.reduce(ctx, prev)
}

/// Run a thermocycler profile with the lid closed, then hold.
#[instrument(skip_all, fields(module = %args.module, steps = args.profile.len()))]
pub fn thermocycler_profile_step(
    args: &ThermocyclerProfileArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let state = placed(ctx, prev, &args.module)?;
    let ModuleState::Thermocycler(tc) = state else {
        return Err(wrong_type(&args.module, ModuleType::ThermocyclerModuleType, state).into());
    };
    let module = &args.module;
    let mut seq = Sequence::new();

    seq.when(tc.lid_open != Some(false), |s| {
        s.atomic(
            "thermocycler_close_lid",
            atomic::thermocycler_close_lid,
            module_params(module),
        );
    });
    if let Some(celsius) = args.lid_target {
        seq.atomic(
            "thermocycler_set_lid_temperature",
            atomic::thermocycler_set_lid_temperature,
            temperature(module, celsius),
        )
        .atomic(
            "thermocycler_wait_for_lid_temperature",
            atomic::thermocycler_wait_for_lid_temperature,
            module_params(module),
        );
    }
    seq.atomic(
        "thermocycler_run_profile",
        atomic::thermocycler_run_profile,
        RunProfileParams {
            module_id: module.clone(),
            profile: args.profile.clone(),
            block_max_volume_ul: args.profile_volume,
        },
    )
    .atomic(
        "thermocycler_await_profile_complete",
        atomic::thermocycler_await_profile_complete,
        module_params(module),
    );

    match args.block_hold {
        Some(celsius) => seq.atomic(
            "thermocycler_set_block_temperature",
            atomic::thermocycler_set_block_temperature,
            BlockTemperatureParams {
                module_id: module.clone(),
                celsius,
                block_max_volume_ul: Some(args.profile_volume),
            },
        ),
        None => seq.atomic(
            "thermocycler_deactivate_block",
            atomic::thermocycler_deactivate_block,
            module_params(module),
        ),
    };
    match args.lid_hold {
        Some(celsius) => seq.atomic(
            "thermocycler_set_lid_temperature",
            atomic::thermocycler_set_lid_temperature,
            temperature(module, celsius),
        ),
        None => seq.atomic(
            "thermocycler_deactivate_lid",
            atomic::thermocycler_deactivate_lid,
            module_params(module),
        ),
    };
    seq.when(args.lid_open_hold, |s| {
        s.atomic(
            "thermocycler_open_lid",
            atomic::thermocycler_open_lid,
            module_params(module),
        );
    });
    seq.reduce(ctx, prev)
}

// ── Heater-shaker ──────────────────────────────────────────────────

/// Drive a heater-shaker to a latch position, temperature and speed,
/// optionally stopping both after a timer.
#[instrument(skip_all, fields(module = %args.module))]
pub fn heater_shaker_step(
    args: &HeaterShakerArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    if args.rpm.is_some() && args.latch_open {
        return Err(CommandCreatorError::InvalidStepArgs {
            reason: "a heater-shaker cannot shake with its latch open".into(),
        }
        .into());
    }
    let state = placed(ctx, prev, &args.module)?;
    let ModuleState::HeaterShaker(hs) = state else {
        return Err(wrong_type(&args.module, ModuleType::HeaterShakerModuleType, state).into());
    };
    let module = &args.module;
    let mut seq = Sequence::new();

    seq.when(hs.is_shaking() && args.rpm.is_none(), |s| {
        s.atomic(
            "heater_shaker_deactivate_shaker",
            atomic::heater_shaker_deactivate_shaker,
            module_params(module),
        );
    });
    if hs.latch_open != Some(args.latch_open) {
        if args.latch_open {
            seq.atomic(
                "heater_shaker_open_latch",
                atomic::heater_shaker_open_latch,
                module_params(module),
            );
        } else {
            seq.atomic(
                "heater_shaker_close_latch",
                atomic::heater_shaker_close_latch,
                module_params(module),
            );
        }
    }
    match args.target_temperature {
        Some(celsius) if !settled(&hs.heater, Some(celsius)) => {
            seq.atomic(
                "heater_shaker_set_temperature",
                atomic::heater_shaker_set_temperature,
                temperature(module, celsius),
            );
        }
        None if hs.heater.is_active() => {
            seq.atomic(
                "heater_shaker_deactivate_heater",
                atomic::heater_shaker_deactivate_heater,
                module_params(module),
            );
        }
        _ => {}
    }
    if let Some(rpm) = args.rpm {
        seq.atomic(
            "heater_shaker_set_shake_speed",
            atomic::heater_shaker_set_shake_speed,
            ShakeSpeedParams {
                module_id: module.clone(),
                rpm,
            },
        );
    }
    if let Some(seconds) = args.timer_seconds {
        seq.atomic(
            "delay",
            atomic::delay,
            WaitForDurationParams {
                seconds,
                message: None,
            },
        )
        .atomic(
            "heater_shaker_deactivate_shaker",
            atomic::heater_shaker_deactivate_shaker,
            module_params(module),
        )
        .atomic(
            "heater_shaker_deactivate_heater",
            atomic::heater_shaker_deactivate_heater,
            module_params(module),
        );
    }
    seq.reduce(ctx, prev)
}

// ── Pause and move ─────────────────────────────────────────────────

/// Pause until resumed, for a time, or until a module reaches a
/// temperature.
#[instrument(skip_all)]
pub fn pause_step(args: &PauseArgs, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    match args {
        PauseArgs::UntilResume { message } => atomic::pause(
            &WaitForResumeParams {
                message: message.clone(),
            },
            ctx,
            prev,
        ),
        PauseArgs::UntilTime { seconds, message } => atomic::delay(
            &WaitForDurationParams {
                seconds: *seconds,
                message: message.clone(),
            },
            ctx,
            prev,
        ),
        PauseArgs::UntilTemperature { module, celsius } => {
            let params = temperature(module, *celsius);
            match placed(ctx, prev, module)? {
                ModuleState::Temperature(_) => atomic::await_temperature(&params, ctx, prev),
                ModuleState::HeaterShaker(_) => {
                    atomic::heater_shaker_await_temperature(&params, ctx, prev)
                }
                other => Err(
                    wrong_type(module, ModuleType::TemperatureModuleType, other).into(),
                ),
            }
        }
    }
}

/// Move a labware to a slot, module, adapter or off the deck.
#[instrument(skip_all, fields(labware = %args.labware))]
pub fn move_labware_step(
    args: &MoveLabwareStepArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    atomic::move_labware(
        &MoveLabwareArgs {
            labware_id: args.labware.clone(),
            new_location: args.new_location.clone(),
            use_gripper: args.use_gripper,
        },
        ctx,
        prev,
    )
}
