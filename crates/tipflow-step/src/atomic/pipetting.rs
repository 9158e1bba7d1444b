//! Aspirate, dispense, air gap, blow-out, touch-tip and move-to-well.

use tipflow_core::{
    BlowoutParams, Command, CommandCreatorResult, CommandCreatorWarning, CommandsAndWarnings,
    InPlaceParams, LabwareId, LiquidHandlingParams, PipetteId, Volume, WellLocation, WellName,
    WellTargetParams,
};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;

use super::{check_volume, check_well, finish, require_labware, require_pipette, require_tip};
use crate::hazards::pipette_access_errors;
use crate::python;

/// Draw liquid from a well.
///
/// Errors: missing pipette or labware, no tip, unknown well, volume over
/// the pipette or else the tip capacity, and every access hazard. Warns
/// when the volume is below the pipette minimum.
pub fn aspirate(
    args: &LiquidHandlingParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "aspirate";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let Some(pipette) = pipette {
        require_tip(
            prev,
            pipette,
            ACTION,
            Some(&args.labware_id),
            Some(&args.well_name),
            &mut errors,
        );
        check_volume(ctx, prev, pipette, ACTION, args.volume, &mut errors);
        if let Some(def) = def {
            check_well(prev, pipette, def, &args.labware_id, &args.well_name, &mut errors);
            errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
        }
    }
    finish(errors)?;

    let mut warnings = Vec::new();
    if let Some(pipette) = pipette {
        if args.volume < pipette.spec.min_volume {
            warnings.push(CommandCreatorWarning::BelowPipetteMinimumVolume {
                pipette: pipette.id.clone(),
                volume: args.volume,
                min_volume: pipette.spec.min_volume,
            });
        }
    }

    let fragment = liquid_fragment(ctx, "aspirate", args, |p| p.default_aspirate_flow_rate);
    Ok(CommandsAndWarnings {
        commands: vec![Command::Aspirate(args.clone())],
        warnings,
        python: fragment,
    })
}

/// Expel liquid into a well.
pub fn dispense(
    args: &LiquidHandlingParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "dispense";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let Some(pipette) = pipette {
        require_tip(
            prev,
            pipette,
            ACTION,
            Some(&args.labware_id),
            Some(&args.well_name),
            &mut errors,
        );
        if let Some(def) = def {
            check_well(prev, pipette, def, &args.labware_id, &args.well_name, &mut errors);
            errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
        }
    }
    finish(errors)?;

    let fragment = liquid_fragment(ctx, "dispense", args, |p| p.default_dispense_flow_rate);
    Ok(CommandsAndWarnings {
        commands: vec![Command::Dispense(args.clone())],
        warnings: Vec::new(),
        python: fragment,
    })
}

fn liquid_fragment(
    ctx: &InvariantContext,
    method: &str,
    args: &LiquidHandlingParams,
    default_rate: impl Fn(&tipflow_deck::PipetteSpec) -> f64,
) -> Option<String> {
    let entity = ctx.pipette(args.pipette_id.as_str())?;
    let pipette = entity.python_name.as_deref()?;
    let location = python::location(
        ctx,
        args.labware_id.as_str(),
        args.well_name.as_str(),
        &args.well_location,
    )?;
    let default = default_rate(&entity.spec);
    let rate = if default > 0.0 { args.flow_rate / default } else { 1.0 };
    Some(format!(
        "{pipette}.{method}(volume={}, location={location}, rate={})",
        python::number(args.volume),
        python::number(rate)
    ))
}

/// Arguments for [`air_gap`].
#[derive(Clone, Debug, PartialEq)]
pub struct AirGapArgs {
    /// Pipette drawing the air.
    pub pipette_id: PipetteId,
    /// Volume of air in µL.
    pub volume: Volume,
    /// Labware the pipette is over.
    pub labware_id: LabwareId,
    /// Well the pipette is over.
    pub well_name: WellName,
    /// Height relative to the well top, in mm.
    pub offset_from_top: f64,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

/// Draw air above a well: move to the well top, then `airGapInPlace`.
pub fn air_gap(args: &AirGapArgs, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    const ACTION: &str = "air gap";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let Some(pipette) = pipette {
        require_tip(
            prev,
            pipette,
            ACTION,
            Some(&args.labware_id),
            Some(&args.well_name),
            &mut errors,
        );
        check_volume(ctx, prev, pipette, ACTION, args.volume, &mut errors);
        if let Some(def) = def {
            check_well(prev, pipette, def, &args.labware_id, &args.well_name, &mut errors);
            errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
        }
    }
    finish(errors)?;

    let fragment = python::pipette(ctx, args.pipette_id.as_str()).map(|p| {
        format!(
            "{p}.air_gap(volume={}, height={})",
            python::number(args.volume),
            python::number(args.offset_from_top)
        )
    });
    Ok(CommandsAndWarnings {
        commands: vec![
            Command::MoveToWell(WellTargetParams {
                pipette_id: args.pipette_id.clone(),
                labware_id: args.labware_id.clone(),
                well_name: args.well_name.clone(),
                well_location: WellLocation::top(args.offset_from_top),
            }),
            Command::AirGapInPlace(InPlaceParams {
                pipette_id: args.pipette_id.clone(),
                volume: args.volume,
                flow_rate: args.flow_rate,
            }),
        ],
        warnings: Vec::new(),
        python: fragment,
    })
}

/// Blow out the tip contents into a well.
pub fn blowout(args: &BlowoutParams, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    const ACTION: &str = "blowout";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let Some(pipette) = pipette {
        require_tip(
            prev,
            pipette,
            ACTION,
            Some(&args.labware_id),
            Some(&args.well_name),
            &mut errors,
        );
        if let Some(def) = def {
            check_well(prev, pipette, def, &args.labware_id, &args.well_name, &mut errors);
            errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
        }
    }
    finish(errors)?;

    let fragment = python::pipette(ctx, args.pipette_id.as_str()).and_then(|p| {
        let location = python::location(
            ctx,
            args.labware_id.as_str(),
            args.well_name.as_str(),
            &args.well_location,
        )?;
        Some(format!("{p}.blow_out(location={location})"))
    });
    Ok(CommandsAndWarnings {
        commands: vec![Command::Blowout(args.clone())],
        warnings: Vec::new(),
        python: fragment,
    })
}

/// Touch the tip against the walls of a well.
pub fn touch_tip(
    args: &WellTargetParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "touch tip";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let Some(pipette) = pipette {
        require_tip(
            prev,
            pipette,
            ACTION,
            Some(&args.labware_id),
            Some(&args.well_name),
            &mut errors,
        );
        if let Some(def) = def {
            check_well(prev, pipette, def, &args.labware_id, &args.well_name, &mut errors);
            errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
        }
    }
    finish(errors)?;

    let fragment = python::pipette(ctx, args.pipette_id.as_str()).and_then(|p| {
        let well = python::well(ctx, args.labware_id.as_str(), args.well_name.as_str())?;
        Some(format!(
            "{p}.touch_tip(location={well}, v_offset={})",
            python::number(args.well_location.offset.z)
        ))
    });
    Ok(CommandsAndWarnings {
        commands: vec![Command::TouchTip(args.clone())],
        warnings: Vec::new(),
        python: fragment,
    })
}

/// Move the pipette to a position in a well. No tip is required.
pub fn move_to_well(
    args: &WellTargetParams,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    const ACTION: &str = "move to well";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let (Some(pipette), Some(def)) = (pipette, def) {
        check_well(prev, pipette, def, &args.labware_id, &args.well_name, &mut errors);
        errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
    }
    finish(errors)?;

    let fragment = python::pipette(ctx, args.pipette_id.as_str()).and_then(|p| {
        let location = python::location(
            ctx,
            args.labware_id.as_str(),
            args.well_name.as_str(),
            &args.well_location,
        )?;
        Some(format!("{p}.move_to({location})"))
    });
    Ok(CommandsAndWarnings {
        commands: vec![Command::MoveToWell(args.clone())],
        warnings: Vec::new(),
        python: fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipflow_core::CommandCreatorError;
    use tipflow_test_utils::fixtures::*;
    use tipflow_test_utils::with_tip;

    fn params(volume: Volume) -> LiquidHandlingParams {
        LiquidHandlingParams {
            pipette_id: P300_SINGLE.into(),
            volume,
            labware_id: SOURCE_PLATE.into(),
            well_name: "A1".into(),
            well_location: WellLocation::bottom(1.0),
            flow_rate: 92.86,
        }
    }

    fn tipped() -> (InvariantContext, RobotState) {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        with_tip(&mut state, P300_SINGLE);
        (ctx, state)
    }

    #[test]
    fn aspirate_emits_one_command() {
        let (ctx, state) = tipped();
        let out = aspirate(&params(50.0), &ctx, &state).unwrap();
        assert_eq!(out.commands, vec![Command::Aspirate(params(50.0))]);
        assert!(out.warnings.is_empty());
        assert_eq!(
            out.python.as_deref(),
            Some("p300_single.aspirate(volume=50, location=source_plate[\"A1\"].bottom(z=1), rate=1)")
        );
    }

    #[test]
    fn aspirate_over_pipette_max_is_one_error() {
        let (ctx, state) = tipped();
        let errors = aspirate(&params(301.0), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["PIPETTE_VOLUME_EXCEEDED"]);
    }

    #[test]
    fn aspirate_collects_every_violation() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let mut args = params(400.0);
        args.well_name = "Z99".into();
        let errors = aspirate(&args, &ctx, &state).unwrap_err();
        assert_eq!(
            errors.kinds(),
            vec!["NO_TIP_ON_PIPETTE", "PIPETTE_VOLUME_EXCEEDED", "WELL_DOES_NOT_EXIST"]
        );
    }

    #[test]
    fn aspirate_missing_pipette_and_labware() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let mut args = params(50.0);
        args.pipette_id = "ghost".into();
        args.labware_id = "nowhere".into();
        let errors = aspirate(&args, &ctx, &state).unwrap_err();
        assert_eq!(
            errors.kinds(),
            vec!["PIPETTE_DOES_NOT_EXIST", "LABWARE_DOES_NOT_EXIST"]
        );
    }

    #[test]
    fn aspirate_below_minimum_warns() {
        let (ctx, state) = tipped();
        let out = aspirate(&params(5.0), &ctx, &state).unwrap();
        match &out.warnings[..] {
            [CommandCreatorWarning::BelowPipetteMinimumVolume { volume, min_volume, .. }] => {
                assert_eq!(*volume, 5.0);
                assert_eq!(*min_volume, 20.0);
            }
            other => panic!("expected BelowPipetteMinimumVolume, got {other:?}"),
        }
    }

    #[test]
    fn dispense_requires_tip() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let errors = dispense(&params(50.0), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["NO_TIP_ON_PIPETTE"]);
    }

    #[test]
    fn air_gap_moves_to_top_then_draws_air() {
        let (ctx, state) = tipped();
        let args = AirGapArgs {
            pipette_id: P300_SINGLE.into(),
            volume: 10.0,
            labware_id: DEST_PLATE.into(),
            well_name: "B1".into(),
            offset_from_top: 1.0,
            flow_rate: 50.0,
        };
        let out = air_gap(&args, &ctx, &state).unwrap();
        match &out.commands[..] {
            [Command::MoveToWell(m), Command::AirGapInPlace(a)] => {
                assert_eq!(m.well_location, WellLocation::top(1.0));
                assert_eq!(a.volume, 10.0);
            }
            other => panic!("expected moveToWell + airGapInPlace, got {other:?}"),
        }
    }

    #[test]
    fn touch_tip_without_tip_names_target() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let args = WellTargetParams {
            pipette_id: P300_SINGLE.into(),
            labware_id: SOURCE_PLATE.into(),
            well_name: "A1".into(),
            well_location: WellLocation::top(-1.0),
        };
        let errors = touch_tip(&args, &ctx, &state).unwrap_err();
        match errors.errors() {
            [CommandCreatorError::NoTipOnPipette {
                pipette,
                labware,
                well,
                ..
            }] => {
                assert_eq!(pipette.as_str(), P300_SINGLE);
                assert_eq!(labware.as_ref().map(|l| l.as_str()), Some(SOURCE_PLATE));
                assert_eq!(well.as_ref().map(|w| w.as_str()), Some("A1"));
            }
            other => panic!("expected one NoTipOnPipette, got {other:?}"),
        }
    }

    #[test]
    fn move_to_well_needs_no_tip() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let args = WellTargetParams {
            pipette_id: P300_SINGLE.into(),
            labware_id: SOURCE_PLATE.into(),
            well_name: "A1".into(),
            well_location: WellLocation::top(0.0),
        };
        assert_eq!(move_to_well(&args, &ctx, &state).unwrap().commands.len(), 1);
    }

    #[test]
    fn blowout_into_closed_thermocycler_fails() {
        let (ctx, state) = tipped();
        let args = BlowoutParams {
            pipette_id: P300_SINGLE.into(),
            labware_id: THERMOCYCLER_PLATE.into(),
            well_name: "A1".into(),
            well_location: WellLocation::top(0.0),
            flow_rate: 92.86,
        };
        let errors = blowout(&args, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["THERMOCYCLER_LID_CLOSED"]);
    }
}
