//! Mix: repeated aspirate/dispense cycles in place, well by well.

use tipflow_core::{CommandCreatorError, CommandCreatorResult};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;
use tipflow_step::{python, Sequence};
use tracing::instrument;

use crate::args::{ChangeTip, MixArgs, MixOptions};
use crate::decorators::{self, Side};
use crate::target::{resolve_blowout, Target};
use crate::validate;

/// Compile a mix step.
///
/// Only the `always`, `once` and `never` tip policies apply: there is no
/// source/destination pairing to key the others on.
#[instrument(skip_all, fields(pipette = %args.common.pipette, wells = args.wells.len()))]
pub fn mix(args: &MixArgs, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let pipette = validate::common(ctx, &args.common, &mut errors);
    validate::volume(args.volume, &mut errors);
    if matches!(args.common.change_tip, ChangeTip::PerSource | ChangeTip::PerDest) {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: format!("mix does not support change tip {:?}", args.common.change_tip),
        });
    }
    if args.times == 0 {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: "mix needs at least one cycle".into(),
        });
    }
    if ctx.disposal(args.labware.as_str()).is_some() {
        errors.push(CommandCreatorError::InvalidTrashOrWasteChuteAction {
            action: "mix",
            equipment: args.labware.to_string(),
        });
    } else {
        validate::labware_access(
            ctx,
            prev,
            pipette,
            "mix",
            &args.labware,
            &args.wells,
            &mut errors,
        );
    }
    let Some(pipette) = pipette.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let spec = &pipette.spec;
    let asp = Side::aspirate(spec, args.aspirate_flow_rate, args.offset_from_bottom);
    let disp = Side::dispense(spec, args.dispense_flow_rate, args.offset_from_bottom);
    let blowout_rate = args
        .blowout
        .as_ref()
        .and_then(|b| b.flow_rate)
        .unwrap_or(spec.default_blow_out_flow_rate);
    let options = MixOptions {
        volume: args.volume,
        times: args.times,
    };
    let delays = (args.aspirate_delay_seconds, args.dispense_delay_seconds);
    let pid = &pipette.id;
    let drop = args.common.drop_tip_location.as_str();

    let mut seq = Sequence::new();
    for (i, well) in args.wells.iter().enumerate() {
        let change = match args.common.change_tip {
            ChangeTip::Always => true,
            ChangeTip::Once => i == 0,
            _ => false,
        };
        seq.when(change, |s| {
            decorators::replace(s, pid, drop, args.common.nozzles);
        });
        decorators::mix(&mut seq, pid, &args.labware, well, options, asp, disp, delays);
        if let Some(b) = &args.blowout {
            let here = Target::well(args.labware.clone(), well.clone());
            let target = resolve_blowout(ctx, &b.location, &here, &here)?;
            decorators::blowout(&mut seq, pid, &target, blowout_rate);
        }
        if let Some(touch) = args.touch_tip {
            decorators::touch_tip(&mut seq, pid, &args.labware, well, touch);
        }
    }

    let mut result = seq.reduce(ctx, prev)?;
    if let Some(fragment) = python_mix(ctx, args) {
        result.python = Some(fragment);
    }
    Ok(result)
}

/// One `pipette.mix(...)` call per well when the step is a plain mix with
/// a single tip.
fn python_mix(ctx: &InvariantContext, args: &MixArgs) -> Option<String> {
    let plain = args.aspirate_flow_rate.is_none()
        && args.dispense_flow_rate.is_none()
        && args.aspirate_delay_seconds.is_none()
        && args.dispense_delay_seconds.is_none()
        && args.blowout.is_none()
        && args.touch_tip.is_none()
        && args.common.nozzles.is_none()
        && args.common.change_tip != ChangeTip::Always;
    if !plain {
        return None;
    }
    let pipette = python::pipette(ctx, args.common.pipette.as_str())?;
    let mut lines = Vec::with_capacity(args.wells.len() + 2);
    if args.common.change_tip == ChangeTip::Once {
        lines.push(format!("{pipette}.pick_up_tip()"));
    }
    for well in &args.wells {
        lines.push(format!(
            "{pipette}.mix(repetitions={}, volume={}, location={})",
            args.times,
            python::number(args.volume),
            python::well(ctx, args.labware.as_str(), well.as_str())?
        ));
    }
    if args.common.change_tip == ChangeTip::Once {
        lines.push(format!("{pipette}.drop_tip()"));
    }
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{BlowoutLocation, BlowoutOptions, PipettingArgs, TouchTipOptions};
    use tipflow_core::{Volume, WellName};
    use tipflow_test_utils::fixtures::*;
    use tipflow_test_utils::{command_types, fill_wells, with_tip};

    fn args(volume: Volume, times: u32, wells: &[&str], change_tip: ChangeTip) -> MixArgs {
        MixArgs {
            common: PipettingArgs {
                pipette: P300_SINGLE.into(),
                change_tip,
                drop_tip_location: TRASH.into(),
                nozzles: None,
            },
            labware: DEST_PLATE.into(),
            wells: wells.iter().map(|w| WellName::from(*w)).collect(),
            volume,
            times,
            aspirate_flow_rate: None,
            dispense_flow_rate: None,
            offset_from_bottom: 1.0,
            aspirate_delay_seconds: None,
            dispense_delay_seconds: None,
            blowout: None,
            touch_tip: None,
        }
    }

    fn state() -> (InvariantContext, RobotState) {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        fill_wells(&mut state, DEST_PLATE, &["A1", "A2"], "cells", 200.0);
        (ctx, state)
    }

    #[test]
    fn once_mixes_every_well_with_one_tip() {
        let (ctx, state) = state();
        let out = mix(&args(50.0, 2, &["A1", "A2"], ChangeTip::Once), &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec![
                "pickUpTip",
                "aspirate",
                "dispense",
                "aspirate",
                "dispense",
                "aspirate",
                "dispense",
                "aspirate",
                "dispense",
            ]
        );
    }

    #[test]
    fn always_replaces_per_well() {
        let (ctx, state) = state();
        let out = mix(&args(50.0, 1, &["A1", "A2"], ChangeTip::Always), &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec!["pickUpTip", "aspirate", "dispense", "dropTip", "pickUpTip", "aspirate", "dispense"]
        );
    }

    #[test]
    fn never_uses_the_mounted_tip() {
        let (ctx, mut state) = state();
        with_tip(&mut state, P300_SINGLE);
        let mut a = args(50.0, 1, &["A1"], ChangeTip::Never);
        a.blowout = Some(BlowoutOptions {
            location: BlowoutLocation::DestWell,
            flow_rate: None,
        });
        a.touch_tip = Some(TouchTipOptions { mm_from_top: -2.0 });
        let out = mix(&a, &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec!["aspirate", "dispense", "blowout", "touchTip"]
        );
    }

    #[test]
    fn per_source_is_rejected() {
        let (ctx, state) = state();
        let errors =
            mix(&args(50.0, 1, &["A1"], ChangeTip::PerSource), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_STEP_ARGS"]);
    }

    #[test]
    fn mixing_in_a_trash_bin_is_rejected() {
        let ctx = flex_context();
        let state = flex_initial_state(&ctx);
        let mut a = args(50.0, 1, &["A1"], ChangeTip::Once);
        a.common.pipette = P1000_SINGLE.into();
        a.common.drop_tip_location = TRASH_BIN.into();
        a.labware = TRASH_BIN.into();
        let errors = mix(&a, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_TRASH_OR_WASTE_CHUTE_ACTION"]);
    }

    #[test]
    fn python_for_a_plain_mix() {
        let (ctx, state) = state();
        let out = mix(&args(50.0, 3, &["A1"], ChangeTip::Once), &ctx, &state).unwrap();
        assert_eq!(
            out.python.as_deref(),
            Some(
                "p300_single.pick_up_tip()\np300_single.mix(repetitions=3, volume=50, location=dest_plate[\"A1\"])\np300_single.drop_tip()"
            )
        );
    }
}
