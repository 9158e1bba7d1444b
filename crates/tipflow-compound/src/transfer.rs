//! Transfer: move a volume from each source well to its paired
//! destination well.
//!
//! A pair whose volume exceeds the planning capacity is split into
//! sub-transfers (see [`split_volume`]). Each sub-transfer is one aspirate
//! cycle:
//!
//! ```text
//! [replace tip] [pre-wet] [mix] aspirate [delay] [touch tip] [air gap]
//! dispense [delay] [mix] [touch tip] [blowout] [air gap [drop tip]]
//! ```

use tipflow_core::{CommandCreatorError, CommandCreatorResult, Volume, WellName};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;
use tipflow_step::{python, Sequence};
use tracing::{debug, instrument};

use crate::args::TransferArgs;
use crate::chunking::split_volume;
use crate::decorators::{self, Side};
use crate::target::{resolve_blowout, Target};
use crate::tip_policy::{change_tip_now, will_reuse_tip, TipUse};
use crate::validate;

#[derive(Clone, Debug)]
struct SubTransfer {
    source: WellName,
    dest: Target,
    volume: Volume,
}

/// Compile a transfer step.
#[instrument(skip_all, fields(pipette = %args.common.pipette, pairs = args.source_wells.len()))]
pub fn transfer(args: &TransferArgs, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let pipette = validate::common(ctx, &args.common, &mut errors);
    validate::volume(args.volume, &mut errors);
    if args.source_wells.is_empty() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: "transfer needs at least one source well".into(),
        });
    }
    validate::labware_access(
        ctx,
        prev,
        pipette,
        "aspirate",
        &args.source_labware,
        &args.source_wells,
        &mut errors,
    );
    let to_disposal = validate::destination(
        ctx,
        prev,
        pipette,
        "dispense",
        &args.dest_labware,
        &args.dest_wells,
        &mut errors,
    );
    if to_disposal {
        validate::no_well_actions_at_disposal(
            &args.dest_labware,
            &[
                ("touch tip", args.dispense.touch_tip.is_some()),
                ("mix", args.dispense.mix.is_some()),
                ("air gap", args.dispense.air_gap.is_some()),
            ],
            &mut errors,
        );
    } else if args.dest_wells.len() != args.source_wells.len() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: format!(
                "{} source wells cannot pair with {} destination wells",
                args.source_wells.len(),
                args.dest_wells.len()
            ),
        });
    }
    let Some(pipette) = pipette.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let policy = args.common.change_tip;
    let air_gap = args.aspirate.air_gap_volume();
    let capacity = validate::planning_capacity(ctx, prev, pipette, policy) - air_gap;
    if capacity <= 0.0 {
        return Err(CommandCreatorError::PipetteVolumeExceeded {
            action: "transfer",
            volume: air_gap,
            max_volume: capacity + air_gap,
            disposal_volume: None,
        }
        .into());
    }

    let dests: Vec<Target> = if to_disposal {
        let target = validate::target(ctx, "dispense", &args.dest_labware, None)?;
        vec![target; args.source_wells.len()]
    } else {
        args.dest_wells
            .iter()
            .map(|w| Target::well(args.dest_labware.as_str(), w.clone()))
            .collect()
    };
    let subs: Vec<SubTransfer> = args
        .source_wells
        .iter()
        .zip(dests)
        .flat_map(|(source, dest)| {
            split_volume(args.volume, capacity, pipette.spec.min_volume)
                .into_iter()
                .map(move |volume| SubTransfer {
                    source: source.clone(),
                    dest: dest.clone(),
                    volume,
                })
        })
        .collect();
    debug!(sub_transfers = subs.len(), capacity, "planned transfer");

    let spec = &pipette.spec;
    let asp = Side::aspirate(spec, args.aspirate.flow_rate, args.aspirate.offset_from_bottom);
    let disp = Side::dispense(spec, args.dispense.flow_rate, args.dispense.offset_from_bottom);
    let blowout_rate = args
        .dispense
        .blowout
        .as_ref()
        .and_then(|b| b.flow_rate)
        .unwrap_or(spec.default_blow_out_flow_rate);
    let pid = &pipette.id;
    let src = &args.source_labware;
    let drop = args.common.drop_tip_location.as_str();

    let uses: Vec<TipUse> = subs
        .iter()
        .map(|s| TipUse::new(s.source.clone(), s.dest.well_name()))
        .collect();

    let mut seq = Sequence::new();
    for (i, sub) in subs.iter().enumerate() {
        let change = change_tip_now(policy, i.checked_sub(1).map(|p| &uses[p]), &uses[i]);
        let reuse = will_reuse_tip(policy, &uses[i], uses.get(i + 1));
        let source = Target::well(src.clone(), sub.source.clone());
        let blowout = match &args.dispense.blowout {
            Some(b) => Some(resolve_blowout(ctx, &b.location, &source, &sub.dest)?),
            None => None,
        };

        seq.when(change, |s| {
            decorators::replace(s, pid, drop, args.common.nozzles);
        })
        .when(args.aspirate.pre_wet_tip && (change || i == 0), |s| {
            decorators::pre_wet(s, pid, src, &sub.source, sub.volume, asp, disp);
        })
        .when(args.aspirate.mix.is_some(), |s| {
            if let Some(mix) = args.aspirate.mix {
                decorators::mix(s, pid, src, &sub.source, mix, asp, disp, (None, None));
            }
        });
        decorators::aspirate(&mut seq, pid, src, &sub.source, sub.volume, asp);
        if let Some(delay) = args.aspirate.delay {
            decorators::delay(&mut seq, pid, &source, delay);
        }
        if let Some(touch) = args.aspirate.touch_tip {
            decorators::touch_tip(&mut seq, pid, src, &sub.source, touch);
        }
        if air_gap > 0.0 {
            decorators::air_gap(&mut seq, pid, src, &sub.source, air_gap, asp.flow_rate);
        }

        decorators::dispense(&mut seq, pid, &sub.dest, sub.volume + air_gap, disp);
        if let Some(delay) = args.dispense.delay {
            decorators::delay(&mut seq, pid, &sub.dest, delay);
        }
        if let Target::Well { labware, well } = &sub.dest {
            if let Some(mix) = args.dispense.mix {
                decorators::mix(&mut seq, pid, labware, well, mix, asp, disp, (None, None));
            }
            if let Some(touch) = args.dispense.touch_tip {
                decorators::touch_tip(&mut seq, pid, labware, well, touch);
            }
        }
        if let Some(target) = &blowout {
            decorators::blowout(&mut seq, pid, target, blowout_rate);
        }
        if let (Some(gap), Target::Well { labware, well }) = (args.dispense.air_gap, &sub.dest) {
            decorators::air_gap(&mut seq, pid, labware, well, gap.volume, asp.flow_rate);
            if !reuse {
                decorators::drop_tip(&mut seq, pid, drop);
            }
        }
    }

    let mut result = seq.reduce(ctx, prev)?;
    if let Some(fragment) = python_transfer(ctx, args, to_disposal) {
        result.python = Some(fragment);
    }
    Ok(result)
}

/// A single `pipette.transfer(...)` call, when no option needs the
/// step-by-step rendering.
fn python_transfer(ctx: &InvariantContext, args: &TransferArgs, to_disposal: bool) -> Option<String> {
    if to_disposal
        || args.aspirate.is_advanced()
        || args.dispense.is_advanced()
        || args.common.nozzles.is_some()
    {
        return None;
    }
    let new_tip = args.common.change_tip.python_new_tip()?;
    let pipette = python::pipette(ctx, args.common.pipette.as_str())?;
    let sources: Vec<&str> = args.source_wells.iter().map(|w| w.as_str()).collect();
    let dests: Vec<&str> = args.dest_wells.iter().map(|w| w.as_str()).collect();
    Some(format!(
        "{pipette}.transfer(volume={}, source={}, dest={}, new_tip={})",
        python::number(args.volume),
        python::well_list(ctx, args.source_labware.as_str(), &sources)?,
        python::well_list(ctx, &args.dest_labware, &dests)?,
        python::string(new_tip)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{
        AirGapOptions, AspirateOptions, BlowoutLocation, BlowoutOptions, ChangeTip,
        DispenseOptions, MixOptions, PipettingArgs,
    };
    use tipflow_core::Command;
    use tipflow_test_utils::fixtures::*;
    use tipflow_test_utils::{command_types, fill_wells};

    fn wells(names: &[&str]) -> Vec<WellName> {
        names.iter().map(|w| WellName::from(*w)).collect()
    }

    fn args(volume: Volume, sources: &[&str], dests: &[&str], change_tip: ChangeTip) -> TransferArgs {
        TransferArgs {
            common: PipettingArgs {
                pipette: P300_SINGLE.into(),
                change_tip,
                drop_tip_location: TRASH.into(),
                nozzles: None,
            },
            volume,
            source_labware: SOURCE_PLATE.into(),
            source_wells: wells(sources),
            dest_labware: DEST_PLATE.into(),
            dest_wells: wells(dests),
            aspirate: AspirateOptions::default(),
            dispense: DispenseOptions::default(),
        }
    }

    fn state() -> (InvariantContext, RobotState) {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        fill_wells(&mut state, SOURCE_PLATE, &["A1", "A2", "A3"], "water", 300.0);
        (ctx, state)
    }

    fn pickups(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, Command::PickUpTip(_)))
            .count()
    }

    #[test]
    fn single_pair_once() {
        let (ctx, state) = state();
        let out = transfer(&args(50.0, &["A1"], &["B1"], ChangeTip::Once), &ctx, &state).unwrap();
        assert_eq!(command_types(&out.commands), vec!["pickUpTip", "aspirate", "dispense"]);
        assert_eq!(
            out.python.as_deref(),
            Some(
                "p300_single.transfer(volume=50, source=[source_plate[\"A1\"]], dest=[dest_plate[\"B1\"]], new_tip=\"once\")"
            )
        );
    }

    #[test]
    fn change_tip_policies_count_pickups() {
        let (ctx, state) = state();
        let sources = ["A1", "A1", "A2", "A3"];
        let dests = ["B1", "B2", "B2", "B3"];
        let expected = [
            (ChangeTip::Always, 4),
            (ChangeTip::Once, 1),
            (ChangeTip::PerSource, 3),
            (ChangeTip::PerDest, 3),
        ];
        for (policy, count) in expected {
            let out = transfer(&args(20.0, &sources, &dests, policy), &ctx, &state).unwrap();
            assert_eq!(pickups(&out.commands), count, "{policy:?}");
        }
    }

    #[test]
    fn never_requires_a_mounted_tip() {
        let (ctx, state) = state();
        let errors =
            transfer(&args(50.0, &["A1"], &["B1"], ChangeTip::Never), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["NO_TIP_ON_PIPETTE"]);
    }

    #[test]
    fn large_volume_splits_into_sub_transfers() {
        let (ctx, state) = state();
        let out = transfer(&args(610.0, &["A1"], &["B1"], ChangeTip::Once), &ctx, &state).unwrap();
        let volumes: Vec<Volume> = out
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::Aspirate(p) => Some(p.volume),
                _ => None,
            })
            .collect();
        assert_eq!(volumes, vec![300.0, 155.0, 155.0]);
    }

    #[test]
    fn mismatched_well_lists() {
        let (ctx, state) = state();
        let errors =
            transfer(&args(50.0, &["A1", "A2"], &["B1"], ChangeTip::Once), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_STEP_ARGS"]);
    }

    #[test]
    fn validation_collects_every_problem() {
        let (ctx, state) = state();
        let mut a = args(50.0, &["A1"], &["B1"], ChangeTip::Once);
        a.common.pipette = "ghost".into();
        a.source_labware = "nowhere".into();
        let errors = transfer(&a, &ctx, &state).unwrap_err();
        assert_eq!(
            errors.kinds(),
            vec!["PIPETTE_DOES_NOT_EXIST", "LABWARE_DOES_NOT_EXIST"]
        );
    }

    #[test]
    fn optional_behaviours_in_order() {
        let (ctx, state) = state();
        let mut a = args(50.0, &["A1"], &["B1"], ChangeTip::Once);
        a.aspirate.pre_wet_tip = true;
        a.aspirate.mix = Some(MixOptions {
            volume: 20.0,
            times: 1,
        });
        a.aspirate.air_gap = Some(AirGapOptions { volume: 10.0 });
        a.dispense.blowout = Some(BlowoutOptions {
            location: BlowoutLocation::DestWell,
            flow_rate: None,
        });
        a.dispense.air_gap = Some(AirGapOptions { volume: 5.0 });
        let out = transfer(&a, &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec![
                "pickUpTip",
                "aspirate",
                "dispense",
                "aspirate",
                "dispense",
                "aspirate",
                "moveToWell",
                "airGapInPlace",
                "dispense",
                "blowout",
                "moveToWell",
                "airGapInPlace",
                "dropTip",
            ]
        );
        match &out.commands[8] {
            Command::Dispense(p) => assert_eq!(p.volume, 60.0),
            other => panic!("expected dispense, got {other:?}"),
        }
        assert_ne!(
            out.python.as_deref().map(|p| p.contains(".transfer(")),
            Some(true)
        );
    }

    #[test]
    fn touch_tip_at_waste_chute_is_rejected() {
        let ctx = flex_context();
        let state = flex_initial_state(&ctx);
        let mut a = args(50.0, &["A1"], &[], ChangeTip::Once);
        a.common.pipette = P1000_SINGLE.into();
        a.common.drop_tip_location = TRASH_BIN.into();
        a.dest_labware = WASTE_CHUTE.into();
        a.dispense.touch_tip = Some(crate::args::TouchTipOptions { mm_from_top: -1.0 });
        let errors = transfer(&a, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_TRASH_OR_WASTE_CHUTE_ACTION"]);
    }

    #[test]
    fn dispense_into_waste_chute() {
        let ctx = flex_context();
        let state = flex_initial_state(&ctx);
        let mut a = args(50.0, &["A1"], &[], ChangeTip::Once);
        a.common.pipette = P1000_SINGLE.into();
        a.common.drop_tip_location = TRASH_BIN.into();
        a.dest_labware = WASTE_CHUTE.into();
        let out = transfer(&a, &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec!["pickUpTip", "aspirate", "moveToAddressableArea", "dispenseInPlace"]
        );
    }
}
