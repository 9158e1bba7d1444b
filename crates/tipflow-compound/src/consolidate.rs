//! Consolidate: pool several source wells into one destination.
//!
//! Source wells are chunked so one tip load never exceeds the planning
//! capacity less any aspirate air gap. Per chunk:
//!
//! ```text
//! [replace tip] [pre-wet] [mix]              first source well only
//! aspirate [delay] [touch tip]               every source well
//! [air gap]                                  after the last source well
//! dispense [delay] [mix] [touch tip] [blowout] [air gap [drop tip]]
//! ```

use tipflow_core::{CommandCreatorError, CommandCreatorResult};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;
use tipflow_step::{python, Sequence};
use tracing::{debug, instrument};

use crate::args::ConsolidateArgs;
use crate::chunking::{chunk_count, max_wells_per_chunk};
use crate::decorators::{self, Side};
use crate::target::{resolve_blowout, Target};
use crate::tip_policy::{change_tip_now, will_reuse_tip, TipUse};
use crate::validate;

/// Compile a consolidate step.
#[instrument(skip_all, fields(pipette = %args.common.pipette, sources = args.source_wells.len()))]
pub fn consolidate(
    args: &ConsolidateArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let pipette = validate::common(ctx, &args.common, &mut errors);
    validate::volume(args.volume, &mut errors);
    if args.source_wells.is_empty() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: "consolidate needs at least one source well".into(),
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
    let dest_wells: Vec<_> = args.dest_well.iter().cloned().collect();
    let to_disposal = validate::destination(
        ctx,
        prev,
        pipette,
        "dispense",
        &args.dest_labware,
        &dest_wells,
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
    } else if args.dest_well.is_none() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: "consolidate into labware needs a destination well".into(),
        });
    }
    let Some(pipette) = pipette.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let policy = args.common.change_tip;
    let air_gap = args.aspirate.air_gap_volume();
    let capacity = validate::planning_capacity(ctx, prev, pipette, policy);
    let per_chunk = max_wells_per_chunk(capacity, air_gap, args.volume);
    if per_chunk == 0 {
        return Err(CommandCreatorError::PipetteVolumeExceeded {
            action: "consolidate",
            volume: args.volume + air_gap,
            max_volume: capacity,
            disposal_volume: None,
        }
        .into());
    }
    debug!(
        capacity,
        per_chunk,
        chunks = chunk_count(args.source_wells.len(), per_chunk),
        "planned consolidate"
    );

    let dest = validate::target(ctx, "dispense", &args.dest_labware, args.dest_well.as_ref())?;
    let chunks: Vec<_> = args.source_wells.chunks(per_chunk).collect();
    let uses: Vec<TipUse> = chunks
        .iter()
        .map(|chunk| TipUse::new(chunk[0].clone(), dest.well_name()))
        .collect();

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

    let mut seq = Sequence::new();
    for (ci, chunk) in chunks.iter().enumerate() {
        let change = change_tip_now(policy, ci.checked_sub(1).map(|p| &uses[p]), &uses[ci]);
        let reuse = will_reuse_tip(policy, &uses[ci], uses.get(ci + 1));
        let first = &chunk[0];

        seq.when(change, |s| {
            decorators::replace(s, pid, drop, args.common.nozzles);
        })
        .when(args.aspirate.pre_wet_tip && (change || ci == 0), |s| {
            decorators::pre_wet(s, pid, src, first, args.volume, asp, disp);
        });
        if let Some(mix) = args.aspirate.mix {
            decorators::mix(&mut seq, pid, src, first, mix, asp, disp, (None, None));
        }

        for well in chunk.iter() {
            decorators::aspirate(&mut seq, pid, src, well, args.volume, asp);
            if let Some(delay) = args.aspirate.delay {
                decorators::delay(&mut seq, pid, &Target::well(src.clone(), well.clone()), delay);
            }
            if let Some(touch) = args.aspirate.touch_tip {
                decorators::touch_tip(&mut seq, pid, src, well, touch);
            }
        }
        let last = &chunk[chunk.len() - 1];
        if air_gap > 0.0 {
            decorators::air_gap(&mut seq, pid, src, last, air_gap, asp.flow_rate);
        }

        let total = args.volume * chunk.len() as f64 + air_gap;
        decorators::dispense(&mut seq, pid, &dest, total, disp);
        if let Some(delay) = args.dispense.delay {
            decorators::delay(&mut seq, pid, &dest, delay);
        }
        if let Target::Well { labware, well } = &dest {
            if let Some(mix) = args.dispense.mix {
                decorators::mix(&mut seq, pid, labware, well, mix, asp, disp, (None, None));
            }
            if let Some(touch) = args.dispense.touch_tip {
                decorators::touch_tip(&mut seq, pid, labware, well, touch);
            }
        }
        if let Some(b) = &args.dispense.blowout {
            let source = Target::well(src.clone(), last.clone());
            let target = resolve_blowout(ctx, &b.location, &source, &dest)?;
            decorators::blowout(&mut seq, pid, &target, blowout_rate);
        }
        if let (Some(gap), Target::Well { labware, well }) = (args.dispense.air_gap, &dest) {
            decorators::air_gap(&mut seq, pid, labware, well, gap.volume, asp.flow_rate);
            if !reuse {
                decorators::drop_tip(&mut seq, pid, drop);
            }
        }
    }

    let mut result = seq.reduce(ctx, prev)?;
    if let Some(fragment) = python_consolidate(ctx, args, to_disposal) {
        result.python = Some(fragment);
    }
    Ok(result)
}

fn python_consolidate(
    ctx: &InvariantContext,
    args: &ConsolidateArgs,
    to_disposal: bool,
) -> Option<String> {
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
    let dest = python::well(ctx, &args.dest_labware, args.dest_well.as_ref()?.as_str())?;
    Some(format!(
        "{pipette}.consolidate(volume={}, source={}, dest={dest}, new_tip={})",
        python::number(args.volume),
        python::well_list(ctx, args.source_labware.as_str(), &sources)?,
        python::string(new_tip)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{AspirateOptions, ChangeTip, DispenseOptions, PipettingArgs};
    use tipflow_core::{Command, Volume, WellName};
    use tipflow_test_utils::fill_wells;
    use tipflow_test_utils::fixtures::*;

    fn args(volume: Volume, sources: &[&str], change_tip: ChangeTip) -> ConsolidateArgs {
        ConsolidateArgs {
            common: PipettingArgs {
                pipette: P300_SINGLE.into(),
                change_tip,
                drop_tip_location: TRASH.into(),
                nozzles: None,
            },
            volume,
            source_labware: SOURCE_PLATE.into(),
            source_wells: sources.iter().map(|w| WellName::from(*w)).collect(),
            dest_labware: SOURCE_PLATE.into(),
            dest_well: Some("B1".into()),
            aspirate: AspirateOptions::default(),
            dispense: DispenseOptions::default(),
        }
    }

    /// `(command, labware, well, volume)` for the liquid and tip commands.
    fn summary(commands: &[Command]) -> Vec<(&'static str, String, String, Option<Volume>)> {
        commands
            .iter()
            .map(|c| match c {
                Command::PickUpTip(p) | Command::DropTip(p) => (
                    c.command_type(),
                    p.labware_id.to_string(),
                    p.well_name.to_string(),
                    None,
                ),
                Command::Aspirate(p) | Command::Dispense(p) => (
                    c.command_type(),
                    p.labware_id.to_string(),
                    p.well_name.to_string(),
                    Some(p.volume),
                ),
                other => panic!("unexpected command {other:?}"),
            })
            .collect()
    }

    fn row(
        kind: &'static str,
        labware: &str,
        well: &str,
        volume: Option<Volume>,
    ) -> (&'static str, String, String, Option<Volume>) {
        (kind, labware.to_string(), well.to_string(), volume)
    }

    #[test]
    fn two_wells_once() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        fill_wells(&mut state, SOURCE_PLATE, &["A1", "A2"], "water", 100.0);
        let out = consolidate(&args(50.0, &["A1", "A2"], ChangeTip::Once), &ctx, &state).unwrap();
        assert_eq!(
            summary(&out.commands),
            vec![
                row("pickUpTip", TIPRACK_1, "A1", None),
                row("aspirate", SOURCE_PLATE, "A1", Some(50.0)),
                row("aspirate", SOURCE_PLATE, "A2", Some(50.0)),
                row("dispense", SOURCE_PLATE, "B1", Some(100.0)),
            ]
        );
        assert_eq!(
            out.python.as_deref(),
            Some(
                "p300_single.consolidate(volume=50, source=[source_plate[\"A1\"], source_plate[\"A2\"]], dest=source_plate[\"B1\"], new_tip=\"once\")"
            )
        );
    }

    #[test]
    fn four_wells_over_capacity_always() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        fill_wells(&mut state, SOURCE_PLATE, &["A1", "A2", "A3", "A4"], "water", 200.0);
        let out = consolidate(
            &args(150.0, &["A1", "A2", "A3", "A4"], ChangeTip::Always),
            &ctx,
            &state,
        )
        .unwrap();
        assert_eq!(
            summary(&out.commands),
            vec![
                row("pickUpTip", TIPRACK_1, "A1", None),
                row("aspirate", SOURCE_PLATE, "A1", Some(150.0)),
                row("aspirate", SOURCE_PLATE, "A2", Some(150.0)),
                row("dispense", SOURCE_PLATE, "B1", Some(300.0)),
                row("dropTip", TRASH, "A1", None),
                row("pickUpTip", TIPRACK_1, "B1", None),
                row("aspirate", SOURCE_PLATE, "A3", Some(150.0)),
                row("aspirate", SOURCE_PLATE, "A4", Some(150.0)),
                row("dispense", SOURCE_PLATE, "B1", Some(300.0)),
            ]
        );
    }

    #[test]
    fn chunk_cycles_match_capacity() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let sources = ["A1", "A2", "A3", "A4", "A5", "A6", "A7"];
        let out = consolidate(&args(100.0, &sources, ChangeTip::Always), &ctx, &state).unwrap();
        let dispenses: Vec<Volume> = out
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::Dispense(p) => Some(p.volume),
                _ => None,
            })
            .collect();
        assert_eq!(dispenses, vec![300.0, 300.0, 100.0]);
    }

    #[test]
    fn volume_over_capacity_is_an_error() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let errors =
            consolidate(&args(350.0, &["A1"], ChangeTip::Once), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["PIPETTE_VOLUME_EXCEEDED"]);
    }

    #[test]
    fn missing_destination_well() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let mut a = args(50.0, &["A1"], ChangeTip::Once);
        a.dest_well = None;
        let errors = consolidate(&a, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_STEP_ARGS"]);
    }
}
