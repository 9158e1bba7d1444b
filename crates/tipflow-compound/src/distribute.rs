//! Distribute: one source well into many destination wells.
//!
//! Destinations are chunked so one aspirate covers as many as fit. A
//! chunk aspirates `volume * n` plus the disposal volume, dispenses
//! `volume` into each destination, then blows the remainder out.

use tipflow_core::{CommandCreatorError, CommandCreatorResult, CommandCreatorWarning};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;
use tipflow_step::{python, Sequence};
use tracing::{debug, instrument};

use crate::args::{BlowoutLocation, ChangeTip, DistributeArgs};
use crate::chunking::{chunk_count, max_wells_per_chunk};
use crate::decorators::{self, Side};
use crate::target::{resolve_blowout, Target};
use crate::tip_policy::{change_tip_now, will_reuse_tip, TipUse};
use crate::validate;

/// Compile a distribute step.
#[instrument(skip_all, fields(pipette = %args.common.pipette, dests = args.dest_wells.len()))]
pub fn distribute(
    args: &DistributeArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let pipette = validate::common(ctx, &args.common, &mut errors);
    validate::volume(args.volume, &mut errors);
    if args.dest_wells.is_empty() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: "distribute needs at least one destination well".into(),
        });
    }
    let disposal_volume = args.disposal_volume.unwrap_or(0.0);
    if disposal_volume < 0.0 || !disposal_volume.is_finite() {
        errors.push(CommandCreatorError::InvalidStepArgs {
            reason: format!("disposal volume {disposal_volume} must be a non-negative number"),
        });
    }
    validate::labware_access(
        ctx,
        prev,
        pipette,
        "aspirate",
        &args.source_labware,
        std::slice::from_ref(&args.source_well),
        &mut errors,
    );
    validate::labware_access(
        ctx,
        prev,
        pipette,
        "dispense",
        &args.dest_labware,
        &args.dest_wells,
        &mut errors,
    );
    let Some(pipette) = pipette.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let mut warnings = Vec::new();
    if disposal_volume > 0.0 && disposal_volume < pipette.spec.min_volume {
        warnings.push(CommandCreatorWarning::BelowMinDisposalVolume {
            volume: disposal_volume,
            min_volume: pipette.spec.min_volume,
        });
    }

    let policy = args.common.change_tip;
    let air_gap = args.aspirate.air_gap_volume();
    let capacity = validate::planning_capacity(ctx, prev, pipette, policy);
    let per_chunk = max_wells_per_chunk(capacity, air_gap + disposal_volume, args.volume);
    if per_chunk == 0 {
        return Err(CommandCreatorError::PipetteVolumeExceeded {
            action: "distribute",
            volume: args.volume + air_gap,
            max_volume: capacity,
            disposal_volume: Some(disposal_volume),
        }
        .into());
    }
    debug!(
        capacity,
        per_chunk,
        chunks = chunk_count(args.dest_wells.len(), per_chunk),
        "planned distribute"
    );

    let chunks: Vec<_> = args.dest_wells.chunks(per_chunk).collect();
    let uses: Vec<TipUse> = chunks
        .iter()
        .map(|chunk| TipUse::new(args.source_well.clone(), chunk[0].clone()))
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
    let source_well = &args.source_well;
    let source = Target::well(src.clone(), source_well.clone());
    let dst = &args.dest_labware;
    let drop = args.common.drop_tip_location.as_str();

    let mut seq = Sequence::new();
    for (ci, chunk) in chunks.iter().enumerate() {
        let change = change_tip_now(policy, ci.checked_sub(1).map(|p| &uses[p]), &uses[ci]);
        let reuse = will_reuse_tip(policy, &uses[ci], uses.get(ci + 1));
        let disposal = if ci == 0 || policy == ChangeTip::Always {
            disposal_volume
        } else {
            0.0
        };

        seq.when(change, |s| {
            decorators::replace(s, pid, drop, args.common.nozzles);
        })
        .when(args.aspirate.pre_wet_tip && (change || ci == 0), |s| {
            decorators::pre_wet(s, pid, src, source_well, args.volume, asp, disp);
        });
        if let Some(mix) = args.aspirate.mix {
            decorators::mix(&mut seq, pid, src, source_well, mix, asp, disp, (None, None));
        }

        let aspirated = args.volume * chunk.len() as f64 + disposal;
        decorators::aspirate(&mut seq, pid, src, source_well, aspirated, asp);
        if let Some(delay) = args.aspirate.delay {
            decorators::delay(&mut seq, pid, &source, delay);
        }
        if let Some(touch) = args.aspirate.touch_tip {
            decorators::touch_tip(&mut seq, pid, src, source_well, touch);
        }
        if air_gap > 0.0 {
            decorators::air_gap(&mut seq, pid, src, source_well, air_gap, asp.flow_rate);
        }

        for (di, well) in chunk.iter().enumerate() {
            let dest = Target::well(dst.clone(), well.clone());
            let volume = if di == 0 { args.volume + air_gap } else { args.volume };
            decorators::dispense(&mut seq, pid, &dest, volume, disp);
            if let Some(delay) = args.dispense.delay {
                decorators::delay(&mut seq, pid, &dest, delay);
            }
            if let Some(touch) = args.dispense.touch_tip {
                decorators::touch_tip(&mut seq, pid, dst, well, touch);
            }
        }

        let last_well = &chunk[chunk.len() - 1];
        let last = Target::well(dst.clone(), last_well.clone());
        let blowout = match &args.dispense.blowout {
            Some(b) => Some(resolve_blowout(ctx, &b.location, &source, &last)?),
            None if disposal > 0.0 => Some(resolve_blowout(
                ctx,
                &BlowoutLocation::Other(drop.to_string()),
                &source,
                &last,
            )?),
            None => None,
        };
        if let Some(target) = &blowout {
            decorators::blowout(&mut seq, pid, target, blowout_rate);
        }
        if let Some(gap) = args.dispense.air_gap {
            decorators::air_gap(&mut seq, pid, dst, last_well, gap.volume, asp.flow_rate);
            if !reuse {
                decorators::drop_tip(&mut seq, pid, drop);
            }
        }
    }

    let mut result = seq.reduce(ctx, prev)?;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    if let Some(fragment) = python_distribute(ctx, args) {
        result.python = Some(fragment);
    }
    Ok(result)
}

fn python_distribute(ctx: &InvariantContext, args: &DistributeArgs) -> Option<String> {
    if args.aspirate.is_advanced() || args.dispense.is_advanced() || args.common.nozzles.is_some()
    {
        return None;
    }
    let new_tip = args.common.change_tip.python_new_tip()?;
    let pipette = python::pipette(ctx, args.common.pipette.as_str())?;
    let dests: Vec<&str> = args.dest_wells.iter().map(|w| w.as_str()).collect();
    let disposal = match args.disposal_volume {
        Some(v) if v > 0.0 => format!(", disposal_volume={}", python::number(v)),
        _ => String::new(),
    };
    Some(format!(
        "{pipette}.distribute(volume={}, source={}, dest={}{disposal}, new_tip={})",
        python::number(args.volume),
        python::well(ctx, args.source_labware.as_str(), args.source_well.as_str())?,
        python::well_list(ctx, args.dest_labware.as_str(), &dests)?,
        python::string(new_tip)
    ))
}
