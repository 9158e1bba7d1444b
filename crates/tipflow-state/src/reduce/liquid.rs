//! Aspirate, dispense, air gap and blow-out updaters.

use indexmap::IndexMap;
use tipflow_core::{
    merge_liquid, split_liquid, BlowoutParams, CommandCreatorWarning, InPlaceParams, LabwareId,
    LiquidHandlingParams, LiquidId, LocationLiquidState, PipetteId, Volume, WellName,
};
use tipflow_deck::{wells_for_tips, InvariantContext};
use tracing::{trace, warn};

use super::StateUpdate;
use crate::selectors::active_channels;
use crate::state::PipetteLocation;

/// Wells under each engaged tip, or `None` (logged) if unresolvable.
fn tip_wells(
    ctx: &InvariantContext,
    update: &StateUpdate,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
) -> Option<Vec<WellName>> {
    let Some(entity) = ctx.pipette(pipette.as_str()) else {
        warn!(%pipette, "liquid command references unknown pipette");
        return None;
    };
    let Some(def) = ctx.labware_def(labware.as_str()) else {
        warn!(%labware, "liquid command references unknown labware");
        return None;
    };
    let channels = active_channels(&update.state, entity);
    match wells_for_tips(def, well.as_str(), channels) {
        Some(wells) => Some(wells.into_vec()),
        None => {
            warn!(%pipette, %labware, %well, channels, "tips do not map onto wells");
            None
        }
    }
}

fn tips_per_well(wells: &[WellName]) -> IndexMap<WellName, usize> {
    let mut counts = IndexMap::new();
    for w in wells {
        *counts.entry(w.clone()).or_insert(0) += 1;
    }
    counts
}

pub(super) fn aspirate(ctx: &InvariantContext, update: &mut StateUpdate, p: &LiquidHandlingParams) {
    update.set_location_well(&p.pipette_id, &p.labware_id, &p.well_name);
    let Some(wells) = tip_wells(ctx, update, &p.pipette_id, &p.labware_id, &p.well_name) else {
        return;
    };

    let well_states = update
        .state
        .liquid_state
        .labware
        .entry(p.labware_id.clone())
        .or_default();
    let counts = tips_per_well(&wells);
    let before: IndexMap<WellName, LocationLiquidState> = counts
        .keys()
        .map(|w| (w.clone(), well_states.get(w).cloned().unwrap_or_default()))
        .collect();

    // Each well is split once; its drawn portion is shared evenly by the
    // tips over it.
    let mut per_tip: IndexMap<WellName, LocationLiquidState> = IndexMap::new();
    for (w, count) in &counts {
        let contents = before.get(w).cloned().unwrap_or_default();
        let requested = p.volume * *count as f64;
        if contents.is_untouched() {
            update
                .warnings
                .push(CommandCreatorWarning::AspirateFromPristineWell {
                    labware: p.labware_id.clone(),
                    well: w.clone(),
                });
        } else if requested > contents.total_volume() {
            update
                .warnings
                .push(CommandCreatorWarning::AspirateMoreThanWellContents {
                    labware: p.labware_id.clone(),
                    well: w.clone(),
                });
        }
        let split = split_liquid(requested, &contents);
        let share = *count as f64;
        per_tip.insert(
            w.clone(),
            split.dest.iter().map(|(id, v)| (id.clone(), v / share)).collect(),
        );
        well_states.insert(w.clone(), split.source);
    }

    let tips = update
        .state
        .liquid_state
        .pipettes
        .entry(p.pipette_id.clone())
        .or_default();
    for (i, w) in wells.iter().enumerate() {
        let drawn = per_tip.get(w).cloned().unwrap_or_default();
        let tip = tips.entry(i).or_default();
        *tip = merge_liquid(tip, &drawn);
    }
}

pub(super) fn dispense(ctx: &InvariantContext, update: &mut StateUpdate, p: &LiquidHandlingParams) {
    update.set_location_well(&p.pipette_id, &p.labware_id, &p.well_name);
    expel_into_wells(
        ctx,
        update,
        &p.pipette_id,
        &p.labware_id,
        &p.well_name,
        Some(p.volume),
        true,
    );
}

pub(super) fn blowout(ctx: &InvariantContext, update: &mut StateUpdate, p: &BlowoutParams) {
    update.set_location_well(&p.pipette_id, &p.labware_id, &p.well_name);
    expel_into_wells(
        ctx,
        update,
        &p.pipette_id,
        &p.labware_id,
        &p.well_name,
        None,
        false,
    );
}

pub(super) fn air_gap_in_place(ctx: &InvariantContext, update: &mut StateUpdate, p: &InPlaceParams) {
    let Some(entity) = ctx.pipette(p.pipette_id.as_str()) else {
        warn!(pipette = %p.pipette_id, "air gap references unknown pipette");
        return;
    };
    let channels = active_channels(&update.state, entity);
    let tips = update
        .state
        .liquid_state
        .pipettes
        .entry(p.pipette_id.clone())
        .or_default();
    for i in 0..channels {
        tips.entry(i).or_default().add(LiquidId::air(), p.volume);
    }
}

/// Remove `volume` (everything if `None`) from each engaged tip.
fn take_from_tips(
    ctx: &InvariantContext,
    update: &mut StateUpdate,
    pipette: &PipetteId,
    volume: Option<Volume>,
) -> Vec<LocationLiquidState> {
    let channels = ctx
        .pipette(pipette.as_str())
        .map(|e| active_channels(&update.state, e))
        .unwrap_or(1);
    let tips = update
        .state
        .liquid_state
        .pipettes
        .entry(pipette.clone())
        .or_default();
    (0..channels)
        .map(|i| {
            let tip = tips.entry(i).or_default();
            let amount = volume.unwrap_or_else(|| tip.total_volume());
            let split = split_liquid(amount, tip);
            *tip = split.source;
            split.dest
        })
        .collect()
}

pub(super) fn expel_into_wells(
    ctx: &InvariantContext,
    update: &mut StateUpdate,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: Option<Volume>,
    check_overflow: bool,
) {
    let Some(wells) = tip_wells(ctx, update, pipette, labware, well) else {
        return;
    };
    let expelled = take_from_tips(ctx, update, pipette, volume);

    let well_states = update
        .state
        .liquid_state
        .labware
        .entry(labware.clone())
        .or_default();
    for (w, portion) in wells.iter().zip(&expelled) {
        let contents = well_states.entry(w.clone()).or_default();
        *contents = merge_liquid(contents, &portion.without_air());
    }

    if !check_overflow {
        return;
    }
    let Some(def) = ctx.labware_def(labware.as_str()) else {
        return;
    };
    for w in tips_per_well(&wells).keys() {
        let total = well_states.get(w).map(|c| c.total_volume()).unwrap_or(0.0);
        if def.well_max_volume(w.as_str()).is_some_and(|max| total > max) {
            update.warnings.push(CommandCreatorWarning::OverMaxWellVolume {
                labware: labware.clone(),
                well: w.clone(),
            });
        }
    }
}

/// Expel from the tips wherever the pipette last moved to.
pub(super) fn expel_in_place(
    ctx: &InvariantContext,
    update: &mut StateUpdate,
    pipette: &PipetteId,
    volume: Option<Volume>,
) {
    match update.state.pipette_locations.get(pipette).cloned() {
        Some(PipetteLocation::Well {
            labware_id,
            well_name,
        }) => expel_into_wells(ctx, update, pipette, &labware_id, &well_name, volume, false),
        Some(PipetteLocation::AddressableArea {
            addressable_area_name,
        }) => {
            let expelled = take_from_tips(ctx, update, pipette, volume);
            match ctx.equipment_for_addressable_area(&addressable_area_name) {
                Some(equipment) => {
                    let contents = update
                        .state
                        .liquid_state
                        .additional_equipment
                        .entry(equipment.id.clone())
                        .or_default();
                    for portion in &expelled {
                        *contents = merge_liquid(contents, &portion.without_air());
                    }
                }
                None => trace!(area = %addressable_area_name, "expelled into untracked area"),
            }
        }
        None => {
            warn!(%pipette, "in-place command before the pipette moved anywhere");
            take_from_tips(ctx, update, pipette, volume);
        }
    }
}
