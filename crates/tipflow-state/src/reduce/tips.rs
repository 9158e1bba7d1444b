//! Pick-up and drop-tip updaters.

use indexmap::IndexMap;
use tipflow_core::{merge_liquid, LocationLiquidState, PipetteId, TipParams};
use tipflow_deck::{wells_for_tips, InvariantContext};
use tracing::{trace, warn};

use super::StateUpdate;
use crate::selectors::active_channels;
use crate::state::PipetteLocation;

pub(super) fn pick_up_tip(ctx: &InvariantContext, update: &mut StateUpdate, p: &TipParams) {
    let Some(entity) = ctx.pipette(p.pipette_id.as_str()) else {
        warn!(pipette = %p.pipette_id, "pick up tip with unknown pipette");
        return;
    };
    let channels = active_channels(&update.state, entity);
    let used = ctx
        .labware_def(p.labware_id.as_str())
        .and_then(|def| wells_for_tips(def, p.well_name.as_str(), channels))
        .map(|w| w.into_vec())
        .unwrap_or_else(|| {
            warn!(tiprack = %p.labware_id, well = %p.well_name, "tip wells unresolved, using primary well");
            vec![p.well_name.clone()]
        });

    let rack = update
        .state
        .tip_state
        .tipracks
        .entry(p.labware_id.clone())
        .or_default();
    for well in used {
        rack.insert(well, false);
    }

    let tips = &mut update.state.tip_state;
    tips.pipettes.insert(p.pipette_id.clone(), true);
    tips.tip_sources
        .insert(p.pipette_id.clone(), p.labware_id.clone());
    update.state.liquid_state.pipettes.insert(
        p.pipette_id.clone(),
        (0..channels)
            .map(|i| (i, LocationLiquidState::new()))
            .collect(),
    );
    update.set_location_well(&p.pipette_id, &p.labware_id, &p.well_name);
}

/// Detach the tips and return their combined contents.
fn detach_tips(update: &mut StateUpdate, pipette: &PipetteId) -> LocationLiquidState {
    update.state.tip_state.pipettes.insert(pipette.clone(), false);
    update.state.tip_state.tip_sources.shift_remove(pipette);
    let tips = update
        .state
        .liquid_state
        .pipettes
        .insert(pipette.clone(), IndexMap::new())
        .unwrap_or_default();
    tips.values()
        .fold(LocationLiquidState::new(), |acc, tip| merge_liquid(&acc, &tip.without_air()))
}

pub(super) fn drop_tip(_ctx: &InvariantContext, update: &mut StateUpdate, p: &TipParams) {
    let contents = detach_tips(update, &p.pipette_id);
    let well = update
        .state
        .liquid_state
        .labware
        .entry(p.labware_id.clone())
        .or_default()
        .entry(p.well_name.clone())
        .or_default();
    *well = merge_liquid(well, &contents);
    update.set_location_well(&p.pipette_id, &p.labware_id, &p.well_name);
}

pub(super) fn drop_tip_in_place(ctx: &InvariantContext, update: &mut StateUpdate, pipette: &PipetteId) {
    let contents = detach_tips(update, pipette);
    match update.state.pipette_locations.get(pipette).cloned() {
        Some(PipetteLocation::AddressableArea {
            addressable_area_name,
        }) => match ctx.equipment_for_addressable_area(&addressable_area_name) {
            Some(equipment) => {
                let bin = update
                    .state
                    .liquid_state
                    .additional_equipment
                    .entry(equipment.id.clone())
                    .or_default();
                *bin = merge_liquid(bin, &contents);
            }
            None => trace!(area = %addressable_area_name, "tip dropped into untracked area"),
        },
        Some(PipetteLocation::Well {
            labware_id,
            well_name,
        }) => {
            let well = update
                .state
                .liquid_state
                .labware
                .entry(labware_id)
                .or_default()
                .entry(well_name)
                .or_default();
            *well = merge_liquid(well, &contents);
        }
        None => warn!(%pipette, "drop tip in place before the pipette moved anywhere"),
    }
}
