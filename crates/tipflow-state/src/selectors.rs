//! Read-only queries over the invariant context and a robot state.

use tipflow_core::{DeckSlot, LabwareId, LabwareLocation, ModuleId, Volume, WellName};
use tipflow_deck::{InvariantContext, LabwareEntity, PipetteEntity};

use crate::module_state::ModuleState;
use crate::state::RobotState;

/// Upper bound on labware stacking depth when resolving a slot.
const MAX_STACK_DEPTH: usize = 8;

// ── Deck ───────────────────────────────────────────────────────────

/// Deck slot a labware ultimately occupies, following modules and stacks.
///
/// `None` if the labware is off deck or unplaced.
pub fn labware_slot(state: &RobotState, labware: &str) -> Option<DeckSlot> {
    let mut current = state.labware.get(labware)?;
    for _ in 0..MAX_STACK_DEPTH {
        match current {
            LabwareLocation::Slot(slot) => return Some(slot.clone()),
            LabwareLocation::Module(module) => {
                return state.modules.get(module).map(|m| m.slot.clone())
            }
            LabwareLocation::Labware(below) => current = state.labware.get(below)?,
            LabwareLocation::OffDeck => return None,
        }
    }
    None
}

/// Whether a labware has been moved off deck.
pub fn is_off_deck(state: &RobotState, labware: &str) -> bool {
    let mut current = state.labware.get(labware);
    for _ in 0..MAX_STACK_DEPTH {
        match current {
            Some(LabwareLocation::OffDeck) => return true,
            Some(LabwareLocation::Labware(below)) => current = state.labware.get(below),
            _ => return false,
        }
    }
    false
}

/// Module a labware sits on, directly or through an adapter stack.
pub fn module_under_labware<'s>(state: &'s RobotState, labware: &str) -> Option<&'s ModuleId> {
    let mut current = state.labware.get(labware)?;
    for _ in 0..MAX_STACK_DEPTH {
        match current {
            LabwareLocation::Module(module) => return Some(module),
            LabwareLocation::Labware(below) => current = state.labware.get(below)?,
            LabwareLocation::Slot(_) | LabwareLocation::OffDeck => return None,
        }
    }
    None
}

/// Module occupying a slot.
pub fn module_at_slot<'s>(state: &'s RobotState, slot: &str) -> Option<&'s ModuleId> {
    state
        .modules
        .iter()
        .find(|(_, m)| m.slot.as_str() == slot)
        .map(|(id, _)| id)
}

/// State machine of a module.
pub fn module_state<'s>(state: &'s RobotState, module: &str) -> Option<&'s ModuleState> {
    state.modules.get(module).map(|m| &m.state)
}

/// What occupies a slot directly: a module, a labware placed in the slot,
/// or slot-bound equipment (trash bin, waste chute, staging area).
pub fn slot_occupant(ctx: &InvariantContext, state: &RobotState, slot: &str) -> Option<String> {
    if let Some(module) = module_at_slot(state, slot) {
        return Some(module.to_string());
    }
    if let Some((id, _)) = state
        .labware
        .iter()
        .find(|(_, loc)| matches!(loc, LabwareLocation::Slot(s) if s.as_str() == slot))
    {
        return Some(id.to_string());
    }
    ctx.equipment_entities()
        .find(|e| e.location.as_ref().is_some_and(|s| s.as_str() == slot))
        .map(|e| e.id.to_string())
}

/// Whether anything occupies a slot.
pub fn is_slot_occupied(ctx: &InvariantContext, state: &RobotState, slot: &str) -> bool {
    slot_occupant(ctx, state, slot).is_some()
}

/// Whether a labware location is free to receive another labware.
pub fn is_location_occupied(
    ctx: &InvariantContext,
    state: &RobotState,
    location: &LabwareLocation,
) -> bool {
    match location {
        LabwareLocation::Slot(slot) => is_slot_occupied(ctx, state, slot.as_str()),
        LabwareLocation::Module(module) => state
            .labware
            .values()
            .any(|loc| matches!(loc, LabwareLocation::Module(m) if m == module)),
        LabwareLocation::Labware(below) => state
            .labware
            .values()
            .any(|loc| matches!(loc, LabwareLocation::Labware(l) if l == below)),
        LabwareLocation::OffDeck => false,
    }
}

// ── Tips ───────────────────────────────────────────────────────────

/// A tip (or column, or rack) that can be picked up next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NextTip {
    /// The tiprack.
    pub tiprack: LabwareId,
    /// Well under the primary nozzle.
    pub well: WellName,
}

/// Tipracks available to a pipette, ordered by deck slot.
///
/// Tipracks that are off deck are skipped.
pub fn sorted_tipracks<'c>(
    ctx: &'c InvariantContext,
    state: &RobotState,
    pipette: &'c PipetteEntity,
) -> Vec<&'c LabwareEntity> {
    let robot = ctx.robot_type();
    let mut racks: Vec<(usize, &LabwareEntity)> = ctx
        .tipracks_for(pipette)
        .filter_map(|l| {
            let slot = labware_slot(state, l.id.as_str())?;
            Some((robot.slot_index(slot.as_str()).unwrap_or(usize::MAX), l))
        })
        .collect();
    racks.sort_by_key(|(idx, _)| *idx);
    racks.into_iter().map(|(_, l)| l).collect()
}

/// Next tip for a pipette given its engaged nozzles.
///
/// - one nozzle: the first full well, top-to-bottom then left-to-right
/// - a column of eight: the first column whose every well is full
/// - ninety-six: the first completely full rack
pub fn next_tip(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
    channels: usize,
) -> Option<NextTip> {
    sorted_tipracks(ctx, state, pipette)
        .into_iter()
        .find_map(|rack| next_tip_in_rack(state, rack, channels))
}

fn next_tip_in_rack(state: &RobotState, rack: &LabwareEntity, channels: usize) -> Option<NextTip> {
    let wells = state.tip_state.tipracks.get(&rack.id)?;
    let has_tip = |w: &WellName| wells.get(w).copied().unwrap_or(false);
    let found = match channels {
        1 => rack.def.wells_in_order().find(|w| has_tip(*w)).cloned(),
        96 => {
            if rack.def.wells_in_order().all(has_tip) {
                rack.def.first_well().cloned()
            } else {
                None
            }
        }
        _ => rack
            .def
            .columns()
            .iter()
            .find(|col| !col.is_empty() && col.iter().all(has_tip))
            .and_then(|col| col.first().cloned()),
    };
    found.map(|well| NextTip {
        tiprack: rack.id.clone(),
        well,
    })
}

/// Lesser of the pipette's max volume and a tiprack's tip volume.
pub fn capacity_with_tiprack(
    ctx: &InvariantContext,
    pipette: &PipetteEntity,
    tiprack: &str,
) -> Volume {
    let tip = ctx
        .labware_def(tiprack)
        .and_then(|d| d.tip_volume())
        .unwrap_or(pipette.spec.max_volume);
    pipette.spec.max_volume.min(tip)
}

/// Effective capacity of the pipette's mounted tip, if any.
pub fn mounted_tip_capacity(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
) -> Option<Volume> {
    if !state.pipette_has_tip(pipette.id.as_str()) {
        return None;
    }
    let capacity = match state.tip_state.tip_sources.get(&pipette.id) {
        Some(rack) => capacity_with_tiprack(ctx, pipette, rack.as_str()),
        None => pipette.spec.max_volume,
    };
    Some(capacity)
}

/// Effective capacity of a pipette: its mounted tip if it has one, else
/// the tip it would pick up next, else the pipette's own max volume.
pub fn effective_capacity(
    ctx: &InvariantContext,
    state: &RobotState,
    pipette: &PipetteEntity,
) -> Volume {
    if let Some(mounted) = mounted_tip_capacity(ctx, state, pipette) {
        return mounted;
    }
    let rack = sorted_tipracks(ctx, state, pipette).into_iter().next();
    match rack {
        Some(rack) => capacity_with_tiprack(ctx, pipette, rack.id.as_str()),
        None => pipette.spec.max_volume,
    }
}

/// Number of engaged nozzles on a pipette.
pub fn active_channels(state: &RobotState, pipette: &PipetteEntity) -> usize {
    state
        .nozzles(pipette.id.as_str())
        .active_channels(pipette.spec.channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::get_next_robot_state_and_warnings;
    use crate::testing::{context, initial_state};
    use tipflow_core::{Command, TipParams};

    fn take_tips(state: &RobotState, wells: &[&str]) -> RobotState {
        let mut s = state.clone();
        for w in wells {
            s.tip_state
                .tipracks
                .get_mut("tiprack")
                .unwrap()
                .insert(WellName::from(*w), false);
        }
        s
    }

    #[test]
    fn single_channel_walks_down_columns() {
        let ctx = context();
        let state = take_tips(&initial_state(&ctx), &["A1", "B1"]);
        let p = ctx.pipette("single").unwrap();
        let next = next_tip(&ctx, &state, p, 1).unwrap();
        assert_eq!(next.well.as_str(), "C1");
        assert_eq!(next.tiprack.as_str(), "tiprack");
    }

    #[test]
    fn eight_channel_needs_full_column() {
        let ctx = context();
        let state = take_tips(&initial_state(&ctx), &["H1"]);
        let p = ctx.pipette("multi").unwrap();
        assert_eq!(next_tip(&ctx, &state, p, 8).unwrap().well.as_str(), "A2");
    }

    #[test]
    fn ninety_six_needs_full_rack() {
        let ctx = context();
        let p = ctx.pipette("multi").unwrap();
        let full = initial_state(&ctx);
        assert_eq!(next_tip(&ctx, &full, p, 96).unwrap().well.as_str(), "A1");
        let partial = take_tips(&full, &["D7"]);
        assert!(next_tip(&ctx, &partial, p, 96).is_none());
    }

    #[test]
    fn capacity_is_min_of_pipette_and_tip() {
        let ctx = context();
        let state = initial_state(&ctx);
        let p = ctx.pipette("single").unwrap();
        assert_eq!(effective_capacity(&ctx, &state, p), 300.0);
        assert_eq!(mounted_tip_capacity(&ctx, &state, p), None);

        let next = get_next_robot_state_and_warnings(
            &[Command::PickUpTip(TipParams {
                pipette_id: "single".into(),
                labware_id: "tiprack".into(),
                well_name: "A1".into(),
            })],
            &ctx,
            &state,
        )
        .robot_state;
        assert_eq!(mounted_tip_capacity(&ctx, &next, p), Some(300.0));
    }

    #[test]
    fn slots_resolve_through_modules() {
        let ctx = context();
        let mut state = initial_state(&ctx);
        state
            .labware
            .insert("plate".into(), LabwareLocation::Module("temp".into()));
        assert_eq!(labware_slot(&state, "plate").map(|s| s.0), Some("7".into()));
        assert_eq!(
            module_under_labware(&state, "plate").map(|m| m.as_str()),
            Some("temp")
        );
        assert!(is_slot_occupied(&ctx, &state, "7"));
        assert!(is_slot_occupied(&ctx, &state, "12"));
        assert!(!is_slot_occupied(&ctx, &state, "5"));
    }

    #[test]
    fn off_deck_labware_has_no_slot() {
        let ctx = context();
        let mut state = initial_state(&ctx);
        state.labware.insert("plate".into(), LabwareLocation::OffDeck);
        assert!(is_off_deck(&state, "plate"));
        assert!(labware_slot(&state, "plate").is_none());
    }
}
