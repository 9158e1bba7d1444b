//! Test utilities for tipflow development.
//!
//! Provides fixture decks in [`fixtures`] and small helpers for
//! arranging robot state ([`fill_wells`], [`with_tip`]) and inspecting
//! command lists ([`command_types`]).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use tipflow_core::{Command, LiquidId, LocationLiquidState, Volume, WellName};
use tipflow_state::RobotState;

/// Put `volume` µL of `liquid` into each of `wells` of `labware`.
pub fn fill_wells(
    state: &mut RobotState,
    labware: &str,
    wells: &[&str],
    liquid: &str,
    volume: Volume,
) {
    let by_well = state
        .liquid_state
        .labware
        .entry(labware.into())
        .or_default();
    for well in wells {
        by_well
            .entry(WellName::from(*well))
            .or_insert_with(LocationLiquidState::new)
            .add(LiquidId::from(liquid), volume);
    }
}

/// Mark a pipette as carrying a tip, without consuming one from a rack.
pub fn with_tip(state: &mut RobotState, pipette: &str) {
    state.tip_state.pipettes.insert(pipette.into(), true);
}

/// Remove every tip from a tiprack.
pub fn empty_tiprack(state: &mut RobotState, tiprack: &str) {
    if let Some(wells) = state.tip_state.tipracks.get_mut(tiprack) {
        for has_tip in wells.values_mut() {
            *has_tip = false;
        }
    }
}

/// Wire tags of a command list, for compact order assertions.
pub fn command_types(commands: &[Command]) -> Vec<&'static str> {
    commands.iter().map(Command::command_type).collect()
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn ot2_fixture_builds_with_full_tipracks() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        assert_eq!(state.tip_state.tipracks.len(), 2);
        assert!(state
            .tip_state
            .tipracks
            .values()
            .all(|wells| wells.values().all(|t| *t)));
        assert_eq!(state.modules.len(), 4);
    }

    #[test]
    fn flex_fixture_builds() {
        let ctx = flex_context();
        let state = flex_initial_state(&ctx);
        assert!(ctx.has_gripper());
        assert_eq!(state.liquid_state.additional_equipment.len(), 2);
    }

    #[test]
    fn fill_wells_sums_volumes() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        fill_wells(&mut state, SOURCE_PLATE, &["A1", "A2"], "water", 50.0);
        fill_wells(&mut state, SOURCE_PLATE, &["A1"], "water", 25.0);
        assert_eq!(state.well_liquid(SOURCE_PLATE, "A1").total_volume(), 75.0);
        assert_eq!(state.well_liquid(SOURCE_PLATE, "A2").total_volume(), 50.0);
    }

    #[test]
    fn with_tip_marks_pipette() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        assert!(!state.pipette_has_tip(P300_SINGLE));
        with_tip(&mut state, P300_SINGLE);
        assert!(state.pipette_has_tip(P300_SINGLE));
    }
}
