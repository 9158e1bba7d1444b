use proptest::prelude::*;
use tipflow_core::{
    AddressableAreaParams, Command, CommandCreatorWarning, InPlaceParams, LiquidHandlingParams,
    LiquidId, LocationLiquidState, ModuleParams, PipetteParams, TemperatureParams, TipParams,
    WellLocation, WellOffset,
};

use super::get_next_robot_state_and_warnings;
use crate::module_state::{ModuleState, TemperatureStatus};
use crate::state::RobotState;
use crate::testing::{context, initial_state};

const EPS: f64 = 1e-9;

fn pick_up(pipette: &str, well: &str) -> Command {
    Command::PickUpTip(TipParams {
        pipette_id: pipette.into(),
        labware_id: "tiprack".into(),
        well_name: well.into(),
    })
}

fn liquid(pipette: &str, labware: &str, well: &str, volume: f64) -> LiquidHandlingParams {
    LiquidHandlingParams {
        pipette_id: pipette.into(),
        volume,
        labware_id: labware.into(),
        well_name: well.into(),
        well_location: WellLocation::bottom(1.0),
        flow_rate: 92.86,
    }
}

fn run(commands: &[Command]) -> (RobotState, Vec<CommandCreatorWarning>) {
    let ctx = context();
    let prev = initial_state(&ctx);
    let out = get_next_robot_state_and_warnings(commands, &ctx, &prev);
    (out.robot_state, out.warnings)
}

fn water() -> LiquidId {
    LiquidId::from("water")
}

#[test]
fn pick_up_tip_single_channel() {
    let (state, warnings) = run(&[pick_up("single", "A1")]);
    assert!(warnings.is_empty());
    assert!(state.pipette_has_tip("single"));
    let rack = &state.tip_state.tipracks["tiprack"];
    assert_eq!(rack.get("A1"), Some(&false));
    assert_eq!(rack.get("B1"), Some(&true));
    assert_eq!(
        state.tip_state.tip_sources.get("single").map(|l| l.as_str()),
        Some("tiprack")
    );
}

#[test]
fn pick_up_tip_eight_channel_takes_column() {
    let (state, _) = run(&[pick_up("multi", "A2")]);
    let rack = &state.tip_state.tipracks["tiprack"];
    for row in ["A", "B", "C", "D", "E", "F", "G", "H"] {
        assert_eq!(rack.get(format!("{row}2").as_str()), Some(&false));
        assert_eq!(rack.get(format!("{row}1").as_str()), Some(&true));
    }
    assert_eq!(state.liquid_state.pipettes["multi"].len(), 8);
}

#[test]
fn aspirate_moves_liquid_into_tip() {
    let (state, warnings) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "plate", "A1", 50.0)),
    ]);
    assert!(warnings.is_empty());
    assert!((state.well_liquid("plate", "A1").volume_of(&water()) - 150.0).abs() < EPS);
    assert!((state.tip_liquid("single", 0).volume_of(&water()) - 50.0).abs() < EPS);
}

#[test]
fn aspirate_from_pristine_well_warns_and_draws_air() {
    let (state, warnings) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "plate", "B1", 30.0)),
    ]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind(), "ASPIRATE_FROM_PRISTINE_WELL");
    assert!((state.tip_liquid("single", 0).volume_of(&LiquidId::air()) - 30.0).abs() < EPS);
}

#[test]
fn aspirate_more_than_contents_warns() {
    let (state, warnings) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "plate", "A1", 250.0)),
    ]);
    match warnings.as_slice() {
        [CommandCreatorWarning::AspirateMoreThanWellContents { labware, well }] => {
            assert_eq!(labware.as_str(), "plate");
            assert_eq!(well.as_str(), "A1");
        }
        other => panic!("expected one AspirateMoreThanWellContents, got {other:?}"),
    }
    let tip = state.tip_liquid("single", 0);
    assert!((tip.volume_of(&water()) - 200.0).abs() < EPS);
    assert!((tip.volume_of(&LiquidId::air()) - 50.0).abs() < EPS);
    assert!(state.well_liquid("plate", "A1").total_volume().abs() < EPS);
}

#[test]
fn multi_channel_in_trough_draws_once_per_tip() {
    let (state, warnings) = run(&[
        pick_up("multi", "A1"),
        Command::Aspirate(liquid("multi", "trough", "A1", 100.0)),
    ]);
    assert!(warnings.is_empty());
    let buffer = LiquidId::from("buffer");
    assert!((state.well_liquid("trough", "A1").volume_of(&buffer) - 9_200.0).abs() < EPS);
    for tip in 0..8 {
        assert!((state.tip_liquid("multi", tip).volume_of(&buffer) - 100.0).abs() < EPS);
    }
}

#[test]
fn multi_channel_shares_shortfall_without_creating_liquid() {
    let ctx = context();
    let mut prev = initial_state(&ctx);
    let buffer = LiquidId::from("buffer");
    prev.liquid_state.labware["trough"].insert(
        "A1".into(),
        LocationLiquidState::single(buffer.clone(), 50.0),
    );
    let out = get_next_robot_state_and_warnings(
        &[
            pick_up("multi", "A1"),
            Command::Aspirate(liquid("multi", "trough", "A1", 10.0)),
        ],
        &ctx,
        &prev,
    );
    let kinds: Vec<_> = out.warnings.iter().map(|w| w.kind()).collect();
    assert_eq!(kinds, vec!["ASPIRATE_MORE_THAN_WELL_CONTENTS"]);

    let state = out.robot_state;
    let in_tips: f64 = (0..8)
        .map(|tip| state.tip_liquid("multi", tip).volume_of(&buffer))
        .sum();
    assert!((in_tips - 50.0).abs() < EPS);
    assert!(state.well_liquid("trough", "A1").volume_of(&buffer).abs() < EPS);
    for tip in 0..8 {
        let contents = state.tip_liquid("multi", tip);
        assert!((contents.volume_of(&buffer) - 6.25).abs() < EPS);
        assert!((contents.volume_of(&LiquidId::air()) - 3.75).abs() < EPS);
    }
}

#[test]
fn drained_well_is_not_pristine() {
    let (state, warnings) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "plate", "A1", 200.0)),
        Command::Aspirate(liquid("single", "plate", "A1", 10.0)),
    ]);
    let kinds: Vec<_> = warnings.iter().map(|w| w.kind()).collect();
    assert_eq!(kinds, vec!["ASPIRATE_MORE_THAN_WELL_CONTENTS"]);
    let tip = state.tip_liquid("single", 0);
    assert!((tip.volume_of(&water()) - 200.0).abs() < EPS);
    assert!((tip.volume_of(&LiquidId::air()) - 10.0).abs() < EPS);
}

#[test]
fn dispense_over_capacity_warns() {
    let (state, warnings) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "trough", "A1", 200.0)),
        Command::Dispense(liquid("single", "plate", "A1", 200.0)),
    ]);
    assert_eq!(
        warnings.iter().map(|w| w.kind()).collect::<Vec<_>>(),
        ["OVER_MAX_WELL_VOLUME"]
    );
    assert!((state.well_liquid("plate", "A1").total_volume() - 400.0).abs() < EPS);
    assert!(state.tip_liquid("single", 0).total_volume().abs() < EPS);
}

#[test]
fn air_gap_then_dispense_keeps_air_out_of_well() {
    let (state, _) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "plate", "A1", 50.0)),
        Command::AirGapInPlace(InPlaceParams {
            pipette_id: "single".into(),
            volume: 10.0,
            flow_rate: 10.0,
        }),
        Command::Dispense(liquid("single", "plate", "A2", 60.0)),
    ]);
    let a2 = state.well_liquid("plate", "A2");
    assert!((a2.volume_of(&water()) - 50.0).abs() < EPS);
    assert_eq!(a2.volume_of(&LiquidId::air()), 0.0);
}

#[test]
fn drop_tip_in_trash_moves_contents() {
    let (state, _) = run(&[
        pick_up("single", "A1"),
        Command::Aspirate(liquid("single", "plate", "A1", 40.0)),
        Command::MoveToAddressableAreaForDropTip(AddressableAreaParams {
            pipette_id: "single".into(),
            addressable_area_name: "fixedTrash".into(),
            offset: WellOffset::default(),
        }),
        Command::DropTipInPlace(PipetteParams {
            pipette_id: "single".into(),
        }),
    ]);
    assert!(!state.pipette_has_tip("single"));
    assert!(state.tip_state.tip_sources.get("single").is_none());
    assert!((state.equipment_liquid("trash").volume_of(&water()) - 40.0).abs() < EPS);
}

#[test]
fn temperature_module_transitions() {
    let set = Command::TemperatureModuleSetTargetTemperature(TemperatureParams {
        module_id: "temp".into(),
        celsius: 4.0,
    });
    let wait = Command::TemperatureModuleWaitForTemperature(TemperatureParams {
        module_id: "temp".into(),
        celsius: 4.0,
    });
    let status = |state: &RobotState| match &state.modules["temp"].state {
        ModuleState::Temperature(t) => t.block.status,
        other => panic!("expected temperature module, got {other:?}"),
    };

    let (state, _) = run(&[set.clone()]);
    assert_eq!(status(&state), TemperatureStatus::ApproachingTarget);
    let (state, _) = run(&[set.clone(), wait]);
    assert_eq!(status(&state), TemperatureStatus::AtTarget);
    let (state, _) = run(&[
        set,
        Command::TemperatureModuleDeactivate(ModuleParams {
            module_id: "temp".into(),
        }),
    ]);
    assert_eq!(status(&state), TemperatureStatus::Deactivated);
}

#[test]
fn reducer_leaves_previous_state_untouched() {
    let ctx = context();
    let prev = initial_state(&ctx);
    let snapshot = prev.clone();
    let _ = get_next_robot_state_and_warnings(
        &[
            pick_up("single", "A1"),
            Command::Aspirate(liquid("single", "plate", "A1", 50.0)),
        ],
        &ctx,
        &prev,
    );
    assert_eq!(prev, snapshot);
}

#[test]
fn unknown_references_are_skipped() {
    let (state, warnings) = run(&[Command::Aspirate(liquid("ghost", "plate", "A1", 10.0))]);
    assert!(warnings.is_empty());
    assert!((state.well_liquid("plate", "A1").total_volume() - 200.0).abs() < EPS);
}

#[test]
fn state_serializes_with_camel_case_keys() {
    let (state, _) = run(&[pick_up("single", "A1")]);
    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value["tipState"]["pipettes"]["single"], true);
    assert_eq!(value["tipState"]["tipracks"]["tiprack"]["A1"], false);
    assert_eq!(value["liquidState"]["labware"]["plate"]["A1"]["water"], 200.0);
}

proptest! {
    #[test]
    fn aspirate_then_dispense_conserves_water(aspirated in 1.0f64..200.0, dispensed_share in 0.0f64..=1.0) {
        let dispensed = aspirated * dispensed_share;
        let (state, _) = run(&[
            pick_up("single", "A1"),
            Command::Aspirate(liquid("single", "plate", "A1", aspirated)),
            Command::Dispense(liquid("single", "plate", "B1", dispensed)),
        ]);
        let total = state.well_liquid("plate", "A1").volume_of(&water())
            + state.well_liquid("plate", "B1").volume_of(&water())
            + state.tip_liquid("single", 0).volume_of(&water());
        prop_assert!((total - 200.0).abs() < 1e-6);
        prop_assert!((state.well_liquid("plate", "B1").volume_of(&water()) - dispensed).abs() < 1e-6);
    }
}
