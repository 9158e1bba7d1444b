//! Multi-step scenarios: compound creators chained through one sequence,
//! each seeing the state the previous step left.

use tipflow_compound::{
    consolidate, distribute, mix, temperature_step, transfer, AspirateOptions, ChangeTip,
    ConsolidateArgs, DispenseOptions, DistributeArgs, MixArgs, PipettingArgs,
    TemperatureStepArgs, TransferArgs,
};
use tipflow_core::{LiquidId, WellName};
use tipflow_step::Sequence;
use tipflow_test_utils::fixtures::*;
use tipflow_test_utils::{command_types, fill_wells};

const EPS: f64 = 1e-9;

fn common(change_tip: ChangeTip) -> PipettingArgs {
    PipettingArgs {
        pipette: P300_SINGLE.into(),
        change_tip,
        drop_tip_location: TRASH.into(),
        nozzles: None,
    }
}

fn wells(names: &[&str]) -> Vec<WellName> {
    names.iter().map(|w| WellName::from(*w)).collect()
}

#[test]
fn transfer_then_mix_tracks_liquid() {
    let ctx = ot2_context();
    let mut state = ot2_initial_state(&ctx);
    fill_wells(&mut state, SOURCE_PLATE, &["A1"], "dye", 200.0);

    let mut seq = Sequence::new();
    seq.compound(
        "transfer",
        transfer,
        TransferArgs {
            common: common(ChangeTip::Always),
            volume: 100.0,
            source_labware: SOURCE_PLATE.into(),
            source_wells: wells(&["A1"]),
            dest_labware: DEST_PLATE.into(),
            dest_wells: wells(&["A1"]),
            aspirate: AspirateOptions::default(),
            dispense: DispenseOptions::default(),
        },
    )
    .compound(
        "mix",
        mix,
        MixArgs {
            common: common(ChangeTip::Always),
            labware: DEST_PLATE.into(),
            wells: wells(&["A1"]),
            volume: 50.0,
            times: 2,
            aspirate_flow_rate: None,
            dispense_flow_rate: None,
            offset_from_bottom: 1.0,
            aspirate_delay_seconds: None,
            dispense_delay_seconds: None,
            blowout: None,
            touch_tip: None,
        },
    );
    let reduced = seq.reduce_with_state(&ctx, &state).unwrap();
    assert_eq!(
        command_types(&reduced.result.commands),
        vec![
            "pickUpTip",
            "aspirate",
            "dispense",
            "dropTip",
            "pickUpTip",
            "aspirate",
            "dispense",
            "aspirate",
            "dispense",
        ]
    );
    let dye = LiquidId::from("dye");
    let source = reduced.robot_state.well_liquid(SOURCE_PLATE, "A1");
    let dest = reduced.robot_state.well_liquid(DEST_PLATE, "A1");
    assert!((source.volume_of(&dye) - 100.0).abs() < EPS);
    assert!((dest.volume_of(&dye) - 100.0).abs() < EPS);
    assert!(reduced.robot_state.pipette_has_tip(P300_SINGLE));
}

#[test]
fn distribute_then_consolidate_round_trips_volume() {
    let ctx = ot2_context();
    let mut state = ot2_initial_state(&ctx);
    fill_wells(&mut state, SOURCE_PLATE, &["A1"], "buffer", 300.0);

    let mut seq = Sequence::new();
    seq.compound(
        "distribute",
        distribute,
        DistributeArgs {
            common: common(ChangeTip::Once),
            volume: 40.0,
            source_labware: SOURCE_PLATE.into(),
            source_well: "A1".into(),
            dest_labware: DEST_PLATE.into(),
            dest_wells: wells(&["B1", "B2", "B3"]),
            disposal_volume: None,
            aspirate: AspirateOptions::default(),
            dispense: DispenseOptions::default(),
        },
    )
    .compound(
        "consolidate",
        consolidate,
        ConsolidateArgs {
            common: common(ChangeTip::Always),
            volume: 40.0,
            source_labware: DEST_PLATE.into(),
            source_wells: wells(&["B1", "B2", "B3"]),
            dest_labware: SOURCE_PLATE.into(),
            dest_well: Some("H12".into()),
            aspirate: AspirateOptions::default(),
            dispense: DispenseOptions::default(),
        },
    );
    let reduced = seq.reduce_with_state(&ctx, &state).unwrap();
    let buffer = LiquidId::from("buffer");
    let pooled = reduced.robot_state.well_liquid(SOURCE_PLATE, "H12");
    assert!((pooled.volume_of(&buffer) - 120.0).abs() < EPS);
    for well in ["B1", "B2", "B3"] {
        let left = reduced.robot_state.well_liquid(DEST_PLATE, well);
        assert!(left.volume_of(&buffer).abs() < EPS, "{well} not emptied");
    }
}

#[test]
fn failing_step_short_circuits_the_sequence() {
    let ctx = ot2_context();
    let state = ot2_initial_state(&ctx);

    let mut seq = Sequence::new();
    seq.compound(
        "temperature",
        temperature_step,
        TemperatureStepArgs {
            module: TEMPERATURE_MODULE.into(),
            target: Some(4.0),
        },
    )
    .compound(
        "transfer",
        transfer,
        TransferArgs {
            common: common(ChangeTip::Never),
            volume: 10.0,
            source_labware: SOURCE_PLATE.into(),
            source_wells: wells(&["A1"]),
            dest_labware: DEST_PLATE.into(),
            dest_wells: wells(&["A1"]),
            aspirate: AspirateOptions::default(),
            dispense: DispenseOptions::default(),
        },
    );
    let errors = seq.reduce(&ctx, &state).unwrap_err();
    assert_eq!(errors.kinds(), vec!["NO_TIP_ON_PIPETTE"]);
}
