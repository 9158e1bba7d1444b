//! End-to-end compilation of JSON protocol documents.

use proptest::prelude::*;
use serde_json::json;

use tipflow_core::{LabwareLocation, LiquidId, ModuleType};
use tipflow_deck::{ModuleEntity, Mount, RobotType};
use tipflow_engine::{
    LabwareConfig, LiquidPlacement, ModuleConfig, PipetteConfig, ProtocolConfig, ProtocolFile,
};
use tipflow_test_utils::command_types;
use tipflow_test_utils::fixtures::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn deck() -> ProtocolConfig {
    let mut config = ProtocolConfig::new(RobotType::Ot2);
    for (uri, def) in [
        (PLATE_96_URI, plate_96()),
        (TIPRACK_300_URI, tiprack_300()),
        (TRASH_URI, trash()),
    ] {
        config.labware_definitions.insert(uri.into(), def);
    }
    config.pipettes.push(PipetteConfig {
        entity: p300_single(),
        mount: Mount::Left,
    });
    config.modules.push(ModuleConfig {
        entity: ModuleEntity {
            id: TEMPERATURE_MODULE.into(),
            module_type: ModuleType::TemperatureModuleType,
            model: "temperatureModuleV2".into(),
            python_name: Some("temperature_module".into()),
        },
        slot: "3".into(),
    });
    for (id, uri, location) in [
        (SOURCE_PLATE, PLATE_96_URI, LabwareLocation::Slot("1".into())),
        (DEST_PLATE, PLATE_96_URI, LabwareLocation::Slot("2".into())),
        (
            TEMPERATURE_PLATE,
            PLATE_96_URI,
            LabwareLocation::Module(TEMPERATURE_MODULE.into()),
        ),
        (TIPRACK_1, TIPRACK_300_URI, LabwareLocation::Slot("7".into())),
        (TRASH, TRASH_URI, LabwareLocation::Slot("12".into())),
    ] {
        config.labware.push(LabwareConfig {
            id: id.into(),
            definition_uri: uri.into(),
            location,
            python_name: None,
        });
    }
    for well in ["A1", "A2"] {
        config.liquids.push(LiquidPlacement {
            labware: SOURCE_PLATE.into(),
            well: well.into(),
            liquid: "buffer".into(),
            volume: 200.0,
        });
    }
    config
}

/// The deck serialized to JSON with `steps` appended at the top level.
fn document(steps: serde_json::Value) -> String {
    let mut value = serde_json::to_value(deck()).unwrap();
    value["steps"] = steps;
    value.to_string()
}

fn transfer(volume: f64, source: &str, dest: &str) -> serde_json::Value {
    json!({
        "stepType": "transfer",
        "pipette": P300_SINGLE,
        "changeTip": "always",
        "dropTipLocation": TRASH,
        "volume": volume,
        "sourceLabware": SOURCE_PLATE,
        "sourceWells": [source],
        "destLabware": TEMPERATURE_PLATE,
        "destWells": [dest],
    })
}

#[test]
fn json_protocol_compiles_to_frames() {
    init_tracing();
    let steps = json!([
        { "stepType": "temperature", "module": TEMPERATURE_MODULE, "target": 4 },
        { "stepType": "pause", "pauseAction": "untilTemperature",
          "module": TEMPERATURE_MODULE, "celsius": 4 },
        transfer(100.0, "A1", "A1"),
        {
            "stepType": "mix",
            "pipette": P300_SINGLE,
            "changeTip": "never",
            "dropTipLocation": TRASH,
            "labware": TEMPERATURE_PLATE,
            "wells": ["A1"],
            "volume": 50,
            "times": 2
        },
        { "stepType": "temperature", "module": TEMPERATURE_MODULE },
    ]);
    let file = ProtocolFile::from_json(&document(steps)).unwrap();
    let timeline = file.compile().unwrap();

    assert!(timeline.is_ok(), "unexpected failure: {:?}", timeline.error);
    let kinds: Vec<_> = timeline.frames.iter().map(|f| f.step_kind).collect();
    assert_eq!(
        kinds,
        vec!["temperature", "pause", "transfer", "mix", "temperature"]
    );
    assert_eq!(
        command_types(&timeline.frames[1].commands),
        vec!["temperatureModule/waitForTemperature"]
    );
    assert_eq!(
        command_types(&timeline.frames[3].commands),
        vec!["aspirate", "dispense", "aspirate", "dispense"]
    );

    let last = timeline.final_state().unwrap();
    let well = last.well_liquid(TEMPERATURE_PLATE, "A1");
    assert!((well.volume_of(&LiquidId::from("buffer")) - 100.0).abs() < 1e-9);
    assert!(last.pipette_has_tip(P300_SINGLE));
}

#[test]
fn failing_step_reports_its_index() {
    init_tracing();
    let steps = json!([
        transfer(100.0, "A1", "A1"),
        { "stepType": "magnet", "module": TEMPERATURE_MODULE, "engageHeight": 10 },
        transfer(50.0, "A2", "A3"),
    ]);
    let timeline = ProtocolFile::from_json(&document(steps))
        .unwrap()
        .compile()
        .unwrap();

    assert_eq!(timeline.frames.len(), 1);
    let failure = timeline.error.as_ref().unwrap();
    assert_eq!(failure.step_index, 1);
    assert_eq!(failure.step_kind, "magnet");
    assert_eq!(failure.errors.kinds(), vec!["WRONG_MODULE_TYPE"]);

    let rendered = serde_json::to_value(&timeline).unwrap();
    assert_eq!(rendered["error"]["stepIndex"], 1);
    assert_eq!(rendered["frames"].as_array().unwrap().len(), 1);
}

#[test]
fn bad_config_is_rejected_before_any_step() {
    let mut value = serde_json::to_value(deck()).unwrap();
    value["labware"][1]["location"] = json!({ "slot": "1" });
    value["steps"] = json!([transfer(10.0, "A1", "A1")]);
    let file = ProtocolFile::from_json(&value.to_string()).unwrap();
    assert!(file.compile().is_err());
}

#[test]
fn malformed_step_is_a_parse_error() {
    let steps = json!([{ "stepType": "transfer", "pipette": P300_SINGLE }]);
    assert!(ProtocolFile::from_json(&document(steps)).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn compilation_is_deterministic(volumes in prop::collection::vec(1.0f64..150.0, 1..5)) {
        let steps: Vec<_> = volumes
            .iter()
            .enumerate()
            .map(|(i, v)| transfer(*v, "A1", ["A1", "A2", "A3", "A4", "A5"][i]))
            .collect();
        let doc = document(serde_json::Value::Array(steps));
        let a = ProtocolFile::from_json(&doc).unwrap().compile().unwrap();
        let b = ProtocolFile::from_json(&doc).unwrap().compile().unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.python(), b.python());
    }
}
