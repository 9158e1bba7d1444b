//! Fixture definitions and decks.
//!
//! Two decks cover most scenarios:
//!
//! - [`ot2_context`]: an OT-2 with two plates, a trough, two 300 µL
//!   tipracks, a trash labware in slot 12, one of each module kind (each
//!   carrying a plate) and P300 single/8-channel pipettes.
//! - [`flex_context`]: a Flex with a trash bin, waste chute, gripper,
//!   1000 µL tipracks and 1/96-channel P1000 pipettes.

use tipflow_core::{LabwareLocation, ModuleType};
use tipflow_deck::{
    AdditionalEquipment, EquipmentKind, InvariantContext, LabwareDefinition, ModuleEntity, Mount,
    PipetteEntity, PipetteGeneration, PipetteSpec, RobotType, WellDefinition, WellShape,
};
use tipflow_state::{InitialStateBuilder, RobotState};

// ── Definition URIs ────────────────────────────────────────────────

pub const PLATE_96_URI: &str = "fixture/fixture_96_plate/1";
pub const TROUGH_12_URI: &str = "fixture/fixture_12_trough/1";
pub const TIPRACK_300_URI: &str = "fixture/fixture_tiprack_300_ul/1";
pub const TIPRACK_1000_URI: &str = "fixture/fixture_tiprack_1000_ul/1";
pub const TRASH_URI: &str = "fixture/fixture_trash/1";

// ── Entity ids ─────────────────────────────────────────────────────

pub const P300_SINGLE: &str = "p300SingleId";
pub const P300_MULTI: &str = "p300MultiId";
pub const P1000_SINGLE: &str = "p1000SingleId";
pub const P1000_96: &str = "p1000_96Id";

pub const SOURCE_PLATE: &str = "sourcePlateId";
pub const DEST_PLATE: &str = "destPlateId";
pub const TROUGH: &str = "troughId";
pub const TIPRACK_1: &str = "tiprack1Id";
pub const TIPRACK_2: &str = "tiprack2Id";
pub const TRASH: &str = "trashId";

pub const TEMPERATURE_MODULE: &str = "temperatureModuleId";
pub const MAGNETIC_MODULE: &str = "magneticModuleId";
pub const THERMOCYCLER: &str = "thermocyclerId";
pub const HEATER_SHAKER: &str = "heaterShakerId";
pub const TEMPERATURE_PLATE: &str = "temperaturePlateId";
pub const MAGNETIC_PLATE: &str = "magneticPlateId";
pub const THERMOCYCLER_PLATE: &str = "thermocyclerPlateId";
pub const HEATER_SHAKER_PLATE: &str = "heaterShakerPlateId";

pub const TRASH_BIN: &str = "trashBinId";
pub const WASTE_CHUTE: &str = "wasteChuteId";
pub const GRIPPER: &str = "gripperId";

// ── Labware definitions ────────────────────────────────────────────

/// 96-well plate, 9 mm pitch, 360 µL round wells.
pub fn plate_96() -> LabwareDefinition {
    LabwareDefinition::grid(
        "Fixture 96 Well Plate",
        8,
        12,
        9.0,
        WellDefinition {
            x: 14.38,
            y: 74.24,
            z: 3.38,
            depth: 10.54,
            total_liquid_volume: 360.0,
            shape: WellShape::Circular { diameter: 6.86 },
        },
    )
}

/// 12-column trough; an 8-channel pipette puts every tip in one column.
pub fn trough_12() -> LabwareDefinition {
    LabwareDefinition::grid(
        "Fixture 12 Trough",
        1,
        12,
        9.0,
        WellDefinition {
            x: 13.94,
            y: 42.78,
            z: 2.29,
            depth: 39.22,
            total_liquid_volume: 22_000.0,
            shape: WellShape::Rectangular {
                x_dimension: 8.33,
                y_dimension: 71.88,
            },
        },
    )
}

fn tiprack(tip_volume: f64) -> LabwareDefinition {
    LabwareDefinition::grid(
        format!("Fixture {tip_volume} µL Tiprack"),
        8,
        12,
        9.0,
        WellDefinition {
            x: 14.38,
            y: 74.38,
            z: 5.39,
            depth: 59.3,
            total_liquid_volume: tip_volume,
            shape: WellShape::Circular { diameter: 5.23 },
        },
    )
    .into_tiprack()
}

/// Tiprack of 300 µL tips.
pub fn tiprack_300() -> LabwareDefinition {
    tiprack(300.0)
}

/// Tiprack of 1000 µL tips.
pub fn tiprack_1000() -> LabwareDefinition {
    tiprack(1000.0)
}

/// Single-well trash labware.
pub fn trash() -> LabwareDefinition {
    LabwareDefinition::grid(
        "Fixture Trash",
        1,
        1,
        9.0,
        WellDefinition {
            x: 82.84,
            y: 80.0,
            z: 5.0,
            depth: 58.0,
            total_liquid_volume: 1_100_000.0,
            shape: WellShape::Rectangular {
                x_dimension: 172.86,
                y_dimension: 165.86,
            },
        },
    )
}

// ── Pipettes ───────────────────────────────────────────────────────

fn pipette(
    id: &str,
    name: &str,
    channels: usize,
    min_volume: f64,
    max_volume: f64,
    generation: PipetteGeneration,
    tiprack_uri: &str,
) -> PipetteEntity {
    PipetteEntity {
        id: id.into(),
        spec: PipetteSpec {
            name: name.into(),
            channels,
            min_volume,
            max_volume,
            generation,
            default_aspirate_flow_rate: 92.86,
            default_dispense_flow_rate: 92.86,
            default_blow_out_flow_rate: 92.86,
        },
        tiprack_def_uris: vec![tiprack_uri.to_string()],
        python_name: Some(name.replace("_gen2", "").replace("_flex", "")),
    }
}

/// P300 single-channel GEN2: 20–300 µL.
pub fn p300_single() -> PipetteEntity {
    pipette(
        P300_SINGLE,
        "p300_single_gen2",
        1,
        20.0,
        300.0,
        PipetteGeneration::Gen2,
        TIPRACK_300_URI,
    )
}

/// P300 8-channel GEN2: 20–300 µL.
pub fn p300_multi() -> PipetteEntity {
    pipette(
        P300_MULTI,
        "p300_multi_gen2",
        8,
        20.0,
        300.0,
        PipetteGeneration::Gen2,
        TIPRACK_300_URI,
    )
}

/// P300 8-channel GEN1, for module collision rules.
pub fn p300_multi_gen1() -> PipetteEntity {
    pipette(
        P300_MULTI,
        "p300_multi",
        8,
        30.0,
        300.0,
        PipetteGeneration::Gen1,
        TIPRACK_300_URI,
    )
}

// ── Decks ──────────────────────────────────────────────────────────

fn module(id: &str, module_type: ModuleType, model: &str) -> ModuleEntity {
    ModuleEntity {
        id: id.into(),
        module_type,
        model: model.into(),
        python_name: Some(python_name(id)),
    }
}

fn python_name(id: &str) -> String {
    let base = id.trim_end_matches("Id");
    let mut out = String::with_capacity(base.len() + 4);
    for c in base.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn ot2_builder(multi: PipetteEntity) -> tipflow_deck::InvariantContextBuilder {
    InvariantContext::builder(RobotType::Ot2)
        .definition(PLATE_96_URI, plate_96())
        .definition(TROUGH_12_URI, trough_12())
        .definition(TIPRACK_300_URI, tiprack_300())
        .definition(TRASH_URI, trash())
        .labware_named(SOURCE_PLATE, PLATE_96_URI, "source_plate")
        .labware_named(DEST_PLATE, PLATE_96_URI, "dest_plate")
        .labware_named(TROUGH, TROUGH_12_URI, "trough")
        .labware_named(TIPRACK_1, TIPRACK_300_URI, "tiprack_1")
        .labware_named(TIPRACK_2, TIPRACK_300_URI, "tiprack_2")
        .labware_named(TRASH, TRASH_URI, "trash")
        .labware(TEMPERATURE_PLATE, PLATE_96_URI)
        .labware(MAGNETIC_PLATE, PLATE_96_URI)
        .labware(THERMOCYCLER_PLATE, PLATE_96_URI)
        .labware(HEATER_SHAKER_PLATE, PLATE_96_URI)
        .pipette(p300_single())
        .pipette(multi)
        .module(module(
            TEMPERATURE_MODULE,
            ModuleType::TemperatureModuleType,
            "temperatureModuleV1",
        ))
        .module(module(
            MAGNETIC_MODULE,
            ModuleType::MagneticModuleType,
            "magneticModuleV2",
        ))
        .module(module(
            THERMOCYCLER,
            ModuleType::ThermocyclerModuleType,
            "thermocyclerModuleV1",
        ))
        .module(module(
            HEATER_SHAKER,
            ModuleType::HeaterShakerModuleType,
            "heaterShakerModuleV1",
        ))
}

/// The standard OT-2 deck.
///
/// ```text
///  10 thermocycler   11 -              12 trash
///   7 tiprack 1       8 tiprack 2       9 -
///   4 magnetic        5 trough          6 heater-shaker
///   1 source plate    2 dest plate      3 temperature
/// ```
pub fn ot2_context() -> InvariantContext {
    ot2_builder(p300_multi())
        .build()
        .expect("fixture context is valid")
}

/// The standard OT-2 deck with a GEN1 8-channel pipette.
pub fn ot2_context_gen1_multi() -> InvariantContext {
    ot2_builder(p300_multi_gen1())
        .build()
        .expect("fixture context is valid")
}

/// Initial state for [`ot2_context`]: full tipracks, no liquid.
pub fn ot2_initial_state(ctx: &InvariantContext) -> RobotState {
    ot2_state_builder(ctx)
        .build()
        .expect("fixture state is valid")
}

/// [`InitialStateBuilder`] pre-populated with the OT-2 fixture placements,
/// for tests that add liquids.
pub fn ot2_state_builder(ctx: &InvariantContext) -> InitialStateBuilder<'_> {
    InitialStateBuilder::new(ctx)
        .pipette(P300_SINGLE, Mount::Left)
        .pipette(P300_MULTI, Mount::Right)
        .module(TEMPERATURE_MODULE, "3")
        .module(MAGNETIC_MODULE, "4")
        .module(HEATER_SHAKER, "6")
        .module(THERMOCYCLER, "10")
        .labware(SOURCE_PLATE, LabwareLocation::Slot("1".into()))
        .labware(DEST_PLATE, LabwareLocation::Slot("2".into()))
        .labware(TROUGH, LabwareLocation::Slot("5".into()))
        .labware(TIPRACK_1, LabwareLocation::Slot("7".into()))
        .labware(TIPRACK_2, LabwareLocation::Slot("8".into()))
        .labware(TRASH, LabwareLocation::Slot("12".into()))
        .labware(
            TEMPERATURE_PLATE,
            LabwareLocation::Module(TEMPERATURE_MODULE.into()),
        )
        .labware(MAGNETIC_PLATE, LabwareLocation::Module(MAGNETIC_MODULE.into()))
        .labware(
            THERMOCYCLER_PLATE,
            LabwareLocation::Module(THERMOCYCLER.into()),
        )
        .labware(
            HEATER_SHAKER_PLATE,
            LabwareLocation::Module(HEATER_SHAKER.into()),
        )
}

/// The standard Flex deck.
///
/// ```text
///  A1 -              A2 -              A3 trash bin
///  B1 tiprack 1      B2 tiprack 2      B3 -
///  C1 source plate   C2 dest plate     C3 -
///  D1 -              D2 -              D3 waste chute
/// ```
pub fn flex_context() -> InvariantContext {
    InvariantContext::builder(RobotType::Flex)
        .definition(PLATE_96_URI, plate_96())
        .definition(TIPRACK_1000_URI, tiprack_1000())
        .labware_named(SOURCE_PLATE, PLATE_96_URI, "source_plate")
        .labware_named(DEST_PLATE, PLATE_96_URI, "dest_plate")
        .labware_named(TIPRACK_1, TIPRACK_1000_URI, "tiprack_1")
        .labware_named(TIPRACK_2, TIPRACK_1000_URI, "tiprack_2")
        .pipette(pipette(
            P1000_SINGLE,
            "p1000_single_flex",
            1,
            5.0,
            1000.0,
            PipetteGeneration::Flex,
            TIPRACK_1000_URI,
        ))
        .pipette(pipette(
            P1000_96,
            "p1000_96",
            96,
            5.0,
            1000.0,
            PipetteGeneration::Flex,
            TIPRACK_1000_URI,
        ))
        .equipment(AdditionalEquipment {
            id: TRASH_BIN.into(),
            kind: EquipmentKind::TrashBin,
            location: Some("A3".into()),
            python_name: Some("trash_bin".into()),
        })
        .equipment(AdditionalEquipment {
            id: WASTE_CHUTE.into(),
            kind: EquipmentKind::WasteChute,
            location: Some("D3".into()),
            python_name: Some("waste_chute".into()),
        })
        .equipment(AdditionalEquipment {
            id: GRIPPER.into(),
            kind: EquipmentKind::Gripper,
            location: None,
            python_name: None,
        })
        .build()
        .expect("fixture context is valid")
}

/// [`InitialStateBuilder`] pre-populated with the Flex fixture placements.
pub fn flex_state_builder(ctx: &InvariantContext) -> InitialStateBuilder<'_> {
    InitialStateBuilder::new(ctx)
        .pipette(P1000_SINGLE, Mount::Left)
        .pipette(P1000_96, Mount::Right)
        .labware(TIPRACK_1, LabwareLocation::Slot("B1".into()))
        .labware(TIPRACK_2, LabwareLocation::Slot("B2".into()))
        .labware(SOURCE_PLATE, LabwareLocation::Slot("C1".into()))
        .labware(DEST_PLATE, LabwareLocation::Slot("C2".into()))
}

/// Initial state for [`flex_context`]: full tipracks, no liquid.
pub fn flex_initial_state(ctx: &InvariantContext) -> RobotState {
    flex_state_builder(ctx)
        .build()
        .expect("fixture state is valid")
}
