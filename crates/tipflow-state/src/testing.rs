//! Minimal deck used by this crate's unit tests.

use tipflow_core::{LabwareLocation, ModuleType};
use tipflow_deck::{
    AdditionalEquipment, EquipmentKind, InvariantContext, LabwareDefinition, ModuleEntity, Mount,
    PipetteEntity, PipetteGeneration, PipetteSpec, RobotType, WellDefinition, WellShape,
};

use crate::{InitialStateBuilder, RobotState};

pub(crate) const TIPRACK_URI: &str = "test/tiprack_300/1";

fn well(volume: f64, shape: WellShape) -> WellDefinition {
    WellDefinition {
        x: 14.38,
        y: 74.24,
        z: 1.0,
        depth: 10.0,
        total_liquid_volume: volume,
        shape,
    }
}

fn pipette(id: &str, channels: usize) -> PipetteEntity {
    PipetteEntity {
        id: id.into(),
        spec: PipetteSpec {
            name: format!("p300_{channels}"),
            channels,
            min_volume: 20.0,
            max_volume: 300.0,
            generation: PipetteGeneration::Gen2,
            default_aspirate_flow_rate: 92.86,
            default_dispense_flow_rate: 92.86,
            default_blow_out_flow_rate: 92.86,
        },
        tiprack_def_uris: vec![TIPRACK_URI.to_string()],
        python_name: None,
    }
}

pub(crate) fn context() -> InvariantContext {
    let circular = WellShape::Circular { diameter: 6.86 };
    let trough = WellShape::Rectangular {
        x_dimension: 8.33,
        y_dimension: 71.88,
    };
    InvariantContext::builder(RobotType::Ot2)
        .definition(
            "test/plate_96/1",
            LabwareDefinition::grid("plate", 8, 12, 9.0, well(360.0, circular)),
        )
        .definition(
            TIPRACK_URI,
            LabwareDefinition::grid("tiprack", 8, 12, 9.0, well(300.0, circular)).into_tiprack(),
        )
        .definition(
            "test/trough_12/1",
            LabwareDefinition::grid(
                "trough",
                1,
                12,
                9.0,
                WellDefinition {
                    y: 42.78,
                    ..well(22_000.0, trough)
                },
            ),
        )
        .labware("plate", "test/plate_96/1")
        .labware("tiprack", TIPRACK_URI)
        .labware("trough", "test/trough_12/1")
        .pipette(pipette("single", 1))
        .pipette(pipette("multi", 8))
        .module(ModuleEntity {
            id: "temp".into(),
            module_type: ModuleType::TemperatureModuleType,
            model: "temperatureModuleV2".into(),
            python_name: None,
        })
        .equipment(AdditionalEquipment {
            id: "trash".into(),
            kind: EquipmentKind::TrashBin,
            location: Some("12".into()),
            python_name: None,
        })
        .build()
        .expect("test context is valid")
}

pub(crate) fn initial_state(ctx: &InvariantContext) -> RobotState {
    InitialStateBuilder::new(ctx)
        .pipette("single", Mount::Left)
        .pipette("multi", Mount::Right)
        .labware("plate", LabwareLocation::Slot("1".into()))
        .labware("tiprack", LabwareLocation::Slot("2".into()))
        .labware("trough", LabwareLocation::Slot("3".into()))
        .module("temp", "7")
        .liquid("plate", "A1", "water", 200.0)
        .liquid("trough", "A1", "buffer", 10_000.0)
        .build()
        .expect("test state is valid")
}
