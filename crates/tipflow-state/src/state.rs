//! The simulated robot state.
//!
//! [`RobotState`] is a plain value. Reducers and command creators take it
//! by reference and return a new one; nothing mutates a state it did not
//! create, so any prefix of a command list can be re-simulated from a
//! retained state without aliasing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tipflow_core::{
    DeckSlot, EquipmentId, LabwareId, LabwareLocation, LocationLiquidState, ModuleId,
    NozzleConfiguration, PipetteId, TipIndex, WellName,
};
use tipflow_deck::Mount;

use crate::module_state::ModuleState;

/// Per-pipette temporal properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipetteTemporalProperties {
    /// Mount side.
    pub mount: Mount,
    /// Engaged nozzle layout.
    #[serde(default)]
    pub nozzles: NozzleConfiguration,
}

/// Per-module temporal properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleTemporalProperties {
    /// Deck slot the module occupies.
    pub slot: DeckSlot,
    /// Module-specific state machine.
    pub state: ModuleState,
}

/// Tip bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipState {
    /// Tiprack id to well to "has a tip".
    pub tipracks: IndexMap<LabwareId, IndexMap<WellName, bool>>,
    /// Pipette id to "has a tip mounted".
    pub pipettes: IndexMap<PipetteId, bool>,
    /// Tiprack each mounted tip was picked up from.
    pub tip_sources: IndexMap<PipetteId, LabwareId>,
}

/// Liquid bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidState {
    /// Labware id to well to contents.
    pub labware: IndexMap<LabwareId, IndexMap<WellName, LocationLiquidState>>,
    /// Pipette id to tip index to contents.
    pub pipettes: IndexMap<PipetteId, IndexMap<TipIndex, LocationLiquidState>>,
    /// Trash bin or waste chute id to contents.
    pub additional_equipment: IndexMap<EquipmentId, LocationLiquidState>,
}

/// Where a pipette last moved to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PipetteLocation {
    /// Over a labware well.
    #[serde(rename_all = "camelCase")]
    Well {
        /// The labware.
        labware_id: LabwareId,
        /// The well.
        well_name: WellName,
    },
    /// At an addressable area (trash bin, waste chute).
    #[serde(rename_all = "camelCase")]
    AddressableArea {
        /// Area name.
        addressable_area_name: String,
    },
}

/// The full simulated robot state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotState {
    /// Pipette mounts and nozzle layouts.
    pub pipettes: IndexMap<PipetteId, PipetteTemporalProperties>,
    /// Labware locations.
    pub labware: IndexMap<LabwareId, LabwareLocation>,
    /// Module slots and state machines.
    pub modules: IndexMap<ModuleId, ModuleTemporalProperties>,
    /// Tip bookkeeping.
    pub tip_state: TipState,
    /// Liquid bookkeeping.
    pub liquid_state: LiquidState,
    /// Last known pipette positions.
    #[serde(default)]
    pub pipette_locations: IndexMap<PipetteId, PipetteLocation>,
}

impl RobotState {
    /// Whether a pipette currently has a tip.
    pub fn pipette_has_tip(&self, pipette: &str) -> bool {
        self.tip_state.pipettes.get(pipette).copied().unwrap_or(false)
    }

    /// Engaged nozzle layout of a pipette (all nozzles if unknown).
    pub fn nozzles(&self, pipette: &str) -> NozzleConfiguration {
        self.pipettes
            .get(pipette)
            .map(|p| p.nozzles)
            .unwrap_or_default()
    }

    /// Contents of a labware well (empty if untracked).
    pub fn well_liquid(&self, labware: &str, well: &str) -> LocationLiquidState {
        self.liquid_state
            .labware
            .get(labware)
            .and_then(|wells| wells.get(well))
            .cloned()
            .unwrap_or_default()
    }

    /// Contents of one tip of a pipette (empty if untracked).
    pub fn tip_liquid(&self, pipette: &str, tip: TipIndex) -> LocationLiquidState {
        self.liquid_state
            .pipettes
            .get(pipette)
            .and_then(|tips| tips.get(&tip))
            .cloned()
            .unwrap_or_default()
    }

    /// Contents of a trash bin or waste chute (empty if untracked).
    pub fn equipment_liquid(&self, equipment: &str) -> LocationLiquidState {
        self.liquid_state
            .additional_equipment
            .get(equipment)
            .cloned()
            .unwrap_or_default()
    }
}
