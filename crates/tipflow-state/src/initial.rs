//! Construction of the initial robot state.
//!
//! The initial state has every tiprack full, every declared liquid in
//! place, every module deactivated and no pipette carrying a tip.

use indexmap::IndexMap;
use tipflow_core::{
    DeckSlot, LabwareId, LabwareLocation, LiquidId, LocationLiquidState, ModuleId, PipetteId,
    Volume, WellName,
};
use tipflow_deck::{InvariantContext, Mount};

use crate::error::StateError;
use crate::module_state::ModuleState;
use crate::state::{ModuleTemporalProperties, PipetteTemporalProperties, RobotState};

/// Builder for the state a protocol starts from.
///
/// # Examples
///
/// ```
/// use tipflow_deck::{InvariantContext, RobotType};
/// use tipflow_state::InitialStateBuilder;
///
/// let ctx = InvariantContext::builder(RobotType::Ot2).build().unwrap();
/// let state = InitialStateBuilder::new(&ctx).build().unwrap();
/// assert!(state.pipettes.is_empty());
/// ```
#[derive(Debug)]
pub struct InitialStateBuilder<'c> {
    ctx: &'c InvariantContext,
    pipettes: Vec<(PipetteId, Mount)>,
    labware: Vec<(LabwareId, LabwareLocation)>,
    modules: Vec<(ModuleId, DeckSlot)>,
    liquids: Vec<(LabwareId, WellName, LiquidId, Volume)>,
}

impl<'c> InitialStateBuilder<'c> {
    /// Start from an empty deck.
    pub fn new(ctx: &'c InvariantContext) -> Self {
        Self {
            ctx,
            pipettes: Vec::new(),
            labware: Vec::new(),
            modules: Vec::new(),
            liquids: Vec::new(),
        }
    }

    /// Mount a pipette.
    pub fn pipette(mut self, id: impl Into<PipetteId>, mount: Mount) -> Self {
        self.pipettes.push((id.into(), mount));
        self
    }

    /// Place a labware.
    pub fn labware(mut self, id: impl Into<LabwareId>, location: LabwareLocation) -> Self {
        self.labware.push((id.into(), location));
        self
    }

    /// Place a module in a slot.
    pub fn module(mut self, id: impl Into<ModuleId>, slot: impl Into<DeckSlot>) -> Self {
        self.modules.push((id.into(), slot.into()));
        self
    }

    /// Put `volume` µL of `liquid` into a well. Repeated placements sum.
    pub fn liquid(
        mut self,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
        liquid: impl Into<LiquidId>,
        volume: Volume,
    ) -> Self {
        self.liquids
            .push((labware.into(), well.into(), liquid.into(), volume));
        self
    }

    /// Validate placements and produce the state.
    pub fn build(self) -> Result<RobotState, StateError> {
        let ctx = self.ctx;
        let robot = ctx.robot_type();
        let mut state = RobotState::default();

        for (id, mount) in self.pipettes {
            if ctx.pipette(id.as_str()).is_none() {
                return Err(unknown("pipette", &id));
            }
            state.tip_state.pipettes.insert(id.clone(), false);
            state.liquid_state.pipettes.insert(id.clone(), IndexMap::new());
            state.pipettes.insert(
                id,
                PipetteTemporalProperties {
                    mount,
                    nozzles: Default::default(),
                },
            );
        }

        let mut occupied: IndexMap<DeckSlot, String> = IndexMap::new();
        for e in ctx.equipment_entities() {
            if let Some(slot) = &e.location {
                occupied.insert(slot.clone(), e.id.to_string());
            }
        }

        for (id, slot) in self.modules {
            let Some(entity) = ctx.module(id.as_str()) else {
                return Err(unknown("module", &id));
            };
            claim_slot(robot, &mut occupied, &slot, id.as_str())?;
            state.modules.insert(
                id,
                ModuleTemporalProperties {
                    slot,
                    state: ModuleState::initial(entity.module_type),
                },
            );
        }

        for (id, location) in self.labware {
            let Some(entity) = ctx.labware(id.as_str()) else {
                return Err(unknown("labware", &id));
            };
            match &location {
                LabwareLocation::Slot(slot) => claim_slot(robot, &mut occupied, slot, id.as_str())?,
                LabwareLocation::Module(m) if !state.modules.contains_key(m) => {
                    return Err(unknown("module", m))
                }
                _ => {}
            }
            if entity.def.is_tiprack {
                state.tip_state.tipracks.insert(
                    id.clone(),
                    entity.def.wells_in_order().map(|w| (w.clone(), true)).collect(),
                );
            }
            state.liquid_state.labware.insert(id.clone(), IndexMap::new());
            state.labware.insert(id, location);
        }

        for (labware, well, liquid, volume) in self.liquids {
            let Some(def) = ctx.labware_def(labware.as_str()) else {
                return Err(unknown("labware", &labware));
            };
            if !def.has_well(well.as_str()) {
                return Err(StateError::UnknownWell {
                    labware: labware.to_string(),
                    well: well.to_string(),
                });
            }
            if !volume.is_finite() || volume < 0.0 {
                return Err(StateError::InvalidVolume {
                    labware: labware.to_string(),
                    well: well.to_string(),
                    volume,
                });
            }
            state
                .liquid_state
                .labware
                .entry(labware)
                .or_default()
                .entry(well)
                .or_insert_with(LocationLiquidState::new)
                .add(liquid, volume);
        }

        for e in ctx.equipment_entities().filter(|e| e.is_disposal()) {
            state
                .liquid_state
                .additional_equipment
                .insert(e.id.clone(), LocationLiquidState::new());
        }

        Ok(state)
    }
}

fn unknown(kind: &'static str, id: &impl ToString) -> StateError {
    StateError::UnknownEntity {
        kind,
        id: id.to_string(),
    }
}

fn claim_slot(
    robot: tipflow_deck::RobotType,
    occupied: &mut IndexMap<DeckSlot, String>,
    slot: &DeckSlot,
    occupant: &str,
) -> Result<(), StateError> {
    if !robot.has_slot(slot.as_str()) {
        return Err(StateError::UnknownSlot(slot.to_string()));
    }
    if let Some(existing) = occupied.get(slot) {
        return Err(StateError::SlotOccupied {
            slot: slot.to_string(),
            occupant: existing.clone(),
        });
    }
    occupied.insert(slot.clone(), occupant.to_string());
    Ok(())
}
