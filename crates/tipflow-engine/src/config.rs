//! Protocol configuration, validation, and error types.
//!
//! [`ProtocolConfig`] is the serializable description of a deck before any
//! step runs: robot type, labware definitions keyed by URI, pipettes,
//! labware instances, modules, additional equipment and starting liquids.
//! [`validate()`](ProtocolConfig::validate) checks cross-references up
//! front so a bad config is reported once, with the offending id, instead
//! of surfacing as a compile error on some later step.
//! [`build()`](ProtocolConfig::build) produces the invariant context and
//! the initial robot state.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tipflow_core::{DeckSlot, LabwareId, LabwareLocation, LiquidId, Volume, WellName};
use tipflow_deck::{
    AdditionalEquipment, DeckError, InvariantContext, LabwareDefinition, ModuleEntity, Mount,
    PipetteEntity, RobotType,
};
use tipflow_state::{InitialStateBuilder, RobotState, StateError};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while loading, validating or building a
/// [`ProtocolConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("protocol config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Invariant context construction failed.
    #[error("deck: {0}")]
    Deck(#[from] DeckError),
    /// Initial state construction failed.
    #[error("initial state: {0}")]
    State(#[from] StateError),
    /// Two entities of one kind share an id.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Entity kind.
        kind: &'static str,
        /// The repeated id.
        id: String,
    },
    /// A pipette's volume range is empty or not finite.
    #[error("pipette '{id}' has min volume {min} above max volume {max}")]
    InvalidVolumeRange {
        /// The pipette.
        id: String,
        /// Configured minimum.
        min: Volume,
        /// Configured maximum.
        max: Volume,
    },
    /// A labware definition URI was referenced but never registered.
    #[error("{referenced_by} references unregistered definition '{uri}'")]
    UnknownDefinition {
        /// The missing URI.
        uri: String,
        /// What referenced it.
        referenced_by: String,
    },
    /// A location names a slot the robot does not have.
    #[error("'{occupant}' is placed in slot '{slot}', which does not exist on this robot")]
    UnknownSlot {
        /// The slot.
        slot: String,
        /// What was placed there.
        occupant: String,
    },
    /// Two things claim one deck slot.
    #[error("slot '{slot}' is claimed by both '{first}' and '{second}'")]
    SlotConflict {
        /// The slot.
        slot: String,
        /// The earlier occupant.
        first: String,
        /// The later occupant.
        second: String,
    },
    /// A reference names an entity the config does not declare.
    #[error("{referenced_by} references unknown {kind} '{id}'")]
    UnknownReference {
        /// Entity kind.
        kind: &'static str,
        /// The unresolved id.
        id: String,
        /// What referenced it.
        referenced_by: String,
    },
    /// A liquid is placed in a well its labware does not have.
    #[error("labware '{labware}' has no well '{well}'")]
    UnknownWell {
        /// The labware.
        labware: String,
        /// The missing well.
        well: String,
    },
    /// A liquid placement has a negative or non-finite volume, or
    /// overfills its well.
    #[error("invalid volume {volume} µL for {labware} {well}")]
    InvalidLiquidVolume {
        /// The labware.
        labware: String,
        /// The well.
        well: String,
        /// Total volume placed.
        volume: Volume,
    },
}

// ── Config records ─────────────────────────────────────────────────

/// A pipette entity and the mount it starts on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipetteConfig {
    /// The pipette.
    #[serde(flatten)]
    pub entity: PipetteEntity,
    /// Mount.
    pub mount: Mount,
}

/// A labware instance: which definition, and where it starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareConfig {
    /// Instance id.
    pub id: LabwareId,
    /// URI of a definition in [`ProtocolConfig::labware_definitions`].
    pub definition_uri: String,
    /// Starting location.
    pub location: LabwareLocation,
    /// Variable name in generated Python source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_name: Option<String>,
}

/// A module entity and its deck slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    /// The module.
    #[serde(flatten)]
    pub entity: ModuleEntity,
    /// Deck slot.
    pub slot: DeckSlot,
}

/// Liquid present in a well before the first step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidPlacement {
    /// The labware.
    pub labware: LabwareId,
    /// The well.
    pub well: WellName,
    /// Which liquid.
    pub liquid: LiquidId,
    /// Volume in µL.
    pub volume: Volume,
}

// ── ProtocolConfig ─────────────────────────────────────────────────

/// Everything needed to start compiling a protocol.
///
/// # Examples
///
/// ```
/// use tipflow_engine::ProtocolConfig;
///
/// let config = ProtocolConfig::from_json(r#"{ "robotType": "OT-2 Standard" }"#).unwrap();
/// let (ctx, state) = config.build().unwrap();
/// assert_eq!(ctx.pipettes().count(), 0);
/// assert!(state.labware.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConfig {
    /// Target robot.
    pub robot_type: RobotType,
    /// Labware definitions keyed by URI.
    #[serde(default)]
    pub labware_definitions: IndexMap<String, LabwareDefinition>,
    /// Pipettes.
    #[serde(default)]
    pub pipettes: Vec<PipetteConfig>,
    /// Labware instances, placed in order.
    #[serde(default)]
    pub labware: Vec<LabwareConfig>,
    /// Modules.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    /// Trash bins, waste chutes, staging areas and the gripper.
    #[serde(default)]
    pub additional_equipment: Vec<AdditionalEquipment>,
    /// Starting liquids.
    #[serde(default)]
    pub liquids: Vec<LiquidPlacement>,
}

impl ProtocolConfig {
    /// An empty deck for `robot_type`.
    pub fn new(robot_type: RobotType) -> Self {
        Self {
            robot_type,
            labware_definitions: IndexMap::new(),
            pipettes: Vec::new(),
            labware: Vec::new(),
            modules: Vec::new(),
            additional_equipment: Vec::new(),
            liquids: Vec::new(),
        }
    }

    /// Parse a config from JSON. Does not validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate all cross-references and placements.
    ///
    /// Definition well geometry and pipette channel counts are checked by
    /// [`build()`](Self::build) through the context builder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Ids are unique per kind.
        unique("pipette", self.pipettes.iter().map(|p| p.entity.id.as_str()))?;
        unique("labware", self.labware.iter().map(|l| l.id.as_str()))?;
        unique("module", self.modules.iter().map(|m| m.entity.id.as_str()))?;
        unique(
            "equipment",
            self.additional_equipment.iter().map(|e| e.id.as_str()),
        )?;

        // 2. Pipette volume ranges and tiprack definitions.
        for p in &self.pipettes {
            let spec = &p.entity.spec;
            let range_ok = spec.min_volume.is_finite()
                && spec.max_volume.is_finite()
                && spec.min_volume >= 0.0
                && spec.min_volume <= spec.max_volume;
            if !range_ok {
                return Err(ConfigError::InvalidVolumeRange {
                    id: p.entity.id.to_string(),
                    min: spec.min_volume,
                    max: spec.max_volume,
                });
            }
            for uri in &p.entity.tiprack_def_uris {
                self.definition(uri, || format!("pipette '{}'", p.entity.id))?;
            }
        }

        // 3. Slot claims: equipment, then modules, then labware.
        let mut claims: IndexMap<&str, &str> = IndexMap::new();
        for e in &self.additional_equipment {
            if let Some(slot) = &e.location {
                self.claim(&mut claims, slot.as_str(), e.id.as_str())?;
            }
        }
        for m in &self.modules {
            self.claim(&mut claims, m.slot.as_str(), m.entity.id.as_str())?;
        }

        // 4. Labware definitions and locations.
        let modules: IndexSet<&str> = self.modules.iter().map(|m| m.entity.id.as_str()).collect();
        let labware: IndexSet<&str> = self.labware.iter().map(|l| l.id.as_str()).collect();
        let mut stacked_on: IndexMap<&str, &str> = IndexMap::new();
        for l in &self.labware {
            self.definition(&l.definition_uri, || format!("labware '{}'", l.id))?;
            let referenced_by = || format!("labware '{}'", l.id);
            match &l.location {
                LabwareLocation::Slot(slot) => {
                    self.claim(&mut claims, slot.as_str(), l.id.as_str())?
                }
                LabwareLocation::Module(m) => {
                    if !modules.contains(m.as_str()) {
                        return Err(ConfigError::UnknownReference {
                            kind: "module",
                            id: m.to_string(),
                            referenced_by: referenced_by(),
                        });
                    }
                    occupy(&mut stacked_on, m.as_str(), l.id.as_str())?;
                }
                LabwareLocation::Labware(below) => {
                    if !labware.contains(below.as_str()) || below == &l.id {
                        return Err(ConfigError::UnknownReference {
                            kind: "labware",
                            id: below.to_string(),
                            referenced_by: referenced_by(),
                        });
                    }
                    occupy(&mut stacked_on, below.as_str(), l.id.as_str())?;
                }
                LabwareLocation::OffDeck => {}
            }
        }

        // 5. Liquids land in existing wells without overfilling them.
        let mut totals: IndexMap<(&str, &str), Volume> = IndexMap::new();
        for placement in &self.liquids {
            let Some(instance) = self.labware.iter().find(|l| l.id == placement.labware) else {
                return Err(ConfigError::UnknownReference {
                    kind: "labware",
                    id: placement.labware.to_string(),
                    referenced_by: format!("liquid '{}'", placement.liquid),
                });
            };
            let def = self.definition(&instance.definition_uri, || {
                format!("labware '{}'", instance.id)
            })?;
            let Some(well) = def.wells.get(placement.well.as_str()) else {
                return Err(ConfigError::UnknownWell {
                    labware: placement.labware.to_string(),
                    well: placement.well.to_string(),
                });
            };
            let total = totals
                .entry((placement.labware.as_str(), placement.well.as_str()))
                .or_insert(0.0);
            *total += placement.volume;
            let valid = placement.volume.is_finite()
                && placement.volume >= 0.0
                && *total <= well.total_liquid_volume;
            if !valid {
                return Err(ConfigError::InvalidLiquidVolume {
                    labware: placement.labware.to_string(),
                    well: placement.well.to_string(),
                    volume: *total,
                });
            }
        }

        Ok(())
    }

    /// Validate, then build the invariant context and initial state.
    pub fn build(&self) -> Result<(InvariantContext, RobotState), ConfigError> {
        self.validate()?;

        let mut builder = InvariantContext::builder(self.robot_type);
        for (uri, def) in &self.labware_definitions {
            builder = builder.definition(uri.clone(), def.clone());
        }
        for p in &self.pipettes {
            builder = builder.pipette(p.entity.clone());
        }
        for l in &self.labware {
            let (id, uri) = (l.id.clone(), l.definition_uri.clone());
            builder = match &l.python_name {
                Some(name) => builder.labware_named(id, uri, name.clone()),
                None => builder.labware(id, uri),
            };
        }
        for m in &self.modules {
            builder = builder.module(m.entity.clone());
        }
        for e in &self.additional_equipment {
            builder = builder.equipment(e.clone());
        }
        let ctx = builder.build()?;

        let mut initial = InitialStateBuilder::new(&ctx);
        for p in &self.pipettes {
            initial = initial.pipette(p.entity.id.clone(), p.mount);
        }
        for m in &self.modules {
            initial = initial.module(m.entity.id.clone(), m.slot.clone());
        }
        for l in &self.labware {
            initial = initial.labware(l.id.clone(), l.location.clone());
        }
        for placement in &self.liquids {
            initial = initial.liquid(
                placement.labware.clone(),
                placement.well.clone(),
                placement.liquid.clone(),
                placement.volume,
            );
        }
        let state = initial.build()?;

        debug!(
            robot = ?self.robot_type,
            pipettes = self.pipettes.len(),
            labware = self.labware.len(),
            modules = self.modules.len(),
            liquids = self.liquids.len(),
            "built protocol deck"
        );
        Ok((ctx, state))
    }

    fn definition(
        &self,
        uri: &str,
        referenced_by: impl FnOnce() -> String,
    ) -> Result<&LabwareDefinition, ConfigError> {
        self.labware_definitions
            .get(uri)
            .ok_or_else(|| ConfigError::UnknownDefinition {
                uri: uri.to_string(),
                referenced_by: referenced_by(),
            })
    }

    fn claim<'a>(
        &self,
        claims: &mut IndexMap<&'a str, &'a str>,
        slot: &'a str,
        occupant: &'a str,
    ) -> Result<(), ConfigError> {
        if !self.robot_type.has_slot(slot) {
            return Err(ConfigError::UnknownSlot {
                slot: slot.to_string(),
                occupant: occupant.to_string(),
            });
        }
        occupy(claims, slot, occupant)
    }
}

fn unique<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = IndexSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn occupy<'a>(
    claims: &mut IndexMap<&'a str, &'a str>,
    place: &'a str,
    occupant: &'a str,
) -> Result<(), ConfigError> {
    if let Some(first) = claims.insert(place, occupant) {
        return Err(ConfigError::SlotConflict {
            slot: place.to_string(),
            first: first.to_string(),
            second: occupant.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipflow_test_utils::fixtures::*;

    fn ot2_config() -> ProtocolConfig {
        let mut config = ProtocolConfig::new(RobotType::Ot2);
        config
            .labware_definitions
            .insert(PLATE_96_URI.into(), plate_96());
        config
            .labware_definitions
            .insert(TIPRACK_300_URI.into(), tiprack_300());
        config.labware_definitions.insert(TRASH_URI.into(), trash());
        config.pipettes.push(PipetteConfig {
            entity: p300_single(),
            mount: Mount::Left,
        });
        for (id, uri, slot) in [
            (SOURCE_PLATE, PLATE_96_URI, "1"),
            (DEST_PLATE, PLATE_96_URI, "2"),
            (TIPRACK_1, TIPRACK_300_URI, "7"),
            (TRASH, TRASH_URI, "12"),
        ] {
            config.labware.push(LabwareConfig {
                id: id.into(),
                definition_uri: uri.into(),
                location: LabwareLocation::Slot(slot.into()),
                python_name: None,
            });
        }
        config.liquids.push(LiquidPlacement {
            labware: SOURCE_PLATE.into(),
            well: "A1".into(),
            liquid: "water".into(),
            volume: 200.0,
        });
        config
    }

    #[test]
    fn valid_config_builds() {
        let (ctx, state) = ot2_config().build().unwrap();
        assert!(ctx.pipette(P300_SINGLE).is_some());
        assert_eq!(
            state
                .well_liquid(SOURCE_PLATE, "A1")
                .volume_of(&LiquidId::from("water")),
            200.0
        );
        assert!(state.tip_state.tipracks.contains_key(TIPRACK_1));
    }

    #[test]
    fn duplicate_labware_id() {
        let mut config = ot2_config();
        let mut copy = config.labware[0].clone();
        copy.location = LabwareLocation::Slot("3".into());
        config.labware.push(copy);
        match config.validate() {
            Err(ConfigError::DuplicateId { kind, id }) => {
                assert_eq!(kind, "labware");
                assert_eq!(id, SOURCE_PLATE);
            }
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn slot_conflict_names_both_occupants() {
        let mut config = ot2_config();
        config.labware[1].location = LabwareLocation::Slot("1".into());
        match config.validate() {
            Err(ConfigError::SlotConflict {
                slot,
                first,
                second,
            }) => {
                assert_eq!(slot, "1");
                assert_eq!(first, SOURCE_PLATE);
                assert_eq!(second, DEST_PLATE);
            }
            other => panic!("expected SlotConflict, got {other:?}"),
        }
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let mut config = ot2_config();
        config.labware[1].location = LabwareLocation::Slot("C2".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownSlot { .. })
        ));
    }

    #[test]
    fn unregistered_tiprack_definition() {
        let mut config = ot2_config();
        config.pipettes[0].entity.tiprack_def_uris = vec!["missing/tips/1".into()];
        match config.validate() {
            Err(ConfigError::UnknownDefinition { uri, .. }) => assert_eq!(uri, "missing/tips/1"),
            other => panic!("expected UnknownDefinition, got {other:?}"),
        }
    }

    #[test]
    fn inverted_volume_range() {
        let mut config = ot2_config();
        config.pipettes[0].entity.spec.min_volume = 400.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVolumeRange { .. })
        ));
    }

    #[test]
    fn liquid_in_missing_well() {
        let mut config = ot2_config();
        config.liquids[0].well = "Z99".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownWell { .. })
        ));
    }

    #[test]
    fn overfilled_well_is_rejected() {
        let mut config = ot2_config();
        config.liquids.push(LiquidPlacement {
            labware: SOURCE_PLATE.into(),
            well: "A1".into(),
            liquid: "dye".into(),
            volume: 200.0,
        });
        match config.validate() {
            Err(ConfigError::InvalidLiquidVolume { volume, .. }) => assert_eq!(volume, 400.0),
            other => panic!("expected InvalidLiquidVolume, got {other:?}"),
        }
    }

    #[test]
    fn labware_on_undeclared_module() {
        let mut config = ot2_config();
        config.labware[1].location = LabwareLocation::Module("ghost".into());
        match config.validate() {
            Err(ConfigError::UnknownReference { kind, id, .. }) => {
                assert_eq!(kind, "module");
                assert_eq!(id, "ghost");
            }
            other => panic!("expected UnknownReference, got {other:?}"),
        }
    }

    #[test]
    fn json_round_trip() {
        let config = ot2_config();
        let json = serde_json::to_string(&config).unwrap();
        let back = ProtocolConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            ProtocolConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
