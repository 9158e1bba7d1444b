//! The invariant context: protocol-lifetime entity registries.
//!
//! An [`InvariantContext`] is built once per compile through
//! [`InvariantContextBuilder`] and never mutated afterwards. Definitions
//! are held behind [`Arc`] so a context (and every labware sharing a
//! definition) is cheap to clone and safe to share across threads.

use indexmap::IndexMap;
use std::sync::Arc;
use tipflow_core::{EquipmentId, LabwareId, ModuleId, PipetteId};

use crate::equipment::{AdditionalEquipment, EquipmentKind};
use crate::error::DeckError;
use crate::labware::LabwareDefinition;
use crate::module::ModuleEntity;
use crate::pipette::PipetteEntity;
use crate::slot::RobotType;

/// A labware instance registered in a protocol.
#[derive(Clone, Debug, PartialEq)]
pub struct LabwareEntity {
    /// Entity id.
    pub id: LabwareId,
    /// URI of the definition.
    pub def_uri: String,
    /// Shared definition.
    pub def: Arc<LabwareDefinition>,
    /// Variable name in generated Python source.
    pub python_name: Option<String>,
}

/// Immutable registries of pipettes, labware, modules and equipment.
#[derive(Clone, Debug)]
pub struct InvariantContext {
    robot_type: RobotType,
    pipettes: IndexMap<PipetteId, PipetteEntity>,
    labware: IndexMap<LabwareId, LabwareEntity>,
    modules: IndexMap<ModuleId, ModuleEntity>,
    equipment: IndexMap<EquipmentId, AdditionalEquipment>,
}

impl InvariantContext {
    /// Start building a context for `robot_type`.
    pub fn builder(robot_type: RobotType) -> InvariantContextBuilder {
        InvariantContextBuilder::new(robot_type)
    }

    /// Target robot.
    pub fn robot_type(&self) -> RobotType {
        self.robot_type
    }

    /// A pipette by id.
    pub fn pipette(&self, id: &str) -> Option<&PipetteEntity> {
        self.pipettes.get(id)
    }

    /// Every pipette, in registration order.
    pub fn pipettes(&self) -> impl Iterator<Item = &PipetteEntity> {
        self.pipettes.values()
    }

    /// A labware instance by id.
    pub fn labware(&self, id: &str) -> Option<&LabwareEntity> {
        self.labware.get(id)
    }

    /// The definition of a labware instance.
    pub fn labware_def(&self, id: &str) -> Option<&LabwareDefinition> {
        self.labware.get(id).map(|l| l.def.as_ref())
    }

    /// Every labware instance, in registration order.
    pub fn labware_entities(&self) -> impl Iterator<Item = &LabwareEntity> {
        self.labware.values()
    }

    /// A module by id.
    pub fn module(&self, id: &str) -> Option<&ModuleEntity> {
        self.modules.get(id)
    }

    /// Every module, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleEntity> {
        self.modules.values()
    }

    /// Additional equipment by id.
    pub fn equipment(&self, id: &str) -> Option<&AdditionalEquipment> {
        self.equipment.get(id)
    }

    /// Every additional equipment entity, in registration order.
    pub fn equipment_entities(&self) -> impl Iterator<Item = &AdditionalEquipment> {
        self.equipment.values()
    }

    /// A trash bin or waste chute by id.
    pub fn disposal(&self, id: &str) -> Option<&AdditionalEquipment> {
        self.equipment(id).filter(|e| e.is_disposal())
    }

    /// Whether a gripper is installed.
    pub fn has_gripper(&self) -> bool {
        self.equipment
            .values()
            .any(|e| e.kind == EquipmentKind::Gripper)
    }

    /// Tipracks a pipette may draw from, in registration order.
    ///
    /// A pipette with no listed tiprack URIs may use any tiprack.
    pub fn tipracks_for<'a>(
        &'a self,
        pipette: &'a PipetteEntity,
    ) -> impl Iterator<Item = &'a LabwareEntity> + 'a {
        self.labware.values().filter(move |l| {
            l.def.is_tiprack
                && (pipette.tiprack_def_uris.is_empty()
                    || pipette.tiprack_def_uris.contains(&l.def_uri))
        })
    }

    /// The trash bin or waste chute owning an addressable area name.
    pub fn equipment_for_addressable_area(&self, area: &str) -> Option<&AdditionalEquipment> {
        self.equipment
            .values()
            .find(|e| e.owns_addressable_area(self.robot_type, area))
    }
}

/// Validating builder for [`InvariantContext`].
#[derive(Debug)]
pub struct InvariantContextBuilder {
    robot_type: RobotType,
    definitions: IndexMap<String, Arc<LabwareDefinition>>,
    pipettes: Vec<PipetteEntity>,
    labware: Vec<(LabwareId, String, Option<String>)>,
    modules: Vec<ModuleEntity>,
    equipment: Vec<AdditionalEquipment>,
}

impl InvariantContextBuilder {
    /// An empty builder.
    pub fn new(robot_type: RobotType) -> Self {
        Self {
            robot_type,
            definitions: IndexMap::new(),
            pipettes: Vec::new(),
            labware: Vec::new(),
            modules: Vec::new(),
            equipment: Vec::new(),
        }
    }

    /// Register a labware definition under `uri`. Re-registering replaces it.
    pub fn definition(mut self, uri: impl Into<String>, def: LabwareDefinition) -> Self {
        self.definitions.insert(uri.into(), Arc::new(def));
        self
    }

    /// Register a pipette.
    pub fn pipette(mut self, pipette: PipetteEntity) -> Self {
        self.pipettes.push(pipette);
        self
    }

    /// Register a labware instance using a previously registered definition.
    pub fn labware(mut self, id: impl Into<LabwareId>, def_uri: impl Into<String>) -> Self {
        self.labware.push((id.into(), def_uri.into(), None));
        self
    }

    /// Register a labware instance with a Python variable name.
    pub fn labware_named(
        mut self,
        id: impl Into<LabwareId>,
        def_uri: impl Into<String>,
        python_name: impl Into<String>,
    ) -> Self {
        self.labware
            .push((id.into(), def_uri.into(), Some(python_name.into())));
        self
    }

    /// Register a module.
    pub fn module(mut self, module: ModuleEntity) -> Self {
        self.modules.push(module);
        self
    }

    /// Register additional equipment.
    pub fn equipment(mut self, equipment: AdditionalEquipment) -> Self {
        self.equipment.push(equipment);
        self
    }

    /// Validate and freeze the context.
    pub fn build(self) -> Result<InvariantContext, DeckError> {
        for (uri, def) in &self.definitions {
            def.validate(uri)?;
        }

        let mut pipettes = IndexMap::with_capacity(self.pipettes.len());
        for p in self.pipettes {
            p.validate()?;
            for uri in &p.tiprack_def_uris {
                if let Some(def) = self.definitions.get(uri) {
                    if !def.is_tiprack {
                        return Err(DeckError::NotATiprack {
                            pipette: p.id.to_string(),
                            uri: uri.clone(),
                        });
                    }
                }
            }
            insert_unique(&mut pipettes, "pipette", p.id.clone(), p)?;
        }

        let mut labware = IndexMap::with_capacity(self.labware.len());
        for (id, uri, python_name) in self.labware {
            let Some(def) = self.definitions.get(&uri) else {
                return Err(DeckError::InvalidLabwareDefinition {
                    uri,
                    reason: format!("no definition registered (labware '{id}')"),
                });
            };
            let entity = LabwareEntity {
                id: id.clone(),
                def_uri: uri.clone(),
                def: Arc::clone(def),
                python_name,
            };
            insert_unique(&mut labware, "labware", id, entity)?;
        }

        let mut modules = IndexMap::with_capacity(self.modules.len());
        for m in self.modules {
            insert_unique(&mut modules, "module", m.id.clone(), m)?;
        }

        let mut equipment = IndexMap::with_capacity(self.equipment.len());
        for e in self.equipment {
            match (&e.location, e.kind) {
                (None, EquipmentKind::Gripper) => {}
                (None, _) => {
                    return Err(DeckError::InvalidEquipment {
                        id: e.id.to_string(),
                        reason: "a deck location is required".into(),
                    })
                }
                (Some(slot), _) => {
                    if !self.robot_type.has_slot(slot.as_str()) {
                        return Err(DeckError::UnknownSlot {
                            slot: slot.to_string(),
                            robot: self.robot_type.label(),
                        });
                    }
                }
            }
            if e.kind == EquipmentKind::WasteChute && self.robot_type == RobotType::Ot2 {
                return Err(DeckError::InvalidEquipment {
                    id: e.id.to_string(),
                    reason: "waste chutes are only available on a Flex".into(),
                });
            }
            insert_unique(&mut equipment, "equipment", e.id.clone(), e)?;
        }

        Ok(InvariantContext {
            robot_type: self.robot_type,
            pipettes,
            labware,
            modules,
            equipment,
        })
    }
}

fn insert_unique<K, V>(
    map: &mut IndexMap<K, V>,
    kind: &'static str,
    key: K,
    value: V,
) -> Result<(), DeckError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if map.contains_key(&key) {
        return Err(DeckError::DuplicateId {
            kind,
            id: key.to_string(),
        });
    }
    map.insert(key, value);
    Ok(())
}
