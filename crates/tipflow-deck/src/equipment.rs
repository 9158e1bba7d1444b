//! Additional equipment: trash bins, waste chutes, staging areas, gripper.
//!
//! Trash bins and waste chutes hold liquid but have no wells; the pipette
//! reaches them through named addressable areas rather than a labware well.

use serde::{Deserialize, Serialize};
use tipflow_core::{DeckSlot, EquipmentId};

use crate::slot::RobotType;

/// Kind of additional equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentKind {
    /// A trash bin in a deck slot.
    TrashBin,
    /// The Flex waste chute (slot D3).
    WasteChute,
    /// A Flex staging area slot (column 4).
    StagingArea,
    /// The Flex labware gripper.
    Gripper,
}

/// An additional equipment entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalEquipment {
    /// Entity id.
    pub id: EquipmentId,
    /// Kind.
    pub kind: EquipmentKind,
    /// Deck slot; required for everything but the gripper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<DeckSlot>,
    /// Variable name in generated Python source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_name: Option<String>,
}

impl AdditionalEquipment {
    /// Whether liquid and tips can be disposed into this equipment.
    pub fn is_disposal(&self) -> bool {
        matches!(self.kind, EquipmentKind::TrashBin | EquipmentKind::WasteChute)
    }

    /// Addressable area a pipette with `channels` engaged nozzles moves to.
    ///
    /// `None` for equipment the pipette does not visit.
    pub fn addressable_area_name(&self, robot: RobotType, channels: usize) -> Option<String> {
        match self.kind {
            EquipmentKind::TrashBin => {
                let slot = self.location.as_ref()?;
                if robot == RobotType::Ot2 && slot.as_str() == "12" {
                    Some("fixedTrash".to_string())
                } else {
                    Some(format!("movableTrash{slot}"))
                }
            }
            EquipmentKind::WasteChute => Some(waste_chute_area(channels).to_string()),
            EquipmentKind::StagingArea | EquipmentKind::Gripper => None,
        }
    }

    /// Whether `area` is one of this equipment's addressable areas.
    pub fn owns_addressable_area(&self, robot: RobotType, area: &str) -> bool {
        [1, 8, 96]
            .into_iter()
            .any(|ch| self.addressable_area_name(robot, ch).as_deref() == Some(area))
    }
}

fn waste_chute_area(channels: usize) -> &'static str {
    match channels {
        96 => "96ChannelWasteChute",
        8 => "8ChannelsWasteChute",
        _ => "1ChannelWasteChute",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equipment(kind: EquipmentKind, slot: Option<&str>) -> AdditionalEquipment {
        AdditionalEquipment {
            id: "eq".into(),
            kind,
            location: slot.map(DeckSlot::from),
            python_name: None,
        }
    }

    #[test]
    fn trash_bin_area_names() {
        let flex_bin = equipment(EquipmentKind::TrashBin, Some("A3"));
        assert_eq!(
            flex_bin.addressable_area_name(RobotType::Flex, 1).as_deref(),
            Some("movableTrashA3")
        );
        let fixed = equipment(EquipmentKind::TrashBin, Some("12"));
        assert_eq!(
            fixed.addressable_area_name(RobotType::Ot2, 8).as_deref(),
            Some("fixedTrash")
        );
    }

    #[test]
    fn waste_chute_area_depends_on_channels() {
        let chute = equipment(EquipmentKind::WasteChute, Some("D3"));
        assert_eq!(
            chute.addressable_area_name(RobotType::Flex, 8).as_deref(),
            Some("8ChannelsWasteChute")
        );
        assert!(chute.owns_addressable_area(RobotType::Flex, "96ChannelWasteChute"));
        assert!(!chute.owns_addressable_area(RobotType::Flex, "movableTrashA3"));
    }

    #[test]
    fn gripper_has_no_area() {
        let gripper = equipment(EquipmentKind::Gripper, None);
        assert!(gripper.addressable_area_name(RobotType::Flex, 1).is_none());
        assert!(!gripper.is_disposal());
    }
}
