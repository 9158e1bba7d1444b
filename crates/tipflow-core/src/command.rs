//! The [`Command`] union: atomic robot commands emitted by the compiler.
//!
//! Commands are the compiler's output. The variant tag (`commandType`) and
//! the camelCase parameter field names are the wire contract consumed by
//! downstream serializers, so renaming a field here is a breaking change.

use serde::{Deserialize, Serialize};

use crate::id::{DeckSlot, LabwareId, ModuleId, PipetteId, Volume, WellName};

// ── Locations ──────────────────────────────────────────────────────

/// Reference point within a well that an offset is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WellOrigin {
    /// Top rim of the well.
    Top,
    /// Bottom of the well.
    #[default]
    Bottom,
    /// Geometric centre of the well.
    Center,
}

/// Offset in millimetres from a [`WellOrigin`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WellOffset {
    /// Offset along the deck x axis.
    pub x: f64,
    /// Offset along the deck y axis.
    pub y: f64,
    /// Offset along the vertical axis.
    pub z: f64,
}

/// Position within a well.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WellLocation {
    /// Reference point.
    pub origin: WellOrigin,
    /// Offset from the reference point.
    pub offset: WellOffset,
}

impl WellLocation {
    /// `z` millimetres above the well bottom.
    pub fn bottom(z: f64) -> Self {
        Self {
            origin: WellOrigin::Bottom,
            offset: WellOffset { x: 0.0, y: 0.0, z },
        }
    }

    /// `z` millimetres relative to the well top (negative is inside the well).
    pub fn top(z: f64) -> Self {
        Self {
            origin: WellOrigin::Top,
            offset: WellOffset { x: 0.0, y: 0.0, z },
        }
    }

    /// Shift the location horizontally.
    pub fn with_xy(mut self, x: f64, y: f64) -> Self {
        self.offset.x = x;
        self.offset.y = y;
        self
    }
}

/// Where a piece of labware sits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabwareLocation {
    /// Directly in a deck slot.
    Slot(DeckSlot),
    /// On top of a module.
    Module(ModuleId),
    /// Stacked on another labware (e.g. an adapter).
    Labware(LabwareId),
    /// Removed from the deck.
    OffDeck,
}

// ── Pipetting parameters ───────────────────────────────────────────

/// Parameters shared by `aspirate` and `dispense`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidHandlingParams {
    /// Pipette performing the action.
    pub pipette_id: PipetteId,
    /// Volume in microlitres.
    pub volume: Volume,
    /// Target labware.
    pub labware_id: LabwareId,
    /// Target well (the primary nozzle's well for multi-channel pipettes).
    pub well_name: WellName,
    /// Position within the well.
    pub well_location: WellLocation,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

/// Parameters for a `blowout` into a well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowoutParams {
    /// Pipette performing the action.
    pub pipette_id: PipetteId,
    /// Target labware.
    pub labware_id: LabwareId,
    /// Target well.
    pub well_name: WellName,
    /// Position within the well.
    pub well_location: WellLocation,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

/// Parameters for `touchTip` and `moveToWell`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellTargetParams {
    /// Pipette performing the action.
    pub pipette_id: PipetteId,
    /// Target labware.
    pub labware_id: LabwareId,
    /// Target well.
    pub well_name: WellName,
    /// Position within the well.
    pub well_location: WellLocation,
}

/// Parameters for `pickUpTip` and `dropTip`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipParams {
    /// Pipette picking up or dropping the tip.
    pub pipette_id: PipetteId,
    /// Tiprack (pick up) or drop labware.
    pub labware_id: LabwareId,
    /// Well of the primary nozzle.
    pub well_name: WellName,
}

/// Parameters for volume-moving in-place commands (`airGapInPlace`,
/// `dispenseInPlace`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InPlaceParams {
    /// Pipette performing the action.
    pub pipette_id: PipetteId,
    /// Volume in microlitres.
    pub volume: Volume,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

/// Parameters for `blowOutInPlace`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowOutInPlaceParams {
    /// Pipette performing the action.
    pub pipette_id: PipetteId,
    /// Plunger flow rate in µL/s.
    pub flow_rate: f64,
}

/// Parameters for commands that only name a pipette (`dropTipInPlace`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipetteParams {
    /// The pipette.
    pub pipette_id: PipetteId,
}

/// Parameters for `moveToAddressableArea` and
/// `moveToAddressableAreaForDropTip`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressableAreaParams {
    /// Pipette to move.
    pub pipette_id: PipetteId,
    /// Addressable area name, e.g. `movableTrashA3` or `1ChannelWasteChute`.
    pub addressable_area_name: String,
    /// Offset from the area's reference point.
    pub offset: WellOffset,
}

/// Nozzle layout style for `configureNozzleLayout`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NozzleConfiguration {
    /// Every nozzle engaged.
    #[default]
    All,
    /// A single column of eight nozzles.
    Column,
    /// One nozzle.
    Single,
}

impl NozzleConfiguration {
    /// Number of engaged nozzles for a pipette with `channels` channels.
    pub fn active_channels(self, channels: usize) -> usize {
        match self {
            Self::All => channels,
            Self::Column => channels.min(8),
            Self::Single => 1,
        }
    }
}

/// Parameters for `configureNozzleLayout`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureNozzleLayoutParams {
    /// Pipette to reconfigure.
    pub pipette_id: PipetteId,
    /// New layout.
    pub configuration_params: NozzleConfiguration,
}

/// How labware is moved by `moveLabware`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveLabwareStrategy {
    /// The gripper moves it.
    UsingGripper,
    /// The protocol pauses for the operator to move it.
    ManualMoveWithPause,
}

/// Parameters for `moveLabware`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveLabwareParams {
    /// Labware to move.
    pub labware_id: LabwareId,
    /// Destination.
    pub new_location: LabwareLocation,
    /// Gripper or manual.
    pub strategy: MoveLabwareStrategy,
}

/// Parameters for `waitForDuration`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForDurationParams {
    /// Seconds to wait.
    pub seconds: f64,
    /// Optional operator-facing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Parameters for `waitForResume`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForResumeParams {
    /// Optional operator-facing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ── Module parameters ──────────────────────────────────────────────

/// Parameters for module commands that take no arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleParams {
    /// Target module.
    pub module_id: ModuleId,
}

/// Parameters for module temperature commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureParams {
    /// Target module.
    pub module_id: ModuleId,
    /// Temperature in °C.
    pub celsius: f64,
}

/// Parameters for `thermocycler/setTargetBlockTemperature`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTemperatureParams {
    /// Target thermocycler.
    pub module_id: ModuleId,
    /// Block temperature in °C.
    pub celsius: f64,
    /// Largest well volume in the block, for thermal modelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_max_volume_ul: Option<Volume>,
}

/// Parameters for `magneticModule/engage`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngageMagnetParams {
    /// Target magnetic module.
    pub module_id: ModuleId,
    /// Magnet height in millimetres.
    pub height: f64,
}

/// One step of a thermocycler profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStep {
    /// Block temperature in °C.
    pub celsius: f64,
    /// Seconds to hold at this temperature.
    pub hold_seconds: f64,
}

/// Parameters for `thermocycler/runProfile`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProfileParams {
    /// Target thermocycler.
    pub module_id: ModuleId,
    /// Flattened profile steps.
    pub profile: Vec<ProfileStep>,
    /// Largest well volume in the block.
    pub block_max_volume_ul: Volume,
}

/// Parameters for `heaterShaker/setAndWaitForShakeSpeed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShakeSpeedParams {
    /// Target heater-shaker.
    pub module_id: ModuleId,
    /// Speed in revolutions per minute.
    pub rpm: f64,
}

// ── Command ────────────────────────────────────────────────────────

/// An atomic robot command.
///
/// Serialized as `{"commandType": ..., "params": {...}}`.
///
/// # Examples
///
/// ```
/// use tipflow_core::{Command, PipetteParams};
///
/// let cmd = Command::DropTipInPlace(PipetteParams { pipette_id: "p300".into() });
/// assert_eq!(cmd.command_type(), "dropTipInPlace");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "commandType", content = "params")]
pub enum Command {
    /// Draw liquid from a well into the mounted tip(s).
    #[serde(rename = "aspirate")]
    Aspirate(LiquidHandlingParams),
    /// Expel liquid from the tip(s) into a well.
    #[serde(rename = "dispense")]
    Dispense(LiquidHandlingParams),
    /// Draw air at the current position.
    #[serde(rename = "airGapInPlace")]
    AirGapInPlace(InPlaceParams),
    /// Expel liquid at the current position (trash or waste chute).
    #[serde(rename = "dispenseInPlace")]
    DispenseInPlace(InPlaceParams),
    /// Blow out the tip contents into a well.
    #[serde(rename = "blowout")]
    Blowout(BlowoutParams),
    /// Blow out at the current position.
    #[serde(rename = "blowOutInPlace")]
    BlowOutInPlace(BlowOutInPlaceParams),
    /// Touch the tip against the well walls.
    #[serde(rename = "touchTip")]
    TouchTip(WellTargetParams),
    /// Pick up tip(s) from a tiprack.
    #[serde(rename = "pickUpTip")]
    PickUpTip(TipParams),
    /// Drop the tip(s) into a labware well.
    #[serde(rename = "dropTip")]
    DropTip(TipParams),
    /// Drop the tip(s) at the current position.
    #[serde(rename = "dropTipInPlace")]
    DropTipInPlace(PipetteParams),
    /// Move the pipette to a position within a well.
    #[serde(rename = "moveToWell")]
    MoveToWell(WellTargetParams),
    /// Move the pipette to an addressable area (trash bin, waste chute).
    #[serde(rename = "moveToAddressableArea")]
    MoveToAddressableArea(AddressableAreaParams),
    /// Move the pipette to an addressable area to drop its tip(s).
    #[serde(rename = "moveToAddressableAreaForDropTip")]
    MoveToAddressableAreaForDropTip(AddressableAreaParams),
    /// Move labware to a new location.
    #[serde(rename = "moveLabware")]
    MoveLabware(MoveLabwareParams),
    /// Change which nozzles of a pipette are engaged.
    #[serde(rename = "configureNozzleLayout")]
    ConfigureNozzleLayout(ConfigureNozzleLayoutParams),
    /// Wait for a fixed duration.
    #[serde(rename = "waitForDuration")]
    WaitForDuration(WaitForDurationParams),
    /// Pause until the operator resumes.
    #[serde(rename = "waitForResume")]
    WaitForResume(WaitForResumeParams),

    /// Set the temperature module target.
    #[serde(rename = "temperatureModule/setTargetTemperature")]
    TemperatureModuleSetTargetTemperature(TemperatureParams),
    /// Block until the temperature module reaches a temperature.
    #[serde(rename = "temperatureModule/waitForTemperature")]
    TemperatureModuleWaitForTemperature(TemperatureParams),
    /// Turn the temperature module off.
    #[serde(rename = "temperatureModule/deactivate")]
    TemperatureModuleDeactivate(ModuleParams),

    /// Raise the magnets.
    #[serde(rename = "magneticModule/engage")]
    MagneticModuleEngage(EngageMagnetParams),
    /// Lower the magnets.
    #[serde(rename = "magneticModule/disengage")]
    MagneticModuleDisengage(ModuleParams),

    /// Set the block target temperature.
    #[serde(rename = "thermocycler/setTargetBlockTemperature")]
    ThermocyclerSetTargetBlockTemperature(BlockTemperatureParams),
    /// Block until the block reaches its target.
    #[serde(rename = "thermocycler/waitForBlockTemperature")]
    ThermocyclerWaitForBlockTemperature(ModuleParams),
    /// Set the lid target temperature.
    #[serde(rename = "thermocycler/setTargetLidTemperature")]
    ThermocyclerSetTargetLidTemperature(TemperatureParams),
    /// Block until the lid reaches its target.
    #[serde(rename = "thermocycler/waitForLidTemperature")]
    ThermocyclerWaitForLidTemperature(ModuleParams),
    /// Turn the block heater off.
    #[serde(rename = "thermocycler/deactivateBlock")]
    ThermocyclerDeactivateBlock(ModuleParams),
    /// Turn the lid heater off.
    #[serde(rename = "thermocycler/deactivateLid")]
    ThermocyclerDeactivateLid(ModuleParams),
    /// Open the lid.
    #[serde(rename = "thermocycler/openLid")]
    ThermocyclerOpenLid(ModuleParams),
    /// Close the lid.
    #[serde(rename = "thermocycler/closeLid")]
    ThermocyclerCloseLid(ModuleParams),
    /// Start a temperature profile.
    #[serde(rename = "thermocycler/runProfile")]
    ThermocyclerRunProfile(RunProfileParams),
    /// Block until the running profile completes.
    #[serde(rename = "thermocycler/awaitProfileComplete")]
    ThermocyclerAwaitProfileComplete(ModuleParams),

    /// Set the heater target.
    #[serde(rename = "heaterShaker/setTargetTemperature")]
    HeaterShakerSetTargetTemperature(TemperatureParams),
    /// Block until the heater reaches its target.
    #[serde(rename = "heaterShaker/waitForTemperature")]
    HeaterShakerWaitForTemperature(TemperatureParams),
    /// Turn the heater off.
    #[serde(rename = "heaterShaker/deactivateHeater")]
    HeaterShakerDeactivateHeater(ModuleParams),
    /// Start shaking and block until the speed is reached.
    #[serde(rename = "heaterShaker/setAndWaitForShakeSpeed")]
    HeaterShakerSetAndWaitForShakeSpeed(ShakeSpeedParams),
    /// Stop shaking.
    #[serde(rename = "heaterShaker/deactivateShaker")]
    HeaterShakerDeactivateShaker(ModuleParams),
    /// Open the labware latch.
    #[serde(rename = "heaterShaker/openLabwareLatch")]
    HeaterShakerOpenLabwareLatch(ModuleParams),
    /// Close the labware latch.
    #[serde(rename = "heaterShaker/closeLabwareLatch")]
    HeaterShakerCloseLabwareLatch(ModuleParams),
}

impl Command {
    /// The wire `commandType` tag.
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::Aspirate(_) => "aspirate",
            Self::Dispense(_) => "dispense",
            Self::AirGapInPlace(_) => "airGapInPlace",
            Self::DispenseInPlace(_) => "dispenseInPlace",
            Self::Blowout(_) => "blowout",
            Self::BlowOutInPlace(_) => "blowOutInPlace",
            Self::TouchTip(_) => "touchTip",
            Self::PickUpTip(_) => "pickUpTip",
            Self::DropTip(_) => "dropTip",
            Self::DropTipInPlace(_) => "dropTipInPlace",
            Self::MoveToWell(_) => "moveToWell",
            Self::MoveToAddressableArea(_) => "moveToAddressableArea",
            Self::MoveToAddressableAreaForDropTip(_) => "moveToAddressableAreaForDropTip",
            Self::MoveLabware(_) => "moveLabware",
            Self::ConfigureNozzleLayout(_) => "configureNozzleLayout",
            Self::WaitForDuration(_) => "waitForDuration",
            Self::WaitForResume(_) => "waitForResume",
            Self::TemperatureModuleSetTargetTemperature(_) => {
                "temperatureModule/setTargetTemperature"
            }
            Self::TemperatureModuleWaitForTemperature(_) => "temperatureModule/waitForTemperature",
            Self::TemperatureModuleDeactivate(_) => "temperatureModule/deactivate",
            Self::MagneticModuleEngage(_) => "magneticModule/engage",
            Self::MagneticModuleDisengage(_) => "magneticModule/disengage",
            Self::ThermocyclerSetTargetBlockTemperature(_) => {
                "thermocycler/setTargetBlockTemperature"
            }
            Self::ThermocyclerWaitForBlockTemperature(_) => "thermocycler/waitForBlockTemperature",
            Self::ThermocyclerSetTargetLidTemperature(_) => "thermocycler/setTargetLidTemperature",
            Self::ThermocyclerWaitForLidTemperature(_) => "thermocycler/waitForLidTemperature",
            Self::ThermocyclerDeactivateBlock(_) => "thermocycler/deactivateBlock",
            Self::ThermocyclerDeactivateLid(_) => "thermocycler/deactivateLid",
            Self::ThermocyclerOpenLid(_) => "thermocycler/openLid",
            Self::ThermocyclerCloseLid(_) => "thermocycler/closeLid",
            Self::ThermocyclerRunProfile(_) => "thermocycler/runProfile",
            Self::ThermocyclerAwaitProfileComplete(_) => "thermocycler/awaitProfileComplete",
            Self::HeaterShakerSetTargetTemperature(_) => "heaterShaker/setTargetTemperature",
            Self::HeaterShakerWaitForTemperature(_) => "heaterShaker/waitForTemperature",
            Self::HeaterShakerDeactivateHeater(_) => "heaterShaker/deactivateHeater",
            Self::HeaterShakerSetAndWaitForShakeSpeed(_) => "heaterShaker/setAndWaitForShakeSpeed",
            Self::HeaterShakerDeactivateShaker(_) => "heaterShaker/deactivateShaker",
            Self::HeaterShakerOpenLabwareLatch(_) => "heaterShaker/openLabwareLatch",
            Self::HeaterShakerCloseLabwareLatch(_) => "heaterShaker/closeLabwareLatch",
        }
    }

    /// The pipette a pipetting command acts on, if any.
    pub fn pipette_id(&self) -> Option<&PipetteId> {
        match self {
            Self::Aspirate(p) | Self::Dispense(p) => Some(&p.pipette_id),
            Self::AirGapInPlace(p) | Self::DispenseInPlace(p) => Some(&p.pipette_id),
            Self::Blowout(p) => Some(&p.pipette_id),
            Self::BlowOutInPlace(p) => Some(&p.pipette_id),
            Self::TouchTip(p) | Self::MoveToWell(p) => Some(&p.pipette_id),
            Self::PickUpTip(p) | Self::DropTip(p) => Some(&p.pipette_id),
            Self::DropTipInPlace(p) => Some(&p.pipette_id),
            Self::MoveToAddressableArea(p) | Self::MoveToAddressableAreaForDropTip(p) => {
                Some(&p.pipette_id)
            }
            Self::ConfigureNozzleLayout(p) => Some(&p.pipette_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspirate_wire_shape() {
        let cmd = Command::Aspirate(LiquidHandlingParams {
            pipette_id: "p300".into(),
            volume: 50.0,
            labware_id: "plate".into(),
            well_name: "A1".into(),
            well_location: WellLocation::bottom(1.0),
            flow_rate: 92.86,
        });
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["commandType"], "aspirate");
        assert_eq!(json["params"]["pipetteId"], "p300");
        assert_eq!(json["params"]["wellName"], "A1");
        assert_eq!(json["params"]["wellLocation"]["origin"], "bottom");
        assert_eq!(json["params"]["flowRate"], 92.86);
    }

    #[test]
    fn module_commands_use_namespaced_tags() {
        let cmd = Command::TemperatureModuleSetTargetTemperature(TemperatureParams {
            module_id: "temp".into(),
            celsius: 4.0,
        });
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["commandType"], "temperatureModule/setTargetTemperature");
        assert_eq!(json["params"]["moduleId"], "temp");
        assert_eq!(cmd.command_type(), "temperatureModule/setTargetTemperature");
    }

    #[test]
    fn commands_round_trip() {
        let cmd = Command::MoveLabware(MoveLabwareParams {
            labware_id: "plate".into(),
            new_location: LabwareLocation::Slot("C2".into()),
            strategy: MoveLabwareStrategy::UsingGripper,
        });
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn nozzle_channels() {
        assert_eq!(NozzleConfiguration::All.active_channels(96), 96);
        assert_eq!(NozzleConfiguration::Column.active_channels(96), 8);
        assert_eq!(NozzleConfiguration::Single.active_channels(8), 1);
    }
}
