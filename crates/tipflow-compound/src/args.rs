//! Parameter records for compound steps.
//!
//! These are the values the protocol layer deserializes from its step
//! list. Every optional behaviour is an `Option` field, so a record with
//! only the required fields set describes the plainest possible step.

use serde::{Deserialize, Serialize};
use tipflow_core::{
    LabwareId, LabwareLocation, ModuleId, NozzleConfiguration, PipetteId, ProfileStep, Volume,
    WellName,
};

/// When a compound step replaces its tip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeTip {
    /// Before every aspirate cycle.
    #[default]
    Always,
    /// Once, at the start of the step.
    Once,
    /// Never; the pipette must already hold a tip.
    Never,
    /// Whenever the source well changes.
    PerSource,
    /// Whenever the destination well changes.
    PerDest,
}

impl ChangeTip {
    /// The Python API `new_tip` value, for the policies it supports.
    pub fn python_new_tip(self) -> Option<&'static str> {
        match self {
            Self::Always => Some("always"),
            Self::Once => Some("once"),
            Self::Never => Some("never"),
            Self::PerSource | Self::PerDest => None,
        }
    }
}

/// Mix: `times` aspirate/dispense pairs of `volume` at one well.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixOptions {
    /// Volume per half-cycle in µL.
    pub volume: Volume,
    /// Number of cycles.
    pub times: u32,
}

/// A pause after an aspirate or dispense, optionally at a set height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayOptions {
    /// Seconds to wait.
    pub seconds: f64,
    /// Move to this height above the well bottom before waiting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mm_from_bottom: Option<f64>,
}

/// Touch the tip to the well walls at a height below the top.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchTipOptions {
    /// Offset from the well top in mm, usually negative.
    pub mm_from_top: f64,
}

/// Draw an air gap after leaving a well.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirGapOptions {
    /// Air volume in µL.
    pub volume: Volume,
}

/// Where excess liquid is blown out.
///
/// Serialized as `"sourceWell"`, `"destWell"` or a labware or equipment id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlowoutLocation {
    /// The well just aspirated from.
    SourceWell,
    /// The well just dispensed into.
    DestWell,
    /// A labware (first well), trash bin or waste chute.
    Other(String),
}

impl From<String> for BlowoutLocation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "sourceWell" => Self::SourceWell,
            "destWell" => Self::DestWell,
            _ => Self::Other(value),
        }
    }
}

impl From<BlowoutLocation> for String {
    fn from(value: BlowoutLocation) -> Self {
        match value {
            BlowoutLocation::SourceWell => "sourceWell".into(),
            BlowoutLocation::DestWell => "destWell".into(),
            BlowoutLocation::Other(id) => id,
        }
    }
}

/// Blow out after dispensing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowoutOptions {
    /// Where to blow out.
    pub location: BlowoutLocation,
    /// Flow rate in µL/s; pipette default if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
}

fn default_offset() -> f64 {
    1.0
}

/// Source-side behaviour of a liquid-moving step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AspirateOptions {
    /// Flow rate in µL/s; pipette default if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    /// Height above the well bottom in mm.
    #[serde(default = "default_offset")]
    pub offset_from_bottom: f64,
    /// Aspirate and dispense once at the source with each fresh tip.
    pub pre_wet_tip: bool,
    /// Mix at the source before the first aspirate of a cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixOptions>,
    /// Wait after aspirating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayOptions>,
    /// Touch tip after aspirating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touch_tip: Option<TouchTipOptions>,
    /// Air gap after aspirating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_gap: Option<AirGapOptions>,
}

impl Default for AspirateOptions {
    fn default() -> Self {
        Self {
            flow_rate: None,
            offset_from_bottom: default_offset(),
            pre_wet_tip: false,
            mix: None,
            delay: None,
            touch_tip: None,
            air_gap: None,
        }
    }
}

impl AspirateOptions {
    /// Whether any behaviour beyond a plain aspirate is requested.
    pub fn is_advanced(&self) -> bool {
        self.flow_rate.is_some()
            || self.offset_from_bottom != default_offset()
            || self.pre_wet_tip
            || self.mix.is_some()
            || self.delay.is_some()
            || self.touch_tip.is_some()
            || self.air_gap.is_some()
    }

    /// Air gap volume, zero if none.
    pub fn air_gap_volume(&self) -> Volume {
        self.air_gap.map_or(0.0, |a| a.volume)
    }
}

/// Destination-side behaviour of a liquid-moving step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DispenseOptions {
    /// Flow rate in µL/s; pipette default if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    /// Height above the well bottom in mm.
    #[serde(default = "default_offset")]
    pub offset_from_bottom: f64,
    /// Mix at the destination after dispensing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixOptions>,
    /// Wait after dispensing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayOptions>,
    /// Touch tip after dispensing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touch_tip: Option<TouchTipOptions>,
    /// Blow out after dispensing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blowout: Option<BlowoutOptions>,
    /// Air gap after dispensing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_gap: Option<AirGapOptions>,
}

impl Default for DispenseOptions {
    fn default() -> Self {
        Self {
            flow_rate: None,
            offset_from_bottom: default_offset(),
            mix: None,
            delay: None,
            touch_tip: None,
            blowout: None,
            air_gap: None,
        }
    }
}

impl DispenseOptions {
    /// Whether any behaviour beyond a plain dispense is requested.
    pub fn is_advanced(&self) -> bool {
        self.flow_rate.is_some()
            || self.offset_from_bottom != default_offset()
            || self.mix.is_some()
            || self.delay.is_some()
            || self.touch_tip.is_some()
            || self.blowout.is_some()
            || self.air_gap.is_some()
    }
}

// ── Liquid-moving steps ────────────────────────────────────────────

/// Settings shared by transfer, consolidate, distribute and mix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipettingArgs {
    /// Pipette doing the work.
    pub pipette: PipetteId,
    /// Tip replacement policy.
    #[serde(default)]
    pub change_tip: ChangeTip,
    /// Trash bin, waste chute or labware id that receives used tips.
    pub drop_tip_location: String,
    /// Nozzle layout to switch to before picking up tips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nozzles: Option<NozzleConfiguration>,
}

/// Move `volume` from each source well to its paired destination well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferArgs {
    /// Pipette, tip policy and drop location.
    #[serde(flatten)]
    pub common: PipettingArgs,
    /// Volume per pair in µL.
    pub volume: Volume,
    /// Source labware.
    pub source_labware: LabwareId,
    /// Source wells, paired 1:1 with `dest_wells`.
    pub source_wells: Vec<WellName>,
    /// Destination labware, trash bin or waste chute.
    pub dest_labware: String,
    /// Destination wells; ignored for a trash bin or waste chute.
    #[serde(default)]
    pub dest_wells: Vec<WellName>,
    /// Source-side behaviour.
    #[serde(default)]
    pub aspirate: AspirateOptions,
    /// Destination-side behaviour.
    #[serde(default)]
    pub dispense: DispenseOptions,
}

/// Move `volume` from every source well into one destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidateArgs {
    /// Pipette, tip policy and drop location.
    #[serde(flatten)]
    pub common: PipettingArgs,
    /// Volume per source well in µL.
    pub volume: Volume,
    /// Source labware.
    pub source_labware: LabwareId,
    /// Source wells in aspirate order.
    pub source_wells: Vec<WellName>,
    /// Destination labware, trash bin or waste chute.
    pub dest_labware: String,
    /// Destination well; ignored for a trash bin or waste chute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_well: Option<WellName>,
    /// Source-side behaviour.
    #[serde(default)]
    pub aspirate: AspirateOptions,
    /// Destination-side behaviour.
    #[serde(default)]
    pub dispense: DispenseOptions,
}

/// Move `volume` from one source well into each destination well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeArgs {
    /// Pipette, tip policy and drop location.
    #[serde(flatten)]
    pub common: PipettingArgs,
    /// Volume per destination well in µL.
    pub volume: Volume,
    /// Source labware.
    pub source_labware: LabwareId,
    /// Source well.
    pub source_well: WellName,
    /// Destination labware.
    pub dest_labware: LabwareId,
    /// Destination wells in dispense order.
    pub dest_wells: Vec<WellName>,
    /// Extra volume aspirated and blown out rather than dispensed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposal_volume: Option<Volume>,
    /// Source-side behaviour.
    #[serde(default)]
    pub aspirate: AspirateOptions,
    /// Destination-side behaviour.
    #[serde(default)]
    pub dispense: DispenseOptions,
}

/// Mix in place in each of a list of wells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixArgs {
    /// Pipette, tip policy and drop location. Only `always`, `once` and
    /// `never` apply.
    #[serde(flatten)]
    pub common: PipettingArgs,
    /// Labware holding the wells.
    pub labware: LabwareId,
    /// Wells to mix, in order.
    pub wells: Vec<WellName>,
    /// Volume per half-cycle in µL.
    pub volume: Volume,
    /// Cycles per well.
    pub times: u32,
    /// Aspirate flow rate in µL/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspirate_flow_rate: Option<f64>,
    /// Dispense flow rate in µL/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispense_flow_rate: Option<f64>,
    /// Height above the well bottom in mm.
    #[serde(default = "default_offset")]
    pub offset_from_bottom: f64,
    /// Seconds to wait after each aspirate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspirate_delay_seconds: Option<f64>,
    /// Seconds to wait after each dispense.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispense_delay_seconds: Option<f64>,
    /// Blow out after the last cycle in each well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blowout: Option<BlowoutOptions>,
    /// Touch tip after each well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch_tip: Option<TouchTipOptions>,
}

// ── Module steps ───────────────────────────────────────────────────

/// Set a temperature module to a target, or turn it off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureStepArgs {
    /// The temperature module.
    pub module: ModuleId,
    /// Target in °C; `None` deactivates.
    #[serde(default)]
    pub target: Option<f64>,
}

/// Engage or disengage a magnetic module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetStepArgs {
    /// The magnetic module.
    pub module: ModuleId,
    /// Engage height in mm; `None` disengages.
    #[serde(default)]
    pub engage_height: Option<f64>,
}

/// Bring a thermocycler to a held state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermocyclerStateArgs {
    /// The thermocycler.
    pub module: ModuleId,
    /// Block target in °C; `None` deactivates the block.
    #[serde(default)]
    pub block_target: Option<f64>,
    /// Lid target in °C; `None` deactivates the lid heater.
    #[serde(default)]
    pub lid_target: Option<f64>,
    /// Whether the lid ends open.
    pub lid_open: bool,
}

/// Run a thermocycler profile, then hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermocyclerProfileArgs {
    /// The thermocycler.
    pub module: ModuleId,
    /// Profile steps, already expanded for repeated cycles.
    pub profile: Vec<ProfileStep>,
    /// Largest well volume in the block, µL.
    pub profile_volume: Volume,
    /// Lid temperature while the profile runs.
    #[serde(default)]
    pub lid_target: Option<f64>,
    /// Block temperature held afterwards; `None` deactivates.
    #[serde(default)]
    pub block_hold: Option<f64>,
    /// Lid temperature held afterwards; `None` deactivates.
    #[serde(default)]
    pub lid_hold: Option<f64>,
    /// Open the lid once the profile completes.
    #[serde(default)]
    pub lid_open_hold: bool,
}

/// Drive a heater-shaker to a state, optionally for a fixed time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaterShakerArgs {
    /// The heater-shaker.
    pub module: ModuleId,
    /// Heater target in °C; `None` turns the heater off.
    #[serde(default)]
    pub target_temperature: Option<f64>,
    /// Shake speed in rpm; `None` stops shaking.
    #[serde(default)]
    pub rpm: Option<f64>,
    /// Whether the latch ends open.
    pub latch_open: bool,
    /// Run for this many seconds, then stop heating and shaking.
    #[serde(default)]
    pub timer_seconds: Option<f64>,
}

/// Pause the protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pauseAction", rename_all = "camelCase")]
pub enum PauseArgs {
    /// Until the operator resumes.
    #[serde(rename_all = "camelCase")]
    UntilResume {
        /// Message for the operator.
        #[serde(default)]
        message: Option<String>,
    },
    /// For a fixed time.
    #[serde(rename_all = "camelCase")]
    UntilTime {
        /// Seconds to wait.
        seconds: f64,
        /// Message for the operator.
        #[serde(default)]
        message: Option<String>,
    },
    /// Until a temperature module or heater-shaker reaches a temperature.
    #[serde(rename_all = "camelCase")]
    UntilTemperature {
        /// The module.
        module: ModuleId,
        /// Temperature in °C.
        celsius: f64,
    },
}

/// Move a labware, with the gripper or by hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveLabwareStepArgs {
    /// The labware.
    pub labware: LabwareId,
    /// Destination.
    pub new_location: LabwareLocation,
    /// Use the gripper.
    #[serde(default)]
    pub use_gripper: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_args_deserialize_with_defaults() {
        let json = r#"{
            "pipette": "p300SingleId",
            "changeTip": "perSource",
            "dropTipLocation": "trashId",
            "volume": 50,
            "sourceLabware": "sourcePlateId",
            "sourceWells": ["A1", "A2"],
            "destLabware": "destPlateId",
            "destWells": ["B1", "B2"]
        }"#;
        let args: TransferArgs = serde_json::from_str(json).unwrap();
        assert_eq!(args.common.change_tip, ChangeTip::PerSource);
        assert_eq!(args.aspirate.offset_from_bottom, 1.0);
        assert!(!args.aspirate.is_advanced());
        assert!(!args.dispense.is_advanced());
    }

    #[test]
    fn blowout_location_sentinels() {
        let loc: BlowoutLocation = serde_json::from_str("\"destWell\"").unwrap();
        assert_eq!(loc, BlowoutLocation::DestWell);
        let loc: BlowoutLocation = serde_json::from_str("\"trashId\"").unwrap();
        assert_eq!(loc, BlowoutLocation::Other("trashId".into()));
        assert_eq!(
            serde_json::to_string(&BlowoutLocation::SourceWell).unwrap(),
            "\"sourceWell\""
        );
    }

    #[test]
    fn pause_is_tagged() {
        let json = r#"{"pauseAction": "untilTime", "seconds": 30}"#;
        match serde_json::from_str::<PauseArgs>(json).unwrap() {
            PauseArgs::UntilTime { seconds, message } => {
                assert_eq!(seconds, 30.0);
                assert_eq!(message, None);
            }
            other => panic!("expected UntilTime, got {other:?}"),
        }
    }

    #[test]
    fn per_source_has_no_python_equivalent() {
        assert_eq!(ChangeTip::Once.python_new_tip(), Some("once"));
        assert_eq!(ChangeTip::PerDest.python_new_tip(), None);
    }
}
