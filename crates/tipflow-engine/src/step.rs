//! Protocol steps and their dispatch to command creators.

use serde::{Deserialize, Serialize};
use tipflow_compound::{
    consolidate, distribute, heater_shaker_step, magnet_step, mix, move_labware_step, pause_step,
    temperature_step, thermocycler_profile_step, thermocycler_state_step, transfer,
    ConsolidateArgs, DistributeArgs, HeaterShakerArgs, MagnetStepArgs, MixArgs,
    MoveLabwareStepArgs, PauseArgs, TemperatureStepArgs, ThermocyclerProfileArgs,
    ThermocyclerStateArgs, TransferArgs,
};
use tipflow_step::{CommandCreator, Curried};

/// One protocol step, tagged by `stepType` on the wire.
///
/// # Examples
///
/// ```
/// use tipflow_engine::StepArgs;
///
/// let step: StepArgs = serde_json::from_str(
///     r#"{ "stepType": "pause", "pauseAction": "untilTime", "seconds": 30 }"#,
/// )
/// .unwrap();
/// assert_eq!(step.kind(), "pause");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stepType", rename_all = "camelCase")]
pub enum StepArgs {
    /// Paired source-to-destination transfer.
    Transfer(TransferArgs),
    /// Many sources into one destination.
    Consolidate(ConsolidateArgs),
    /// One source into many destinations.
    Distribute(DistributeArgs),
    /// Mix in place.
    Mix(MixArgs),
    /// Temperature module target.
    Temperature(TemperatureStepArgs),
    /// Magnetic module engage height.
    Magnet(MagnetStepArgs),
    /// Thermocycler held state.
    ThermocyclerState(ThermocyclerStateArgs),
    /// Thermocycler profile run.
    ThermocyclerProfile(ThermocyclerProfileArgs),
    /// Heater-shaker state and timer.
    HeaterShaker(HeaterShakerArgs),
    /// Pause or delay.
    Pause(PauseArgs),
    /// Move a labware.
    MoveLabware(MoveLabwareStepArgs),
}

impl StepArgs {
    /// Stable name of the step kind, as on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer(_) => "transfer",
            Self::Consolidate(_) => "consolidate",
            Self::Distribute(_) => "distribute",
            Self::Mix(_) => "mix",
            Self::Temperature(_) => "temperature",
            Self::Magnet(_) => "magnet",
            Self::ThermocyclerState(_) => "thermocyclerState",
            Self::ThermocyclerProfile(_) => "thermocyclerProfile",
            Self::HeaterShaker(_) => "heaterShaker",
            Self::Pause(_) => "pause",
            Self::MoveLabware(_) => "moveLabware",
        }
    }

    /// The creator that compiles this step.
    ///
    /// Pause and labware moves are a single atomic command, so they are
    /// bound as atomic creators and the state reducer's warnings are kept.
    pub fn creator(&self) -> Box<dyn CommandCreator> {
        let name = self.kind();
        match self.clone() {
            Self::Transfer(a) => Box::new(Curried::compound(name, transfer, a)),
            Self::Consolidate(a) => Box::new(Curried::compound(name, consolidate, a)),
            Self::Distribute(a) => Box::new(Curried::compound(name, distribute, a)),
            Self::Mix(a) => Box::new(Curried::compound(name, mix, a)),
            Self::Temperature(a) => Box::new(Curried::compound(name, temperature_step, a)),
            Self::Magnet(a) => Box::new(Curried::compound(name, magnet_step, a)),
            Self::ThermocyclerState(a) => {
                Box::new(Curried::compound(name, thermocycler_state_step, a))
            }
            Self::ThermocyclerProfile(a) => {
                Box::new(Curried::compound(name, thermocycler_profile_step, a))
            }
            Self::HeaterShaker(a) => Box::new(Curried::compound(name, heater_shaker_step, a)),
            Self::Pause(a) => Box::new(Curried::atomic(name, pause_step, a)),
            Self::MoveLabware(a) => Box::new(Curried::atomic(name, move_labware_step, a)),
        }
    }
}
