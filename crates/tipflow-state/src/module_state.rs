//! Per-module temporal state machines.
//!
//! Each module kind advances its own sub-state independently. The
//! temperature idiom is shared: setting a target always moves to
//! [`TemperatureStatus::ApproachingTarget`], and waiting for a temperature
//! only reaches [`TemperatureStatus::AtTarget`] when the awaited value
//! equals the current target.

use serde::{Deserialize, Serialize};
use tipflow_core::ModuleType;

/// Heating/cooling progress of a temperature-controlled element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureStatus {
    /// Off.
    #[default]
    Deactivated,
    /// Heading for the target.
    ApproachingTarget,
    /// Holding the target.
    AtTarget,
}

/// A temperature-controlled element: a target plus a status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureControl {
    /// Progress.
    pub status: TemperatureStatus,
    /// Target in °C, `None` while deactivated.
    pub target: Option<f64>,
}

impl TemperatureControl {
    /// Start approaching `celsius`, whatever the prior state.
    pub fn set_target(&mut self, celsius: f64) {
        self.status = TemperatureStatus::ApproachingTarget;
        self.target = Some(celsius);
    }

    /// Mark the target reached if `celsius` matches it.
    pub fn await_target(&mut self, celsius: f64) {
        if self.target == Some(celsius) {
            self.status = TemperatureStatus::AtTarget;
        }
    }

    /// Mark the current target reached, whatever it is.
    pub fn await_current(&mut self) {
        if self.target.is_some() {
            self.status = TemperatureStatus::AtTarget;
        }
    }

    /// Turn off.
    pub fn deactivate(&mut self) {
        *self = Self::default();
    }

    /// Whether the element is on.
    pub fn is_active(&self) -> bool {
        self.status != TemperatureStatus::Deactivated
    }
}

/// Temperature module state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureModuleState {
    /// The heating block.
    pub block: TemperatureControl,
}

/// Magnetic module state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagneticModuleState {
    /// Whether the magnets are raised.
    pub engaged: bool,
    /// Height of the raised magnets in mm.
    pub engage_height: Option<f64>,
}

/// Thermocycler state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermocyclerModuleState {
    /// The block.
    pub block: TemperatureControl,
    /// The heated lid.
    pub lid: TemperatureControl,
    /// Lid position, `None` until first set.
    pub lid_open: Option<bool>,
    /// Whether a profile has been started and not yet awaited.
    pub profile_running: bool,
}

/// Heater-shaker state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaterShakerModuleState {
    /// The heater.
    pub heater: TemperatureControl,
    /// Shake speed in rpm, `None` while not shaking.
    pub target_speed: Option<f64>,
    /// Latch position, `None` until first set.
    pub latch_open: Option<bool>,
}

impl HeaterShakerModuleState {
    /// Whether the module is shaking.
    pub fn is_shaking(&self) -> bool {
        self.target_speed.is_some_and(|rpm| rpm > 0.0)
    }
}

/// Module-specific temporal state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModuleState {
    /// Temperature module.
    Temperature(TemperatureModuleState),
    /// Magnetic module.
    Magnetic(MagneticModuleState),
    /// Thermocycler.
    Thermocycler(ThermocyclerModuleState),
    /// Heater-shaker.
    HeaterShaker(HeaterShakerModuleState),
}

impl ModuleState {
    /// The deactivated initial state for a module kind.
    pub fn initial(module_type: ModuleType) -> Self {
        match module_type {
            ModuleType::TemperatureModuleType => Self::Temperature(Default::default()),
            ModuleType::MagneticModuleType => Self::Magnetic(Default::default()),
            ModuleType::ThermocyclerModuleType => Self::Thermocycler(Default::default()),
            ModuleType::HeaterShakerModuleType => Self::HeaterShaker(Default::default()),
        }
    }

    /// The module kind this state belongs to.
    pub fn module_type(&self) -> ModuleType {
        match self {
            Self::Temperature(_) => ModuleType::TemperatureModuleType,
            Self::Magnetic(_) => ModuleType::MagneticModuleType,
            Self::Thermocycler(_) => ModuleType::ThermocyclerModuleType,
            Self::HeaterShaker(_) => ModuleType::HeaterShakerModuleType,
        }
    }
}
