//! Hardware module kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a hardware module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleType {
    /// Temperature module (heats or cools a block).
    TemperatureModuleType,
    /// Magnetic module (raises magnets under a plate).
    MagneticModuleType,
    /// Thermocycler (block and heated lid).
    ThermocyclerModuleType,
    /// Heater-shaker (heats and orbitally shakes, with a labware latch).
    HeaterShakerModuleType,
}

impl ModuleType {
    /// Stable wire name of this module type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TemperatureModuleType => "temperatureModuleType",
            Self::MagneticModuleType => "magneticModuleType",
            Self::ThermocyclerModuleType => "thermocyclerModuleType",
            Self::HeaterShakerModuleType => "heaterShakerModuleType",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
