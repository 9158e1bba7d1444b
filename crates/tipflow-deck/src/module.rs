//! Hardware module entities.

use serde::{Deserialize, Serialize};
use tipflow_core::{ModuleId, ModuleType};

/// A hardware module registered in a protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntity {
    /// Entity id.
    pub id: ModuleId,
    /// Module kind.
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    /// Model string, e.g. `temperatureModuleV2`.
    pub model: String,
    /// Variable name in generated Python source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_name: Option<String>,
}

impl ModuleEntity {
    /// Whether this is a first-generation module model.
    pub fn is_gen1(&self) -> bool {
        self.model.ends_with("V1")
    }
}
