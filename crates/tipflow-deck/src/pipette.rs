//! Pipette specifications and entities.

use serde::{Deserialize, Serialize};
use tipflow_core::{PipetteId, Volume};

use crate::error::DeckError;

/// Hardware generation, which affects collision rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PipetteGeneration {
    /// First-generation OT-2 pipette.
    Gen1,
    /// Second-generation OT-2 pipette.
    #[default]
    Gen2,
    /// Flex pipette.
    Flex,
}

/// Which side of the gantry a pipette is mounted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mount {
    /// Left mount.
    Left,
    /// Right mount.
    Right,
}

/// Static pipette capabilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipetteSpec {
    /// Model name, e.g. `p300_single_gen2`.
    pub name: String,
    /// Number of channels: 1, 8 or 96.
    pub channels: usize,
    /// Smallest accurate volume in µL.
    pub min_volume: Volume,
    /// Nominal maximum volume in µL.
    pub max_volume: Volume,
    /// Hardware generation.
    #[serde(default)]
    pub generation: PipetteGeneration,
    /// Default aspirate flow rate in µL/s.
    pub default_aspirate_flow_rate: f64,
    /// Default dispense flow rate in µL/s.
    pub default_dispense_flow_rate: f64,
    /// Default blow-out flow rate in µL/s.
    pub default_blow_out_flow_rate: f64,
}

impl PipetteSpec {
    /// Whether this is a multi-channel pipette.
    pub fn is_multi_channel(&self) -> bool {
        self.channels > 1
    }
}

/// A pipette registered in a protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipetteEntity {
    /// Entity id.
    pub id: PipetteId,
    /// Capabilities.
    pub spec: PipetteSpec,
    /// Definition URIs of the tipracks this pipette may use.
    pub tiprack_def_uris: Vec<String>,
    /// Variable name in generated Python source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_name: Option<String>,
}

impl PipetteEntity {
    pub(crate) fn validate(&self) -> Result<(), DeckError> {
        let invalid = |reason: &str| DeckError::InvalidPipette {
            id: self.id.to_string(),
            reason: reason.to_string(),
        };
        if !matches!(self.spec.channels, 1 | 8 | 96) {
            return Err(invalid("channels must be 1, 8 or 96"));
        }
        if self.spec.min_volume < 0.0 || self.spec.max_volume <= 0.0 {
            return Err(invalid("volumes must be positive"));
        }
        if self.spec.min_volume > self.spec.max_volume {
            return Err(invalid("min volume exceeds max volume"));
        }
        Ok(())
    }
}
