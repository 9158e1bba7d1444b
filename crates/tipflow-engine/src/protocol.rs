//! A whole protocol document: deck configuration plus ordered steps.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::{ConfigError, ProtocolConfig};
use crate::step::StepArgs;
use crate::timeline::{compile_protocol, Timeline};

/// A deck and the steps to run on it.
///
/// On the wire the config fields sit at the top level next to `steps`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolFile {
    /// Deck and starting state.
    #[serde(flatten)]
    pub config: ProtocolConfig,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepArgs>,
}

impl ProtocolFile {
    /// Parse a protocol document from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the deck, then compile every step.
    ///
    /// Configuration problems are returned as `Err`; step problems end up
    /// in [`Timeline::error`].
    #[instrument(skip_all, fields(robot = ?self.config.robot_type, steps = self.steps.len()))]
    pub fn compile(&self) -> Result<Timeline, ConfigError> {
        let (ctx, initial) = self.config.build()?;
        Ok(compile_protocol(&self.steps, &ctx, &initial))
    }
}
