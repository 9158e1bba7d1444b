//! Output of a command creator.

use serde::Serialize;

use crate::command::Command;
use crate::error::{CommandCreatorError, CommandCreatorErrors, CommandCreatorWarning};

/// Commands emitted by a successful command creator, plus any advisories.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommandsAndWarnings {
    /// Emitted commands, in execution order.
    pub commands: Vec<Command>,
    /// Non-fatal advisories raised while creating them.
    pub warnings: Vec<CommandCreatorWarning>,
    /// Equivalent Python API source, when every contributor produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
}

impl CommandsAndWarnings {
    /// No commands, no warnings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single command with no warnings.
    pub fn single(command: Command) -> Self {
        Self {
            commands: vec![command],
            ..Self::default()
        }
    }

    /// Several commands with no warnings.
    pub fn from_commands(commands: Vec<Command>) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<CommandCreatorWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Attach a Python fragment.
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = Some(python.into());
        self
    }
}

/// Result of invoking a command creator.
pub type CommandCreatorResult = Result<CommandsAndWarnings, CommandCreatorErrors>;

/// Shorthand for failing with a single error.
pub fn fail(error: CommandCreatorError) -> CommandCreatorResult {
    Err(CommandCreatorErrors::single(error))
}
