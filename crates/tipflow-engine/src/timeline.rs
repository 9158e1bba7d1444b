//! Step-by-step protocol compilation.
//!
//! [`compile_protocol`] folds an ordered step list over the robot state.
//! Each successful step contributes one [`TimelineFrame`] holding the
//! commands it emitted, its warnings and the state it left behind. The
//! first failing step ends compilation; the frames before it are kept so
//! callers can show how far the protocol got.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use tipflow_core::{Command, CommandCreatorErrors, CommandCreatorWarning};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;
use tipflow_step::reduce_with_state;

use crate::step::StepArgs;

/// The outcome of one successfully compiled step.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineFrame {
    /// Position of the step in the protocol.
    pub step_index: usize,
    /// [`StepArgs::kind`] of the step.
    pub step_kind: &'static str,
    /// Commands the step emitted.
    pub commands: Vec<Command>,
    /// Warnings the step raised.
    pub warnings: Vec<CommandCreatorWarning>,
    /// Python API source for the step, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    /// Robot state after the step.
    pub robot_state: RobotState,
}

/// The step compilation stopped at.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailure {
    /// Position of the failing step.
    pub step_index: usize,
    /// [`StepArgs::kind`] of the failing step.
    pub step_kind: &'static str,
    /// Why it failed.
    pub errors: CommandCreatorErrors,
}

/// Frames for every compiled step, plus the failure if one occurred.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// One frame per successful step, in order.
    pub frames: Vec<TimelineFrame>,
    /// Set when a step failed; no frames follow it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
}

impl Timeline {
    /// Whether every step compiled.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// All commands of all frames, in order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.frames.iter().flat_map(|f| f.commands.iter())
    }

    /// All warnings of all frames, in order.
    pub fn warnings(&self) -> impl Iterator<Item = &CommandCreatorWarning> {
        self.frames.iter().flat_map(|f| f.warnings.iter())
    }

    /// State after the last compiled step, if any step compiled.
    pub fn final_state(&self) -> Option<&RobotState> {
        self.frames.last().map(|f| &f.robot_state)
    }

    /// Python source for the whole protocol.
    ///
    /// `None` if any frame that emitted commands has no Python equivalent.
    pub fn python(&self) -> Option<String> {
        let mut lines = Vec::new();
        for frame in &self.frames {
            match &frame.python {
                Some(p) if p.is_empty() => {}
                Some(p) => lines.push(p.as_str()),
                None if frame.commands.is_empty() => {}
                None => return None,
            }
        }
        Some(lines.join("\n"))
    }
}

/// Compile `steps` in order, starting from `initial`.
///
/// Never panics on bad input: an invalid step ends the timeline with a
/// [`StepFailure`] carrying its index and errors.
#[instrument(skip_all, fields(steps = steps.len()))]
pub fn compile_protocol(
    steps: &[StepArgs],
    ctx: &InvariantContext,
    initial: &RobotState,
) -> Timeline {
    let mut frames = Vec::with_capacity(steps.len());
    let mut state = initial.clone();

    for (step_index, step) in steps.iter().enumerate() {
        let step_kind = step.kind();
        match reduce_with_state(&[step.creator()], ctx, &state) {
            Ok(reduced) => {
                debug!(
                    step_index,
                    step_kind,
                    commands = reduced.result.commands.len(),
                    warnings = reduced.result.warnings.len(),
                    "step compiled"
                );
                state = reduced.robot_state;
                frames.push(TimelineFrame {
                    step_index,
                    step_kind,
                    commands: reduced.result.commands,
                    warnings: reduced.result.warnings,
                    python: reduced.result.python,
                    robot_state: state.clone(),
                });
            }
            Err(errors) => {
                warn!(step_index, step_kind, kinds = ?errors.kinds(), "step failed");
                return Timeline {
                    frames,
                    error: Some(StepFailure {
                        step_index,
                        step_kind,
                        errors,
                    }),
                };
            }
        }
    }

    info!(frames = frames.len(), "protocol compiled");
    Timeline {
        frames,
        error: None,
    }
}
