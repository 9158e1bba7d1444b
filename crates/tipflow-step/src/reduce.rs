//! Folding a list of command creators over the robot state.

use tipflow_core::{CommandCreatorErrors, CommandCreatorResult, CommandsAndWarnings};
use tipflow_deck::InvariantContext;
use tipflow_state::{get_next_robot_state_and_warnings, RobotState};
use tracing::{debug, trace};

use crate::creator::CommandCreator;

/// Output of [`reduce_with_state`]: the combined result and the state it
/// leaves the robot in.
#[derive(Clone, Debug, PartialEq)]
pub struct Reduced {
    /// Commands, warnings and text fragment of the whole sequence.
    pub result: CommandsAndWarnings,
    /// State after every command.
    pub robot_state: RobotState,
}

/// Run `creators` left to right, threading state.
///
/// Stops at the first creator that fails and returns only its errors; no
/// command from the failed creator or any later one is returned. On
/// success the commands are concatenated and the warnings of each creator
/// are followed by the warnings the state reducer raised for its commands.
///
/// The text fragment is the newline-joined fragments of every creator that
/// emitted commands, or `None` if any of those creators produced none. An
/// empty fragment marks commands whose Python equivalent is folded into a
/// neighbouring call (a blocking `set_block_temperature` covers the wait
/// that follows it).
pub fn reduce_command_creators(
    creators: &[Box<dyn CommandCreator>],
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    reduce_with_state(creators, ctx, prev).map(|r| r.result)
}

/// [`reduce_command_creators`], also returning the final state.
pub fn reduce_with_state(
    creators: &[Box<dyn CommandCreator>],
    ctx: &InvariantContext,
    prev: &RobotState,
) -> Result<Reduced, CommandCreatorErrors> {
    let mut state = prev.clone();
    let mut out = CommandsAndWarnings::empty();
    let mut fragments: Vec<String> = Vec::new();
    let mut fragments_complete = true;

    for (index, creator) in creators.iter().enumerate() {
        let next = match creator.create(ctx, &state) {
            Ok(next) => next,
            Err(errors) => {
                debug!(
                    index,
                    creator = creator.name(),
                    kinds = ?errors.kinds(),
                    "command creator failed; short-circuiting"
                );
                return Err(errors);
            }
        };
        trace!(
            index,
            creator = creator.name(),
            commands = next.commands.len(),
            "command creator succeeded"
        );

        let updated = get_next_robot_state_and_warnings(&next.commands, ctx, &state);
        state = updated.robot_state;

        if !next.commands.is_empty() {
            match next.python {
                Some(fragment) if fragment.is_empty() => {}
                Some(fragment) => fragments.push(fragment),
                None => fragments_complete = false,
            }
        }
        out.commands.extend(next.commands);
        out.warnings.extend(next.warnings);
        if !creator.is_compound() {
            out.warnings.extend(updated.warnings);
        }
    }

    if fragments_complete && !fragments.is_empty() {
        out.python = Some(fragments.join("\n"));
    }
    Ok(Reduced {
        result: out,
        robot_state: state,
    })
}
