//! Delays and operator pauses.

use tipflow_core::{
    Command, CommandCreatorError, CommandCreatorResult, CommandsAndWarnings,
    WaitForDurationParams, WaitForResumeParams,
};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;

use crate::python;

/// Wait for a fixed number of seconds.
pub fn delay(
    args: &WaitForDurationParams,
    _ctx: &InvariantContext,
    _prev: &RobotState,
) -> CommandCreatorResult {
    if !args.seconds.is_finite() || args.seconds < 0.0 {
        return Err(CommandCreatorError::InvalidStepArgs {
            reason: format!("delay of {} seconds", args.seconds),
        }
        .into());
    }
    let fragment = match &args.message {
        Some(msg) => format!(
            "protocol.delay(seconds={}, msg={})",
            python::number(args.seconds),
            python::string(msg)
        ),
        None => format!("protocol.delay(seconds={})", python::number(args.seconds)),
    };
    Ok(CommandsAndWarnings::single(Command::WaitForDuration(args.clone())).with_python(fragment))
}

/// Pause until the operator resumes the run.
pub fn pause(
    args: &WaitForResumeParams,
    _ctx: &InvariantContext,
    _prev: &RobotState,
) -> CommandCreatorResult {
    let fragment = match &args.message {
        Some(msg) => format!("protocol.pause({})", python::string(msg)),
        None => "protocol.pause()".to_string(),
    };
    Ok(CommandsAndWarnings::single(Command::WaitForResume(args.clone())).with_python(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipflow_test_utils::fixtures::*;

    #[test]
    fn delay_renders_seconds() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let out = delay(
            &WaitForDurationParams {
                seconds: 90.0,
                message: None,
            },
            &ctx,
            &state,
        )
        .unwrap();
        assert_eq!(out.commands.len(), 1);
        assert_eq!(out.python.as_deref(), Some("protocol.delay(seconds=90)"));
    }

    #[test]
    fn negative_delay_is_invalid() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let errors = delay(
            &WaitForDurationParams {
                seconds: -1.0,
                message: None,
            },
            &ctx,
            &state,
        )
        .unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_STEP_ARGS"]);
    }

    #[test]
    fn pause_quotes_message() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let out = pause(
            &WaitForResumeParams {
                message: Some("swap plates".into()),
            },
            &ctx,
            &state,
        )
        .unwrap();
        match &out.commands[..] {
            [Command::WaitForResume(p)] => assert_eq!(p.message.as_deref(), Some("swap plates")),
            other => panic!("expected waitForResume, got {other:?}"),
        }
        assert_eq!(out.python.as_deref(), Some("protocol.pause(\"swap plates\")"));
    }
}
