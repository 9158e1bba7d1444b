//! The [`CommandCreator`] trait and curried creators.
//!
//! A command creator is an operation bound to its arguments but not yet
//! run against a particular robot state. Creators are stateless: given the
//! same context and state they return the same result, so a list of them
//! can be folded, replayed or re-simulated from any prefix.

use std::fmt;

use tipflow_core::CommandCreatorResult;
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;

/// Signature shared by every atomic and compound creator function.
pub type CreatorFn<A> = fn(&A, &InvariantContext, &RobotState) -> CommandCreatorResult;

/// An operation with its arguments bound, deferring context and state.
///
/// # Contract
///
/// - `create()` MUST be deterministic and MUST NOT mutate anything.
/// - A successful result's commands, applied to `prev` with the state
///   reducer, give the state the next creator sees.
///
/// # Object safety
///
/// This trait is object-safe; sequences store creators as
/// `Vec<Box<dyn CommandCreator>>`.
///
/// # Examples
///
/// A creator that always waits one second:
///
/// ```
/// use tipflow_core::{Command, CommandCreatorResult, CommandsAndWarnings, WaitForDurationParams};
/// use tipflow_deck::InvariantContext;
/// use tipflow_state::RobotState;
/// use tipflow_step::CommandCreator;
///
/// struct OneSecond;
///
/// impl CommandCreator for OneSecond {
///     fn name(&self) -> &str { "one_second" }
///
///     fn create(&self, _: &InvariantContext, _: &RobotState) -> CommandCreatorResult {
///         Ok(CommandsAndWarnings::single(Command::WaitForDuration(WaitForDurationParams {
///             seconds: 1.0,
///             message: None,
///         })))
///     }
/// }
///
/// assert_eq!(OneSecond.name(), "one_second");
/// ```
pub trait CommandCreator: Send + Sync {
    /// Human-readable name for logging and error reporting.
    fn name(&self) -> &str;

    /// Whether this creator folds its own sub-creators, so its warnings
    /// already include those raised by the state reducer.
    ///
    /// Default: `false`.
    fn is_compound(&self) -> bool {
        false
    }

    /// Run against a context and the state before this creator.
    fn create(&self, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult;
}

/// A creator function paired with its arguments.
pub struct Curried<A> {
    name: &'static str,
    f: CreatorFn<A>,
    args: A,
    compound: bool,
}

impl<A> Curried<A> {
    /// Bind arguments to an atomic creator.
    pub fn atomic(name: &'static str, f: CreatorFn<A>, args: A) -> Self {
        Self {
            name,
            f,
            args,
            compound: false,
        }
    }

    /// Bind arguments to a compound creator.
    pub fn compound(name: &'static str, f: CreatorFn<A>, args: A) -> Self {
        Self {
            name,
            f,
            args,
            compound: true,
        }
    }

    /// The bound arguments.
    pub fn args(&self) -> &A {
        &self.args
    }
}

impl<A: fmt::Debug> fmt::Debug for Curried<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curried")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("compound", &self.compound)
            .finish()
    }
}

impl<A: Send + Sync> CommandCreator for Curried<A> {
    fn name(&self) -> &str {
        self.name
    }

    fn is_compound(&self) -> bool {
        self.compound
    }

    fn create(&self, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
        (self.f)(&self.args, ctx, prev)
    }
}

/// Bind `args` to an atomic creator function, boxed for use in a sequence.
pub fn curry_command_creator<A>(
    name: &'static str,
    f: CreatorFn<A>,
    args: A,
) -> Box<dyn CommandCreator>
where
    A: Send + Sync + 'static,
{
    Box::new(Curried::atomic(name, f, args))
}
