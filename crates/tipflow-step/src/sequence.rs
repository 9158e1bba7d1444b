//! An ordered builder of command creators.
//!
//! Compound operations describe themselves as a [`Sequence`]: a flat list
//! of bound creators appended in execution order, with optional behaviours
//! added through [`Sequence::when`]. The sequence is then folded with
//! [`reduce_command_creators`].

use std::fmt;

use tipflow_core::{CommandCreatorErrors, CommandCreatorResult};
use tipflow_deck::InvariantContext;
use tipflow_state::RobotState;

use crate::creator::{CommandCreator, CreatorFn, Curried};
use crate::reduce::{reduce_command_creators, reduce_with_state, Reduced};

/// Ordered list of bound command creators.
///
/// # Examples
///
/// ```
/// use tipflow_core::WaitForDurationParams;
/// use tipflow_step::{atomic, Sequence};
///
/// let mut seq = Sequence::new();
/// seq.atomic("delay", atomic::delay, WaitForDurationParams { seconds: 1.0, message: None })
///     .when(false, |s| {
///         s.atomic("delay", atomic::delay, WaitForDurationParams { seconds: 2.0, message: None });
///     });
/// assert_eq!(seq.names(), vec!["delay"]);
/// ```
#[derive(Default)]
pub struct Sequence {
    creators: Vec<Box<dyn CommandCreator>>,
}

impl Sequence {
    /// An empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already boxed creator.
    pub fn push(&mut self, creator: Box<dyn CommandCreator>) -> &mut Self {
        self.creators.push(creator);
        self
    }

    /// Append an atomic creator bound to `args`.
    pub fn atomic<A>(&mut self, name: &'static str, f: CreatorFn<A>, args: A) -> &mut Self
    where
        A: Send + Sync + 'static,
    {
        self.push(Box::new(Curried::atomic(name, f, args)))
    }

    /// Append a compound creator bound to `args`.
    pub fn compound<A>(&mut self, name: &'static str, f: CreatorFn<A>, args: A) -> &mut Self
    where
        A: Send + Sync + 'static,
    {
        self.push(Box::new(Curried::compound(name, f, args)))
    }

    /// Run `build` against this sequence only when `condition` holds.
    pub fn when(&mut self, condition: bool, build: impl FnOnce(&mut Self)) -> &mut Self {
        if condition {
            build(self);
        }
        self
    }

    /// Append every creator of another sequence.
    pub fn extend(&mut self, other: Sequence) -> &mut Self {
        self.creators.extend(other.creators);
        self
    }

    /// Number of creators.
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    /// Whether the sequence holds no creators.
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    /// Names of the creators, in order.
    pub fn names(&self) -> Vec<&str> {
        self.creators.iter().map(|c| c.name()).collect()
    }

    /// The creators, in order.
    pub fn creators(&self) -> &[Box<dyn CommandCreator>] {
        &self.creators
    }

    /// Consume the builder.
    pub fn into_creators(self) -> Vec<Box<dyn CommandCreator>> {
        self.creators
    }

    /// Fold the sequence over `prev`.
    pub fn reduce(&self, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
        reduce_command_creators(&self.creators, ctx, prev)
    }

    /// Fold the sequence over `prev`, keeping the final state.
    pub fn reduce_with_state(
        &self,
        ctx: &InvariantContext,
        prev: &RobotState,
    ) -> Result<Reduced, CommandCreatorErrors> {
        reduce_with_state(&self.creators, ctx, prev)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl From<Vec<Box<dyn CommandCreator>>> for Sequence {
    fn from(creators: Vec<Box<dyn CommandCreator>>) -> Self {
        Self { creators }
    }
}
