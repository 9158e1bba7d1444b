//! Command creators for tipflow.
//!
//! A command creator turns bound arguments plus a robot state into a
//! short list of robot commands, or a list of errors. Creators compose by
//! folding: each one sees the state its predecessors produced.
//!
//! - [`CommandCreator`] and [`curry_command_creator`]: the creator trait and
//!   its function-pointer implementation
//! - [`Sequence`]: an ordered list of curried creators
//! - [`reduce_command_creators`]: the short-circuiting fold
//! - [`atomic`]: one creator per primitive robot action
//! - [`hazards`]: module and deck access checks shared by creators
//! - [`python`]: Python API source fragments

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod atomic;
pub mod creator;
pub mod hazards;
pub mod python;
pub mod reduce;
pub mod sequence;

pub use creator::{curry_command_creator, CommandCreator, CreatorFn, Curried};
pub use reduce::{reduce_command_creators, reduce_with_state, Reduced};
pub use sequence::Sequence;
