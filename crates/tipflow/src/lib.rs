//! Tipflow: a liquid-handling protocol compiler.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! tipflow sub-crates. For most users, adding `tipflow` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tipflow::prelude::*;
//!
//! let file = ProtocolFile::from_json(r#"{
//!     "robotType": "OT-3 Standard",
//!     "steps": [
//!         { "stepType": "pause", "pauseAction": "untilTime", "seconds": 60 },
//!         { "stepType": "pause", "pauseAction": "untilResume" }
//!     ]
//! }"#)
//! .unwrap();
//!
//! let timeline = file.compile().unwrap();
//! assert!(timeline.is_ok());
//! assert_eq!(timeline.frames.len(), 2);
//! assert_eq!(timeline.commands().next().map(Command::command_type), Some("waitForDuration"));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tipflow-core` | Ids, commands, errors and warnings, liquid algebra |
//! | [`deck`] | `tipflow-deck` | Robot types, labware and pipette definitions, invariant context |
//! | [`state`] | `tipflow-state` | Robot state and the command reducer |
//! | [`step`] | `tipflow-step` | Command creator trait, atomic creators, the fold |
//! | [`compound`] | `tipflow-compound` | Transfer, consolidate, distribute, mix and module steps |
//! | [`engine`] | `tipflow-engine` | Protocol config, step dispatch and timelines |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids and the liquid-state algebra (`tipflow-core`).
///
/// Contains the [`types::Command`] union, the error and warning taxonomy,
/// and [`types::split_liquid`] / [`types::merge_liquid`].
pub use tipflow_core as types;

/// Deck configuration (`tipflow-deck`).
///
/// [`deck::InvariantContext`] holds everything that does not change during
/// a run: labware definitions, pipettes, modules and additional equipment.
pub use tipflow_deck as deck;

/// Simulated robot state (`tipflow-state`).
pub use tipflow_state as state;

/// Command creators and the short-circuiting fold (`tipflow-step`).
///
/// The [`step::CommandCreator`] trait is the extension point for custom
/// steps; [`step::atomic`] has one creator per robot command.
pub use tipflow_step as step;

/// Compound steps (`tipflow-compound`).
pub use tipflow_compound as compound;

/// Protocol loading and compilation (`tipflow-engine`).
///
/// [`engine::ProtocolConfig`] builds the deck, [`engine::compile_protocol`]
/// turns a step list into an [`engine::Timeline`].
pub use tipflow_engine as engine;

/// Common imports for typical tipflow usage.
///
/// ```rust
/// use tipflow::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tipflow_core::{
        Command, CommandCreatorError, CommandCreatorErrors, CommandCreatorResult,
        CommandCreatorWarning, CommandsAndWarnings, LabwareLocation, LiquidId,
        LocationLiquidState,
    };

    // Deck
    pub use tipflow_deck::{
        AdditionalEquipment, InvariantContext, LabwareDefinition, ModuleEntity, Mount,
        PipetteEntity, RobotType,
    };

    // State
    pub use tipflow_state::{get_next_robot_state_and_warnings, InitialStateBuilder, RobotState};

    // Creators
    pub use tipflow_step::{reduce_command_creators, CommandCreator, Curried, Sequence};

    // Compound steps
    pub use tipflow_compound::{
        ChangeTip, ConsolidateArgs, DistributeArgs, MixArgs, PipettingArgs, TransferArgs,
    };

    // Engine
    pub use tipflow_engine::{
        compile_protocol, ConfigError, ProtocolConfig, ProtocolFile, StepArgs, Timeline,
        TimelineFrame,
    };
}
