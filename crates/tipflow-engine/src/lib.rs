//! Protocol compilation for tipflow.
//!
//! The engine ties the lower crates together. A [`ProtocolConfig`]
//! describes the deck and builds the invariant context and initial state;
//! a list of [`StepArgs`] is compiled by [`compile_protocol`] into a
//! [`Timeline`] of per-step frames. [`ProtocolFile`] bundles both for
//! callers that load a single JSON document.
//!
//! # Example
//!
//! ```
//! use tipflow_engine::ProtocolFile;
//!
//! let file = ProtocolFile::from_json(r#"{
//!     "robotType": "OT-2 Standard",
//!     "steps": [
//!         { "stepType": "pause", "pauseAction": "untilResume", "message": "swap plates" }
//!     ]
//! }"#)
//! .unwrap();
//! let timeline = file.compile().unwrap();
//! assert!(timeline.is_ok());
//! assert_eq!(timeline.commands().count(), 1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod protocol;
pub mod step;
pub mod timeline;

pub use config::{
    ConfigError, LabwareConfig, LiquidPlacement, ModuleConfig, PipetteConfig, ProtocolConfig,
};
pub use protocol::ProtocolFile;
pub use step::StepArgs;
pub use timeline::{compile_protocol, StepFailure, Timeline, TimelineFrame};
