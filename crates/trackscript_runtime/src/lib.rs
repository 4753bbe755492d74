//! REPL, CLI, and scenario serialization for Trackscript.
//!
//! This crate provides:
//! - [`Session`] - A scenario with bound scripts that can be ticked
//! - [`Repl`] - Interactive read-eval-print loop
//! - [`serialize`] - Scenario snapshots in `MessagePack`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod editor;
mod highlight;
mod repl;
pub mod serialize;
mod session;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use highlight::TrackscriptHighlighter;
pub use repl::Repl;
pub use session::{DEFAULT_CAR_LENGTH, LineReport, MAX_COUNT, SCENARIO_FIELDS, Scenario, Session};
