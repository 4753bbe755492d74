//! Trackscript - Expression language for animated train and scenery objects
//!
//! This crate re-exports all layers of the Trackscript system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: trackscript_runtime    - REPL, CLI, scenario serialization
//! Layer 1: trackscript_language   - Notation, postfix, optimizer, compiler, VM
//! Layer 0: trackscript_foundation - Errors, geometry, train and world snapshots
//! ```

pub use trackscript_foundation as foundation;
pub use trackscript_language as language;
pub use trackscript_runtime as runtime;
