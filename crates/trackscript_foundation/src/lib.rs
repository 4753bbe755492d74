//! Core types for Trackscript.
//!
//! This crate provides:
//! - [`Error`] - Rich error types with context
//! - [`Vector3`] - World-space coordinates
//! - [`TrainState`] - Read-only snapshot of a train for expressions
//! - [`WorldState`] - Ambient state (clock, camera, signalling sections)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod train;
mod vector;
mod world;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use train::{
    AirBrakeHandle, AxleState, BrakePressures, BrakeType, CarState, DoorSide, DoorState,
    HandleState, SecurityPhase, SecurityState, SecuritySystem, TrainState,
};
pub use vector::Vector3;
pub use world::{SectionState, WorldState};
