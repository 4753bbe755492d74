//! Ambient simulation state shared by every expression in a frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// Global state that is not tied to a particular train.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldState {
    /// Simulation clock, in seconds since midnight.
    pub seconds_since_midnight: f64,
    /// Absolute camera position.
    pub camera_position: Vector3,
    /// Signalling sections of the route.
    pub sections: Vec<SectionState>,
    /// A custom timetable image is currently shown.
    pub custom_timetable_visible: bool,
}

impl WorldState {
    /// The aspect number currently shown by a section, or 0 when the section
    /// or its current aspect does not exist.
    #[must_use]
    pub fn section_aspect(&self, section: usize) -> i32 {
        self.sections
            .get(section)
            .map_or(0, SectionState::current_aspect_number)
    }
}

/// A signalling section and the aspects it can show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SectionState {
    /// Index into `aspects` of the aspect currently shown.
    pub current_aspect: Option<usize>,
    /// Aspect numbers, from most to least restrictive.
    pub aspects: Vec<i32>,
}

impl SectionState {
    /// A section showing `aspects[current]`.
    #[must_use]
    pub fn new(aspects: Vec<i32>, current: usize) -> Self {
        Self {
            current_aspect: Some(current),
            aspects,
        }
    }

    /// The number of the aspect currently shown, or 0 if none.
    #[must_use]
    pub fn current_aspect_number(&self) -> i32 {
        self.current_aspect
            .and_then(|a| self.aspects.get(a).copied())
            .unwrap_or(0)
    }
}
