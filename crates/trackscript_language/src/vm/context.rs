//! Evaluation inputs for VM execution.
//!
//! Every call to the VM receives an [`EvalContext`] describing the object
//! being animated: the train it belongs to (if any), where it is, and how
//! much time has passed since its previous evaluation. Ambient state shared
//! by every object in a frame is read through the [`VmContext`] trait.

use trackscript_foundation::{TrainState, Vector3, WorldState};

// =============================================================================
// EvalContext
// =============================================================================

/// Per-call inputs of one evaluation.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvalContext<'a> {
    /// The train the evaluated object belongs to, if any.
    pub train: Option<&'a TrainState>,
    /// World position of the evaluated object.
    pub position: Vector3,
    /// Track position of the evaluated object, in meters.
    pub track_position: f64,
    /// Signalling section the object reflects, if any.
    pub section: Option<usize>,
    /// Seconds since the previous evaluation of this object.
    pub time_elapsed: f64,
}

impl<'a> EvalContext<'a> {
    /// An evaluation bound to a train.
    #[must_use]
    pub fn for_train(train: &'a TrainState) -> Self {
        Self {
            train: Some(train),
            ..Self::default()
        }
    }

    /// Sets the world position.
    #[must_use]
    pub fn at(mut self, position: Vector3) -> Self {
        self.position = position;
        self
    }

    /// Sets the track position.
    #[must_use]
    pub fn on_track(mut self, track_position: f64) -> Self {
        self.track_position = track_position;
        self
    }

    /// Sets the signalling section.
    #[must_use]
    pub fn in_section(mut self, section: usize) -> Self {
        self.section = Some(section);
        self
    }

    /// Sets the elapsed time.
    #[must_use]
    pub fn after(mut self, time_elapsed: f64) -> Self {
        self.time_elapsed = time_elapsed;
        self
    }
}

// =============================================================================
// VmContext Trait
// =============================================================================

/// Provides read-only ambient state for VM execution.
///
/// Implement this trait to let expressions observe the simulation clock,
/// the camera, signalling, and the timetable display.
pub trait VmContext {
    /// Simulation clock, in seconds since midnight.
    fn seconds_since_midnight(&self) -> f64;

    /// Absolute camera position.
    fn camera_position(&self) -> Vector3;

    /// Aspect number currently shown by a section, or 0 if the section or
    /// its aspect does not exist.
    fn section_aspect_number(&self, section: usize) -> i32;

    /// Whether a custom timetable image is shown.
    fn custom_timetable_visible(&self) -> bool;
}

impl VmContext for WorldState {
    fn seconds_since_midnight(&self) -> f64 {
        self.seconds_since_midnight
    }

    fn camera_position(&self) -> Vector3 {
        self.camera_position
    }

    fn section_aspect_number(&self, section: usize) -> i32 {
        self.section_aspect(section)
    }

    fn custom_timetable_visible(&self) -> bool {
        self.custom_timetable_visible
    }
}

// =============================================================================
// NoContext (for evaluation without a world)
// =============================================================================

/// A world at midnight with the camera at the origin and no sections.
///
/// Used internally when executing without a world context.
pub(crate) struct NoContext;

impl VmContext for NoContext {
    fn seconds_since_midnight(&self) -> f64 {
        0.0
    }

    fn camera_position(&self) -> Vector3 {
        Vector3::ZERO
    }

    fn section_aspect_number(&self, _section: usize) -> i32 {
        0
    }

    fn custom_timetable_visible(&self) -> bool {
        false
    }
}
