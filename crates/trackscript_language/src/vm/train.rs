//! Train queries for the VM.
//!
//! Each query reads a [`TrainState`] snapshot. The VM only calls them when
//! a train is bound; without one every query yields 0.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use trackscript_foundation::{
    CarState, DoorSide, SecurityPhase, SecuritySystem, TrainState, Vector3,
};

use super::math::truth;

// =============================================================================
// Position
// =============================================================================

/// Resolves a car index from a stack value.
///
/// The value is rounded half to even and negative indices count from the
/// rear. `None` when the result is out of range.
pub(crate) fn car_index(train: &TrainState, value: f64) -> Option<usize> {
    let count = train.cars.len() as i64;
    let mut j = value.round_ties_even() as i64;
    if j < 0 {
        j += count;
    }
    usize::try_from(j).ok().filter(|&j| j < train.cars.len())
}

fn car(train: &TrainState, value: f64) -> Option<&CarState> {
    car_index(train, value).map(|j| &train.cars[j])
}

/// Distance from `position` to the nearest axle of the train.
pub(crate) fn distance(train: &TrainState, position: Vector3) -> f64 {
    train
        .cars
        .iter()
        .flat_map(|car| [car.front_axle, car.rear_axle])
        .map(|axle| axle.world_position.distance_squared_to(position))
        .reduce(f64::min)
        .map_or(0.0, f64::sqrt)
}

/// Distance from `position` to the center of a car.
pub(crate) fn distance_to_car(train: &TrainState, value: f64, position: Vector3) -> f64 {
    car(train, value).map_or(0.0, |car| car.center().distance_to(position))
}

/// Track distance from the nearest end of the train, 0 alongside it.
///
/// Positive ahead of the train, negative behind it.
pub(crate) fn track_distance(train: &TrainState, track_position: f64) -> f64 {
    let (Some(first), Some(last)) = (train.cars.first(), train.cars.last()) else {
        return 0.0;
    };
    let front =
        first.front_axle.track_position - first.front_axle_offset + 0.5 * first.length;
    let rear = last.rear_axle.track_position - last.rear_axle_offset - 0.5 * last.length;
    if track_position > front {
        track_position - front
    } else if track_position < rear {
        track_position - rear
    } else {
        0.0
    }
}

/// Track distance from the center of a car.
pub(crate) fn track_distance_to_car(train: &TrainState, value: f64, track_position: f64) -> f64 {
    car(train, value).map_or(0.0, |car| track_position - car.track_center())
}

// =============================================================================
// Doors
// =============================================================================

fn most_open(car: &CarState, side: Option<DoorSide>) -> f64 {
    car.doors
        .iter()
        .filter(|door| side.is_none_or(|side| door.side == side))
        .map(|door| door.state)
        .fold(0.0, f64::max)
}

/// Most open door of the train, optionally restricted to one side.
pub(crate) fn doors(train: &TrainState, side: Option<DoorSide>) -> f64 {
    train
        .cars
        .iter()
        .map(|car| most_open(car, side))
        .fold(0.0, f64::max)
}

/// Most open door of a car, optionally restricted to one side.
pub(crate) fn doors_of_car(train: &TrainState, value: f64, side: Option<DoorSide>) -> f64 {
    car(train, value).map_or(0.0, |car| most_open(car, side))
}

fn anticipated(car: &CarState, side: DoorSide) -> bool {
    match side {
        DoorSide::Left => car.anticipated_left_doors_opened,
        DoorSide::Right => car.anticipated_right_doors_opened,
    }
}

/// Whether any car expects the doors on `side` to open.
pub(crate) fn doors_target(train: &TrainState, side: DoorSide) -> f64 {
    truth(train.cars.iter().any(|car| anticipated(car, side)))
}

/// Whether a car expects the doors on `side` to open.
pub(crate) fn doors_target_of_car(train: &TrainState, value: f64, side: DoorSide) -> f64 {
    car(train, value).map_or(0.0, |car| truth(anticipated(car, side)))
}

// =============================================================================
// Handles
// =============================================================================

/// Brake notch, or the air brake handle position on air-braked trains.
pub(crate) fn brake_notch(train: &TrainState) -> f64 {
    if train.has_air_brake() {
        train.handles.air_brake_handle.notch()
    } else {
        f64::from(train.handles.brake_notch)
    }
}

/// Highest brake notch.
pub(crate) fn brake_notches(train: &TrainState) -> f64 {
    if train.has_air_brake() {
        2.0
    } else {
        f64::from(train.handles.max_brake_notch)
    }
}

/// Brake notch on a single scale covering hold brake and emergency.
///
/// Hold brake takes position 1 and shifts the service notches up by one;
/// emergency is the position after the highest notch.
pub(crate) fn brake_notch_linear(train: &TrainState) -> f64 {
    let handles = &train.handles;
    if train.has_air_brake() {
        if handles.emergency_brake {
            3.0
        } else {
            handles.air_brake_handle.notch()
        }
    } else if handles.has_hold_brake {
        if handles.emergency_brake {
            f64::from(handles.max_brake_notch) + 2.0
        } else if handles.brake_notch > 0 {
            f64::from(handles.brake_notch) + 1.0
        } else {
            truth(handles.hold_brake)
        }
    } else if handles.emergency_brake {
        f64::from(handles.max_brake_notch) + 1.0
    } else {
        f64::from(handles.brake_notch)
    }
}

/// Highest position of [`brake_notch_linear`].
pub(crate) fn brake_notches_linear(train: &TrainState) -> f64 {
    let handles = &train.handles;
    if train.has_air_brake() {
        3.0
    } else if handles.has_hold_brake {
        f64::from(handles.max_brake_notch) + 2.0
    } else {
        f64::from(handles.max_brake_notch) + 1.0
    }
}

// =============================================================================
// Security
// =============================================================================

/// ATC speed restriction bands, in m/s, for the speedometer indicator.
const ATC_SPEED_BANDS: [f64; 10] = [
    4.1666, 6.9443, 12.4999, 15.2777, 18.0555, 20.8333, 24.9999, 27.7777, 30.5555, 33.3333,
];

/// Protection panel value `n`.
///
/// Plugin trains publish their own panel. Built-in systems expose fixed
/// indicators at 256 through 271; everything else reads 0.
pub(crate) fn plugin_state(train: &TrainState, value: f64, seconds_since_midnight: f64) -> f64 {
    let security = &train.security;
    let n = value.round_ties_even();
    if security.system == SecuritySystem::Plugin {
        return if n >= 0.0 {
            security
                .plugin_panel
                .get(n as usize)
                .map_or(0.0, |&v| f64::from(v))
        } else {
            0.0
        };
    }

    let system = security.system;
    let phase = security.phase;
    let braking = matches!(
        phase,
        SecurityPhase::Emergency | SecurityPhase::Pattern | SecurityPhase::Service
    );
    match n as i64 {
        // ATS
        256 => truth(
            system == SecuritySystem::AtsSn
                && matches!(phase, SecurityPhase::Normal | SecurityPhase::Initialization),
        ),
        // ATS run, separate flashing lamp
        257 if system == SecuritySystem::AtsSn => {
            if phase == SecurityPhase::Ringing {
                1.0
            } else if braking {
                2.0
            } else {
                0.0
            }
        }
        // ATS run, integrated flashing lamp
        258 if system == SecuritySystem::AtsSn => {
            if phase == SecurityPhase::Ringing {
                1.0
            } else if braking {
                let half_seconds = (2.0 * seconds_since_midnight).floor() as i64;
                truth((half_seconds & 1) == 0)
            } else {
                0.0
            }
        }
        // P power
        259 => truth(
            matches!(system, SecuritySystem::AtsSn | SecuritySystem::AtsP)
                && security.ats_p_available,
        ),
        // pattern approach
        260 => truth(
            system == SecuritySystem::AtsP
                && matches!(phase, SecurityPhase::Pattern | SecurityPhase::Service),
        ),
        // brake release
        261 => truth(system == SecuritySystem::AtsP && security.ats_p_override),
        // brake operation
        262 => truth(
            system == SecuritySystem::AtsP
                && phase == SecurityPhase::Service
                && !security.ats_p_override,
        ),
        // ATS-P
        263 => truth(system == SecuritySystem::AtsP),
        // failure
        264 => truth(
            system != SecuritySystem::None
                && (phase == SecurityPhase::Initialization
                    || (system == SecuritySystem::AtsP
                        && matches!(phase, SecurityPhase::Ringing | SecurityPhase::Emergency))),
        ),
        // ATC
        265 => truth(system == SecuritySystem::Atc),
        // ATC power
        266 => truth(
            system == SecuritySystem::Atc
                || (system != SecuritySystem::None && security.atc_automatic_switch),
        ),
        // ATC service
        267 => truth(system == SecuritySystem::Atc && phase == SecurityPhase::Service),
        // ATC emergency
        268 => truth(system == SecuritySystem::Atc && !security.atc_transmitting),
        // EB
        269 => truth(system != SecuritySystem::None && security.eb_bell_ringing),
        // constant speed
        270 => truth(train.handles.has_const_speed && train.handles.const_speed),
        // ATC speedometer
        271 => {
            if system != SecuritySystem::Atc {
                12.0
            } else if !security.atc_transmitting {
                0.0
            } else {
                let band = ATC_SPEED_BANDS
                    .iter()
                    .position(|&limit| security.atc_speed_restriction < limit)
                    .unwrap_or(ATC_SPEED_BANDS.len());
                band as f64 + 1.0
            }
        }
        _ => 0.0,
    }
}
