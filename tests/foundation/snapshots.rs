//! Integration tests for train and world snapshots

#![allow(clippy::float_cmp)]

use trackscript_foundation::{
    AirBrakeHandle, BrakeType, DoorSide, SectionState, TrainState, Vector3, WorldState,
};

// =============================================================================
// Geometry
// =============================================================================

#[test]
fn vector_distance() {
    let a = Vector3::new(0.0, 3.0, 0.0);
    let b = Vector3::new(4.0, 0.0, 0.0);
    assert_eq!(a.distance_to(b), 5.0);
    assert_eq!(a.distance_squared_to(b), 25.0);
}

#[test]
fn vector_arithmetic() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(3.0, 2.0, 1.0);
    assert_eq!(a + b, Vector3::new(4.0, 4.0, 4.0));
    assert_eq!(a - b, Vector3::new(-2.0, 0.0, 2.0));
    assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
    assert_eq!(a.midpoint(b), Vector3::new(2.0, 2.0, 2.0));
}

// =============================================================================
// Trains
// =============================================================================

#[test]
fn consist_layout() {
    let train = TrainState::consist(3, 25.0, 100.0);
    assert_eq!(train.cars.len(), 3);
    let centers: Vec<f64> = train.cars.iter().map(|c| c.track_center()).collect();
    assert_eq!(centers, vec![87.5, 62.5, 37.5]);
    for car in &train.cars {
        assert_eq!(car.length, 25.0);
        assert_eq!(car.doors.len(), 2);
        assert!(car.doors.iter().any(|d| d.side == DoorSide::Left));
        assert!(car.doors.iter().all(|d| d.state == 0.0));
    }
}

#[test]
fn empty_consist_has_no_driver() {
    let train = TrainState::consist(0, 20.0, 0.0);
    assert!(train.driver().is_none());
    assert!(!train.has_air_brake());
}

#[test]
fn driver_car_brake_type() {
    let mut train = TrainState::consist(2, 20.0, 0.0);
    train.cars[1].brake_type = BrakeType::AutomaticAirBrake;
    assert!(!train.has_air_brake());
    train.driver_car = 1;
    assert!(train.has_air_brake());
}

#[test]
fn air_brake_handle_notch_numbers() {
    assert_eq!(AirBrakeHandle::Release.notch(), 0.0);
    assert_eq!(AirBrakeHandle::Lap.notch(), 1.0);
    assert_eq!(AirBrakeHandle::Service.notch(), 2.0);
}

// =============================================================================
// World
// =============================================================================

#[test]
fn section_aspects() {
    let world = WorldState {
        sections: vec![
            SectionState::new(vec![0, 2, 5], 2),
            SectionState {
                current_aspect: None,
                aspects: vec![1],
            },
        ],
        ..WorldState::default()
    };
    assert_eq!(world.section_aspect(0), 5);
    assert_eq!(world.section_aspect(1), 0);
    assert_eq!(world.section_aspect(9), 0);
}
