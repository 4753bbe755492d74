//! Integration tests for the VM
//!
//! Tests evaluation of compiled Trackscript programs against train and world
//! snapshots.

#![allow(clippy::float_cmp)]

use trackscript_foundation::{DoorSide, SectionState, TrainState, Vector3, WorldState};
use trackscript_language::{EvalContext, Vm, compile, eval};

fn commuter() -> TrainState {
    let mut train = TrainState::consist(4, 20.0, 200.0);
    train.average_speed = 12.0;
    train.handles.max_power_notch = 4;
    train.handles.max_brake_notch = 8;
    train
}

fn run(source: &str, ctx: &EvalContext<'_>, world: &WorldState) -> f64 {
    let program = compile(source).unwrap();
    Vm::new().execute_with_context(&program, ctx, world)
}

// =============================================================================
// Constant Evaluation
// =============================================================================

#[test]
fn eval_arithmetic() {
    assert_eq!(eval("1 + 2").unwrap(), 3.0);
    assert_eq!(eval("7 / 2").unwrap(), 3.5);
    assert_eq!(eval("2 * (3 + 4)").unwrap(), 14.0);
    assert_eq!(eval("-(2 + 3)").unwrap(), -5.0);
}

#[test]
fn eval_fallbacks_never_fail() {
    assert_eq!(eval("1 / 0").unwrap(), 0.0);
    assert_eq!(eval("Sqrt[-1]").unwrap(), 0.0);
    assert_eq!(eval("Log[-1]").unwrap(), 0.0);
}

#[test]
fn eval_reports_compile_errors() {
    assert!(eval("1 +").is_err());
    assert!(eval("Sin[]").is_err());
}

// =============================================================================
// Train State
// =============================================================================

#[test]
fn speed_and_handles() {
    let mut train = commuter();
    train.handles.power_notch = 2;
    let ctx = EvalContext::for_train(&train);
    let world = WorldState::default();

    assert_eq!(run("speed * 2", &ctx, &world), 24.0);
    assert_eq!(run("cars", &ctx, &world), 4.0);
    assert_eq!(run("powernotch / powernotches", &ctx, &world), 0.5);
    assert_eq!(run("brakenotches", &ctx, &world), 8.0);
}

#[test]
fn doors_by_side_and_car() {
    let mut train = commuter();
    for door in &mut train.cars[2].doors {
        if door.side == DoorSide::Right {
            door.state = 0.75;
        }
    }
    let ctx = EvalContext::for_train(&train);
    let world = WorldState::default();

    assert_eq!(run("doors", &ctx, &world), 0.75);
    assert_eq!(run("leftdoors", &ctx, &world), 0.0);
    assert_eq!(run("rightdoors", &ctx, &world), 0.75);
    assert_eq!(run("RightDoors[2]", &ctx, &world), 0.75);
    assert_eq!(run("RightDoors[1]", &ctx, &world), 0.0);
    assert_eq!(run("RightDoors[-2]", &ctx, &world), 0.75);
    assert_eq!(run("RightDoors[9]", &ctx, &world), 0.0);
}

#[test]
fn distances_along_the_consist() {
    let train = commuter();
    let world = WorldState::default();
    let ahead = EvalContext::for_train(&train)
        .at(Vector3::new(0.0, 0.0, 250.0))
        .on_track(250.0);

    assert_eq!(run("distance", &ahead, &world), 52.0);
    assert_eq!(run("trackdistance", &ahead, &world), 50.0);

    let alongside = EvalContext::for_train(&train).on_track(150.0);
    assert_eq!(run("trackdistance", &alongside, &world), 0.0);

    let behind = EvalContext::for_train(&train).on_track(100.0);
    assert_eq!(run("trackdistance", &behind, &world), -20.0);
}

#[test]
fn queries_without_a_train_are_zero() {
    let world = WorldState::default();
    let ctx = EvalContext::default();
    for query in ["speed", "cars", "doors", "distance", "brakenotch", "Doors[0]"] {
        assert_eq!(run(query, &ctx, &world), 0.0, "{query}");
    }
}

// =============================================================================
// World State
// =============================================================================

#[test]
fn clock_and_signals() {
    let world = WorldState {
        seconds_since_midnight: 7.5 * 3600.0,
        sections: vec![SectionState::new(vec![0, 1, 3], 2)],
        ..WorldState::default()
    };
    let ctx = EvalContext::default().in_section(0);

    assert_eq!(run("Floor[time / 3600]", &ctx, &world), 7.0);
    assert_eq!(run("If[section == 0, 1, 2]", &ctx, &world), 2.0);
    assert_eq!(run("section", &ctx, &world), 3.0);
}

#[test]
fn timetable_visibility() {
    let mut world = WorldState::default();
    let ctx = EvalContext::default();
    assert_eq!(run("timetable", &ctx, &world), -1.0);
    world.custom_timetable_visible = true;
    assert_eq!(run("timetable", &ctx, &world), 0.0);
}
