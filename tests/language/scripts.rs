//! Integration tests for function scripts
//!
//! Scripts animate objects frame by frame: each keeps its previous result in
//! `value` while sharing one compiled program with its duplicates.

#![allow(clippy::float_cmp)]

use std::sync::Arc;
use std::thread;

use trackscript_foundation::{DoorSide, TrainState, WorldState};
use trackscript_language::{EvalContext, FunctionScript};

const DOOR_ANIMATION: &str = "Min[Max[value + delta * (leftdoors * 2 - 1), 0], 1]";

fn train_with_left_doors(state: f64) -> TrainState {
    let mut train = TrainState::consist(2, 20.0, 0.0);
    for car in &mut train.cars {
        for door in car.doors.iter_mut().filter(|d| d.side == DoorSide::Left) {
            door.state = state;
        }
    }
    train
}

#[test]
fn door_animation_opens_and_clamps() {
    let train = train_with_left_doors(1.0);
    let world = WorldState::default();
    let ctx = EvalContext::for_train(&train).after(0.25);
    let mut script = FunctionScript::from_infix(DOOR_ANIMATION).unwrap();

    let frames: Vec<f64> = (0..6).map(|_| script.perform(&ctx, &world)).collect();
    assert_eq!(frames, vec![0.25, 0.5, 0.75, 1.0, 1.0, 1.0]);
}

#[test]
fn door_animation_closes_again() {
    let open = train_with_left_doors(1.0);
    let closed = train_with_left_doors(0.0);
    let world = WorldState::default();
    let mut script = FunctionScript::from_infix(DOOR_ANIMATION).unwrap();

    for _ in 0..2 {
        script.perform(&EvalContext::for_train(&open).after(0.5), &world);
    }
    assert_eq!(script.last_result(), 1.0);

    let ctx = EvalContext::for_train(&closed).after(0.5);
    assert_eq!(script.perform(&ctx, &world), 0.5);
    assert_eq!(script.perform(&ctx, &world), 0.0);
    assert_eq!(script.perform(&ctx, &world), 0.0);
}

#[test]
fn duplicates_animate_independently() {
    let train = train_with_left_doors(1.0);
    let world = WorldState::default();
    let template = FunctionScript::from_infix(DOOR_ANIMATION).unwrap();
    let mut fast = template.duplicate();
    let mut slow = template.duplicate();

    for _ in 0..2 {
        fast.perform(&EvalContext::for_train(&train).after(0.5), &world);
        slow.perform(&EvalContext::for_train(&train).after(0.125), &world);
    }

    assert_eq!(fast.last_result(), 1.0);
    assert_eq!(slow.last_result(), 0.25);
    assert_eq!(template.last_result(), 0.0);
    assert!(Arc::ptr_eq(fast.program(), slow.program()));
}

#[test]
fn duplicates_run_on_separate_threads() {
    let template = FunctionScript::from_infix("value + delta").unwrap();

    let results: Vec<f64> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                let mut script = template.duplicate();
                scope.spawn(move || {
                    let ctx = EvalContext::default().after(f64::from(n));
                    for _ in 0..10 {
                        script.perform_detached(&ctx);
                    }
                    script.last_result()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, vec![10.0, 20.0, 30.0, 40.0]);
}

#[test]
fn duplicate_mid_animation_resumes_from_copied_state() {
    let opening = train_with_left_doors(1.0);
    let closing = train_with_left_doors(0.0);
    let world = WorldState::default();
    let mut script = FunctionScript::from_infix(DOOR_ANIMATION).unwrap();

    script.perform(&EvalContext::for_train(&opening).after(0.25), &world);
    script.perform(&EvalContext::for_train(&opening).after(0.25), &world);
    let mut copy = script.duplicate();
    assert_eq!(copy.last_result(), 0.5);

    assert_eq!(copy.perform(&EvalContext::for_train(&closing).after(0.25), &world), 0.25);
    assert_eq!(script.perform(&EvalContext::for_train(&opening).after(0.25), &world), 0.75);
    assert_eq!(copy.last_result(), 0.25);
}
