//! Integration tests for sessions

#![allow(clippy::float_cmp)]

use std::fs;

use trackscript_foundation::ErrorKind;
use trackscript_runtime::Session;

fn station_stop() -> Session {
    let mut session = Session::new();
    session.set("cars", 4.0).unwrap();
    session.set("speed", 0.0).unwrap();
    session.set("step", 0.25).unwrap();
    session.set("leftdoors", 1.0).unwrap();
    session
}

#[test]
fn bound_scripts_follow_the_scenario() {
    let mut session = station_stop();
    session
        .bind("door", "Min[Max[value + delta * (leftdoors * 2 - 1), 0], 1]")
        .unwrap();

    session.tick(2);
    assert_eq!(session.script("door").unwrap().last_result(), 0.5);

    session.set("leftdoors", 0.0).unwrap();
    session.tick(1);
    assert_eq!(session.script("door").unwrap().last_result(), 0.25);
}

#[test]
fn rebinding_replaces_a_script() {
    let mut session = station_stop();
    session.bind("a", "1").unwrap();
    session.bind("a", "2").unwrap();
    session.tick(1);
    assert_eq!(session.scripts().count(), 1);
    assert_eq!(session.script("a").unwrap().last_result(), 2.0);
}

#[test]
fn failed_binds_leave_scripts_untouched() {
    let mut session = station_stop();
    session.bind("a", "speed").unwrap();
    assert!(session.bind("a", "Sin[").is_err());
    assert_eq!(session.script("a").unwrap().program().source(), "speed");
}

#[test]
fn stages_expose_the_pipeline() {
    let session = Session::new();
    let stages = session.stages("speed * 2 + 1").unwrap();
    assert_eq!(stages.optimized, "speed 2 1 fma");
}

#[test]
fn expression_files_carry_locations() {
    let path = std::env::temp_dir().join("trackscript_it_exprs.txt");
    fs::write(&path, "speed\n  # pantograph\nWarp[1]\n").unwrap();

    let mut session = station_stop();
    let reports = session.load_expressions(&path, false).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(session.scripts().count(), 0);

    let err = reports[1].outcome.as_ref().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownFunction { .. }));
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.line, Some(3));
    assert!(format!("{context}").ends_with("trackscript_it_exprs.txt:3"));

    let _ = fs::remove_file(&path);
}
