//! Integration tests for scenario persistence

#![allow(clippy::float_cmp)]

use trackscript_foundation::ErrorKind;
use trackscript_runtime::{Scenario, Session, serialize};

#[test]
fn saved_scenarios_reload_into_new_sessions() {
    let path = std::env::temp_dir().join("trackscript_it_scenario.msgpack");
    let path = path.to_string_lossy().into_owned();

    let mut session = Session::new();
    session.set("cars", 3.0).unwrap();
    session.set("speed", 22.0).unwrap();
    session.set("section", 1.0).unwrap();
    session.set("aspect", 4.0).unwrap();
    session.save_scenario(&path).unwrap();

    let mut restored = Session::new();
    restored.load_scenario(&path).unwrap();
    assert_eq!(restored.scenario(), session.scenario());
    assert_eq!(restored.evaluate("speed + section").unwrap(), 26.0);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn scenario_bytes_roundtrip() {
    let mut session = Session::new();
    session.set("cars", 2.0).unwrap();
    session.set("emergency", 1.0).unwrap();
    session.tick(3);

    let bytes = serialize::to_bytes(session.scenario()).unwrap();
    let scenario: Scenario = serialize::from_bytes(&bytes).unwrap();
    assert_eq!(&scenario, session.scenario());
    assert!(scenario.train.unwrap().handles.emergency_brake);
}

#[test]
fn truncated_scenarios_are_rejected() {
    let bytes = serialize::to_bytes(&Scenario::default()).unwrap();
    let err = serialize::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
}
