//! Scenario serialization and deserialization using `MessagePack`.
//!
//! A [`Scenario`] is the persistent state of a REPL session: the world and
//! train that expressions observe. Bound scripts are not saved.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use trackscript_foundation::{Error, ErrorKind, Result};

use crate::session::Scenario;

/// Serializes a scenario to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(scenario: &Scenario) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(scenario)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Deserializes a scenario from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<Scenario> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!(
        "failed to {action} '{}': {e}",
        path.display()
    )))
}

/// Saves a scenario to a file, creating or overwriting it.
///
/// # Errors
///
/// Returns an error if the file cannot be written or serialization fails.
pub fn save_to_file<P: AsRef<Path>>(scenario: &Scenario, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(scenario)?;
    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))
}

/// Loads a scenario from a `MessagePack` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Scenario> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read", path, &e))?;

    from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackscript_foundation::{SectionState, TrainState, Vector3};

    fn create_test_scenario() -> Scenario {
        let mut train = TrainState::consist(4, 20.0, 250.0);
        train.average_speed = 16.5;
        train.handles.brake_notch = 3;
        train.security.plugin_panel = vec![0, 1, 2];

        let mut scenario = Scenario {
            train: Some(train),
            position: Vector3::new(1.0, 2.0, 200.0),
            track_position: 200.0,
            section: Some(1),
            time_step: 0.25,
            ..Scenario::default()
        };
        scenario.world.seconds_since_midnight = 8.0 * 3600.0;
        scenario.world.sections = vec![SectionState::default(), SectionState::new(vec![0, 3], 1)];
        scenario
    }

    #[test]
    fn roundtrip_bytes() {
        let scenario = create_test_scenario();

        let bytes = to_bytes(&scenario).expect("serialization failed");
        assert!(!bytes.is_empty());

        let restored = from_bytes(&bytes).expect("deserialization failed");
        assert_eq!(restored, scenario);
    }

    #[test]
    fn roundtrip_file() {
        let scenario = create_test_scenario();
        let temp_path = std::env::temp_dir().join("trackscript_test_scenario.msgpack");

        save_to_file(&scenario, &temp_path).expect("save failed");
        let restored = load_from_file(&temp_path).expect("load failed");
        assert_eq!(restored, scenario);

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn empty_scenario_roundtrips() {
        let bytes = to_bytes(&Scenario::default()).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), Scenario::default());
    }

    #[test]
    fn garbage_is_rejected() {
        let result = from_bytes(&[0xc1, 0x00, 0xff]);
        assert!(matches!(
            result.unwrap_err().kind,
            ErrorKind::Serialization(_)
        ));
    }

    #[test]
    fn load_nonexistent_file_fails() {
        let result = load_from_file("/nonexistent/path/to/scenario.msgpack");
        assert!(matches!(result.unwrap_err().kind, ErrorKind::Io(_)));
    }
}
