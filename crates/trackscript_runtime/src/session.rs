//! Session state for the REPL.
//!
//! A session owns a [`Scenario`], the world and train that expressions
//! observe, and a set of named scripts bound to it. Ticking the session
//! advances the clock, moves the train, and re-evaluates every bound script
//! so that `value` and `delta` behave as they do for animated objects.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use trackscript_foundation::{
    DoorSide, Error, ErrorContext, ErrorKind, Result, SectionState, TrainState, Vector3,
    WorldState,
};
use trackscript_language::{EvalContext, FunctionScript, Stages, Vm, compile, stages};

use crate::serialize;

/// Length of the cars laid out by `:set cars N`, in meters.
pub const DEFAULT_CAR_LENGTH: f64 = 20.0;

/// Upper bound for car counts, car indices and section indices set by hand.
pub const MAX_COUNT: usize = 4096;

/// Scenario fields accepted by [`Session::set`].
pub const SCENARIO_FIELDS: &[&str] = &[
    "time",
    "step",
    "x",
    "y",
    "z",
    "track",
    "section",
    "aspect",
    "timetable",
    "cars",
    "speed",
    "driver",
    "reverser",
    "power",
    "maxpower",
    "brake",
    "maxbrake",
    "emergency",
    "holdbrake",
    "constspeed",
    "leftdoors",
    "rightdoors",
    "mr",
    "er",
    "bp",
    "bc",
    "sap",
];

// =============================================================================
// Scenario
// =============================================================================

/// Everything an expression can observe, plus the time step of one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock, camera, signalling, and timetable state.
    pub world: WorldState,
    /// The train evaluated objects belong to, if any.
    pub train: Option<TrainState>,
    /// World position of the evaluated object.
    pub position: Vector3,
    /// Track position of the evaluated object.
    pub track_position: f64,
    /// Signalling section of the evaluated object.
    pub section: Option<usize>,
    /// Seconds that pass on each tick.
    pub time_step: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            world: WorldState::default(),
            train: None,
            position: Vector3::ZERO,
            track_position: 0.0,
            section: None,
            time_step: 1.0,
        }
    }
}

impl Scenario {
    /// The evaluation inputs this scenario describes, with no elapsed time.
    #[must_use]
    pub fn context(&self) -> EvalContext<'_> {
        EvalContext {
            train: self.train.as_ref(),
            position: self.position,
            track_position: self.track_position,
            section: self.section,
            time_elapsed: 0.0,
        }
    }
}

/// Outcome of one expression line read from a file.
#[derive(Debug)]
pub struct LineReport {
    /// Line number, 1-indexed.
    pub line: usize,
    /// The expression text.
    pub source: String,
    /// The first evaluation result, or the compile error with its location.
    pub outcome: Result<f64>,
}

// =============================================================================
// Session
// =============================================================================

/// Session state for an interactive REPL session.
pub struct Session {
    /// What expressions observe.
    scenario: Scenario,

    /// Scripts re-evaluated on every tick, by name.
    scripts: BTreeMap<String, FunctionScript>,

    /// VM for one-off evaluations; `value` holds the previous result.
    vm: Vm,

    /// Current load path for relative file resolution.
    load_path: PathBuf,
}

impl Session {
    /// Creates a session with an empty scenario.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scenario(Scenario::default())
    }

    /// Creates a session observing the given scenario.
    #[must_use]
    pub fn with_scenario(scenario: Scenario) -> Self {
        Self {
            scenario,
            scripts: BTreeMap::new(),
            vm: Vm::new(),
            load_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Returns a reference to the scenario.
    #[must_use]
    pub const fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Returns a mutable reference to the scenario.
    pub fn scenario_mut(&mut self) -> &mut Scenario {
        &mut self.scenario
    }

    /// Replaces the scenario. Bound scripts keep their memory.
    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
    }

    /// Compiles and evaluates an infix expression against the scenario.
    ///
    /// # Errors
    ///
    /// Returns the first error from any pipeline stage.
    pub fn evaluate(&mut self, infix: &str) -> Result<f64> {
        let program = compile(infix)?;
        let ctx = self.scenario.context();
        Ok(self
            .vm
            .execute_with_context(&program, &ctx, &self.scenario.world))
    }

    /// Every pipeline stage of an infix expression.
    ///
    /// # Errors
    ///
    /// Returns the first error from any pipeline stage.
    #[allow(clippy::unused_self)]
    pub fn stages(&self, infix: &str) -> Result<Stages> {
        stages(infix)
    }

    /// Compiles an expression and binds it under `name`, replacing any
    /// script already bound there.
    ///
    /// # Errors
    ///
    /// Returns the first error from any pipeline stage.
    pub fn bind(&mut self, name: impl Into<String>, infix: &str) -> Result<()> {
        let script = FunctionScript::from_infix(infix)?;
        self.bind_script(name, script);
        Ok(())
    }

    /// Binds an already compiled script.
    pub fn bind_script(&mut self, name: impl Into<String>, script: FunctionScript) {
        let name = name.into();
        debug!(script = %name, source = script.program().source(), "bound");
        self.scripts.insert(name, script);
    }

    /// Removes a bound script. Returns whether one was bound.
    pub fn unbind(&mut self, name: &str) -> bool {
        self.scripts.remove(name).is_some()
    }

    /// Looks up a bound script.
    #[must_use]
    pub fn script(&self, name: &str) -> Option<&FunctionScript> {
        self.scripts.get(name)
    }

    /// Bound scripts in name order.
    pub fn scripts(&self) -> impl Iterator<Item = (&str, &FunctionScript)> {
        self.scripts.iter().map(|(name, script)| (name.as_str(), script))
    }

    /// Advances the scenario by `count` time steps, re-evaluating every
    /// bound script once per step.
    ///
    /// The clock moves forward by the time step and the train moves along
    /// the track at its average speed.
    pub fn tick(&mut self, count: usize) {
        let step = self.scenario.time_step;
        for _ in 0..count {
            self.scenario.world.seconds_since_midnight += step;
            if let Some(train) = &mut self.scenario.train {
                let distance = train.average_speed * step;
                advance(train, distance);
            }

            let ctx = self.scenario.context().after(step);
            for (name, script) in &mut self.scripts {
                let result = script.perform(&ctx, &self.scenario.world);
                debug!(script = %name, result, "tick");
            }
        }
    }

    /// Sets one scenario field from a number.
    ///
    /// Flags treat any nonzero value as true. Setting `cars` to 0 removes the
    /// train; a negative `section` clears the section.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields, for train fields when the
    /// scenario has no train, and for counts or indices that are negative or
    /// above [`MAX_COUNT`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn set(&mut self, field: &str, value: f64) -> Result<()> {
        let scenario = &mut self.scenario;
        match field {
            "time" => scenario.world.seconds_since_midnight = value,
            "step" => scenario.time_step = value,
            "x" => scenario.position.x = value,
            "y" => scenario.position.y = value,
            "z" => scenario.position.z = value,
            "track" => scenario.track_position = value,
            "section" => {
                scenario.section = if value < 0.0 {
                    None
                } else {
                    Some(to_count(field, value)?)
                };
            }
            "aspect" => {
                let index = scenario
                    .section
                    .ok_or_else(|| usage("no section in the scenario, use :set section N first"))?;
                let sections = &mut scenario.world.sections;
                if sections.len() <= index {
                    sections.resize_with(index + 1, SectionState::default);
                }
                sections[index] = SectionState::new(vec![value as i32], 0);
            }
            "timetable" => scenario.world.custom_timetable_visible = value != 0.0,
            "cars" => {
                let count = to_count(field, value)?;
                scenario.train =
                    (count > 0).then(|| TrainState::consist(count, DEFAULT_CAR_LENGTH, 0.0));
            }
            _ => set_train_field(scenario.train.as_mut(), field, value)?,
        }
        debug!(field, value, "scenario updated");
        Ok(())
    }

    /// Saves the scenario to a `MessagePack` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_scenario(&self, path: &str) -> Result<()> {
        let path = self.resolve_path(path);
        serialize::save_to_file(&self.scenario, &path)?;
        info!(path = %path.display(), "scenario saved");
        Ok(())
    }

    /// Replaces the scenario with one loaded from a `MessagePack` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load_scenario(&mut self, path: &str) -> Result<()> {
        let path = self.resolve_path(path);
        self.scenario = serialize::load_from_file(&path)?;
        info!(path = %path.display(), "scenario loaded");
        Ok(())
    }

    /// Compiles and evaluates every expression in a file, one per line.
    ///
    /// Blank lines and lines starting with `#` or `;` are skipped. Compile
    /// errors carry the file and line they came from. When `bind` is set,
    /// every expression that compiles is bound as `<file stem>:<line>`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read.
    pub fn load_expressions(&mut self, path: &Path, bind: bool) -> Result<Vec<LineReport>> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::Io(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        })?;

        if let Some(parent) = path.parent() {
            self.load_path = parent.to_path_buf();
        }

        let stem = path
            .file_stem()
            .map_or_else(|| "expr".to_string(), |s| s.to_string_lossy().into_owned());
        let mut reports = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let source = line.trim();
            if source.is_empty() || source.starts_with('#') || source.starts_with(';') {
                continue;
            }
            let number = index + 1;

            let outcome = match FunctionScript::from_infix(source) {
                Ok(mut script) => {
                    let ctx = self.scenario.context();
                    let result = script.perform(&ctx, &self.scenario.world);
                    if bind {
                        self.bind_script(format!("{stem}:{number}"), script);
                    }
                    Ok(result)
                }
                Err(error) => Err(error.with_context(
                    ErrorContext::new()
                        .with_source(path.display().to_string())
                        .with_line(number),
                )),
            };

            reports.push(LineReport {
                line: number,
                source: source.to_string(),
                outcome,
            });
        }

        info!(path = %path.display(), expressions = reports.len(), "expressions loaded");
        Ok(reports)
    }

    /// Gets the current load path.
    #[must_use]
    pub fn load_path(&self) -> &PathBuf {
        &self.load_path
    }

    /// Sets the load path (used when loading files).
    pub fn set_load_path(&mut self, path: PathBuf) {
        self.load_path = path;
    }

    /// Resolves a path relative to the current load path.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.load_path.join(path)
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

#[allow(clippy::cast_possible_truncation)]
fn set_train_field(train: Option<&mut TrainState>, field: &str, value: f64) -> Result<()> {
    if !SCENARIO_FIELDS.contains(&field) {
        return Err(usage(format!("unknown scenario field '{field}'")));
    }
    let train = train.ok_or_else(|| usage("no train in the scenario, use :set cars N first"))?;
    let handles = &mut train.handles;
    match field {
        "speed" => train.average_speed = value,
        "driver" => train.driver_car = to_count(field, value)?,
        "reverser" => handles.reverser = value as i32,
        "power" => handles.power_notch = value as i32,
        "maxpower" => handles.max_power_notch = value as i32,
        "brake" => handles.brake_notch = value as i32,
        "maxbrake" => handles.max_brake_notch = value as i32,
        "emergency" => handles.emergency_brake = value != 0.0,
        "holdbrake" => {
            handles.hold_brake = value != 0.0;
            handles.has_hold_brake = true;
        }
        "constspeed" => {
            handles.const_speed = value != 0.0;
            handles.has_const_speed = true;
        }
        "leftdoors" => open_doors(train, DoorSide::Left, value),
        "rightdoors" => open_doors(train, DoorSide::Right, value),
        _ => {
            let driver = train.driver_car;
            let car = train
                .cars
                .get_mut(driver)
                .ok_or_else(|| usage(format!("driver car {driver} does not exist")))?;
            let pressures = &mut car.pressures;
            match field {
                "mr" => pressures.main_reservoir = value,
                "er" => pressures.equalizing_reservoir = value,
                "bp" => pressures.brake_pipe = value,
                "bc" => pressures.brake_cylinder = value,
                _ => pressures.straight_air_pipe = value,
            }
        }
    }
    Ok(())
}

fn open_doors(train: &mut TrainState, side: DoorSide, state: f64) {
    let state = state.clamp(0.0, 1.0);
    for car in &mut train.cars {
        for door in car.doors.iter_mut().filter(|d| d.side == side) {
            door.state = state;
        }
    }
}

/// Moves every axle of the train `distance` meters along the track.
fn advance(train: &mut TrainState, distance: f64) {
    for car in &mut train.cars {
        for axle in [&mut car.front_axle, &mut car.rear_axle] {
            axle.track_position += distance;
            axle.world_position.z += distance;
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn to_count(field: &str, value: f64) -> Result<usize> {
    if value < 0.0 || !value.is_finite() {
        return Err(usage(format!("{field} must be a non-negative number, got {value}")));
    }
    if value > MAX_COUNT as f64 {
        return Err(usage(format!("{field} must be at most {MAX_COUNT}, got {value}")));
    }
    Ok(value as usize)
}

fn usage(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Internal(message.into()))
}
