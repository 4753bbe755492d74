//! Read-only snapshot of a train as seen by expressions.
//!
//! The simulation owns the live train; expressions only ever observe a
//! [`TrainState`] captured for the current frame. Every type here is plain
//! data so that hosts, tests, and saved scenarios can build one directly.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// A train made of one or more cars.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainState {
    /// Cars from front to rear.
    pub cars: Vec<CarState>,
    /// Index of the car the driver sits in.
    pub driver_car: usize,
    /// Average speed of the consist, in m/s.
    pub average_speed: f64,
    /// Driver handle positions.
    pub handles: HandleState,
    /// Train protection system state.
    pub security: SecurityState,
}

impl TrainState {
    /// Lays out `count` identical cars back to back along the track, the
    /// front of the first car at `front_position`.
    #[must_use]
    pub fn consist(count: usize, car_length: f64, front_position: f64) -> Self {
        let cars = (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let center = front_position - car_length * (i as f64 + 0.5);
                CarState::centered_at(center, car_length)
            })
            .collect();
        Self {
            cars,
            ..Self::default()
        }
    }

    /// The car the driver sits in, if the index is valid.
    #[must_use]
    pub fn driver(&self) -> Option<&CarState> {
        self.cars.get(self.driver_car)
    }

    /// Whether the driver car uses an automatic air brake.
    #[must_use]
    pub fn has_air_brake(&self) -> bool {
        self.driver()
            .is_some_and(|car| car.brake_type == BrakeType::AutomaticAirBrake)
    }
}

/// A single car of a train.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CarState {
    /// Front axle position.
    pub front_axle: AxleState,
    /// Rear axle position.
    pub rear_axle: AxleState,
    /// Offset of the front axle from the car center, positive towards the front.
    pub front_axle_offset: f64,
    /// Offset of the rear axle from the car center, negative towards the rear.
    pub rear_axle_offset: f64,
    /// Car body length, in meters.
    pub length: f64,
    /// Speed shown on this car's speedometer, in m/s.
    pub perceived_speed: f64,
    /// Doors of this car.
    pub doors: Vec<DoorState>,
    /// The next station expects the left doors to open.
    pub anticipated_left_doors_opened: bool,
    /// The next station expects the right doors to open.
    pub anticipated_right_doors_opened: bool,
    /// Brake system of this car.
    pub brake_type: BrakeType,
    /// Current brake system pressures, in pascals.
    pub pressures: BrakePressures,
}

impl CarState {
    /// A car of the given length centered on `center` along the track, with
    /// one closed door on each side and axles 40% of the length from center.
    #[must_use]
    pub fn centered_at(center: f64, length: f64) -> Self {
        let front_axle_offset = 0.4 * length;
        let rear_axle_offset = -0.4 * length;
        Self {
            front_axle: AxleState::on_track(center + front_axle_offset),
            rear_axle: AxleState::on_track(center + rear_axle_offset),
            front_axle_offset,
            rear_axle_offset,
            length,
            doors: vec![DoorState::new(DoorSide::Left), DoorState::new(DoorSide::Right)],
            ..Self::default()
        }
    }

    /// World position halfway between the axles.
    #[must_use]
    pub fn center(&self) -> Vector3 {
        self.front_axle
            .world_position
            .midpoint(self.rear_axle.world_position)
    }

    /// Track position halfway between the axles.
    #[must_use]
    pub fn track_center(&self) -> f64 {
        0.5 * (self.front_axle.track_position + self.rear_axle.track_position)
    }
}

/// Where an axle currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxleState {
    /// Position in world space.
    pub world_position: Vector3,
    /// Distance along the track, in meters.
    pub track_position: f64,
}

impl AxleState {
    /// An axle on a straight track running along the z axis.
    #[must_use]
    pub fn on_track(track_position: f64) -> Self {
        Self {
            world_position: Vector3::new(0.0, 0.0, track_position),
            track_position,
        }
    }
}

/// Which side of the car a door is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DoorSide {
    /// Left in the direction of travel.
    #[default]
    Left,
    /// Right in the direction of travel.
    Right,
}

/// A door and how far it is open.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoorState {
    /// Side of the car.
    pub side: DoorSide,
    /// Opening ratio, from 0 (closed) to 1 (fully open).
    pub state: f64,
}

impl DoorState {
    /// A closed door on the given side.
    #[must_use]
    pub fn new(side: DoorSide) -> Self {
        Self { side, state: 0.0 }
    }
}

/// Brake system fitted to a car.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BrakeType {
    /// Electromagnetic straight air brake.
    #[default]
    ElectromagneticStraightAir,
    /// Electric command brake.
    ElectricCommand,
    /// Automatic air brake with a three-position handle.
    AutomaticAirBrake,
}

/// Brake system pressures of a car, in pascals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrakePressures {
    /// Main reservoir.
    pub main_reservoir: f64,
    /// Equalizing reservoir.
    pub equalizing_reservoir: f64,
    /// Brake pipe.
    pub brake_pipe: f64,
    /// Brake cylinder.
    pub brake_cylinder: f64,
    /// Straight air pipe.
    pub straight_air_pipe: f64,
}

/// Position of an automatic air brake handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AirBrakeHandle {
    /// Brakes released.
    #[default]
    Release,
    /// Pressure held.
    Lap,
    /// Service application.
    Service,
}

impl AirBrakeHandle {
    /// The handle position as a notch number (0, 1 or 2).
    #[must_use]
    pub fn notch(self) -> f64 {
        match self {
            Self::Release => 0.0,
            Self::Lap => 1.0,
            Self::Service => 2.0,
        }
    }
}

/// Driver handle positions of a train.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HandleState {
    /// Reverser: -1 backward, 0 neutral, 1 forward.
    pub reverser: i32,
    /// Current power notch.
    pub power_notch: i32,
    /// Highest power notch.
    pub max_power_notch: i32,
    /// Current brake notch.
    pub brake_notch: i32,
    /// Highest brake notch.
    pub max_brake_notch: i32,
    /// Air brake handle, used when the driver car has an automatic air brake.
    pub air_brake_handle: AirBrakeHandle,
    /// Emergency brake applied.
    pub emergency_brake: bool,
    /// Hold brake applied.
    pub hold_brake: bool,
    /// The train has a hold brake.
    pub has_hold_brake: bool,
    /// Constant speed device engaged.
    pub const_speed: bool,
    /// The train has a constant speed device.
    pub has_const_speed: bool,
}

/// Built-in train protection systems.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SecuritySystem {
    /// No protection.
    #[default]
    None,
    /// ATS-SN.
    AtsSn,
    /// ATS-P.
    AtsP,
    /// ATC.
    Atc,
    /// An external plugin drives the panel.
    Plugin,
}

/// Phase of the active protection system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SecurityPhase {
    /// Running normally.
    #[default]
    Normal,
    /// Starting up.
    Initialization,
    /// Alarm ringing.
    Ringing,
    /// Emergency brake applied.
    Emergency,
    /// Approaching a speed pattern.
    Pattern,
    /// Service brake applied.
    Service,
}

/// Train protection state.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecurityState {
    /// Active system.
    pub system: SecuritySystem,
    /// Phase of the active system.
    pub phase: SecurityPhase,
    /// Emergency brake bell is ringing.
    pub eb_bell_ringing: bool,
    /// ATS-P is available on this section.
    pub ats_p_available: bool,
    /// ATS-P brake override is engaged.
    pub ats_p_override: bool,
    /// ATC switches in automatically.
    pub atc_automatic_switch: bool,
    /// ATC signal is being received.
    pub atc_transmitting: bool,
    /// ATC speed restriction, in m/s.
    pub atc_speed_restriction: f64,
    /// Panel values published by a plugin.
    pub plugin_panel: Vec<i32>,
}
