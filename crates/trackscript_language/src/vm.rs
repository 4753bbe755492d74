//! Stack-based virtual machine for Trackscript bytecode.
//!
//! The VM executes a compiled program as a straight line of instructions
//! over a working stack of `f64`. The compiler has already proven the peak
//! depth, so the stack is sized once per run and addressed with a running
//! counter. Evaluation never fails: numeric edge cases and queries without
//! a bound train resolve to fallback values.
//!
//! # World Access
//!
//! Ambient state (clock, camera, signalling, timetable) is read through the
//! [`VmContext`] trait. [`Vm::execute`] runs without one, as if at midnight
//! with the camera at the origin.
//!
//! # Memory
//!
//! Each VM remembers the result of its previous run; the `value` instruction
//! pushes it. Give every animated object its own VM.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]

mod context;
mod math;
mod train;

pub use context::{EvalContext, VmContext};

use context::NoContext;
use math::{truth, truthy};

use trackscript_foundation::{CarState, DoorSide, Result, TrainState};

use crate::compiler::CompiledProgram;
use crate::opcode::Opcode;

/// Stack-based virtual machine.
#[derive(Clone, Debug, Default)]
pub struct Vm {
    /// Working stack, sized to the program's peak depth.
    stack: Vec<f64>,
    /// Result of the previous run.
    last_result: f64,
}

impl Vm {
    /// Creates a new VM with no evaluation history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The result of the previous run, 0 before the first.
    #[must_use]
    pub fn last_result(&self) -> f64 {
        self.last_result
    }

    /// Forgets the evaluation history.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.last_result = 0.0;
    }

    /// Executes a compiled program without world context.
    pub fn execute(&mut self, program: &CompiledProgram, ctx: &EvalContext<'_>) -> f64 {
        self.execute_with_context(program, ctx, &NoContext)
    }

    /// Executes a compiled program with world context.
    pub fn execute_with_context<C: VmContext>(
        &mut self,
        program: &CompiledProgram,
        ctx: &EvalContext<'_>,
        world: &C,
    ) -> f64 {
        let constants = program.constants();
        let last = self.last_result;
        let train = ctx.train;

        let st = &mut self.stack;
        st.clear();
        st.resize(program.max_stack().max(1), 0.0);
        let mut s = 0usize;
        let mut c = 0usize;

        for op in &program.code().ops {
            match *op {
                Opcode::Halt => break,

                Opcode::Const => {
                    st[s] = constants[c];
                    s += 1;
                    c += 1;
                }
                Opcode::ConstArray(n) => {
                    let n = usize::from(n);
                    st[s..s + n].copy_from_slice(&constants[c..c + n]);
                    s += n;
                    c += n;
                }
                Opcode::Value => push(st, &mut s, last),
                Opcode::Delta => push(st, &mut s, ctx.time_elapsed),

                // Stack
                Opcode::Dup => {
                    let top = st[s - 1];
                    push(st, &mut s, top);
                }
                Opcode::Swap => st.swap(s - 1, s - 2),

                // Arithmetic
                Opcode::Add => binary(st, &mut s, |a, b| a + b),
                Opcode::Sub => binary(st, &mut s, |a, b| a - b),
                Opcode::Neg => unary(st, s, |a| -a),
                Opcode::Mul => binary(st, &mut s, |a, b| a * b),
                Opcode::Div => binary(st, &mut s, math::divide),
                Opcode::Reciprocal => unary(st, s, math::reciprocal),
                Opcode::Pow => binary(st, &mut s, math::power),
                Opcode::Inc => unary(st, s, |a| a + 1.0),
                Opcode::Dec => unary(st, s, |a| a - 1.0),
                Opcode::Fma => {
                    st[s - 3] = st[s - 3] * st[s - 2] + st[s - 1];
                    s -= 2;
                }
                Opcode::Quotient => binary(st, &mut s, math::quotient),
                Opcode::Mod => binary(st, &mut s, math::modulo),
                Opcode::Floor => unary(st, s, f64::floor),
                Opcode::Ceil => unary(st, s, f64::ceil),
                Opcode::Round => unary(st, s, f64::round_ties_even),
                Opcode::Min => binary(st, &mut s, math::min),
                Opcode::Max => binary(st, &mut s, math::max),
                Opcode::Abs => unary(st, s, f64::abs),
                Opcode::Sign => unary(st, s, math::sign),
                Opcode::Exp => unary(st, s, f64::exp),
                Opcode::Log => unary(st, s, math::log),
                Opcode::Sqrt => unary(st, s, math::sqrt),
                Opcode::Sin => unary(st, s, f64::sin),
                Opcode::Cos => unary(st, s, f64::cos),
                Opcode::Tan => unary(st, s, math::tan),
                Opcode::Atan => unary(st, s, f64::atan),

                // Comparison
                Opcode::Eq => binary(st, &mut s, |a, b| truth(a == b)),
                Opcode::Ne => binary(st, &mut s, |a, b| truth(a != b)),
                Opcode::Lt => binary(st, &mut s, |a, b| truth(a < b)),
                Opcode::Gt => binary(st, &mut s, |a, b| truth(a > b)),
                Opcode::Le => binary(st, &mut s, |a, b| truth(a <= b)),
                Opcode::Ge => binary(st, &mut s, |a, b| truth(a >= b)),
                Opcode::Select => {
                    st[s - 3] = if truthy(st[s - 3]) { st[s - 2] } else { st[s - 1] };
                    s -= 2;
                }

                // Logic
                Opcode::Not => unary(st, s, |a| truth(!truthy(a))),
                Opcode::And => binary(st, &mut s, |a, b| truth(truthy(a) && truthy(b))),
                Opcode::Or => binary(st, &mut s, |a, b| truth(truthy(a) || truthy(b))),
                Opcode::Nand => binary(st, &mut s, |a, b| truth(!(truthy(a) && truthy(b)))),
                Opcode::Nor => binary(st, &mut s, |a, b| truth(!(truthy(a) || truthy(b)))),
                Opcode::Xor => binary(st, &mut s, |a, b| truth(truthy(a) ^ truthy(b))),

                // Time and camera
                Opcode::Time => push(st, &mut s, world.seconds_since_midnight()),
                Opcode::CameraDistance => push(
                    st,
                    &mut s,
                    world.camera_position().distance_to(ctx.position),
                ),

                // Train
                Opcode::Cars => push(st, &mut s, query(train, |t| t.cars.len() as f64)),
                Opcode::Speed => push(st, &mut s, query(train, |t| t.average_speed)),
                Opcode::Speedometer => push(
                    st,
                    &mut s,
                    driver(train, |car| car.perceived_speed),
                ),
                Opcode::Distance => push(
                    st,
                    &mut s,
                    query(train, |t| train::distance(t, ctx.position)),
                ),
                Opcode::DistanceToCar => unary(st, s, |x| {
                    query(train, |t| train::distance_to_car(t, x, ctx.position))
                }),
                Opcode::TrackDistance => push(
                    st,
                    &mut s,
                    query(train, |t| train::track_distance(t, ctx.track_position)),
                ),
                Opcode::TrackDistanceToCar => unary(st, s, |x| {
                    query(train, |t| {
                        train::track_distance_to_car(t, x, ctx.track_position)
                    })
                }),

                // Doors
                Opcode::Doors => push(st, &mut s, query(train, |t| train::doors(t, None))),
                Opcode::DoorsIndex => unary(st, s, |x| {
                    query(train, |t| train::doors_of_car(t, x, None))
                }),
                Opcode::LeftDoors => push(
                    st,
                    &mut s,
                    query(train, |t| train::doors(t, Some(DoorSide::Left))),
                ),
                Opcode::LeftDoorsIndex => unary(st, s, |x| {
                    query(train, |t| train::doors_of_car(t, x, Some(DoorSide::Left)))
                }),
                Opcode::RightDoors => push(
                    st,
                    &mut s,
                    query(train, |t| train::doors(t, Some(DoorSide::Right))),
                ),
                Opcode::RightDoorsIndex => unary(st, s, |x| {
                    query(train, |t| train::doors_of_car(t, x, Some(DoorSide::Right)))
                }),
                Opcode::LeftDoorsTarget => push(
                    st,
                    &mut s,
                    query(train, |t| train::doors_target(t, DoorSide::Left)),
                ),
                Opcode::LeftDoorsTargetIndex => unary(st, s, |x| {
                    query(train, |t| train::doors_target_of_car(t, x, DoorSide::Left))
                }),
                Opcode::RightDoorsTarget => push(
                    st,
                    &mut s,
                    query(train, |t| train::doors_target(t, DoorSide::Right)),
                ),
                Opcode::RightDoorsTargetIndex => unary(st, s, |x| {
                    query(train, |t| train::doors_target_of_car(t, x, DoorSide::Right))
                }),

                // Handles
                Opcode::ReverserNotch => push(
                    st,
                    &mut s,
                    query(train, |t| f64::from(t.handles.reverser)),
                ),
                Opcode::PowerNotch => push(
                    st,
                    &mut s,
                    query(train, |t| f64::from(t.handles.power_notch)),
                ),
                Opcode::PowerNotches => push(
                    st,
                    &mut s,
                    query(train, |t| f64::from(t.handles.max_power_notch)),
                ),
                Opcode::BrakeNotch => push(st, &mut s, query(train, train::brake_notch)),
                Opcode::BrakeNotches => push(st, &mut s, query(train, train::brake_notches)),
                Opcode::BrakeNotchLinear => {
                    push(st, &mut s, query(train, train::brake_notch_linear));
                }
                Opcode::BrakeNotchesLinear => {
                    push(st, &mut s, query(train, train::brake_notches_linear));
                }
                Opcode::EmergencyBrake => push(
                    st,
                    &mut s,
                    query(train, |t| truth(t.handles.emergency_brake)),
                ),
                Opcode::HasAirBrake => {
                    push(st, &mut s, query(train, |t| truth(t.has_air_brake())));
                }
                Opcode::HoldBrake => push(
                    st,
                    &mut s,
                    query(train, |t| truth(t.handles.hold_brake)),
                ),
                Opcode::HasHoldBrake => push(
                    st,
                    &mut s,
                    query(train, |t| truth(t.handles.has_hold_brake)),
                ),
                Opcode::ConstSpeed => push(
                    st,
                    &mut s,
                    query(train, |t| truth(t.handles.const_speed)),
                ),
                Opcode::HasConstSpeed => push(
                    st,
                    &mut s,
                    query(train, |t| truth(t.handles.has_const_speed)),
                ),

                // Brake pressures
                Opcode::MainReservoir => push(
                    st,
                    &mut s,
                    driver(train, |car| car.pressures.main_reservoir),
                ),
                Opcode::EqualizingReservoir => push(
                    st,
                    &mut s,
                    driver(train, |car| car.pressures.equalizing_reservoir),
                ),
                Opcode::BrakePipe => push(
                    st,
                    &mut s,
                    driver(train, |car| car.pressures.brake_pipe),
                ),
                Opcode::BrakeCylinder => push(
                    st,
                    &mut s,
                    driver(train, |car| car.pressures.brake_cylinder),
                ),
                Opcode::StraightAirPipe => push(
                    st,
                    &mut s,
                    driver(train, |car| car.pressures.straight_air_pipe),
                ),

                // Security, timetable, signalling
                Opcode::PluginState => unary(st, s, |x| {
                    query(train, |t| {
                        train::plugin_state(t, x, world.seconds_since_midnight())
                    })
                }),
                Opcode::TimetableVisible => push(
                    st,
                    &mut s,
                    if world.custom_timetable_visible() { 0.0 } else { -1.0 },
                ),
                Opcode::SectionAspect => push(
                    st,
                    &mut s,
                    f64::from(ctx.section.map_or(0, |i| world.section_aspect_number(i))),
                ),
            }
        }

        let result = s.checked_sub(1).map_or(0.0, |top| st[top]);
        self.last_result = result;
        result
    }
}

#[inline]
fn push(st: &mut [f64], s: &mut usize, value: f64) {
    st[*s] = value;
    *s += 1;
}

#[inline]
fn unary(st: &mut [f64], s: usize, f: impl FnOnce(f64) -> f64) {
    st[s - 1] = f(st[s - 1]);
}

#[inline]
fn binary(st: &mut [f64], s: &mut usize, f: impl FnOnce(f64, f64) -> f64) {
    st[*s - 2] = f(st[*s - 2], st[*s - 1]);
    *s -= 1;
}

#[inline]
fn query(train: Option<&TrainState>, f: impl FnOnce(&TrainState) -> f64) -> f64 {
    train.map_or(0.0, f)
}

#[inline]
fn driver(train: Option<&TrainState>, f: impl FnOnce(&CarState) -> f64) -> f64 {
    train.and_then(TrainState::driver).map_or(0.0, f)
}

/// Compiles and evaluates an infix expression with no train or world.
///
/// # Errors
///
/// Returns an error if the expression does not compile.
pub fn eval(source: &str) -> Result<f64> {
    let program = crate::compiler::compile(source)?;
    let mut vm = Vm::new();
    Ok(vm.execute(&program, &EvalContext::default()))
}
