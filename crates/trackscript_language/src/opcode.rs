//! Bytecode instruction set for the Trackscript VM.
//!
//! The VM is stack-based. Most operations consume operands from the stack
//! and push results back. Every instruction has a fixed stack effect, so the
//! compiler can size the working stack ahead of time.

#![allow(clippy::doc_markdown)]

use std::fmt;

/// A single bytecode instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    // === System ===
    /// Stop execution. Only valid in hand-assembled programs.
    Halt,
    /// Push the next constant from the constant pool.
    Const,
    /// Push the next `n` constants from the constant pool.
    ConstArray(u16),
    /// Push the result of the previous evaluation.
    Value,
    /// Push the time elapsed since the previous evaluation.
    Delta,

    // === Stack ===
    /// Duplicate: `[a] -> [a, a]`
    Dup,
    /// Swap: `[a, b] -> [b, a]`
    Swap,

    // === Arithmetic ===
    /// Add: `[a, b] -> [a + b]`
    Add,
    /// Subtract: `[a, b] -> [a - b]`
    Sub,
    /// Negate: `[a] -> [-a]`
    Neg,
    /// Multiply: `[a, b] -> [a * b]`
    Mul,
    /// Divide: `[a, b] -> [a / b]`, 0 when `b` is 0
    Div,
    /// Reciprocal: `[a] -> [1 / a]`, 0 when `a` is 0
    Reciprocal,
    /// Power: `[a, b] -> [a ^ b]`
    Pow,
    /// Increment: `[a] -> [a + 1]`
    Inc,
    /// Decrement: `[a] -> [a - 1]`
    Dec,
    /// Fused multiply-add: `[a, b, c] -> [a * b + c]`
    Fma,
    /// Floor division: `[a, b] -> [floor(a / b)]`, 0 when `b` is 0
    Quotient,
    /// Floored modulo: `[a, b] -> [a - b * floor(a / b)]`, 0 when `b` is 0
    Mod,
    /// Floor: `[a] -> [floor(a)]`
    Floor,
    /// Ceiling: `[a] -> [ceil(a)]`
    Ceil,
    /// Round half to even: `[a] -> [round(a)]`
    Round,
    /// Minimum: `[a, b] -> [min(a, b)]`
    Min,
    /// Maximum: `[a, b] -> [max(a, b)]`
    Max,
    /// Absolute value: `[a] -> [|a|]`
    Abs,
    /// Sign: `[a] -> [-1 | 0 | 1]`
    Sign,
    /// Exponential: `[a] -> [e ^ a]`
    Exp,
    /// Natural logarithm: `[a] -> [ln a]`, 0 for non-positive `a`
    Log,
    /// Square root: `[a] -> [sqrt a]`, 0 for negative `a`
    Sqrt,
    /// Sine: `[a] -> [sin a]`
    Sin,
    /// Cosine: `[a] -> [cos a]`
    Cos,
    /// Tangent: `[a] -> [tan a]`, 0 at the poles
    Tan,
    /// Arc tangent: `[a] -> [atan a]`
    Atan,

    // === Comparison ===
    /// Equal: `[a, b] -> [a == b]`
    Eq,
    /// Not equal: `[a, b] -> [a != b]`
    Ne,
    /// Less than: `[a, b] -> [a < b]`
    Lt,
    /// Greater than: `[a, b] -> [a > b]`
    Gt,
    /// Less than or equal: `[a, b] -> [a <= b]`
    Le,
    /// Greater than or equal: `[a, b] -> [a >= b]`
    Ge,
    /// Conditional: `[c, a, b] -> [c != 0 ? a : b]`
    Select,

    // === Logic ===
    /// Logical not: `[a] -> [!a]`
    Not,
    /// Logical and: `[a, b] -> [a && b]`
    And,
    /// Logical or: `[a, b] -> [a || b]`
    Or,
    /// Logical nand: `[a, b] -> [!(a && b)]`
    Nand,
    /// Logical nor: `[a, b] -> [!(a || b)]`
    Nor,
    /// Logical xor: `[a, b] -> [a != b]`
    Xor,

    // === Time and Camera ===
    /// Push the simulation clock in seconds since midnight.
    Time,
    /// Push the distance from the camera to the evaluated object.
    CameraDistance,

    // === Train ===
    /// Push the number of cars.
    Cars,
    /// Push the average train speed.
    Speed,
    /// Push the speed shown in the driver car.
    Speedometer,
    /// Push the distance to the nearest axle.
    Distance,
    /// Distance to a car: `[car] -> [distance]`
    DistanceToCar,
    /// Push the track distance to the nearest end of the train.
    TrackDistance,
    /// Track distance to a car: `[car] -> [distance]`
    TrackDistanceToCar,

    // === Doors ===
    /// Push the most open door ratio of the train.
    Doors,
    /// Most open door of a car: `[car] -> [ratio]`
    DoorsIndex,
    /// Push the most open left door ratio.
    LeftDoors,
    /// Most open left door of a car: `[car] -> [ratio]`
    LeftDoorsIndex,
    /// Push the most open right door ratio.
    RightDoors,
    /// Most open right door of a car: `[car] -> [ratio]`
    RightDoorsIndex,
    /// Push whether any car expects its left doors to open.
    LeftDoorsTarget,
    /// Whether a car expects its left doors to open: `[car] -> [flag]`
    LeftDoorsTargetIndex,
    /// Push whether any car expects its right doors to open.
    RightDoorsTarget,
    /// Whether a car expects its right doors to open: `[car] -> [flag]`
    RightDoorsTargetIndex,

    // === Handles ===
    /// Push the reverser position.
    ReverserNotch,
    /// Push the power notch.
    PowerNotch,
    /// Push the highest power notch.
    PowerNotches,
    /// Push the brake notch (air brake handle position on air-braked trains).
    BrakeNotch,
    /// Push the highest brake notch.
    BrakeNotches,
    /// Push the brake notch counting hold and emergency positions.
    BrakeNotchLinear,
    /// Push the highest linear brake notch.
    BrakeNotchesLinear,
    /// Push whether the emergency brake is applied.
    EmergencyBrake,
    /// Push whether the driver car has an automatic air brake.
    HasAirBrake,
    /// Push whether the hold brake is applied.
    HoldBrake,
    /// Push whether the train has a hold brake.
    HasHoldBrake,
    /// Push whether constant speed is engaged.
    ConstSpeed,
    /// Push whether the train has a constant speed device.
    HasConstSpeed,

    // === Brake Pressures ===
    /// Push the driver car main reservoir pressure.
    MainReservoir,
    /// Push the driver car equalizing reservoir pressure.
    EqualizingReservoir,
    /// Push the driver car brake pipe pressure.
    BrakePipe,
    /// Push the driver car brake cylinder pressure.
    BrakeCylinder,
    /// Push the driver car straight air pipe pressure.
    StraightAirPipe,

    // === Security, Timetable, Signalling ===
    /// Protection panel value: `[index] -> [state]`
    PluginState,
    /// Push 0 if a custom timetable is visible, -1 otherwise.
    TimetableVisible,
    /// Push the aspect number of the evaluated object's section.
    SectionAspect,
}

impl Opcode {
    /// Every instruction reachable from postfix text, in mnemonic table order.
    pub const TEXTUAL: &'static [Opcode] = &[
        Self::Halt,
        Self::Value,
        Self::Delta,
        Self::Dup,
        Self::Swap,
        Self::Add,
        Self::Sub,
        Self::Neg,
        Self::Mul,
        Self::Div,
        Self::Reciprocal,
        Self::Pow,
        Self::Inc,
        Self::Dec,
        Self::Fma,
        Self::Quotient,
        Self::Mod,
        Self::Floor,
        Self::Ceil,
        Self::Round,
        Self::Min,
        Self::Max,
        Self::Abs,
        Self::Sign,
        Self::Exp,
        Self::Log,
        Self::Sqrt,
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Atan,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Select,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Nand,
        Self::Nor,
        Self::Xor,
        Self::Time,
        Self::CameraDistance,
        Self::Cars,
        Self::Speed,
        Self::Speedometer,
        Self::Distance,
        Self::DistanceToCar,
        Self::TrackDistance,
        Self::TrackDistanceToCar,
        Self::Doors,
        Self::DoorsIndex,
        Self::LeftDoors,
        Self::LeftDoorsIndex,
        Self::RightDoors,
        Self::RightDoorsIndex,
        Self::LeftDoorsTarget,
        Self::LeftDoorsTargetIndex,
        Self::RightDoorsTarget,
        Self::RightDoorsTargetIndex,
        Self::ReverserNotch,
        Self::PowerNotch,
        Self::PowerNotches,
        Self::BrakeNotch,
        Self::BrakeNotches,
        Self::BrakeNotchLinear,
        Self::BrakeNotchesLinear,
        Self::EmergencyBrake,
        Self::HasAirBrake,
        Self::HoldBrake,
        Self::HasHoldBrake,
        Self::ConstSpeed,
        Self::HasConstSpeed,
        Self::MainReservoir,
        Self::EqualizingReservoir,
        Self::BrakePipe,
        Self::BrakeCylinder,
        Self::StraightAirPipe,
        Self::PluginState,
        Self::TimetableVisible,
        Self::SectionAspect,
    ];

    /// Looks up an instruction by its postfix mnemonic.
    ///
    /// Mnemonics are matched case-insensitively. Numeric literals are not
    /// mnemonics; the compiler handles them before calling this.
    #[must_use]
    pub fn from_mnemonic(token: &str) -> Option<Self> {
        let op = match token.to_ascii_lowercase().as_str() {
            "halt" => Self::Halt,
            "value" => Self::Value,
            "delta" => Self::Delta,
            "~" => Self::Dup,
            "<>" => Self::Swap,
            "+" => Self::Add,
            "-" => Self::Sub,
            "minus" => Self::Neg,
            "*" => Self::Mul,
            "/" => Self::Div,
            "reciprocal" => Self::Reciprocal,
            "power" => Self::Pow,
            "++" => Self::Inc,
            "--" => Self::Dec,
            "fma" => Self::Fma,
            "quotient" => Self::Quotient,
            "mod" => Self::Mod,
            "floor" => Self::Floor,
            "ceiling" => Self::Ceil,
            "round" => Self::Round,
            "min" => Self::Min,
            "max" => Self::Max,
            "abs" => Self::Abs,
            "sign" => Self::Sign,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "sqrt" => Self::Sqrt,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "arctan" => Self::Atan,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "?" => Self::Select,
            "!" => Self::Not,
            "&" => Self::And,
            "|" => Self::Or,
            "!&" => Self::Nand,
            "!|" => Self::Nor,
            "^" => Self::Xor,
            "time" => Self::Time,
            "cameradistance" => Self::CameraDistance,
            "cars" => Self::Cars,
            "speed" => Self::Speed,
            "speedometer" => Self::Speedometer,
            "distance" => Self::Distance,
            "distancetocar" => Self::DistanceToCar,
            "trackdistance" => Self::TrackDistance,
            "trackdistancetocar" => Self::TrackDistanceToCar,
            "doors" => Self::Doors,
            "doorsindex" => Self::DoorsIndex,
            "leftdoors" => Self::LeftDoors,
            "leftdoorsindex" => Self::LeftDoorsIndex,
            "rightdoors" => Self::RightDoors,
            "rightdoorsindex" => Self::RightDoorsIndex,
            "leftdoorstarget" => Self::LeftDoorsTarget,
            "leftdoorstargetindex" => Self::LeftDoorsTargetIndex,
            "rightdoorstarget" => Self::RightDoorsTarget,
            "rightdoorstargetindex" => Self::RightDoorsTargetIndex,
            "reversernotch" => Self::ReverserNotch,
            "powernotch" => Self::PowerNotch,
            "powernotches" => Self::PowerNotches,
            "brakenotch" => Self::BrakeNotch,
            "brakenotches" => Self::BrakeNotches,
            "brakenotchlinear" => Self::BrakeNotchLinear,
            "brakenotcheslinear" => Self::BrakeNotchesLinear,
            "emergencybrake" => Self::EmergencyBrake,
            "hasairbrake" => Self::HasAirBrake,
            "holdbrake" => Self::HoldBrake,
            "hasholdbrake" => Self::HasHoldBrake,
            "constspeed" => Self::ConstSpeed,
            "hasconstspeed" => Self::HasConstSpeed,
            "mainreservoir" => Self::MainReservoir,
            "equalizingreservoir" => Self::EqualizingReservoir,
            "brakepipe" => Self::BrakePipe,
            "brakecylinder" => Self::BrakeCylinder,
            "straightairpipe" => Self::StraightAirPipe,
            "pluginstate" => Self::PluginState,
            "timetable" => Self::TimetableVisible,
            "section" => Self::SectionAspect,
            _ => return None,
        };
        Some(op)
    }

    /// The postfix mnemonic of this instruction.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Const => "const",
            Self::ConstArray(_) => "constarray",
            Self::Value => "value",
            Self::Delta => "delta",
            Self::Dup => "~",
            Self::Swap => "<>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Neg => "minus",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Reciprocal => "reciprocal",
            Self::Pow => "power",
            Self::Inc => "++",
            Self::Dec => "--",
            Self::Fma => "fma",
            Self::Quotient => "quotient",
            Self::Mod => "mod",
            Self::Floor => "floor",
            Self::Ceil => "ceiling",
            Self::Round => "round",
            Self::Min => "min",
            Self::Max => "max",
            Self::Abs => "abs",
            Self::Sign => "sign",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Atan => "arctan",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Select => "?",
            Self::Not => "!",
            Self::And => "&",
            Self::Or => "|",
            Self::Nand => "!&",
            Self::Nor => "!|",
            Self::Xor => "^",
            Self::Time => "time",
            Self::CameraDistance => "cameradistance",
            Self::Cars => "cars",
            Self::Speed => "speed",
            Self::Speedometer => "speedometer",
            Self::Distance => "distance",
            Self::DistanceToCar => "distancetocar",
            Self::TrackDistance => "trackdistance",
            Self::TrackDistanceToCar => "trackdistancetocar",
            Self::Doors => "doors",
            Self::DoorsIndex => "doorsindex",
            Self::LeftDoors => "leftdoors",
            Self::LeftDoorsIndex => "leftdoorsindex",
            Self::RightDoors => "rightdoors",
            Self::RightDoorsIndex => "rightdoorsindex",
            Self::LeftDoorsTarget => "leftdoorstarget",
            Self::LeftDoorsTargetIndex => "leftdoorstargetindex",
            Self::RightDoorsTarget => "rightdoorstarget",
            Self::RightDoorsTargetIndex => "rightdoorstargetindex",
            Self::ReverserNotch => "reversernotch",
            Self::PowerNotch => "powernotch",
            Self::PowerNotches => "powernotches",
            Self::BrakeNotch => "brakenotch",
            Self::BrakeNotches => "brakenotches",
            Self::BrakeNotchLinear => "brakenotchlinear",
            Self::BrakeNotchesLinear => "brakenotcheslinear",
            Self::EmergencyBrake => "emergencybrake",
            Self::HasAirBrake => "hasairbrake",
            Self::HoldBrake => "holdbrake",
            Self::HasHoldBrake => "hasholdbrake",
            Self::ConstSpeed => "constspeed",
            Self::HasConstSpeed => "hasconstspeed",
            Self::MainReservoir => "mainreservoir",
            Self::EqualizingReservoir => "equalizingreservoir",
            Self::BrakePipe => "brakepipe",
            Self::BrakeCylinder => "brakecylinder",
            Self::StraightAirPipe => "straightairpipe",
            Self::PluginState => "pluginstate",
            Self::TimetableVisible => "timetable",
            Self::SectionAspect => "section",
        }
    }

    /// Stack effect as `(consumed, produced)`.
    ///
    /// The instruction needs at least `consumed` values on the stack and
    /// leaves the depth changed by `produced - consumed`.
    #[must_use]
    pub fn stack_effect(self) -> (usize, usize) {
        match self {
            Self::Halt => (0, 0),
            Self::ConstArray(n) => (0, usize::from(n)),
            Self::Const
            | Self::Value
            | Self::Delta
            | Self::Time
            | Self::CameraDistance
            | Self::Cars
            | Self::Speed
            | Self::Speedometer
            | Self::Distance
            | Self::TrackDistance
            | Self::Doors
            | Self::LeftDoors
            | Self::RightDoors
            | Self::LeftDoorsTarget
            | Self::RightDoorsTarget
            | Self::ReverserNotch
            | Self::PowerNotch
            | Self::PowerNotches
            | Self::BrakeNotch
            | Self::BrakeNotches
            | Self::BrakeNotchLinear
            | Self::BrakeNotchesLinear
            | Self::EmergencyBrake
            | Self::HasAirBrake
            | Self::HoldBrake
            | Self::HasHoldBrake
            | Self::ConstSpeed
            | Self::HasConstSpeed
            | Self::MainReservoir
            | Self::EqualizingReservoir
            | Self::BrakePipe
            | Self::BrakeCylinder
            | Self::StraightAirPipe
            | Self::TimetableVisible
            | Self::SectionAspect => (0, 1),
            Self::Dup => (1, 2),
            Self::Neg
            | Self::Reciprocal
            | Self::Inc
            | Self::Dec
            | Self::Floor
            | Self::Ceil
            | Self::Round
            | Self::Abs
            | Self::Sign
            | Self::Exp
            | Self::Log
            | Self::Sqrt
            | Self::Sin
            | Self::Cos
            | Self::Tan
            | Self::Atan
            | Self::Not
            | Self::DistanceToCar
            | Self::TrackDistanceToCar
            | Self::DoorsIndex
            | Self::LeftDoorsIndex
            | Self::RightDoorsIndex
            | Self::LeftDoorsTargetIndex
            | Self::RightDoorsTargetIndex
            | Self::PluginState => (1, 1),
            Self::Swap => (2, 2),
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Pow
            | Self::Quotient
            | Self::Mod
            | Self::Min
            | Self::Max
            | Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Gt
            | Self::Le
            | Self::Ge
            | Self::And
            | Self::Or
            | Self::Nand
            | Self::Nor
            | Self::Xor => (2, 1),
            Self::Fma | Self::Select => (3, 1),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstArray(n) => write!(f, "constarray {n}"),
            other => f.write_str(other.mnemonic()),
        }
    }
}

/// A sequence of bytecode instructions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bytecode {
    /// The instructions.
    pub ops: Vec<Opcode>,
}

impl Bytecode {
    /// Creates an empty bytecode sequence.
    #[must_use]
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, op: Opcode) -> usize {
        let idx = self.ops.len();
        self.ops.push(op);
        idx
    }

    /// Returns the current instruction count (next instruction index).
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there are no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl From<Vec<Opcode>> for Bytecode {
    fn from(ops: Vec<Opcode>) -> Self {
        Self { ops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytecode_emit() {
        let mut bc = Bytecode::new();
        assert!(bc.is_empty());

        let idx = bc.emit(Opcode::Const);
        assert_eq!(idx, 0);
        assert_eq!(bc.len(), 1);

        let idx = bc.emit(Opcode::Add);
        assert_eq!(idx, 1);
        assert_eq!(bc.len(), 2);
    }

    #[test]
    fn every_textual_opcode_round_trips() {
        for &op in Opcode::TEXTUAL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op), "{op:?}");
        }
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        assert_eq!(Opcode::from_mnemonic("ArcTan"), Some(Opcode::Atan));
        assert_eq!(Opcode::from_mnemonic("SECTION"), Some(Opcode::SectionAspect));
        assert_eq!(Opcode::from_mnemonic("nope"), None);
        assert_eq!(Opcode::from_mnemonic("const"), None);
    }

    #[test]
    fn stack_effects() {
        assert_eq!(Opcode::Fma.stack_effect(), (3, 1));
        assert_eq!(Opcode::Dup.stack_effect(), (1, 2));
        assert_eq!(Opcode::DoorsIndex.stack_effect(), (1, 1));
        assert_eq!(Opcode::ConstArray(4).stack_effect(), (0, 4));
        assert_eq!(Opcode::Halt.stack_effect(), (0, 0));
    }

    #[test]
    fn display_uses_mnemonic() {
        assert_eq!(Opcode::Pow.to_string(), "power");
        assert_eq!(Opcode::ConstArray(3).to_string(), "constarray 3");
    }
}
