//! Expression pipeline and bytecode VM for Trackscript.
//!
//! This crate provides:
//! - [`to_function_notation`] - Infix text to `Name[arg,...]` notation
//! - [`to_postfix`] - Function notation to a postfix token stream
//! - [`optimize`] - Peephole rewriting of postfix streams
//! - [`Compiler`] - Postfix to validated bytecode ([`CompiledProgram`])
//! - [`Vm`] - Stack-based bytecode interpreter
//! - [`FunctionScript`] - A shared program with its own evaluation state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod compiler;
mod notation;
mod opcode;
mod optimizer;
mod postfix;
mod script;
mod vm;

pub use compiler::{CompiledProgram, Compiler, Stages, compile, compile_postfix, stages};
pub use notation::to_function_notation;
pub use opcode::{Bytecode, Opcode};
pub use optimizer::{optimize, parse_literal};
pub use postfix::{FUNCTIONS, to_postfix};
pub use script::FunctionScript;
pub use vm::{EvalContext, Vm, VmContext, eval};
