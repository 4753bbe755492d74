//! Compiler for transforming postfix token streams into bytecode.
//!
//! The compiler optimizes the stream, maps each token to an instruction,
//! collects literals into a constant pool, and simulates the stack depth so
//! that only programs leaving exactly one value are accepted. The peak depth
//! sizes the VM's working stack.

#![allow(clippy::cast_possible_truncation)]

use std::fmt::Write as _;

use tracing::debug;

use trackscript_foundation::{Error, ErrorKind, Result};

use crate::notation::to_function_notation;
use crate::opcode::{Bytecode, Opcode};
use crate::optimizer::{optimize, parse_literal};
use crate::postfix::to_postfix;

/// Compiled program ready for execution.
///
/// Immutable once built; share it between evaluation sites with an `Arc`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledProgram {
    code: Bytecode,
    constants: Vec<f64>,
    max_stack: usize,
    source: String,
}

impl CompiledProgram {
    /// Builds a program from hand-assembled instructions.
    ///
    /// The instructions are validated exactly like compiled text: no
    /// instruction may underflow the stack and one value must remain when
    /// the program ends or reaches `Halt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stack would underflow, the final depth is not
    /// one, or the constant pool is shorter than the constant loads need.
    pub fn from_bytecode(code: impl Into<Bytecode>, constants: Vec<f64>) -> Result<Self> {
        let code = code.into();
        let source = code
            .ops
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        let mut depth = StackDepth::default();
        let mut loads = 0usize;
        for op in &code.ops {
            if *op == Opcode::Halt {
                break;
            }
            depth.apply(*op, op.mnemonic(), &source)?;
            match op {
                Opcode::Const => loads += 1,
                Opcode::ConstArray(n) => loads += usize::from(*n),
                _ => {}
            }
        }
        depth.finish(&source)?;
        if loads > constants.len() {
            return Err(Error::new(ErrorKind::Internal(format!(
                "program loads {loads} constants but the pool holds {}",
                constants.len()
            ))));
        }

        Ok(Self {
            code,
            constants,
            max_stack: depth.peak,
            source,
        })
    }

    /// The instructions.
    #[must_use]
    pub fn code(&self) -> &Bytecode {
        &self.code
    }

    /// The constant pool, in load order.
    #[must_use]
    pub fn constants(&self) -> &[f64] {
        &self.constants
    }

    /// Peak working-stack depth.
    #[must_use]
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    /// The text this program was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Human-readable listing, one instruction per line.
    #[must_use]
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let mut c = 0;
        for (i, op) in self.code.ops.iter().enumerate() {
            let _ = write!(out, "{i:04}  {op}");
            match op {
                Opcode::Const => {
                    if let Some(value) = self.constants.get(c) {
                        let _ = write!(out, " {value}");
                    }
                    c += 1;
                }
                Opcode::ConstArray(n) => {
                    let n = usize::from(*n);
                    let end = (c + n).min(self.constants.len());
                    let values = self.constants[c.min(end)..end]
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    let _ = write!(out, " [{values}]");
                    c += n;
                }
                _ => {}
            }
            out.push('\n');
        }
        let _ = write!(out, "; max stack {}", self.max_stack);
        out
    }
}

/// Simulated stack depth during compilation.
#[derive(Default)]
struct StackDepth {
    current: usize,
    peak: usize,
}

impl StackDepth {
    fn apply(&mut self, op: Opcode, token: &str, expression: &str) -> Result<()> {
        let (consumed, produced) = op.stack_effect();
        if self.current < consumed {
            return Err(Error::stack_underflow(
                token,
                consumed,
                self.current,
                expression,
            ));
        }
        self.current = self.current - consumed + produced;
        self.peak = self.peak.max(self.current);
        Ok(())
    }

    fn finish(&self, expression: &str) -> Result<()> {
        if self.current == 1 {
            Ok(())
        } else {
            Err(Error::malformed_program(self.current, expression))
        }
    }
}

/// Compiler state for transforming postfix text into bytecode.
#[derive(Default)]
pub struct Compiler {
    code: Bytecode,
    constants: Vec<f64>,
    depth: StackDepth,
}

impl Compiler {
    /// Creates a new compiler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimizes and compiles a postfix token stream.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tokens, the reserved `halt` instruction,
    /// stack underflow, or a final stack depth other than one.
    pub fn compile_postfix(&mut self, postfix: &str) -> Result<CompiledProgram> {
        self.code = Bytecode::new();
        self.constants.clear();
        self.depth = StackDepth::default();

        let optimized = optimize(postfix);
        for token in optimized.split_whitespace() {
            if let Some(value) = parse_literal(token) {
                self.emit(Opcode::Const, token, postfix)?;
                self.constants.push(value);
                continue;
            }
            match Opcode::from_mnemonic(token) {
                Some(Opcode::Halt) => return Err(Error::reserved_instruction(token, postfix)),
                Some(op) => self.emit(op, token, postfix)?,
                None => return Err(Error::unknown_token(token, postfix)),
            }
        }
        self.depth.finish(postfix)?;

        Ok(CompiledProgram {
            code: coalesce_constants(&self.code),
            constants: std::mem::take(&mut self.constants),
            max_stack: self.depth.peak,
            source: postfix.to_string(),
        })
    }

    fn emit(&mut self, op: Opcode, token: &str, expression: &str) -> Result<()> {
        self.depth.apply(op, token, expression)?;
        self.code.emit(op);
        Ok(())
    }
}

/// Replaces runs of two or more `Const` loads with `ConstArray`.
fn coalesce_constants(code: &Bytecode) -> Bytecode {
    let mut out = Bytecode::new();
    let mut run = 0usize;
    let flush = |out: &mut Bytecode, run: &mut usize| {
        while *run > 0 {
            let n = (*run).min(usize::from(u16::MAX));
            if n == 1 {
                out.emit(Opcode::Const);
            } else {
                out.emit(Opcode::ConstArray(n as u16));
            }
            *run -= n;
        }
    };
    for op in &code.ops {
        if *op == Opcode::Const {
            run += 1;
        } else {
            flush(&mut out, &mut run);
            out.emit(*op);
        }
    }
    flush(&mut out, &mut run);
    out
}

/// Compiles an infix expression.
///
/// # Errors
///
/// Returns the first error from any pipeline stage.
pub fn compile(infix: &str) -> Result<CompiledProgram> {
    let result = to_function_notation(infix)
        .and_then(|function| to_postfix(&function))
        .and_then(|postfix| {
            Compiler::new()
                .compile_postfix(&postfix)
                .map_err(|error| error.with_expression(infix))
        })
        .map(|program| CompiledProgram {
            source: infix.to_string(),
            ..program
        });
    log_outcome(infix, &result);
    result
}

/// Compiles a postfix token stream.
///
/// # Errors
///
/// Returns an error for unknown tokens, `halt`, stack underflow, or a final
/// stack depth other than one.
pub fn compile_postfix(postfix: &str) -> Result<CompiledProgram> {
    let result = Compiler::new().compile_postfix(postfix);
    log_outcome(postfix, &result);
    result
}

fn log_outcome(source: &str, result: &Result<CompiledProgram>) {
    match result {
        Ok(program) => debug!(
            source,
            instructions = program.code.len(),
            constants = program.constants.len(),
            max_stack = program.max_stack,
            "compiled"
        ),
        Err(error) => debug!(source, %error, "compilation rejected"),
    }
}

/// Every intermediate form of one expression.
#[derive(Clone, Debug)]
pub struct Stages {
    /// Function notation.
    pub function: String,
    /// Postfix before optimization.
    pub postfix: String,
    /// Postfix after optimization.
    pub optimized: String,
    /// The compiled program.
    pub program: CompiledProgram,
}

/// Runs the pipeline on an infix expression, keeping every stage.
///
/// # Errors
///
/// Returns the first error from any pipeline stage.
pub fn stages(infix: &str) -> Result<Stages> {
    let function = to_function_notation(infix)?;
    let postfix = to_postfix(&function)?;
    let optimized = optimize(&postfix);
    let program = compile(infix)?;
    Ok(Stages {
        function,
        postfix,
        optimized,
        program,
    })
}
