//! Function scripts: a compiled program bound to its own VM.
//!
//! The program is immutable and shared; the VM holds the per-object
//! evaluation state (working stack and last result). Animated objects that
//! reuse one expression each take a [`FunctionScript::duplicate`].

use std::sync::Arc;

use trackscript_foundation::Result;

use crate::compiler::{CompiledProgram, compile, compile_postfix};
use crate::vm::{EvalContext, Vm, VmContext};

/// A compiled expression together with its evaluation state.
#[derive(Clone, Debug)]
pub struct FunctionScript {
    program: Arc<CompiledProgram>,
    vm: Vm,
}

impl FunctionScript {
    /// Wraps an already compiled program.
    #[must_use]
    pub fn new(program: Arc<CompiledProgram>) -> Self {
        Self {
            program,
            vm: Vm::new(),
        }
    }

    /// Compiles an infix expression.
    ///
    /// # Errors
    ///
    /// Returns the first error from any pipeline stage.
    pub fn from_infix(infix: &str) -> Result<Self> {
        Ok(Self::new(Arc::new(compile(infix)?)))
    }

    /// Compiles a postfix token stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream does not compile.
    pub fn from_postfix(postfix: &str) -> Result<Self> {
        Ok(Self::new(Arc::new(compile_postfix(postfix)?)))
    }

    /// Evaluates the expression and returns its result.
    pub fn perform<C: VmContext>(&mut self, ctx: &EvalContext<'_>, world: &C) -> f64 {
        self.vm.execute_with_context(&self.program, ctx, world)
    }

    /// Evaluates the expression without world context.
    pub fn perform_detached(&mut self, ctx: &EvalContext<'_>) -> f64 {
        self.vm.execute(&self.program, ctx)
    }

    /// The result of the previous evaluation, 0 before the first.
    #[must_use]
    pub fn last_result(&self) -> f64 {
        self.vm.last_result()
    }

    /// A script sharing this program with a private copy of the
    /// evaluation state, including the last result.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            program: Arc::clone(&self.program),
            vm: self.vm.clone(),
        }
    }

    /// The compiled program.
    #[must_use]
    pub fn program(&self) -> &Arc<CompiledProgram> {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;
    use trackscript_foundation::WorldState;

    #[test]
    fn perform_updates_last_result() {
        let mut script = FunctionScript::from_infix("value + 1").unwrap();
        let ctx = EvalContext::default();
        assert_eq!(script.last_result(), 0.0);
        assert_eq!(script.perform_detached(&ctx), 1.0);
        assert_eq!(script.perform(&ctx, &WorldState::default()), 2.0);
        assert_eq!(script.last_result(), 2.0);
    }

    #[test]
    fn duplicates_copy_memory_then_diverge() {
        let mut a = FunctionScript::from_postfix("value 1 +").unwrap();
        let ctx = EvalContext::default();
        a.perform_detached(&ctx);
        a.perform_detached(&ctx);

        let mut b = a.duplicate();
        assert!(Arc::ptr_eq(a.program(), b.program()));
        assert_eq!(b.last_result(), 2.0);

        assert_eq!(b.perform_detached(&ctx), 3.0);
        assert_eq!(b.perform_detached(&ctx), 4.0);
        assert_eq!(a.last_result(), 2.0);
        assert_eq!(a.perform_detached(&ctx), 3.0);
        assert_eq!(b.last_result(), 4.0);
    }

    #[test]
    fn clones_carry_memory() {
        let mut a = FunctionScript::from_infix("value + 2").unwrap();
        a.perform_detached(&EvalContext::default());
        let b = a.clone();
        assert_eq!(b.last_result(), 2.0);
    }

    #[test]
    fn compile_errors_surface() {
        assert!(FunctionScript::from_infix("Sin[1,2]").is_err());
        assert!(FunctionScript::from_postfix("1 2").is_err());
    }
}
