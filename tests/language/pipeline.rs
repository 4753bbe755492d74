//! Integration tests for the compile pipeline
//!
//! Infix text through function notation, postfix, optimization, and bytecode.

use trackscript_foundation::ErrorKind;
use trackscript_language::{
    CompiledProgram, Opcode, compile, compile_postfix, optimize, stages, to_function_notation,
    to_postfix,
};

// =============================================================================
// Stages
// =============================================================================

#[test]
fn stages_of_a_door_expression() {
    let s = stages("If[speed > 10, 1, 0]").unwrap();
    assert_eq!(s.function, "If[Greater[speed,10],1,0]");
    assert_eq!(s.postfix, "speed 10 > 1 0 ?");
    assert_eq!(s.program.source(), "If[speed > 10, 1, 0]");
}

#[test]
fn stages_agree_with_individual_entry_points() {
    let infix = "2*Max[x-1, (y)]+1";
    let function = to_function_notation(infix).unwrap();
    let postfix = to_postfix(&function).unwrap();
    let s = stages(infix).unwrap();
    assert_eq!(s.function, function);
    assert_eq!(s.postfix, postfix);
    assert_eq!(s.optimized, optimize(&postfix));
}

#[test]
fn fused_multiply_add() {
    let s = stages("speed * 2 + 1").unwrap();
    assert_eq!(s.optimized, "speed 2 1 fma");
    assert_eq!(s.program.code().len(), 3);
    assert_eq!(s.program.max_stack(), 3);
}

#[test]
fn constant_expressions_fold_to_one_load() {
    let program = compile("(2 + 3) * 4 - 1").unwrap();
    assert_eq!(program.constants(), &[19.0]);
    assert_eq!(program.code().len(), 1);
}

#[test]
fn disassembly_lists_every_instruction() {
    let program = compile("Sin[time] * 2").unwrap();
    let listing = program.disassemble();
    assert!(listing.contains("time"));
    assert!(listing.contains("sin"));
    assert!(listing.ends_with(&format!("; max stack {}", program.max_stack())));
}

#[test]
fn hand_assembled_programs_are_validated() {
    let ok = CompiledProgram::from_bytecode(vec![Opcode::Const, Opcode::Neg], vec![2.0]).unwrap();
    assert_eq!(ok.max_stack(), 1);

    let err = CompiledProgram::from_bytecode(vec![Opcode::Add], vec![]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackUnderflow { .. }));

    let err = CompiledProgram::from_bytecode(vec![Opcode::Const], vec![]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Internal(_)));
}

// =============================================================================
// Error Taxonomy
// =============================================================================

fn kind_of(infix: &str) -> ErrorKind {
    compile(infix).unwrap_err().kind
}

#[test]
fn front_end_errors() {
    assert!(matches!(kind_of("(1 + 2"), ErrorKind::Syntax { .. }));
    assert!(matches!(kind_of("Sin[1]]"), ErrorKind::Syntax { .. }));
    assert!(matches!(kind_of("Sin[1,2]"), ErrorKind::Arity { .. }));
    assert!(matches!(kind_of("Warp[1]"), ErrorKind::UnknownFunction { .. }));
    assert!(matches!(kind_of("Plus[1,]"), ErrorKind::EmptyArgument { .. }));
}

#[test]
fn compiler_errors() {
    let kind = |postfix: &str| compile_postfix(postfix).unwrap_err().kind;
    assert!(matches!(kind("warp"), ErrorKind::UnknownToken { .. }));
    assert!(matches!(kind("1 halt"), ErrorKind::ReservedInstruction { .. }));
    assert!(matches!(kind("1 +"), ErrorKind::StackUnderflow { .. }));
    assert!(matches!(kind("1 2"), ErrorKind::MalformedProgram { depth: 2, .. }));
    assert!(matches!(kind(""), ErrorKind::MalformedProgram { depth: 0, .. }));
}

#[test]
fn errors_embed_the_source() {
    let err = compile("Sin[1,2]").unwrap_err();
    assert_eq!(err.expression(), Some("Sin[1,2]"));

    let err = compile("Sin[~]").unwrap_err();
    assert_eq!(err.expression(), Some("Sin[~]"));
    assert!(format!("{err}").contains("Sin[~]"), "{err}");

    let err = compile("speed + velocity").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownToken { .. }));
    assert_eq!(err.expression(), Some("speed + velocity"));

    let err = compile_postfix("speed warp +").unwrap_err();
    assert_eq!(err.expression(), Some("speed warp +"));
    assert!(format!("{err}").contains("warp"));
}

#[test]
fn unknown_variables_are_rejected() {
    assert!(matches!(
        kind_of("speed + velocity"),
        ErrorKind::UnknownToken { .. }
    ));
}
