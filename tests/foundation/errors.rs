//! Integration tests for Error types
//!
//! Tests error construction, display, context, and embedded source text.

use trackscript_foundation::{Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn syntax_error_names_expression() {
    let err = Error::syntax("no closing match for '['", "Sin[1");
    assert!(matches!(err.kind, ErrorKind::Syntax { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("Sin[1"));
    assert!(msg.contains("no closing match"));
}

#[test]
fn arity_error_reports_counts() {
    let err = Error::arity("Sin", "one argument", 2, "Sin[1,2]");
    let msg = format!("{err}");
    assert!(msg.contains("Sin"));
    assert!(msg.contains("one argument"));
    assert!(msg.contains('2'));
}

#[test]
fn stack_underflow_reports_depths() {
    let err = Error::stack_underflow("+", 2, 1, "1 +");
    assert!(matches!(
        err.kind,
        ErrorKind::StackUnderflow {
            required: 2,
            available: 1,
            ..
        }
    ));
}

#[test]
fn compile_errors_expose_their_expression() {
    let errors = [
        Error::syntax("x", "a"),
        Error::arity("Sin", "one argument", 0, "a"),
        Error::unknown_function("Warp", "a"),
        Error::empty_argument("Plus", "a"),
        Error::argument_format("Plus", "b c", "a"),
        Error::unknown_token("warp", "a"),
        Error::reserved_instruction("halt", "a"),
        Error::stack_underflow("+", 2, 0, "a"),
        Error::malformed_program(2, "a"),
    ];
    for err in errors {
        assert_eq!(err.expression(), Some("a"), "{err}");
    }
}

#[test]
fn ambient_errors_have_no_expression() {
    assert_eq!(Error::new(ErrorKind::Io("gone".into())).expression(), None);
    assert_eq!(
        Error::new(ErrorKind::Serialization("bad".into())).expression(),
        None
    );
    assert_eq!(Error::new(ErrorKind::Internal("oops".into())).expression(), None);
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_is_attached() {
    let err = Error::unknown_token("warp", "1 warp +")
        .with_context(ErrorContext::new().with_source("doors.txt").with_line(7));
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.line, Some(7));
    assert_eq!(format!("{context}"), "at doors.txt:7");
}

#[test]
fn context_display_without_source() {
    assert_eq!(format!("{}", ErrorContext::new().with_line(3)), "at line 3");
    assert_eq!(format!("{}", ErrorContext::new()), "");
}
