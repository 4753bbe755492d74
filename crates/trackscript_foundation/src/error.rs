//! Error types for the Trackscript system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every compile-time error embeds the offending token or sub-expression
//! together with the text it was found in, so authors can locate the fault
//! in their own content.

use std::fmt;

use thiserror::Error;

/// The main error type for Trackscript operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a syntax error (unbalanced brackets or parentheses, stray operators).
    #[must_use]
    pub fn syntax(message: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            expression: expression.into(),
        })
    }

    /// Creates an arity error for a known function.
    #[must_use]
    pub fn arity(
        function: impl Into<String>,
        expected: impl Into<String>,
        actual: usize,
        expression: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Arity {
            function: function.into(),
            expected: expected.into(),
            actual,
            expression: expression.into(),
        })
    }

    /// Creates an unknown function error.
    #[must_use]
    pub fn unknown_function(function: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownFunction {
            function: function.into(),
            expression: expression.into(),
        })
    }

    /// Creates an empty argument error.
    #[must_use]
    pub fn empty_argument(function: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyArgument {
            function: function.into(),
            expression: expression.into(),
        })
    }

    /// Creates an argument format error (an argument containing whitespace).
    #[must_use]
    pub fn argument_format(
        function: impl Into<String>,
        argument: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::ArgumentFormat {
            function: function.into(),
            argument: argument.into(),
            expression: expression.into(),
        })
    }

    /// Creates an unknown postfix token error.
    #[must_use]
    pub fn unknown_token(token: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownToken {
            token: token.into(),
            expression: expression.into(),
        })
    }

    /// Creates an error for an instruction that exists but may not be compiled from text.
    #[must_use]
    pub fn reserved_instruction(token: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReservedInstruction {
            token: token.into(),
            expression: expression.into(),
        })
    }

    /// Creates a stack underflow error.
    #[must_use]
    pub fn stack_underflow(
        token: impl Into<String>,
        required: usize,
        available: usize,
        expression: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::StackUnderflow {
            token: token.into(),
            required,
            available,
            expression: expression.into(),
        })
    }

    /// Creates a malformed program error (final stack depth is not one).
    #[must_use]
    pub fn malformed_program(depth: usize, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedProgram {
            depth,
            expression: expression.into(),
        })
    }

    /// Replaces the source text embedded in a compile-time error.
    ///
    /// Ambient errors are returned unchanged.
    #[must_use]
    pub fn with_expression(mut self, source: impl Into<String>) -> Self {
        match &mut self.kind {
            ErrorKind::Syntax { expression, .. }
            | ErrorKind::Arity { expression, .. }
            | ErrorKind::UnknownFunction { expression, .. }
            | ErrorKind::EmptyArgument { expression, .. }
            | ErrorKind::ArgumentFormat { expression, .. }
            | ErrorKind::UnknownToken { expression, .. }
            | ErrorKind::ReservedInstruction { expression, .. }
            | ErrorKind::StackUnderflow { expression, .. }
            | ErrorKind::MalformedProgram { expression, .. } => *expression = source.into(),
            ErrorKind::Io(_) | ErrorKind::Serialization(_) | ErrorKind::Internal(_) => {}
        }
        self
    }

    /// Returns the source text embedded in a compile-time error.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::Syntax { expression, .. }
            | ErrorKind::Arity { expression, .. }
            | ErrorKind::UnknownFunction { expression, .. }
            | ErrorKind::EmptyArgument { expression, .. }
            | ErrorKind::ArgumentFormat { expression, .. }
            | ErrorKind::UnknownToken { expression, .. }
            | ErrorKind::ReservedInstruction { expression, .. }
            | ErrorKind::StackUnderflow { expression, .. }
            | ErrorKind::MalformedProgram { expression, .. } => Some(expression),
            ErrorKind::Io(_) | ErrorKind::Serialization(_) | ErrorKind::Internal(_) => None,
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Unbalanced brackets or parentheses, or an operator without operands.
    #[error("syntax error: {message} in {expression}")]
    Syntax {
        /// Description of the problem.
        message: String,
        /// The expression being normalized.
        expression: String,
    },

    /// A known function was called with the wrong number of arguments.
    #[error("{function} is expected to have {expected}, got {actual} in {expression}")]
    Arity {
        /// The function name as written.
        function: String,
        /// Description of the accepted argument count.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
        /// The function-notation expression.
        expression: String,
    },

    /// The function name is not part of the language.
    #[error("the function {function} is not supported in {expression}")]
    UnknownFunction {
        /// The function name as written.
        function: String,
        /// The function-notation expression.
        expression: String,
    },

    /// An argument slot was empty, as in `Plus[a,]`.
    #[error("an empty argument is invalid in {function} in {expression}")]
    EmptyArgument {
        /// The function name as written.
        function: String,
        /// The function-notation expression.
        expression: String,
    },

    /// An argument contained embedded whitespace.
    #[error("the argument '{argument}' containing a space is invalid in {function} in {expression}")]
    ArgumentFormat {
        /// The function name as written.
        function: String,
        /// The offending argument.
        argument: String,
        /// The function-notation expression.
        expression: String,
    },

    /// A postfix token is neither a literal nor a known mnemonic.
    #[error("unknown instruction {token} encountered in {expression}")]
    UnknownToken {
        /// The offending token.
        token: String,
        /// The expression being compiled, as written.
        expression: String,
    },

    /// A known mnemonic that may not appear in authored programs.
    #[error("the {token} instruction cannot be compiled in {expression}")]
    ReservedInstruction {
        /// The offending token.
        token: String,
        /// The expression being compiled, as written.
        expression: String,
    },

    /// An instruction consumes more operands than the stack holds.
    #[error(
        "{token} requires at least {required} value(s) on the stack but {available} are available in {expression}"
    )]
    StackUnderflow {
        /// The offending token.
        token: String,
        /// Operands the instruction consumes.
        required: usize,
        /// Operands on the simulated stack at that point.
        available: usize,
        /// The expression being compiled, as written.
        expression: String,
    },

    /// The program does not leave exactly one value on the stack.
    #[error("exactly one value must remain on the stack, found {depth} in {expression}")]
    MalformedProgram {
        /// Final simulated stack depth.
        depth: usize,
        /// The expression being compiled, as written.
        expression: String,
    },

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Scenario encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file or object name.
    pub source: Option<String>,
    /// Line number in source (1-indexed).
    pub line: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line number.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
        } else if let Some(line) = self.line {
            write!(f, "at line {line}")?;
        }
        Ok(())
    }
}

/// Result type alias for Trackscript operations.
pub type Result<T> = std::result::Result<T, Error>;
