//! Function notation to postfix.
//!
//! Each `Name[arg,...]` node is expanded into a space-separated postfix token
//! stream, arguments first. Function names are matched case-insensitively
//! and their argument counts validated.

use tracing::trace;

use trackscript_foundation::{Error, Result};

/// Every function name accepted in function notation.
pub const FUNCTIONS: &[&str] = &[
    "Plus",
    "Subtract",
    "Times",
    "Divide",
    "Power",
    "Quotient",
    "Mod",
    "Min",
    "Max",
    "Minus",
    "Reciprocal",
    "Floor",
    "Ceiling",
    "Round",
    "Abs",
    "Sign",
    "Exp",
    "Log",
    "Sqrt",
    "Sin",
    "Cos",
    "Tan",
    "ArcTan",
    "Equal",
    "Unequal",
    "Less",
    "Greater",
    "LessEqual",
    "GreaterEqual",
    "If",
    "Not",
    "And",
    "Or",
    "Xor",
    "Distance",
    "TrackDistance",
    "Doors",
    "LeftDoors",
    "RightDoors",
    "LeftDoorsTarget",
    "RightDoorsTarget",
    "PluginState",
];

/// How a function expands into postfix.
#[derive(Clone, Copy, Debug)]
enum Shape {
    /// Left fold with `token`; no arguments yields `empty`.
    Fold {
        token: &'static str,
        empty: &'static str,
    },
    /// All operands, then one `power` per operand after the first.
    PowerChain,
    /// Exactly two operands followed by `token`.
    Binary(&'static str),
    /// Exactly one operand followed by `token`.
    Unary(&'static str),
    /// Condition, then value, else value, then `?`.
    Conditional,
}

impl Shape {
    fn of(function: &str) -> Option<Self> {
        let shape = match function.to_ascii_lowercase().as_str() {
            "plus" => Self::Fold {
                token: "+",
                empty: "0",
            },
            "times" => Self::Fold {
                token: "*",
                empty: "1",
            },
            "and" => Self::Fold {
                token: "&",
                empty: "1",
            },
            "or" => Self::Fold {
                token: "|",
                empty: "0",
            },
            "xor" => Self::Fold {
                token: "^",
                empty: "0",
            },
            "power" => Self::PowerChain,
            "subtract" => Self::Binary("-"),
            "divide" => Self::Binary("/"),
            "quotient" => Self::Binary("quotient"),
            "mod" => Self::Binary("mod"),
            "min" => Self::Binary("min"),
            "max" => Self::Binary("max"),
            "equal" => Self::Binary("=="),
            "unequal" => Self::Binary("!="),
            "less" => Self::Binary("<"),
            "greater" => Self::Binary(">"),
            "lessequal" => Self::Binary("<="),
            "greaterequal" => Self::Binary(">="),
            "minus" => Self::Unary("minus"),
            "reciprocal" => Self::Unary("reciprocal"),
            "floor" => Self::Unary("floor"),
            "ceiling" => Self::Unary("ceiling"),
            "round" => Self::Unary("round"),
            "abs" => Self::Unary("abs"),
            "sign" => Self::Unary("sign"),
            "exp" => Self::Unary("exp"),
            "log" => Self::Unary("log"),
            "sqrt" => Self::Unary("sqrt"),
            "sin" => Self::Unary("sin"),
            "cos" => Self::Unary("cos"),
            "tan" => Self::Unary("tan"),
            "arctan" => Self::Unary("arctan"),
            "not" => Self::Unary("!"),
            "distance" => Self::Unary("distancetocar"),
            "trackdistance" => Self::Unary("trackdistancetocar"),
            "doors" => Self::Unary("doorsindex"),
            "leftdoors" => Self::Unary("leftdoorsindex"),
            "rightdoors" => Self::Unary("rightdoorsindex"),
            "leftdoorstarget" => Self::Unary("leftdoorstargetindex"),
            "rightdoorstarget" => Self::Unary("rightdoorstargetindex"),
            "pluginstate" => Self::Unary("pluginstate"),
            "if" => Self::Conditional,
            _ => return None,
        };
        Some(shape)
    }

    fn render(self, function: &str, args: &[String], expression: &str) -> Result<String> {
        let n = args.len();
        match self {
            Self::Fold { token, empty } => Ok(match args {
                [] => empty.to_string(),
                [only] => only.clone(),
                // puts a product first so the optimizer can fuse it
                [a, b] if token == "+" && b.ends_with(" *") => format!("{b} {a} +"),
                [first, rest @ ..] => {
                    let mut out = first.clone();
                    for arg in rest {
                        out.push(' ');
                        out.push_str(arg);
                        out.push(' ');
                        out.push_str(token);
                    }
                    out
                }
            }),
            Self::PowerChain => Ok(match args {
                [] => "1".to_string(),
                [only] => only.clone(),
                _ => {
                    let mut out = args.join(" ");
                    for _ in 1..n {
                        out.push_str(" power");
                    }
                    out
                }
            }),
            Self::Binary(token) => match args {
                [a, b] => Ok(format!("{a} {b} {token}")),
                _ => Err(Error::arity(function, "2 arguments", n, expression)),
            },
            Self::Unary(token) => match args {
                [a] => Ok(format!("{a} {token}")),
                _ => Err(Error::arity(function, "1 argument", n, expression)),
            },
            Self::Conditional => match args {
                [c, a, b] => Ok(format!("{c} {a} {b} ?")),
                _ => Err(Error::arity(function, "3 arguments", n, expression)),
            },
        }
    }
}

/// Converts a function-notation expression to postfix.
///
/// Text without a trailing call (`speed`, `3.5`) is returned unchanged.
///
/// # Errors
///
/// Returns an error for empty arguments, arguments containing whitespace,
/// unbalanced brackets, unknown function names, and wrong argument counts.
pub fn to_postfix(function_notation: &str) -> Result<String> {
    let postfix = translate(function_notation.trim())?;
    trace!(function = function_notation, %postfix, "postfix");
    Ok(postfix)
}

fn translate(expression: &str) -> Result<String> {
    let Some(open) = expression.find('[') else {
        return Ok(expression.to_string());
    };
    if !expression.ends_with(']') {
        return Ok(expression.to_string());
    }
    let function = &expression[..open];
    let body = &expression[open + 1..expression.len() - 1];

    let mut raw = split_arguments(body, expression)?;
    if raw.len() == 1 && raw[0].is_empty() {
        raw.clear();
    }
    let mut args = Vec::with_capacity(raw.len());
    for arg in raw {
        if arg.is_empty() {
            return Err(Error::empty_argument(function, expression));
        }
        if arg.contains(char::is_whitespace) {
            return Err(Error::argument_format(function, arg, expression));
        }
        args.push(translate(arg)?.trim().to_string());
    }

    let shape = Shape::of(function).ok_or_else(|| Error::unknown_function(function, expression))?;
    shape.render(function, &args, expression)
}

/// Splits a call body at its top-level commas, trimming each argument.
fn split_arguments<'a>(body: &'a str, expression: &str) -> Result<Vec<&'a str>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => {
                return Err(Error::syntax("unexpected closing bracket", expression));
            }
            ']' => depth -= 1,
            ',' if depth == 0 => {
                args.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::syntax("no closing bracket", expression));
    }
    args.push(body[start..].trim());
    Ok(args)
}
