//! Infix to function notation.
//!
//! Rewrites author-facing infix text such as `a+b*c` into a uniform prefix
//! notation (`Plus[a,Times[b,c]]`) in which every operator has become a
//! named call. The rewrite works directly on text: bracketed call arguments
//! are normalized first, then parenthesized groups, then operators from the
//! loosest binding to the tightest.
//!
//! | Operators | Function | Split at |
//! |-----------|----------|----------|
//! | `\|` `^` `&` | `Or` `Xor` `And` | first occurrence |
//! | `!` | `Not` | first `!` not part of `!=` |
//! | `==` `!=` `<=` `>=` `<` `>` | `Equal` ... `Greater` | last occurrence |
//! | `+` `-` | `Plus` `Subtract` | last occurrence |
//! | `*` | `Times` | first occurrence |
//! | `/` | `Divide` | first occurrence |
//! | leading `-` | `Minus` | |

use tracing::trace;

use trackscript_foundation::{Error, Result};

/// Converts an infix expression to function notation.
///
/// # Errors
///
/// Returns a syntax error when brackets or parentheses are unbalanced or
/// mismatched, or when `!` follows an operand.
pub fn to_function_notation(infix: &str) -> Result<String> {
    check_balance(infix)?;
    let function = normalize(infix, true)?;
    trace!(infix, %function, "function notation");
    Ok(function)
}

/// Rejects unbalanced or crossed `[]`/`()` pairs before any rewriting.
fn check_balance(expression: &str) -> Result<()> {
    let mut open = Vec::new();
    for c in expression.chars() {
        match c {
            '[' | '(' => open.push(c),
            ']' | ')' => {
                let expected = if c == ']' { '[' } else { '(' };
                match open.pop() {
                    Some(o) if o == expected => {}
                    Some(o) => {
                        return Err(Error::syntax(
                            format!("'{c}' closes '{o}'"),
                            expression,
                        ));
                    }
                    None => {
                        return Err(Error::syntax(
                            format!("unexpected closing '{c}'"),
                            expression,
                        ));
                    }
                }
            }
            _ => {}
        }
    }
    match open.last() {
        Some(o) => Err(Error::syntax(format!("no closing match for '{o}'"), expression)),
        None => Ok(()),
    }
}

fn normalize(expression: &str, expand_calls: bool) -> Result<String> {
    let expression = expression.trim();
    let expanded;
    let expression = if expand_calls {
        expanded = expand_brackets(expression)?;
        expanded.as_str()
    } else {
        expression
    };

    // parentheses
    if let Some(open) = expression.find('(') {
        let close = matching_parenthesis(expression, open)?;
        let before = expression[..open].trim();
        let inner = normalize(&expression[open + 1..close], false)?;
        let after = expression[close + 1..].trim();
        return normalize(&format!("{before}{inner}{after}"), false);
    }
    if expression.contains(')') {
        return Err(Error::syntax("unexpected closing ')'", expression));
    }

    // logical
    for (symbol, function) in [('|', "Or"), ('^', "Xor"), ('&', "And")] {
        if let Some(i) = expression.find(symbol) {
            return binary(function, &expression[..i], &expression[i + 1..]);
        }
    }
    if let Some(i) = find_not(expression) {
        let operand = expression[..i].trim();
        if !operand.is_empty() {
            return Err(Error::syntax(
                format!("'!' cannot follow the operand '{operand}'"),
                expression,
            ));
        }
        return Ok(format!("Not[{}]", normalize(&expression[i + 1..], false)?));
    }

    // relational
    if let Some((i, symbol, function)) = last_relational(expression) {
        return binary(function, &expression[..i], &expression[i + symbol.len()..]);
    }

    // additive
    let plus = expression.rfind('+');
    let minus = expression.rfind('-');
    if let Some(i) = plus.filter(|&i| minus.is_none_or(|j| i > j)) {
        return binary("Plus", &expression[..i], &expression[i + 1..]);
    }
    if let Some(j) = minus {
        if !expression[..j].trim().is_empty() {
            return binary("Subtract", &expression[..j], &expression[j + 1..]);
        }
    }

    // multiplicative
    if let Some(i) = expression.find('*') {
        return binary("Times", &expression[..i], &expression[i + 1..]);
    }
    if let Some(i) = expression.find('/') {
        return binary("Divide", &expression[..i], &expression[i + 1..]);
    }

    // unary minus
    if let Some(i) = expression.find('-') {
        if expression[..i].trim().is_empty() {
            return Ok(format!("Minus[{}]", normalize(&expression[i + 1..], false)?));
        }
    }

    Ok(expression.to_string())
}

fn binary(function: &str, lhs: &str, rhs: &str) -> Result<String> {
    Ok(format!(
        "{function}[{},{}]",
        normalize(lhs, false)?,
        normalize(rhs, false)?
    ))
}

/// Normalizes the arguments of every `name[...]` call, left to right.
fn expand_brackets(expression: &str) -> Result<String> {
    let mut expression = expression.to_string();
    let mut start = 0;
    while let Some(offset) = expression[start..].find('[') {
        let open = start + offset;
        let (arguments, close) = split_call(&expression, open)?;
        let arguments = arguments
            .into_iter()
            .map(|argument| normalize(argument, true))
            .collect::<Result<Vec<_>>>()?
            .join(",");
        let before = expression[..open].trim();
        let after = expression[close + 1..].trim();
        let rewritten = format!("{before}[{arguments}]{after}");
        start = before.len() + arguments.len() + 2;
        expression = rewritten;
    }
    Ok(expression)
}

/// Splits the call opened at `open` into its top-level arguments and returns
/// them with the index of the closing bracket.
fn split_call(expression: &str, open: usize) -> Result<(Vec<&str>, usize)> {
    let mut depth = 0usize;
    let mut arguments = Vec::new();
    let mut start = open + 1;
    for (i, c) in expression.char_indices().skip_while(|&(i, _)| i <= open) {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => {
                arguments.push(&expression[start..i]);
                return Ok((arguments, i));
            }
            ']' => depth -= 1,
            ',' if depth == 0 => {
                arguments.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    Err(Error::syntax("no closing bracket", expression))
}

fn matching_parenthesis(expression: &str, open: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, c) in expression.char_indices().skip_while(|&(i, _)| i <= open) {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Ok(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    Err(Error::syntax("no closing parenthesis", expression))
}

/// First `!` that does not start a `!=`.
fn find_not(expression: &str) -> Option<usize> {
    let bytes = expression.as_bytes();
    expression
        .match_indices('!')
        .map(|(i, _)| i)
        .find(|&i| bytes.get(i + 1) != Some(&b'='))
}

const RELATIONAL: [(&str, &str); 6] = [
    ("==", "Equal"),
    ("!=", "Unequal"),
    ("<=", "LessEqual"),
    (">=", "GreaterEqual"),
    ("<", "Less"),
    (">", "Greater"),
];

/// The rightmost relational operator; two-character forms win ties.
fn last_relational(expression: &str) -> Option<(usize, &'static str, &'static str)> {
    let mut best: Option<(usize, &'static str, &'static str)> = None;
    for (symbol, function) in RELATIONAL {
        if let Some(i) = expression.rfind(symbol) {
            if best.is_none_or(|(j, _, _)| i > j) {
                best = Some((i, symbol, function));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackscript_foundation::ErrorKind;

    fn f(infix: &str) -> String {
        to_function_notation(infix).unwrap()
    }

    #[test]
    fn precedence() {
        assert_eq!(f("a+b*c"), "Plus[a,Times[b,c]]");
        assert_eq!(f("a*b+c"), "Plus[Times[a,b],c]");
        assert_eq!(f("a - b - c"), "Subtract[Subtract[a,b],c]");
        assert_eq!(f("a/b/c"), "Divide[a,Divide[b,c]]");
        assert_eq!(f("a*b*c"), "Times[a,Times[b,c]]");
    }

    #[test]
    fn parentheses_group_first() {
        assert_eq!(f("(a+b)*c"), "Times[Plus[a,b],c]");
        assert_eq!(f("((a))"), "a");
        assert_eq!(f("2*(3-(4+5))"), "Times[2,Subtract[3,Plus[4,5]]]");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(f("-a"), "Minus[a]");
        assert_eq!(f("-a+b"), "Plus[Minus[a],b]");
        assert_eq!(f("-a*b"), "Times[Minus[a],b]");
        assert_eq!(f("a-b"), "Subtract[a,b]");
    }

    #[test]
    fn relational_uses_last_operator() {
        assert_eq!(f("a<b"), "Less[a,b]");
        assert_eq!(f("a<=b"), "LessEqual[a,b]");
        assert_eq!(f("a>=b"), "GreaterEqual[a,b]");
        assert_eq!(f("a!=b"), "Unequal[a,b]");
        assert_eq!(f("a<b==c"), "Equal[Less[a,b],c]");
        assert_eq!(f("a+1>b"), "Greater[Plus[a,1],b]");
    }

    #[test]
    fn logical_operators() {
        assert_eq!(f("a|b&c"), "Or[a,And[b,c]]");
        assert_eq!(f("a^b"), "Xor[a,b]");
        assert_eq!(f("!a"), "Not[a]");
        assert_eq!(f("!a==b"), "Not[Equal[a,b]]");
        assert_eq!(f("a & !b"), "And[a,Not[b]]");
    }

    #[test]
    fn not_after_operand_is_rejected() {
        let err = to_function_notation("a == !b").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Syntax { .. }));
    }

    #[test]
    fn calls_are_normalized_recursively() {
        assert_eq!(f("Sin[a+b]"), "Sin[Plus[a,b]]");
        assert_eq!(f("If[a<b, 1, 2]"), "If[Less[a,b],1,2]");
        assert_eq!(f("2*Max[x-1, (y)]+1"), "Plus[Times[2,Max[Subtract[x,1],y]],1]");
        assert_eq!(f("Sin[Cos[x*2]]"), "Sin[Cos[Times[x,2]]]");
        assert_eq!(f("Doors[0] + Doors[1]"), "Plus[Doors[0],Doors[1]]");
    }

    #[test]
    fn leaves_are_trimmed() {
        assert_eq!(f("  speed  "), "speed");
        assert_eq!(f(""), "");
    }

    #[test]
    fn unbalanced_input_fails_fast() {
        for bad in ["(a+b", "a+b)", "Sin[a", "Sin]a[", "(a[b)]", "Max[a,b"] {
            let err = to_function_notation(bad).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Syntax { .. }), "{bad}");
            assert_eq!(err.expression(), Some(bad));
        }
    }
}
