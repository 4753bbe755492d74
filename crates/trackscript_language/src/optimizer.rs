//! Peephole optimizer for postfix token streams.
//!
//! The optimizer replays the token stream onto a stack of cells. A cell is
//! either a numeric literal or an unevaluated token. Before a token is
//! pushed, the top few cells are matched against local rewrite rules:
//! literal folding, regrouping of chained `+ - * /` with a literal operand,
//! multiply-add fusion into `fma`, cancellation of doubled `minus`,
//! `reciprocal`, `!` and `<>`, negation of comparisons, and `floor` of a
//! division into `quotient`. Each input token is consumed once, so the pass
//! always terminates.

#![allow(clippy::float_cmp)]

use std::fmt;

use tracing::trace;

/// Legacy whole-text rewrites kept for compatibility with existing content.
const LEGACY_PATTERNS: [(&str, &str); 2] = [
    (" 1 1 == -- ", " 0 "),
    (" 1 doors - 1 == -- ", " doors ! -- "),
];

#[derive(Clone, Debug, PartialEq)]
enum Cell {
    Literal(f64),
    Word(String),
}

impl Cell {
    fn word(word: &str) -> Self {
        Self::Word(word.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Word(word) => f.write_str(word),
        }
    }
}

/// Parses a postfix token as a numeric literal.
#[must_use]
pub fn parse_literal(token: &str) -> Option<f64> {
    token.parse().ok()
}

/// Optimizes a postfix token stream.
///
/// Non-literal tokens are lowercased. Literals are printed in their shortest
/// round-trip form, so optimizing the output again yields the same text.
#[must_use]
pub fn optimize(postfix: &str) -> String {
    let tokens = postfix
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    let input = apply_legacy_patterns(&tokens);

    let mut stack = CellStack::default();
    for token in input.split_whitespace() {
        stack.push_token(token);
    }
    let output = apply_legacy_patterns(&stack.to_string());
    trace!(postfix, optimized = %output, "optimized");
    output
}

fn apply_legacy_patterns(tokens: &str) -> String {
    let mut text = format!(" {tokens} ");
    for (pattern, replacement) in LEGACY_PATTERNS {
        text = text.replace(pattern, replacement);
    }
    text.trim().to_string()
}

#[derive(Default)]
struct CellStack {
    cells: Vec<Cell>,
}

impl fmt::Display for CellStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}

impl CellStack {
    fn push_token(&mut self, token: &str) {
        if let Some(value) = parse_literal(token) {
            self.cells.push(Cell::Literal(value));
            return;
        }
        let rewritten = match token {
            "<>" => self.swap(),
            "+" => self.add(),
            "-" => self.subtract(),
            "minus" => self.negate(),
            "*" => self.multiply(),
            "reciprocal" => self.reciprocal(),
            "/" => self.divide(),
            "++" => self.step(1.0),
            "--" => self.step(-1.0),
            "!" => self.not(),
            "==" | "!=" | "<" | ">" | "<=" | ">=" => self.compare(token),
            "floor" => self.floor(),
            _ => false,
        };
        if !rewritten {
            self.cells.push(Cell::word(token));
        }
    }

    /// The literal `back` cells from the top (1 is the top).
    fn literal(&self, back: usize) -> Option<f64> {
        let index = self.cells.len().checked_sub(back)?;
        match self.cells[index] {
            Cell::Literal(value) => Some(value),
            Cell::Word(_) => None,
        }
    }

    /// Whether the cell `back` from the top is the token `word`.
    fn is(&self, back: usize, word: &str) -> bool {
        self.cells
            .len()
            .checked_sub(back)
            .is_some_and(|i| matches!(&self.cells[i], Cell::Word(w) if w == word))
    }

    /// The literal under `op` when `op` sits just below the top cell.
    fn operand_below(&self, op: &str) -> Option<f64> {
        if self.is(2, op) {
            self.literal(3)
        } else {
            None
        }
    }

    fn set(&mut self, back: usize, cell: Cell) {
        let index = self.cells.len() - back;
        self.cells[index] = cell;
    }

    fn pop(&mut self) {
        self.cells.pop();
    }

    fn swap(&mut self) -> bool {
        if self.is(1, "<>") {
            // <> <>
            self.pop();
            return true;
        }
        if self.literal(1).is_some() && self.literal(2).is_some() {
            // x y <>  =>  y x
            let n = self.cells.len();
            self.cells.swap(n - 1, n - 2);
            return true;
        }
        false
    }

    fn add(&mut self) -> bool {
        let Some(y) = self.literal(1) else {
            return false;
        };
        if let Some(x) = self.literal(2) {
            // x y +
            self.set(2, Cell::Literal(x + y));
            self.pop();
        } else if let Some(x) = self.operand_below("+") {
            // A x + y +  =>  A (x+y) +
            self.set(3, Cell::Literal(x + y));
            self.pop();
        } else if let Some(x) = self.operand_below("-") {
            // A x - y +  =>  A (y-x) +
            self.set(3, Cell::Literal(y - x));
            self.set(2, Cell::word("+"));
            self.pop();
        } else if self.is(2, "*") {
            // A x * y +  =>  A x y fma
            self.set(2, Cell::Literal(y));
            self.set(1, Cell::word("fma"));
        } else if let Some(x) = self.operand_below("fma") {
            // A B y fma z +  =>  A B (y+z) fma
            self.set(3, Cell::Literal(x + y));
            self.pop();
        } else {
            return false;
        }
        true
    }

    fn subtract(&mut self) -> bool {
        let Some(y) = self.literal(1) else {
            return false;
        };
        if let Some(x) = self.literal(2) {
            // x y -
            self.set(2, Cell::Literal(x - y));
            self.pop();
        } else if let Some(x) = self.operand_below("+") {
            // A x + y -  =>  A (x-y) +
            self.set(3, Cell::Literal(x - y));
            self.pop();
        } else if let Some(x) = self.operand_below("-") {
            // A x - y -  =>  A (-x-y) +
            self.set(3, Cell::Literal(-x - y));
            self.set(2, Cell::word("+"));
            self.pop();
        } else if self.is(2, "*") {
            // A x * y -  =>  A x (-y) fma
            self.set(2, Cell::Literal(-y));
            self.set(1, Cell::word("fma"));
        } else if let Some(x) = self.operand_below("fma") {
            // A B y fma z -  =>  A B (y-z) fma
            self.set(3, Cell::Literal(x - y));
            self.pop();
        } else {
            return false;
        }
        true
    }

    fn negate(&mut self) -> bool {
        if self.is(1, "minus") {
            self.pop();
            true
        } else if let Some(x) = self.literal(1) {
            self.set(1, Cell::Literal(-x));
            true
        } else {
            false
        }
    }

    fn multiply(&mut self) -> bool {
        let Some(y) = self.literal(1) else {
            return false;
        };
        if let Some(x) = self.literal(2) {
            // x y *
            self.set(2, Cell::Literal(x * y));
            self.pop();
        } else if let Some(x) = self.operand_below("*") {
            // A x * y *  =>  A (x*y) *
            self.set(3, Cell::Literal(x * y));
            self.pop();
        } else if let Some(x) = self.operand_below("+") {
            // A x + y *  =>  A y (x*y) fma
            self.set(3, Cell::Literal(y));
            self.set(2, Cell::Literal(x * y));
            self.set(1, Cell::word("fma"));
        } else if let Some(x) = self.operand_below("-") {
            // A x - y *  =>  A y (-x*y) fma
            self.set(3, Cell::Literal(y));
            self.set(2, Cell::Literal(-x * y));
            self.set(1, Cell::word("fma"));
        } else if let Some(b) = self
            .operand_below("fma")
            .filter(|_| self.cells.len() >= 4)
        {
            if let Some(a) = self.literal(4) {
                // A a b fma y *  =>  A (a*y) (b*y) fma
                self.set(4, Cell::Literal(a * y));
                self.set(3, Cell::Literal(b * y));
                self.pop();
            } else {
                // A B b fma y *  =>  A B * y (b*y) fma
                self.set(3, Cell::word("*"));
                self.set(2, Cell::Literal(y));
                self.set(1, Cell::Literal(b * y));
                self.cells.push(Cell::word("fma"));
            }
        } else {
            return false;
        }
        true
    }

    fn reciprocal(&mut self) -> bool {
        if self.is(1, "reciprocal") {
            self.pop();
            true
        } else if let Some(x) = self.literal(1) {
            self.set(1, Cell::Literal(if x == 0.0 { 0.0 } else { 1.0 / x }));
            true
        } else {
            false
        }
    }

    fn divide(&mut self) -> bool {
        let Some(y) = self.literal(1).filter(|&y| y != 0.0) else {
            return false;
        };
        if let Some(x) = self.literal(2) {
            // x y /
            self.set(2, Cell::Literal(x / y));
            self.pop();
        } else if let Some(x) = self.operand_below("*") {
            // A x * y /  =>  A (x/y) *
            self.set(3, Cell::Literal(x / y));
            self.pop();
        } else {
            return false;
        }
        true
    }

    fn step(&mut self, by: f64) -> bool {
        match self.literal(1) {
            Some(x) => {
                self.set(1, Cell::Literal(x + by));
                true
            }
            None => false,
        }
    }

    fn not(&mut self) -> bool {
        let negated = match self.cells.last() {
            Some(Cell::Word(w)) => match w.as_str() {
                "!" => None,
                "==" => Some("!="),
                "!=" => Some("=="),
                "<" => Some(">="),
                ">" => Some("<="),
                "<=" => Some(">"),
                ">=" => Some("<"),
                _ => return false,
            },
            Some(Cell::Literal(x)) => Some(if *x == 0.0 { "1" } else { "0" }),
            None => return false,
        };
        let Some(negated) = negated else {
            // ! !
            self.pop();
            return true;
        };
        match parse_literal(negated) {
            Some(value) => self.set(1, Cell::Literal(value)),
            None => self.set(1, Cell::word(negated)),
        }
        true
    }

    fn compare(&mut self, op: &str) -> bool {
        let (Some(b), Some(a)) = (self.literal(1), self.literal(2)) else {
            return false;
        };
        let result = match op {
            "==" => a == b,
            "!=" => a != b,
            "<" => a < b,
            ">" => a > b,
            "<=" => a <= b,
            _ => a >= b,
        };
        self.set(2, Cell::Literal(if result { 1.0 } else { 0.0 }));
        self.pop();
        true
    }

    fn floor(&mut self) -> bool {
        if self.is(1, "/") {
            self.set(1, Cell::word("quotient"));
            true
        } else {
            false
        }
    }
}
