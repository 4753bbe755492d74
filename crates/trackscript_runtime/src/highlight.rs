//! Syntax highlighting for the REPL.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use trackscript_language::{FUNCTIONS, Opcode};

/// Highlighter for Trackscript expressions and REPL commands.
pub struct TrackscriptHighlighter;

impl TrackscriptHighlighter {
    /// Creates a new highlighter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Highlight a line of input.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();

        // REPL command
        if line.starts_with(':') {
            result.push_str("\x1b[1;32m");
            take_while(&mut chars, &mut result, |c| !c.is_whitespace());
            result.push_str("\x1b[0m");
        }

        while let Some(c) = chars.next() {
            match c {
                // Comments in expression files
                '#' | ';' => {
                    result.push_str("\x1b[2;3m"); // dim italic
                    result.push(c);
                    result.extend(chars.by_ref());
                    result.push_str("\x1b[0m");
                }

                // Numbers
                c if c.is_ascii_digit() || c == '.' => {
                    result.push_str("\x1b[35m"); // magenta
                    result.push(c);
                    take_while(&mut chars, &mut result, |n| n.is_ascii_digit() || n == '.');
                    result.push_str("\x1b[0m");
                }

                // Function names and variables
                c if c.is_ascii_alphabetic() => {
                    let mut word = String::from(c);
                    take_while(&mut chars, &mut word, |n| n.is_ascii_alphanumeric());

                    let color = if FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(&word)) {
                        "\x1b[32m" // green
                    } else if Opcode::from_mnemonic(&word).is_some() {
                        "\x1b[36m" // cyan
                    } else {
                        "\x1b[31m" // red: not part of the language
                    };
                    result.push_str(color);
                    result.push_str(&word);
                    result.push_str("\x1b[0m");
                }

                // Operators
                '+' | '-' | '*' | '/' | '^' | '!' | '&' | '|' | '<' | '>' | '=' => {
                    result.push_str("\x1b[33m"); // yellow
                    result.push(c);
                    result.push_str("\x1b[0m");
                }

                // Delimiters
                '(' | ')' | '[' | ']' | ',' => {
                    result.push_str("\x1b[1m"); // bold
                    result.push(c);
                    result.push_str("\x1b[0m");
                }

                _ => result.push(c),
            }
        }

        Cow::Owned(result)
    }
}

fn take_while(chars: &mut Peekable<Chars<'_>>, out: &mut String, pred: impl Fn(char) -> bool) {
    while let Some(next) = chars.next_if(|&c| pred(c)) {
        out.push(next);
    }
}

impl Default for TrackscriptHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
