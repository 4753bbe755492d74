//! The main REPL implementation.

use std::fmt::Write as _;
use std::io::{self, Write};

use trackscript_foundation::{Error, ErrorKind, Result};
use trackscript_language::compile;

use crate::editor::{LineEditor, ReadResult, RustylineEditor, bracket_depth};
use crate::session::{SCENARIO_FIELDS, Scenario, Session};

/// REPL commands, offered for completion.
pub(crate) const COMMANDS: &[&str] = &[
    ":help",
    ":quit",
    ":stages",
    ":bytecode",
    ":bind",
    ":unbind",
    ":scripts",
    ":tick",
    ":set",
    ":show",
    ":save",
    ":load",
];

const HELP: &str = "\
Expressions are evaluated against the session scenario, e.g. Sin[time] * 2.

  :stages EXPR        Show every pipeline stage of EXPR
  :bytecode EXPR      Show the compiled program of EXPR
  :bind NAME EXPR     Bind EXPR as a script re-evaluated on every tick
  :unbind NAME        Remove a bound script
  :scripts            List bound scripts and their last results
  :tick [N]           Advance N time steps (default 1)
  :set FIELD VALUE    Change the scenario
  :show               Show the scenario
  :save PATH          Save the scenario
  :load PATH          Load a scenario
  :quit               Exit (also Ctrl+D)";

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (scenario, bound scripts).
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,

    /// Continuation prompt (for multi-line input).
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "ts> ".to_string(),
            continuation_prompt: ".. ".to_string(),
        }
    }

    /// Sets the session for this REPL.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop until `:quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails fatally.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            print_banner();
        }

        while self.read_eval_print()? {}

        println!("\nGoodbye!");
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false);
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }
        self.editor.add_history(&input);

        if matches!(trimmed, ":quit" | ":q" | ":exit") {
            return Ok(false);
        }

        match self.eval(trimmed) {
            Ok(output) if !output.is_empty() => println!("{output}"),
            Ok(_) => {}
            Err(e) => print_error(&e),
        }

        Ok(true)
    }

    /// Reads a potentially multi-line input.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        let mut first_line = true;

        loop {
            let prompt = if first_line {
                &self.prompt
            } else {
                &self.continuation_prompt
            };

            match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => {
                    if !first_line {
                        input.push(' ');
                    }
                    input.push_str(&line);

                    if self.is_complete(&input) {
                        return Ok(Some(input));
                    }
                    first_line = false;
                }
                ReadResult::Interrupted => {
                    if !first_line {
                        println!("\nInput cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => {
                    if first_line {
                        return Ok(None);
                    }
                    return Err(Error::new(ErrorKind::Io(
                        "unexpected EOF in multi-line input".to_string(),
                    )));
                }
            }
        }
    }

    /// Checks if input has no unclosed brackets.
    #[allow(clippy::unused_self)]
    fn is_complete(&self, input: &str) -> bool {
        bracket_depth(input) <= 0
    }

    /// Evaluates one input line and returns the text to print.
    ///
    /// Lines starting with `:` are commands; anything else is an infix
    /// expression evaluated against the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression does not compile or the command
    /// fails.
    pub fn eval(&mut self, input: &str) -> Result<String> {
        let input = input.trim();
        if let Some(command) = input.strip_prefix(':') {
            let (name, rest) = command
                .split_once(char::is_whitespace)
                .map_or((command, ""), |(n, r)| (n, r.trim()));
            return self.command(name, rest);
        }

        let result = self.session.evaluate(input)?;
        Ok(format_number(result))
    }

    fn command(&mut self, name: &str, rest: &str) -> Result<String> {
        match name {
            "help" | "h" | "?" => Ok(HELP.to_string()),
            "stages" => {
                let stages = self.session.stages(required(rest, ":stages EXPR")?)?;
                Ok(format!(
                    "function   {}\npostfix    {}\noptimized  {}\n{}",
                    stages.function,
                    stages.postfix,
                    stages.optimized,
                    stages.program.disassemble()
                ))
            }
            "bytecode" => Ok(compile(required(rest, ":bytecode EXPR")?)?.disassemble()),
            "bind" => {
                let (name, expr) = required(rest, ":bind NAME EXPR")?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| usage(":bind NAME EXPR"))?;
                self.session.bind(name, expr.trim())?;
                Ok(format!("bound {name}"))
            }
            "unbind" => {
                let name = required(rest, ":unbind NAME")?;
                if self.session.unbind(name) {
                    Ok(format!("unbound {name}"))
                } else {
                    Err(Error::new(ErrorKind::Internal(format!(
                        "no script named {name}"
                    ))))
                }
            }
            "scripts" => Ok(self.format_scripts()),
            "tick" => {
                let count = if rest.is_empty() {
                    1
                } else {
                    rest.parse().map_err(|_| usage(":tick [N]"))?
                };
                self.session.tick(count);
                let time = self.session.scenario().world.seconds_since_midnight;
                let mut out = format!("time {}", format_number(time));
                if self.session.scripts().next().is_some() {
                    out.push('\n');
                    out.push_str(&self.format_scripts());
                }
                Ok(out)
            }
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| usage(":set FIELD VALUE"))?;
                let value: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| usage(":set FIELD VALUE (VALUE is a number)"))?;
                self.session.set(field, value)?;
                Ok(format!("{field} = {}", format_number(value)))
            }
            "show" => Ok(format_scenario(self.session.scenario())),
            "save" => {
                let path = required(rest, ":save PATH")?;
                self.session.save_scenario(path)?;
                Ok(format!("saved {path}"))
            }
            "load" => {
                let path = required(rest, ":load PATH")?;
                self.session.load_scenario(path)?;
                Ok(format!("loaded {path}"))
            }
            _ => Err(Error::new(ErrorKind::Internal(format!(
                "unknown command :{name}, try :help"
            )))),
        }
    }

    fn format_scripts(&self) -> String {
        let width = self
            .session
            .scripts()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        let lines: Vec<String> = self
            .session
            .scripts()
            .map(|(name, script)| {
                format!(
                    "{name:<width$}  {:>12}  {}",
                    format_number(script.last_result()),
                    script.program().source()
                )
            })
            .collect();
        if lines.is_empty() {
            "no scripts bound".to_string()
        } else {
            lines.join("\n")
        }
    }
}

fn required<'a>(rest: &'a str, form: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(usage(form))
    } else {
        Ok(rest)
    }
}

fn usage(form: &str) -> Error {
    Error::new(ErrorKind::Internal(format!("usage: {form}")))
}

/// Formats a result the way the REPL prints it.
fn format_number(value: f64) -> String {
    format!("{value}")
}

fn format_scenario(scenario: &Scenario) -> String {
    let world = &scenario.world;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "time      {} s (step {} s)",
        format_number(world.seconds_since_midnight),
        format_number(scenario.time_step)
    );
    let _ = writeln!(
        out,
        "object    at {} track {} section {}",
        scenario.position,
        format_number(scenario.track_position),
        scenario
            .section
            .map_or_else(|| "-".to_string(), |s| s.to_string())
    );
    let _ = writeln!(
        out,
        "world     camera {} sections {} timetable {}",
        world.camera_position,
        world.sections.len(),
        if world.custom_timetable_visible {
            "custom"
        } else {
            "default"
        }
    );
    match &scenario.train {
        Some(train) => {
            let h = &train.handles;
            let _ = writeln!(
                out,
                "train     {} cars, speed {} m/s, driver car {}",
                train.cars.len(),
                format_number(train.average_speed),
                train.driver_car
            );
            let _ = write!(
                out,
                "handles   reverser {} power {}/{} brake {}/{}{}",
                h.reverser,
                h.power_notch,
                h.max_power_notch,
                h.brake_notch,
                h.max_brake_notch,
                if h.emergency_brake { " emergency" } else { "" }
            );
        }
        None => out.push_str("train     none"),
    }
    out
}

/// Prints an error to stderr.
fn print_error(error: &Error) {
    match &error.context {
        Some(context) => eprintln!("\x1b[31mError {context}: {error}\x1b[0m"),
        None => eprintln!("\x1b[31mError: {error}\x1b[0m"),
    }
}

/// Prints the welcome banner.
fn print_banner() {
    println!("\x1b[1;36mTrackscript\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!("Type expressions to evaluate, :help for commands, Ctrl+D to exit.");
    println!("Scenario fields: {}\n", SCENARIO_FIELDS.join(" "));
    let _ = io::stdout().flush();
}
