//! Trackscript CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use trackscript_runtime::{Repl, Session, serialize};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    expressions: Vec<String>,
    scenario: Option<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    show_stages: bool,
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--stages" => config.show_stages = true,
            "--verbose" => config.verbose = true,
            "-e" | "--eval" => {
                let expr = args.next().ok_or("--eval requires an expression")?;
                config.expressions.push(expr);
            }
            "--scenario" => {
                let path = args.next().ok_or("--scenario requires a file")?;
                config.scenario = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option: {flag}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
    }

    Ok(config)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,trackscript_language=debug,trackscript_runtime=debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether every expression compiled.
fn run(args: Vec<String>) -> Result<bool, Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(true);
    }

    if config.show_version {
        println!("trackscript {}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    init_tracing(config.verbose);

    let mut session = match &config.scenario {
        Some(path) => Session::with_scenario(serialize::load_from_file(path)?),
        None => Session::new(),
    };
    let mut ok = true;

    for file in &config.files {
        for report in session.load_expressions(file, !config.batch_mode)? {
            let location = format!("{}:{}", file.display(), report.line);
            match report.outcome {
                Ok(value) => {
                    println!("{location}  {value}  {}", report.source);
                    if config.show_stages {
                        print_stages(&session, &report.source)?;
                    }
                }
                Err(e) => {
                    eprintln!("\x1b[31m{location}: {e}\x1b[0m");
                    ok = false;
                }
            }
        }
    }

    for expr in &config.expressions {
        if config.show_stages {
            print_stages(&session, expr)?;
        }
        match session.evaluate(expr) {
            Ok(value) => println!("{value}"),
            Err(e) => {
                eprintln!("\x1b[31mError: {e}\x1b[0m");
                ok = false;
            }
        }
    }

    // Expressions on the command line imply batch mode
    if config.batch_mode || !config.expressions.is_empty() {
        return Ok(ok);
    }

    let mut repl = Repl::new()?.with_session(session);
    if !config.files.is_empty() {
        repl = repl.without_banner();
    }
    repl.run()?;
    Ok(true)
}

fn print_stages(session: &Session, expr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stages = session.stages(expr)?;
    println!("  function   {}", stages.function);
    println!("  postfix    {}", stages.postfix);
    println!("  optimized  {}", stages.optimized);
    for line in stages.program.disassemble().lines() {
        println!("  {line}");
    }
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mTrackscript\x1b[0m - Expression compiler and VM for animated train objects

\x1b[1mUSAGE:\x1b[0m
    trackscript [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Expression files to load, one expression per line
                  (lines starting with # or ; are comments)

\x1b[1mOPTIONS:\x1b[0m
    -h, --help           Print help information
    -V, --version        Print version information
    -b, --batch          Compile and report files, then exit (no REPL)
    -e, --eval EXPR      Evaluate EXPR and exit (repeatable)
    --scenario FILE      Load a saved scenario before evaluating
    --stages             Print every pipeline stage of each expression
    --verbose            Log compilation and session events (RUST_LOG overrides)

\x1b[1mEXAMPLES:\x1b[0m
    trackscript                              Start interactive REPL
    trackscript doors.txt                    Bind every line, then start REPL
    trackscript -b doors.txt                 Check doors.txt and exit
    trackscript -e 'Sin[time] * 2' --stages  Show how an expression compiles
    trackscript --scenario rush.msgpack      Start from a saved scenario

\x1b[1mREPL COMMANDS:\x1b[0m
    :help                Show all commands
    :bind NAME EXPR      Bind a script re-evaluated on every tick
    :tick [N]            Advance the scenario
    :set FIELD VALUE     Change the scenario
    :save PATH           Save the scenario
    Ctrl+D               Exit REPL
    Ctrl+C               Cancel current input"
    );
}
