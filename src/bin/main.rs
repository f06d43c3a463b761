use clap::Parser;
use lox_treewalk::{Failure, Lox};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Runs a Lox script, or starts an interactive prompt when none is given.
#[derive(Parser)]
#[command(name = "lox", author, version, about)]
struct Cli {
    script: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not usage errors.
            let code = if e.use_stderr() { 64 } else { 0 };
            let _ = e.print();
            process::exit(code);
        },
    };

    let result = match cli.script {
        Some(path) => run_file(&path),
        None => run_prompt(),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(74);
        },
    }
}

// Tracing stays off unless RUST_LOG is set.
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(path: &Path) -> io::Result<i32> {
    let contents = std::fs::read_to_string(path)?;
    let mut lox = Lox::new(io::stdout());

    match lox.run(&contents) {
        Ok(()) => Ok(0),
        Err(failure) => {
            report(&failure)?;
            Ok(failure.exit_code())
        },
    }
}

fn run_prompt() -> io::Result<i32> {
    let mut buffer = String::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lox = Lox::new(io::stdout());

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        buffer.clear();

        let num_bytes = stdin.read_line(&mut buffer)?;
        if num_bytes == 0 { break };

        if let Err(failure) = lox.run(buffer.as_str()) {
            report(&failure)?;
        }
    }

    Ok(0)
}

fn report(failure: &Failure) -> io::Result<()> {
    let mut stderr = io::stderr();
    for e in failure.errors() {
        writeln!(stderr, "{}", e)?;
    }
    Ok(())
}
