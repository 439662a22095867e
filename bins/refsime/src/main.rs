//! Command-line runner for refsim programs.

use clap::{Parser, Subcommand};
use refsim::engine::{run_program, to_csv_string};
use refsim::lang;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and execute a program, writing result CSV.
    Run {
        /// Path to the program source.
        path: PathBuf,
        /// Write CSV here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a program and report diagnostics and compatibility.
    Check {
        /// Path to the program source.
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { path, output } => run(&path, output.as_deref()),
        Commands::Check { path } => check(&path),
    }
}

fn run(path: &std::path::Path, output: Option<&std::path::Path>) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: {error}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let program = match lang::Program::from_source(&source) {
        Ok(program) => program,
        Err(error) => {
            eprintln!("{}:{error}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let rows = match run_program(&program) {
        Ok(rows) => rows,
        Err(error) => {
            eprintln!("execution failed: {error}");
            return ExitCode::FAILURE;
        }
    };
    let csv = to_csv_string(&rows);
    match output {
        Some(path) => {
            if let Err(error) = fs::write(path, csv) {
                eprintln!("{}: {error}", path.display());
                return ExitCode::FAILURE;
            }
        }
        None => print!("{csv}"),
    }
    ExitCode::SUCCESS
}

fn check(path: &std::path::Path) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: {error}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let result = lang::parse(&source);
    for diagnostic in &result.diagnostics {
        eprintln!("{}:{diagnostic}", path.display());
    }
    match result.program {
        Some(program) => {
            let issues = program.incompatibilities();
            if issues.is_empty() {
                println!("ok");
                ExitCode::SUCCESS
            } else {
                for issue in issues {
                    eprintln!("incompatible: {issue}");
                }
                ExitCode::FAILURE
            }
        }
        None => ExitCode::FAILURE,
    }
}
