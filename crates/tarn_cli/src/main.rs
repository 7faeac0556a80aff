//! Command-line interface for the Tarn compiler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tarn_driver::Driver;

#[derive(Parser)]
#[command(name = "tarn")]
#[command(author, version, about = "The Tarn programming language compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Trace pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Tarn source file to QBE IL
    Build {
        /// The input file to compile
        input: PathBuf,

        /// The output file (defaults to the input with an .ssa extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a Tarn source file for errors without generating code
    Check {
        /// The input file to check
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let driver = if cli.verbose {
        Driver::verbose()
    } else {
        Driver::new()
    };

    match run(&driver, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(driver: &Driver, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Build { input, output } => {
            let il = driver
                .compile_file(&input)
                .with_context(|| format!("failed to compile {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_extension("ssa"));
            fs::write(&output, il)
                .with_context(|| format!("failed to write {}", output.display()))?;
            Ok(())
        }
        Commands::Check { input } => {
            driver
                .check_file(&input)
                .with_context(|| format!("{}", input.display()))?;
            Ok(())
        }
    }
}
