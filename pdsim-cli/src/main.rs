mod logger;

use clap::{Parser, Subcommand};
use logger::RankLog;
use pdsim_core::diagnostics::format_parse_error;
use pdsim_core::{
    check_deck, parse_deck, report, run_parsed, Error, Execution, ProcessContext, Reporter,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdsim")]
#[command(about = "pdsim - velocity-Verlet particle integration", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an input deck
    Run {
        /// Path to the deck file
        file: PathBuf,
        /// Force single-threaded execution
        #[arg(long)]
        serial: bool,
    },
    /// Parse and validate an input deck without running it
    Check {
        /// Path to the deck file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let context = ProcessContext::from_env();
    if let Err(e) = RankLog::init(context, cli.verbose) {
        eprintln!("Error: {}", e);
    }

    let result = match cli.command {
        Commands::Run { file, serial } => run_file(&file, serial, context),
        Commands::Check { file } => check_file(&file, context),
    };

    if let Err(e) = result {
        if context.is_coordinator() {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run_file(file: &PathBuf, serial: bool, context: ProcessContext) -> Result<(), Error> {
    let source = fs::read_to_string(file)?;
    let mut out = Reporter::stdout(context);
    let mut err = Reporter::stderr(context);

    let mut deck = match parse_deck(&source) {
        Ok(deck) => deck,
        Err(e) => return err.log_err(&[&format_parse_error(&e, &source)]),
    };
    if serial {
        deck.execution = Execution::Serial;
    }

    match run_parsed(&deck, &mut out) {
        Ok(summary) => {
            report!(out, "momentum {}", summary.momentum)?;
            Ok(())
        }
        Err(e) => err.log_err(&[&e]),
    }
}

fn check_file(file: &PathBuf, context: ProcessContext) -> Result<(), Error> {
    let source = fs::read_to_string(file)?;
    let mut out = Reporter::stdout(context);
    let mut err = Reporter::stderr(context);

    let deck = match parse_deck(&source) {
        Ok(deck) => deck,
        Err(e) => return err.log_err(&[&format_parse_error(&e, &source)]),
    };

    let diagnostics = check_deck(&deck);
    for diagnostic in diagnostics.iter() {
        out.log(&[diagnostic])?;
    }
    if diagnostics.has_errors() {
        return err.log_err(&[&"deck has ", &diagnostics.errors().count(), &" error(s)"]);
    }

    report!(
        out,
        "ok: {} particles, {} steps of dt = {} ({})",
        deck.particles.len(),
        deck.steps,
        deck.timestep.dt,
        deck.execution
    )?;
    Ok(())
}
