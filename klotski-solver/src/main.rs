//! Klotski Solver
//!
//! Finds a shortest move sequence for the classic layout with breadth-first
//! search, then prints every transition.
//!
//! Exit status: 0 solved, 1 no solution, 2 interrupted, 3 internal error.

mod movegen;
mod path;
mod report;
mod solver;
mod stats;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use klotski_core::{Identity, Mechanism, Puzzle, Rules};
use log::{info, warn};

use crate::report::{OutcomeReport, SolutionReport};
use crate::solver::{Outcome, SearchConfig, Solver};

#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(about = "Shortest-path solver for the classic Klotski layout")]
struct Args {
    /// How combo-move legality is evaluated
    #[arg(long, value_enum, default_value_t = RulesArg::Composed)]
    rules: RulesArg,

    /// Whether same-class pieces are interchangeable
    #[arg(long, value_enum, default_value_t = IdentityArg::Labelled)]
    identity: IdentityArg,

    /// Only allow one-cell slides (no double steps or diagonals)
    #[arg(long)]
    single_steps_only: bool,

    /// Print the solution (or how the search ended) as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Print move descriptions only, without boards or statistics
    #[arg(long)]
    quiet: bool,

    /// Seconds between progress log lines
    #[arg(long, default_value_t = 5)]
    log_interval: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RulesArg {
    /// Direction pairs composed from single steps, per piece class
    Composed,
    /// Hard-coded combined masks for every pattern
    Bitmask,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum IdentityArg {
    /// Every piece keeps its own identity
    Labelled,
    /// Same-class pieces are interchangeable
    Interchangeable,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        let mechanism = match self.rules {
            RulesArg::Composed => Mechanism::Composed,
            RulesArg::Bitmask => Mechanism::Bitmask,
        };
        let rules = if self.single_steps_only {
            Rules::single_steps(mechanism)
        } else {
            Rules::new(mechanism)
        };
        let identity = match self.identity {
            IdentityArg::Labelled => Identity::Labelled,
            IdentityArg::Interchangeable => Identity::Interchangeable,
        };
        SearchConfig {
            rules,
            identity,
            log_interval_secs: self.log_interval,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.quiet || args.json { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&args) {
        Ok(Outcome::Solved(_)) => ExitCode::SUCCESS,
        Ok(Outcome::Exhausted) => ExitCode::from(1),
        Ok(Outcome::Interrupted) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run(args: &Args) -> Result<Outcome> {
    let config = args.search_config();
    let puzzle = Puzzle::classic();
    let text = !args.json;
    let verbose = text && !args.quiet;

    if verbose {
        println!("Klotski Solver");
        println!("==============");
        println!(
            "Rules: {:?}{}",
            config.rules.mechanism,
            if config.rules.combos { "" } else { " (single steps only)" }
        );
        println!("Identity: {:?}", config.identity);
        println!();
        println!("{}", puzzle.start);
        println!();
    }

    // Set up SIGINT handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping search...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    info!("Starting search from initial position...");
    let start = Instant::now();
    let mut solver = Solver::new(config);
    let outcome = solver.solve(&puzzle, running).context("invalid puzzle")?;
    let elapsed = start.elapsed();
    info!("Search finished in {:.2}s", elapsed.as_secs_f64());

    if args.json && !matches!(outcome, Outcome::Solved(_)) {
        let report = OutcomeReport::new(outcome, config.rules, config.identity, &solver.stats);
        println!("{}", report.to_json().context("serializing outcome")?);
        return Ok(outcome);
    }

    let solved = match outcome {
        Outcome::Solved(board) => board,
        Outcome::Exhausted => {
            println!("No solution found");
            if verbose {
                println!();
                solver.stats.print_summary();
            }
            return Ok(outcome);
        }
        Outcome::Interrupted => {
            println!("Search was interrupted before completion.");
            return Ok(outcome);
        }
    };

    let path = solver.path(solved).context("reconstructing solution path")?;
    let steps = path::steps(&path).context("describing solution moves")?;

    if args.json {
        let report =
            SolutionReport::new(config.rules, config.identity, &path, &steps, &solver.stats);
        println!("{}", report.to_json().context("serializing solution")?);
        return Ok(outcome);
    }

    println!("Found solution! {} moves", steps.len());
    for (i, (step, board)) in steps.iter().zip(path.iter().skip(1)).enumerate() {
        let piece = board.piece(step.piece);
        println!(
            "Move {}: piece {} ({}) {}",
            i + 1,
            step.piece,
            piece.color().symbol(),
            step.pattern
        );
        if verbose {
            println!("{}", board);
            println!();
        }
    }

    if verbose {
        println!("==========================");
        println!("Time: {:.2}s", elapsed.as_secs_f64());
        solver.stats.print_summary();
    }

    Ok(outcome)
}
