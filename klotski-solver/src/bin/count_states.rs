//! Count every layout reachable from the classic start.
//!
//! Runs breadth-first search over the whole graph without stopping at the
//! goal and reports:
//! - Node count and the number of nodes at each distance from the start
//! - Eccentricity of the start (largest distance)
//! - How many nodes are solved, and the nearest one
//!
//! Every node is checked for overlapping pieces along the way.

use std::collections::{HashMap, VecDeque};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use klotski_core::{Board, Identity, Mechanism, Puzzle, Rules};
use log::{info, warn};
use xxhash_rust::xxh64::Xxh64Builder;

#[derive(Parser, Debug)]
#[command(name = "count_states")]
#[command(about = "Reachable-graph census for the classic Klotski layout")]
struct Args {
    /// Treat same-class pieces as distinct (much larger graph)
    #[arg(long)]
    labelled: bool,

    /// Only allow one-cell slides
    #[arg(long)]
    single_steps_only: bool,

    /// Use the hard-coded combined-mask rules
    #[arg(long)]
    bitmask: bool,

    /// Seconds between progress log lines
    #[arg(long, default_value_t = 5)]
    log_interval: u64,
}

/// Totals for the census.
#[derive(Default)]
struct Census {
    /// Nodes at each distance from the start
    layers: Vec<u64>,
    /// Solved nodes
    solved: u64,
    /// Distance of the nearest solved node
    nearest_solved: Option<u32>,
    /// Edges examined
    edges: u64,
}

impl Census {
    fn nodes(&self) -> u64 {
        self.layers.iter().sum()
    }

    fn record(&mut self, depth: u32) {
        let depth = depth as usize;
        if self.layers.len() <= depth {
            self.layers.resize(depth + 1, 0);
        }
        self.layers[depth] += 1;
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(&Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

/// Returns false if interrupted.
fn run(args: &Args) -> Result<bool> {
    let mechanism = if args.bitmask { Mechanism::Bitmask } else { Mechanism::Composed };
    let rules = if args.single_steps_only {
        Rules::single_steps(mechanism)
    } else {
        Rules::new(mechanism)
    };
    let identity = if args.labelled { Identity::Labelled } else { Identity::Interchangeable };
    let puzzle = Puzzle::classic();
    puzzle.validate().context("invalid puzzle")?;

    println!("Reachable State Counter");
    println!("=======================");
    println!("Rules: {:?}", rules);
    println!("Identity: {:?}", identity);
    println!();

    // Set up SIGINT handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping count...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let start_time = Instant::now();
    let mut last_log = Instant::now();

    let mut seen: HashMap<Board, u32, Xxh64Builder> = HashMap::with_hasher(Xxh64Builder::new(39));
    let mut queue: VecDeque<(Board, u32)> = VecDeque::new();
    let mut census = Census::default();

    seen.insert(identity.key(&puzzle.start), 0);
    census.record(0);
    queue.push_back((puzzle.start, 0));

    while let Some((board, depth)) = queue.pop_front() {
        if !running.load(Ordering::SeqCst) {
            println!("\nCount interrupted after {} nodes.", seen.len());
            return Ok(false);
        }

        if !board.is_valid() {
            bail!("invalid layout at depth {}:\n{}", depth, board);
        }

        if puzzle.is_solved(&board) {
            census.solved += 1;
            census.nearest_solved.get_or_insert(depth);
        }

        for (_, next) in board.successors(&rules) {
            census.edges += 1;
            let key = identity.key(&next);
            if !seen.contains_key(&key) {
                seen.insert(key, depth + 1);
                census.record(depth + 1);
                queue.push_back((next, depth + 1));
            }
        }

        if last_log.elapsed().as_secs() >= args.log_interval {
            info!(
                "nodes={} queue={} depth={} elapsed={:.0}s",
                seen.len(),
                queue.len(),
                depth,
                start_time.elapsed().as_secs_f64()
            );
            last_log = Instant::now();
        }
    }

    println!("Enumeration complete!");
    println!("=====================");
    println!("Total nodes: {}", census.nodes());
    println!("Edges examined: {}", census.edges);
    println!("Eccentricity of start: {}", census.layers.len() - 1);
    println!("Solved nodes: {}", census.solved);
    match census.nearest_solved {
        Some(depth) => println!("Nearest solved: {} moves", depth),
        None => println!("Nearest solved: none"),
    }
    println!();
    println!("Nodes per distance:");
    for (depth, count) in census.layers.iter().enumerate() {
        println!("  {:>3}: {}", depth, count);
    }
    println!();
    println!("Total time: {:.1}s", start_time.elapsed().as_secs_f64());

    Ok(true)
}
