//! # Pushvault Main Entry Point
//!
//! Command line front end: generate levels, answer JSON requests, derive vault
//! levels and solve level files.

use clap::{Parser, Subcommand, ValueEnum};
use pushvault::board::solver::{solve, Solution};
use pushvault::service::{self, GenerationRequest, GenerationResponse};
use pushvault::{
    config, Board, GenerationOutcome, GenerationParameters, LevelGenerator, Position,
    PushvaultError, PushvaultResult, SchedulePolicy, Seed, VaultRun,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "dev-tools")]
use tracing::{info, Level};

#[cfg(not(feature = "dev-tools"))]
use log::info;

/// Command line arguments for Pushvault.
#[derive(Parser, Debug)]
#[command(name = "pushvault")]
#[command(about = "Seeded generator of solvable push-block puzzles")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one level
    Generate(GenerateArgs),
    /// Answer a JSON generation request read from a file
    Request {
        /// Path to the request JSON
        file: PathBuf,
    },
    /// Generate the level at a depth of a vault run
    Vault {
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = 0)]
        depth: u32,
    },
    /// Print the minimum number of pushes of a level file
    Solve {
        /// Level rows, one per line
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value_t = 9)]
    width: u32,

    #[arg(long, default_value_t = 9)]
    height: u32,

    #[arg(short, long, default_value_t = 3)]
    boxes: u32,

    /// Minimum number of walls inside the border
    #[arg(long, default_value_t = 13)]
    min_walls: u32,

    #[arg(long, default_value_t = config::DEFAULT_ATTEMPT_BUDGET)]
    attempts: u32,

    /// Integer or text seed
    #[arg(short, long, default_value = "42")]
    seed: String,

    /// Fixed player start as `x,y`
    #[arg(long, value_parser = parse_position)]
    player: Option<Position>,

    #[arg(long)]
    min_difficulty: Option<u32>,

    #[arg(long, value_enum, default_value_t = Profile::Bounded)]
    profile: Profile,

    /// Deadline of the bounded profile
    #[arg(long, default_value_t = config::SERVER_DEADLINE.as_millis() as u64)]
    deadline_ms: u64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Profile {
    Bounded,
    Smooth,
}

fn parse_position(text: &str) -> Result<Position, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {text:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok(Position::new(x, y))
}

/// Integer text becomes a numeric seed, anything else a text seed.
fn parse_seed(text: &str) -> Seed {
    text.parse::<u64>()
        .map(Seed::Number)
        .unwrap_or_else(|_| Seed::from(text))
}

#[tokio::main]
async fn main() -> PushvaultResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Pushvault v{}", pushvault::VERSION);

    match args.command {
        Command::Generate(generate) => run_generate(&generate).await,
        Command::Request { file } => run_request(&file).await,
        Command::Vault { seed, depth } => run_vault(&seed, depth),
        Command::Solve { file } => run_solve(&file),
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> PushvaultResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_target(false)
            .init();
    }

    Ok(())
}

async fn run_generate(args: &GenerateArgs) -> PushvaultResult<()> {
    let seed = parse_seed(&args.seed);
    let mut params = GenerationParameters::new(args.width, args.height, args.boxes, seed)
        .with_min_walls(args.min_walls)
        .with_attempts(args.attempts);
    params.initial_player = args.player;
    params.min_difficulty = args.min_difficulty;

    let policy = match args.profile {
        Profile::Bounded => SchedulePolicy::bounded(Duration::from_millis(args.deadline_ms)),
        Profile::Smooth => SchedulePolicy::smooth(),
    };
    let outcome = LevelGenerator::new(policy).generate_async(&params).await?;
    print_outcome(&outcome, args.json)
}

fn print_outcome(outcome: &GenerationOutcome, json: bool) -> PushvaultResult<()> {
    if json {
        let response = GenerationResponse::from(outcome.clone());
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let report = outcome.report();
    match outcome {
        GenerationOutcome::Succeeded { result, .. } => {
            for row in &result.rows {
                println!("{row}");
            }
            println!(
                "difficulty: {} pushes ({} attempts, {:?})",
                result.difficulty, report.attempts, report.elapsed
            );
        }
        GenerationOutcome::Exhausted { .. } => {
            println!("No level after {} attempts", report.attempts);
        }
        GenerationOutcome::TimedOut { .. } => {
            println!("Timed out after {} attempts", report.attempts);
        }
    }
    Ok(())
}

async fn run_request(file: &Path) -> PushvaultResult<()> {
    let request = GenerationRequest::from_file(file)?;
    let response = service::handle_request_async(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_vault(seed: &str, depth: u32) -> PushvaultResult<()> {
    let run = VaultRun::new(parse_seed(seed));
    let outcome = run.generate(depth, &LevelGenerator::default())?;
    print_outcome(&outcome, false)
}

fn run_solve(file: &Path) -> PushvaultResult<()> {
    let text = std::fs::read_to_string(file)?;
    let rows: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    let board = Board::from_rows(&rows)?;
    if board.player().is_none() {
        return Err(PushvaultError::InvalidLevel("level has no player".to_string()));
    }

    match solve(&board, config::SOLVER_STATES) {
        Solution::Solved { pushes, .. } => println!("{pushes} pushes"),
        Solution::Unsolvable => println!("unsolvable"),
        Solution::GaveUp { expanded } => println!("gave up after {expanded} states"),
    }
    Ok(())
}
