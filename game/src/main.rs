use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use engine::HeadlessRunner;
use engine::profiling::WorstStep;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cryptris::agent::{CryptrisAction, CryptrisGame};
use cryptris::codec::{decode_ternary, encrypt_simple_message};
use cryptris::keygen::{generate_key_pair, generate_key_ring};
use cryptris::puzzle::generate_puzzle;
use cryptris::session::GameSession;
use cryptris::settings::{ConfigStore, GameConfig};

#[derive(Debug, Parser)]
#[command(name = "cryptris")]
#[command(about = "Lattice puzzle engine: key generation, puzzles and headless rounds")]
struct Cli {
    /// Config file; defaults to $CRYPTRIS_CONFIG_PATH or the XDG location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate one key pair per board length.
    Keys {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate a solvable puzzle and the key that solves it.
    Puzzle {
        #[arg(long, default_value_t = 8)]
        length: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Encrypt a short text under a fresh public key.
    Encrypt {
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 8)]
        length: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play a round headlessly from a move string (`<` `>` `^` `v` `.`).
    Play {
        #[arg(long, default_value_t = 8)]
        length: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "")]
        moves: String,
        /// Extra ticks to run after the moves, stopping early if the round ends.
        #[arg(long, default_value_t = 0)]
        ticks: u64,
        /// Save the recorded frames as JSON.
        #[arg(long)]
        record: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::from_env(),
    };
    let config = store
        .load()
        .with_context(|| format!("loading config from {}", store.path().display()))?;

    match cli.command {
        Commands::Keys { seed } => cmd_keys(&config, resolve_seed(seed)),
        Commands::Puzzle { length, seed } => cmd_puzzle(&config, length, resolve_seed(seed)),
        Commands::Encrypt { text, length, seed } => {
            cmd_encrypt(&config, &text, length, resolve_seed(seed))
        }
        Commands::Play {
            length,
            seed,
            moves,
            ticks,
            record,
        } => cmd_play(&config, length, resolve_seed(seed), &moves, ticks, record),
    }
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    })
}

fn cmd_keys(config: &GameConfig, seed: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let ring = generate_key_ring(config, &mut rng)?;
    info!(seed, "generated key ring");
    println!("{}", serde_json::to_string_pretty(&ring)?);
    Ok(())
}

fn cmd_puzzle(config: &GameConfig, length: usize, seed: u64) -> Result<()> {
    let params = config.params(length)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    let pair = generate_key_pair(length, config, &mut rng)?;
    let puzzle = generate_puzzle(length, &pair.private, params.puzzle_steps, &mut rng);
    let out = serde_json::json!({
        "seed": seed,
        "private_key": pair.private,
        "public_key": pair.public,
        "columns": puzzle.data_message().columns,
        "puzzle": puzzle,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_encrypt(config: &GameConfig, text: &str, length: usize, seed: u64) -> Result<()> {
    let params = config.params(length)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    let pair = generate_key_pair(length, config, &mut rng)?;
    let encrypted =
        encrypt_simple_message(text, &pair.public, params.message_repetitions, &mut rng);
    let out = serde_json::json!({
        "seed": seed,
        "public_key": pair.public,
        "encrypted": encrypted,
        "encrypted_symbols": decode_ternary(&encrypted),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_play(
    config: &GameConfig,
    length: usize,
    seed: u64,
    moves: &str,
    ticks: u64,
    record: Option<PathBuf>,
) -> Result<()> {
    let actions = CryptrisAction::parse_moves(moves)
        .map_err(|c| anyhow!("unknown move {c:?}; expected one of < > ^ v ."))?;
    let game = CryptrisGame::new(length, seed, config)?;
    let mut runner = HeadlessRunner::new(game);
    let mut worst = WorstStep::default();

    let ticks = std::iter::repeat_n(CryptrisAction::Tick, ticks as usize);
    for action in actions.into_iter().chain(ticks) {
        if runner.is_finished() {
            break;
        }
        runner.step_profiled(action, &mut worst);
    }

    if let Some(path) = record {
        runner
            .timemachine()
            .save_json_file(&path)
            .with_context(|| format!("writing recording to {}", path.display()))?;
        info!(path = %path.display(), frames = runner.history().len(), "saved recording");
    }

    let session: &GameSession = runner.state();
    info!(
        worst_frame = worst.frame,
        worst_step_us = worst.timings.total.as_micros() as u64,
        "profiling"
    );
    let out = serde_json::json!({
        "seed": seed,
        "frames": runner.frame(),
        "ticks": session.ticks(),
        "status": session.status(),
        "end_reason": session.end_reason(),
        "player": session.player().snapshot(),
        "opponent": session.opponent_board().snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
