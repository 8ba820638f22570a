//! One decryption round: the player races a random opponent to flatten the
//! same message. The player holds the private key, the opponent only the
//! public key.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Board, BoardStatus, TickReport};
use crate::codec::encrypt_simple_message;
use crate::error::ConfigError;
use crate::keygen::{KeyPair, generate_key_pair};
use crate::opponent::Opponent;
use crate::puzzle::generate_puzzle;
use crate::round_timer::RoundTimer;
use crate::settings::GameConfig;

/// Simulated time per tick (60 fps).
pub const FRAME: Duration = Duration::from_millis(16);

/// Offset applied to the session seed for the opponent's own stream.
const OPPONENT_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EndReason {
    Decrypted,
    OpponentDecrypted,
    TimeUp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerInput {
    RotateLeft,
    RotateRight,
    Invert,
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSession {
    seed: u64,
    keys: KeyPair,
    initial_message: Vec<i32>,
    player: Board,
    opponent_board: Board,
    opponent: Opponent,
    timer: Option<RoundTimer>,
    #[serde(with = "crate::serde_duration::option")]
    auto_drop_interval: Option<Duration>,
    #[serde(with = "crate::serde_duration")]
    auto_drop_elapsed: Duration,
    #[serde(with = "crate::serde_duration")]
    clock: Duration,
    ticks: u64,
    status: SessionStatus,
    end_reason: Option<EndReason>,
}

impl GameSession {
    /// Fresh keys and a solvable puzzle for `length`, all drawn from `seed`.
    pub fn new(length: usize, seed: u64, config: &GameConfig) -> Result<Self, ConfigError> {
        let params = config.params(length)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let keys = generate_key_pair(length, config, &mut rng)?;
        let puzzle = generate_puzzle(length, &keys.private, params.puzzle_steps, &mut rng);
        Ok(Self::from_parts(keys, puzzle.message, seed, config))
    }

    /// Encrypts `text` under a fresh public key; decrypting leaves the
    /// plaintext digits as the residue.
    pub fn encrypted(
        length: usize,
        text: &str,
        seed: u64,
        config: &GameConfig,
    ) -> Result<Self, ConfigError> {
        let params = config.params(length)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let keys = generate_key_pair(length, config, &mut rng)?;
        let message =
            encrypt_simple_message(text, &keys.public, params.message_repetitions, &mut rng);
        Ok(Self::from_parts(keys, message, seed, config))
    }

    pub fn from_parts(keys: KeyPair, message: Vec<i32>, seed: u64, config: &GameConfig) -> Self {
        let player = Board::from_vectors(&message, keys.private.as_slice(), config.geometry);
        let opponent_board = Board::from_vectors(&message, keys.public.as_slice(), config.geometry);
        let mut session = Self {
            seed,
            keys,
            initial_message: message,
            player,
            opponent_board,
            opponent: Opponent::new(config.opponent, seed ^ OPPONENT_SEED_SALT),
            timer: config.round_limit.map(RoundTimer::new),
            auto_drop_interval: config.auto_drop_interval.filter(|d| !d.is_zero()),
            auto_drop_elapsed: Duration::ZERO,
            clock: Duration::ZERO,
            ticks: 0,
            status: SessionStatus::Playing,
            end_reason: None,
        };
        session.evaluate();
        session
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn length(&self) -> usize {
        self.player.len()
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    pub fn initial_message(&self) -> &[i32] {
        &self.initial_message
    }

    pub fn player(&self) -> &Board {
        &self.player
    }

    pub fn opponent_board(&self) -> &Board {
        &self.opponent_board
    }

    pub fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    pub fn timer(&self) -> Option<&RoundTimer> {
        self.timer.as_ref()
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::Playing
    }

    /// Routes a player action to the player board. Returns false when the
    /// action was ignored (round over, or key still falling).
    pub fn input(&mut self, input: PlayerInput) -> bool {
        if self.is_finished() {
            return false;
        }
        match input {
            PlayerInput::RotateLeft => self.player.rotate_left(),
            PlayerInput::RotateRight => self.player.rotate_right(),
            PlayerInput::Invert => self.player.invert_key(),
            PlayerInput::Drop => self.player.apply_key(),
        }
    }

    /// Advances both boards, the opponent and the clocks by one frame.
    pub fn tick(&mut self) -> TickReport {
        if self.is_finished() {
            return TickReport::default();
        }
        self.ticks += 1;
        self.clock = self.clock.saturating_add(FRAME);

        if let Some(interval) = self.auto_drop_interval {
            self.auto_drop_elapsed = self.auto_drop_elapsed.saturating_add(FRAME);
            while self.auto_drop_elapsed >= interval {
                self.auto_drop_elapsed = self.auto_drop_elapsed.saturating_sub(interval);
                self.player.apply_key();
            }
        }

        let report = self.player.update();
        self.opponent.update(self.clock, &mut self.opponent_board);
        self.opponent_board.update();
        if let Some(timer) = self.timer.as_mut() {
            timer.advance(FRAME);
        }

        self.evaluate();
        report
    }

    /// Ticks until the round ends or `max_ticks` frames have run.
    pub fn run_ticks(&mut self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while ran < max_ticks && !self.is_finished() {
            self.tick();
            ran += 1;
        }
        ran
    }

    fn evaluate(&mut self) {
        let reason = if self.player.check_status() == BoardStatus::Win {
            EndReason::Decrypted
        } else if self.opponent_board.check_status() == BoardStatus::Win {
            EndReason::OpponentDecrypted
        } else if self.timer.as_ref().is_some_and(RoundTimer::is_up) {
            EndReason::TimeUp
        } else {
            return;
        };

        self.status = match reason {
            EndReason::Decrypted => SessionStatus::Won,
            EndReason::OpponentDecrypted | EndReason::TimeUp => SessionStatus::Lost,
        };
        self.end_reason = Some(reason);
        info!(
            length = self.length(),
            seed = self.seed,
            ticks = self.ticks,
            drops = self.player.drops(),
            status = ?self.status,
            ?reason,
            "round finished"
        );
    }
}
