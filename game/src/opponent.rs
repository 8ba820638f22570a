use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::settings::OpponentSettings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpponentMove {
    RotateLeft,
    RotateRight,
    Invert,
    Drop,
}

impl OpponentMove {
    const SHUFFLES: [OpponentMove; 3] = [
        OpponentMove::RotateLeft,
        OpponentMove::RotateRight,
        OpponentMove::Invert,
    ];

    /// Returns whether the board accepted the move.
    pub fn apply(self, board: &mut Board) -> bool {
        match self {
            OpponentMove::RotateLeft => board.rotate_left(),
            OpponentMove::RotateRight => board.rotate_right(),
            OpponentMove::Invert => board.invert_key(),
            OpponentMove::Drop => board.apply_key(),
        }
    }
}

/// Random adversary: queues a few shuffles followed by a drop, and plays one
/// queued move per interval. It does not try to solve anything.
///
/// Randomness is re-derived from `(seed, plans_made)` so the whole struct
/// stays plain serializable data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Opponent {
    settings: OpponentSettings,
    seed: u64,
    plans_made: u64,
    queue: VecDeque<OpponentMove>,
    #[serde(with = "crate::serde_duration::option")]
    last_action: Option<Duration>,
}

impl Opponent {
    pub fn new(settings: OpponentSettings, seed: u64) -> Self {
        Self {
            settings,
            seed,
            plans_made: 0,
            queue: VecDeque::new(),
            last_action: None,
        }
    }

    /// Active once the start delay has passed.
    pub fn is_active(&self) -> bool {
        self.last_action.is_some()
    }

    pub fn plans_made(&self) -> u64 {
        self.plans_made
    }

    pub fn queue(&self) -> &VecDeque<OpponentMove> {
        &self.queue
    }

    fn plan(&mut self) {
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(self.plans_made));
        self.plans_made += 1;
        for _ in 0..self.settings.plan_length {
            let pick = OpponentMove::SHUFFLES[rng.gen_range(0..OpponentMove::SHUFFLES.len())];
            self.queue.push_back(pick);
        }
        self.queue.push_back(OpponentMove::Drop);
    }

    /// Advances the opponent to session time `now`. Returns the move played,
    /// if any. A move the board rejects (key still falling) is still consumed.
    pub fn update(&mut self, now: Duration, board: &mut Board) -> Option<OpponentMove> {
        let Some(last) = self.last_action else {
            if now >= self.settings.start_delay {
                self.last_action = Some(now);
                self.plan();
                debug!(now_ms = now.as_millis() as u64, "opponent started");
            }
            return None;
        };

        if now.saturating_sub(last) <= self.settings.move_interval {
            return None;
        }
        let Some(next) = self.queue.pop_front() else {
            self.plan();
            return None;
        };
        let accepted = next.apply(board);
        self.last_action = Some(now);
        debug!(?next, accepted, "opponent moved");
        Some(next)
    }
}
