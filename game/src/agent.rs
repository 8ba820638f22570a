use engine::GameLogic;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::{GameSession, PlayerInput};
use crate::settings::GameConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptrisAction {
    RotateLeft,
    RotateRight,
    Invert,
    Drop,
    /// Advance one 16 ms frame.
    Tick,
    Noop,
}

impl CryptrisAction {
    /// Parses the compact move alphabet used by the CLI: `<` `>` `^` `v` `.`.
    /// Whitespace is skipped; anything else is rejected.
    pub fn parse_moves(moves: &str) -> Result<Vec<CryptrisAction>, char> {
        moves
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '<' => Ok(CryptrisAction::RotateLeft),
                '>' => Ok(CryptrisAction::RotateRight),
                '^' => Ok(CryptrisAction::Invert),
                'v' => Ok(CryptrisAction::Drop),
                '.' => Ok(CryptrisAction::Tick),
                other => Err(other),
            })
            .collect()
    }
}

/// Replayable round: the initial session is built once so every runner
/// starting from this game sees the same keys and message.
#[derive(Debug, Clone)]
pub struct CryptrisGame {
    initial: GameSession,
}

impl CryptrisGame {
    pub fn new(length: usize, seed: u64, config: &GameConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            initial: GameSession::new(length, seed, config)?,
        })
    }

    pub fn from_session(initial: GameSession) -> Self {
        Self { initial }
    }
}

impl GameLogic for CryptrisGame {
    type State = GameSession;
    type Input = CryptrisAction;

    fn initial_state(&self) -> Self::State {
        self.initial.clone()
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        apply_action(&mut next, input);
        next
    }

    fn is_finished(&self, state: &Self::State) -> bool {
        state.is_finished()
    }
}

fn apply_action(session: &mut GameSession, action: CryptrisAction) {
    match action {
        CryptrisAction::RotateLeft => {
            session.input(PlayerInput::RotateLeft);
        }
        CryptrisAction::RotateRight => {
            session.input(PlayerInput::RotateRight);
        }
        CryptrisAction::Invert => {
            session.input(PlayerInput::Invert);
        }
        CryptrisAction::Drop => {
            session.input(PlayerInput::Drop);
        }
        CryptrisAction::Tick => {
            session.tick();
        }
        CryptrisAction::Noop => {}
    }
}
