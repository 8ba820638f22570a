//! Player and opponent board: falling key columns merged into the message.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::{Column, Destruction, Effect, columns_from_signed, merge, signed_from_columns};
use crate::settings::BoardGeometry;

/// Residual height a message column may keep and still count as solved.
pub const SOLVED_TOLERANCE: u32 = 1;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FallState {
    #[default]
    Resting,
    Falling {
        offset: i32,
        target: i32,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyColumn {
    pub column: Column,
    pub fall: FallState,
}

impl KeyColumn {
    fn new(column: Column) -> Self {
        Self {
            column,
            fall: FallState::Resting,
        }
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.fall, FallState::Falling { .. })
    }

    /// Pixels below the resting position.
    pub fn offset(&self) -> i32 {
        match self.fall {
            FallState::Resting => 0,
            FallState::Falling { offset, .. } => offset,
        }
    }

    /// Advances one tick; returns true when the column reaches its target.
    fn advance(&mut self, speed: i32) -> bool {
        let FallState::Falling { offset, target } = self.fall else {
            return false;
        };
        let next = offset.saturating_add(speed);
        if next >= target {
            self.fall = FallState::Falling {
                offset: target,
                target,
            };
            return true;
        }
        self.fall = FallState::Falling {
            offset: next,
            target,
        };
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageColumn {
    pub column: Column,
    effects: Vec<Effect>,
}

impl MessageColumn {
    fn new(column: Column) -> Self {
        Self {
            column,
            effects: Vec::new(),
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    fn absorb(&mut self, key: Column) -> Option<Destruction> {
        let outcome = merge(self.column, key);
        self.column = outcome.column;
        if let Some(destruction) = outcome.destruction {
            self.effects.push(Effect::new(destruction));
        }
        outcome.destruction
    }

    fn tick_effects(&mut self) {
        for effect in &mut self.effects {
            effect.tick();
        }
        self.effects.retain(|effect| !effect.is_finished());
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BoardStatus {
    Playing,
    Win,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Key columns that landed this tick.
    pub landed: usize,
    /// Blocks annihilated by sign-mismatched landings this tick.
    pub destroyed: u32,
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub message: Vec<Column>,
    pub effects: Vec<Vec<Effect>>,
    pub key: Vec<Column>,
    pub key_offsets: Vec<i32>,
    pub falling: bool,
    pub drops: u32,
    pub status: BoardStatus,
}

/// A message stack and the key piece that falls onto it.
///
/// Column `i` of the key always lands on column `i` of the message; rotating
/// the key changes which key column faces which message column. Input is
/// ignored while any key column is still falling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    message: Vec<MessageColumn>,
    key: Vec<KeyColumn>,
    geometry: BoardGeometry,
    drops: u32,
}

impl Board {
    pub fn new(message: Vec<Column>, key: Vec<Column>, geometry: BoardGeometry) -> Self {
        assert!(!message.is_empty(), "board needs at least one column");
        assert_eq!(message.len(), key.len(), "message and key widths differ");
        assert!(
            geometry.fall_speed > 0,
            "fall speed must be positive, got {}",
            geometry.fall_speed
        );
        Self {
            message: message.into_iter().map(MessageColumn::new).collect(),
            key: key.into_iter().map(KeyColumn::new).collect(),
            geometry,
            drops: 0,
        }
    }

    pub fn from_vectors(message: &[i32], key: &[i32], geometry: BoardGeometry) -> Self {
        Self::new(columns_from_signed(message), columns_from_signed(key), geometry)
    }

    pub fn len(&self) -> usize {
        self.message.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    pub fn message_columns(&self) -> &[MessageColumn] {
        &self.message
    }

    pub fn key_columns(&self) -> &[KeyColumn] {
        &self.key
    }

    pub fn message_vector(&self) -> Vec<i32> {
        signed_from_columns(&self.message.iter().map(|m| m.column).collect::<Vec<_>>())
    }

    pub fn key_vector(&self) -> Vec<i32> {
        signed_from_columns(&self.key.iter().map(|k| k.column).collect::<Vec<_>>())
    }

    /// Completed `apply_key` calls.
    pub fn drops(&self) -> u32 {
        self.drops
    }

    pub fn is_falling(&self) -> bool {
        self.key.iter().any(KeyColumn::is_falling)
    }

    pub fn rotate_left(&mut self) -> bool {
        if self.is_falling() {
            return false;
        }
        self.key.rotate_left(1);
        true
    }

    pub fn rotate_right(&mut self) -> bool {
        if self.is_falling() {
            return false;
        }
        self.key.rotate_right(1);
        true
    }

    /// Flips the sign of every key column; magnitudes are unchanged.
    pub fn invert_key(&mut self) -> bool {
        if self.is_falling() {
            return false;
        }
        for key in &mut self.key {
            key.column = key.column.inverted();
        }
        true
    }

    /// Starts every key column falling toward the top of its message stack.
    pub fn apply_key(&mut self) -> bool {
        if self.is_falling() {
            return false;
        }
        let g = self.geometry;
        for (key, message) in self.key.iter_mut().zip(&self.message) {
            let message_height = if message.column.is_empty() {
                0
            } else {
                g.stack_height(message.column.value)
            };
            let key_height = g.stack_height(key.column.value);
            let target = g.available_height - message_height - key_height - g.spacing;
            key.fall = FallState::Falling { offset: 0, target };
        }
        self.drops = self.drops.saturating_add(1);
        debug!(drops = self.drops, key = ?self.key_vector(), "key dropped");
        true
    }

    /// One simulation frame: advance falling columns, resolve landings and
    /// fade effects.
    pub fn update(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let speed = self.geometry.fall_speed;

        for (index, key) in self.key.iter_mut().enumerate() {
            if !key.advance(speed) {
                continue;
            }
            let message = &mut self.message[index];
            let before = message.column;
            let destruction = message.absorb(key.column);
            key.fall = FallState::Resting;
            report.landed += 1;
            if let Some(d) = destruction {
                report.destroyed += d.amount;
            }
            debug!(index, ?before, key = ?key.column, after = ?message.column, "key column landed");
        }

        for message in &mut self.message {
            message.tick_effects();
        }
        report
    }

    /// Ticks until no key column is falling. Returns the merged report.
    pub fn settle(&mut self) -> TickReport {
        let mut total = TickReport::default();
        while self.is_falling() {
            let report = self.update();
            total.landed += report.landed;
            total.destroyed += report.destroyed;
        }
        total
    }

    pub fn check_status(&self) -> BoardStatus {
        if self
            .message
            .iter()
            .all(|m| m.column.value <= SOLVED_TOLERANCE)
        {
            BoardStatus::Win
        } else {
            BoardStatus::Playing
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            message: self.message.iter().map(|m| m.column).collect(),
            effects: self.message.iter().map(|m| m.effects.clone()).collect(),
            key: self.key.iter().map(|k| k.column).collect(),
            key_offsets: self.key.iter().map(KeyColumn::offset).collect(),
            falling: self.is_falling(),
            drops: self.drops,
            status: self.check_status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnKind;

    fn board(message: &[i32], key: &[i32]) -> Board {
        Board::from_vectors(message, key, BoardGeometry::default())
    }

    #[test]
    #[should_panic(expected = "fall speed must be positive")]
    fn zero_fall_speed_is_rejected() {
        let geometry = BoardGeometry {
            fall_speed: 0,
            ..BoardGeometry::default()
        };
        Board::from_vectors(&[3, 0], &[2, 0], geometry);
    }

    #[test]
    fn key_advance_clamps_to_target() {
        let mut key = KeyColumn::new(Column::from_signed(2));
        key.fall = FallState::Falling {
            offset: 0,
            target: 30,
        };
        assert!(!key.advance(20));
        assert_eq!(key.offset(), 20);
        assert!(key.advance(20));
        assert_eq!(key.offset(), 30);
    }

    #[test]
    fn drop_target_accounts_for_both_stacks() {
        let mut b = board(&[3, 0], &[2, 0]);
        assert!(b.apply_key());
        let g = BoardGeometry::default();
        let expected_first = g.available_height - 3 * 34 - 2 * 34 - g.spacing;
        let expected_second = g.available_height - g.spacing;
        assert_eq!(
            b.key_columns()[0].fall,
            FallState::Falling {
                offset: 0,
                target: expected_first
            }
        );
        assert_eq!(
            b.key_columns()[1].fall,
            FallState::Falling {
                offset: 0,
                target: expected_second
            }
        );
    }

    #[test]
    fn falling_takes_multiple_ticks_then_rests() {
        let mut b = board(&[0, 0], &[1, 0]);
        b.apply_key();
        let first = b.update();
        assert_eq!(first.landed, 0);
        assert!(b.is_falling());

        let settled = b.settle();
        assert_eq!(settled.landed, 2);
        assert!(!b.is_falling());
        assert!(b.key_columns().iter().all(|k| k.offset() == 0));
        assert_eq!(b.message_vector(), vec![1, 0]);
        assert_eq!(b.key_vector(), vec![1, 0]);
    }

    #[test]
    fn message_effects_fade_and_disappear() {
        let mut b = board(&[3], &[-2]);
        b.apply_key();
        b.settle();
        assert_eq!(b.message_vector(), vec![1]);
        assert_eq!(b.message_columns()[0].effects().len(), 1);

        for _ in 0..30 {
            b.update();
        }
        assert!(b.message_columns()[0].effects().is_empty());
    }

    #[test]
    fn snapshot_reports_offsets_and_status() {
        let mut b = board(&[2, -1], &[-1, 0]);
        b.apply_key();
        b.update();
        let snap = b.snapshot();
        assert!(snap.falling);
        assert_eq!(snap.key_offsets[0], b.geometry().fall_speed);
        assert_eq!(snap.status, BoardStatus::Playing);
        assert_eq!(snap.drops, 1);
        assert_eq!(snap.message[1].kind, ColumnKind::Negative);
    }
}
