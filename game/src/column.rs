//! Message and key columns and the rules for merging them.

use serde::{Deserialize, Serialize};

/// Starting fade level of a destruction effect.
pub const EFFECT_FADE_START: u8 = 255;
/// Fade lost per tick.
pub const EFFECT_FADE_STEP: u8 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Positive,
    Negative,
    Empty,
}

impl ColumnKind {
    pub fn inverted(self) -> Self {
        match self {
            ColumnKind::Positive => ColumnKind::Negative,
            ColumnKind::Negative => ColumnKind::Positive,
            ColumnKind::Empty => ColumnKind::Empty,
        }
    }
}

/// A signed stack height stored as (sign kind, magnitude).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Column {
    pub kind: ColumnKind,
    pub value: u32,
}

impl Column {
    pub const EMPTY: Column = Column {
        kind: ColumnKind::Empty,
        value: 0,
    };

    pub fn new(kind: ColumnKind, value: u32) -> Self {
        if value == 0 {
            return Self::EMPTY;
        }
        Self { kind, value }
    }

    pub fn from_signed(v: i32) -> Self {
        match v {
            v if v > 0 => Self::new(ColumnKind::Positive, v.unsigned_abs()),
            v if v < 0 => Self::new(ColumnKind::Negative, v.unsigned_abs()),
            _ => Self::EMPTY,
        }
    }

    pub fn signed_value(self) -> i32 {
        match self.kind {
            ColumnKind::Positive => self.value as i32,
            ColumnKind::Negative => -(self.value as i32),
            ColumnKind::Empty => 0,
        }
    }

    pub fn inverted(self) -> Self {
        Self {
            kind: self.kind.inverted(),
            value: self.value,
        }
    }

    pub fn is_empty(self) -> bool {
        self.kind == ColumnKind::Empty
    }
}

pub fn columns_from_signed(v: &[i32]) -> Vec<Column> {
    v.iter().copied().map(Column::from_signed).collect()
}

pub fn signed_from_columns(columns: &[Column]) -> Vec<i32> {
    columns.iter().map(|c| c.signed_value()).collect()
}

/// Blocks annihilated by a sign-mismatched landing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destruction {
    pub amount: u32,
    pub message_kind: ColumnKind,
    pub key_kind: ColumnKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeOutcome {
    pub column: Column,
    pub destruction: Option<Destruction>,
}

/// Resolves a key column landing on a message column.
pub fn merge(message: Column, key: Column) -> MergeOutcome {
    if key.is_empty() {
        return MergeOutcome {
            column: message,
            destruction: None,
        };
    }
    if message.is_empty() {
        return MergeOutcome {
            column: key,
            destruction: None,
        };
    }
    if message.kind == key.kind {
        return MergeOutcome {
            column: Column::new(message.kind, message.value + key.value),
            destruction: None,
        };
    }

    let destruction = Destruction {
        amount: message.value.min(key.value),
        message_kind: message.kind,
        key_kind: key.kind,
    };
    let column = if message.value > key.value {
        Column::new(message.kind, message.value - key.value)
    } else if message.value < key.value {
        Column::new(key.kind, key.value - message.value)
    } else {
        Column::EMPTY
    };
    MergeOutcome {
        column,
        destruction: Some(destruction),
    }
}

/// Fading annotation left on a message column by a destructive merge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Effect {
    pub destruction: Destruction,
    pub fade: u8,
}

impl Effect {
    pub fn new(destruction: Destruction) -> Self {
        Self {
            destruction,
            fade: EFFECT_FADE_START,
        }
    }

    pub fn tick(&mut self) {
        self.fade = self.fade.saturating_sub(EFFECT_FADE_STEP);
    }

    pub fn is_finished(&self) -> bool {
        self.fade == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(v: u32) -> Column {
        Column::new(ColumnKind::Positive, v)
    }

    fn neg(v: u32) -> Column {
        Column::new(ColumnKind::Negative, v)
    }

    #[test]
    fn signed_mapping_round_trips() {
        let v = [3, -2, 0, 1, -5, 0, 7, -1];
        let columns = columns_from_signed(&v);
        assert_eq!(columns[0], pos(3));
        assert_eq!(columns[1], neg(2));
        assert_eq!(columns[2], Column::EMPTY);
        assert_eq!(signed_from_columns(&columns), v.to_vec());
    }

    #[test]
    fn zero_magnitude_is_always_empty() {
        assert_eq!(Column::new(ColumnKind::Negative, 0), Column::EMPTY);
    }

    #[test]
    fn landing_on_empty_adopts_key() {
        let out = merge(Column::EMPTY, neg(4));
        assert_eq!(out.column, neg(4));
        assert!(out.destruction.is_none());
    }

    #[test]
    fn same_sign_stacks_grow() {
        let out = merge(pos(2), pos(3));
        assert_eq!(out.column, pos(5));
        assert!(out.destruction.is_none());
    }

    #[test]
    fn taller_message_survives_destruction() {
        let out = merge(pos(5), neg(3));
        assert_eq!(out.column, pos(2));
        assert_eq!(
            out.destruction,
            Some(Destruction {
                amount: 3,
                message_kind: ColumnKind::Positive,
                key_kind: ColumnKind::Negative,
            })
        );
    }

    #[test]
    fn taller_key_flips_message_sign() {
        let out = merge(neg(2), pos(5));
        assert_eq!(out.column, pos(3));
        assert_eq!(out.destruction.map(|d| d.amount), Some(2));
    }

    #[test]
    fn equal_heights_cancel_out() {
        let out = merge(pos(4), neg(4));
        assert_eq!(out.column, Column::EMPTY);
        assert_eq!(out.destruction.map(|d| d.amount), Some(4));
    }

    #[test]
    fn empty_key_leaves_message_untouched() {
        let out = merge(neg(3), Column::EMPTY);
        assert_eq!(out.column, neg(3));
        assert!(out.destruction.is_none());
    }

    #[test]
    fn double_inversion_is_identity() {
        for c in [pos(3), neg(1), Column::EMPTY] {
            assert_eq!(c.inverted().inverted(), c);
        }
        assert_eq!(Column::EMPTY.inverted(), Column::EMPTY);
        assert_eq!(pos(2).inverted(), neg(2));
    }

    #[test]
    fn effect_fades_out_after_26_ticks() {
        let mut effect = Effect::new(Destruction {
            amount: 1,
            message_kind: ColumnKind::Positive,
            key_kind: ColumnKind::Negative,
        });
        for _ in 0..25 {
            effect.tick();
            assert!(!effect.is_finished());
        }
        effect.tick();
        assert!(effect.is_finished());
    }
}
