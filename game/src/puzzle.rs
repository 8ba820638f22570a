//! Solvable message generation and column views of messages.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::{Column, columns_from_signed, signed_from_columns};
use crate::keygen::PrivateKey;
use crate::vector_math::{positive_modulo, rotate, scale, spike_index, sum};

/// Default number of signed key rotations folded into a puzzle.
pub fn default_puzzle_steps(length: usize) -> u32 {
    match length {
        0..=10 => 4,
        11..=12 => 6,
        13..=14 => 10,
        _ => 15,
    }
}

/// One signed rotation of the private key added into the message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleStep {
    /// Column the key spike was aligned under.
    pub target: usize,
    /// Left rotation applied to the key.
    pub rotation: usize,
    pub sign: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Puzzle {
    pub message: Vec<i32>,
    pub steps: Vec<PuzzleStep>,
}

impl Puzzle {
    /// Re-applies the recorded steps to `key`, starting from zero.
    pub fn replay(&self, key: &PrivateKey) -> Vec<i32> {
        self.steps.iter().fold(vec![0; key.len()], |acc, step| {
            sum(&acc, &scale(step.sign, &rotate(key.as_slice(), step.rotation as i64)))
        })
    }

    pub fn data_message(&self) -> DataMessage {
        to_column_representation(&self.message)
    }
}

/// Builds a message that is a signed sum of rotations of `private_key`, so a
/// player holding that key can always cancel it back down.
pub fn generate_puzzle<R: Rng + ?Sized>(
    length: usize,
    private_key: &PrivateKey,
    steps: u32,
    rng: &mut R,
) -> Puzzle {
    assert_eq!(private_key.len(), length, "private key length mismatch");

    let spike = spike_index(private_key.as_slice());
    let mut message = vec![0; length];
    let mut recorded = Vec::with_capacity(steps as usize);

    for _ in 0..steps {
        let target = rng.gen_range(0..length);
        let rotation = positive_modulo(spike as i64 - target as i64, length as i64) as usize;
        let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
        message = sum(
            &message,
            &scale(sign, &rotate(private_key.as_slice(), rotation as i64)),
        );
        recorded.push(PuzzleStep {
            target,
            rotation,
            sign,
        });
    }

    debug!(length, steps, ?message, "generated puzzle");
    Puzzle {
        message,
        steps: recorded,
    }
}

pub fn generate_solvable_message<R: Rng + ?Sized>(
    length: usize,
    private_key: &PrivateKey,
    steps: u32,
    rng: &mut R,
) -> Vec<i32> {
    generate_puzzle(length, private_key, steps, rng).message
}

/// A message in both signed and column form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataMessage {
    pub plain: Vec<i32>,
    pub columns: Vec<Column>,
}

impl DataMessage {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_signed(&self) -> Vec<i32> {
        signed_from_columns(&self.columns)
    }
}

pub fn to_column_representation(vector: &[i32]) -> DataMessage {
    DataMessage {
        plain: vector.to_vec(),
        columns: columns_from_signed(vector),
    }
}
