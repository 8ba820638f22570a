//! Private/public key generation.
//!
//! A private key is a sparse vector summing to exactly 1: one peak of
//! magnitude 3-5 at index 0, balanced by small negative entries a few slots
//! to its right. The public key folds random signed rotations of the private
//! key into itself and is re-rolled until its playability score clears a
//! threshold, falling back to the best candidate seen.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::column::{Column, columns_from_signed};
use crate::error::ConfigError;
use crate::settings::GameConfig;
use crate::vector_math::{AUTHORIZED_LENGTHS, norm_squared, rotate, scale, sum};

pub const PEAK_MIN: i32 = 3;
pub const PEAK_MAX: i32 = 5;
/// No balancing entry is pushed below this value.
pub const ENTRY_FLOOR: i32 = -2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct PrivateKey(Vec<i32>);

impl PrivateKey {
    /// Accepts `values` only if they sum to exactly 1.
    pub fn from_vec(values: Vec<i32>) -> Option<Self> {
        if values.is_empty() || values.iter().sum::<i32>() != 1 {
            return None;
        }
        Some(Self(values))
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> Vec<Column> {
        columns_from_signed(&self.0)
    }
}

impl TryFrom<Vec<i32>> for PrivateKey {
    type Error = String;

    fn try_from(values: Vec<i32>) -> Result<Self, Self::Error> {
        let total: i32 = values.iter().sum();
        let len = values.len();
        Self::from_vec(values).ok_or_else(|| {
            format!("private key must be non-empty and sum to 1, got {len} entries summing to {total}")
        })
    }
}

impl From<PrivateKey> for Vec<i32> {
    fn from(key: PrivateKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PublicKey(Vec<i32>);

impl PublicKey {
    pub fn from_vec(values: Vec<i32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> Vec<Column> {
        columns_from_signed(&self.0)
    }

    pub fn score(&self) -> f64 {
        score(&self.0)
    }
}

/// Hand-balanced keys shipped with the game, one per authorized length.
pub fn pregenerated_private_key(length: usize) -> Option<PrivateKey> {
    let values = match length {
        8 => vec![2, 0, 1, 0, -1, 0, -1, 0],
        10 => vec![0, 2, 0, 1, 1, 0, -1, 0, -1, -1],
        12 => vec![3, 0, 1, 0, -1, 0, -1, 0, -1, 0, 0, 0],
        14 => vec![2, 0, 1, 0, 1, 0, -1, 0, -1, 0, -1, 0, 0, 0],
        16 => vec![3, 0, 1, 0, 1, 0, -1, 0, -1, 0, -1, 0, -1, 0, 0, 0],
        _ => return None,
    };
    PrivateKey::from_vec(values)
}

fn balance_offsets(length: usize) -> &'static [usize] {
    if length <= 8 { &[2, 3] } else { &[2, 3, 4] }
}

/// Builds a readable private key of `length` entries summing to 1.
///
/// The random balancing search is capped at `max_fixup_attempts` draws;
/// any deficit left after that is assigned deterministically.
pub fn generate_private_key<R: Rng + ?Sized>(
    length: usize,
    max_fixup_attempts: u32,
    rng: &mut R,
) -> PrivateKey {
    assert!(length > 4, "private key length {length} too short");

    let offsets = balance_offsets(length);
    let peak = rng.gen_range(PEAK_MIN..=PEAK_MAX);
    let mut vector = vec![0; length];
    vector[0] = peak;
    let mut needed = 1 - peak;

    let mut attempts = 0;
    while needed < 0 && attempts < max_fixup_attempts {
        attempts += 1;
        let target = offsets[rng.gen_range(0..offsets.len())] % length;
        if vector[target] > ENTRY_FLOOR {
            vector[target] -= 1;
            needed += 1;
        }
    }

    if needed < 0 {
        warn!(length, peak, deficit = -needed, "private key balancing exhausted, filling deterministically");
        let slots = offsets
            .iter()
            .map(|o| o % length)
            .chain(1..length)
            .collect::<Vec<_>>();
        for slot in slots {
            while needed < 0 && vector[slot] > ENTRY_FLOOR {
                vector[slot] -= 1;
                needed += 1;
            }
        }
        vector[length - 1] += needed;
    }

    debug!(length, peak, attempts, ?vector, "generated private key");
    PrivateKey(vector)
}

/// Accumulates `repetitions` random signed rotations of `private_key` onto
/// a copy of it. The rotation amount is drawn from `0..=length`.
pub fn generate_public_key<R: Rng + ?Sized>(
    length: usize,
    private_key: &PrivateKey,
    repetitions: u32,
    rng: &mut R,
) -> PublicKey {
    assert_eq!(private_key.len(), length, "private key length mismatch");

    let mut acc = private_key.0.clone();
    for _ in 0..repetitions {
        let k = rng.gen_range(0..=length) as i64;
        let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
        acc = sum(&acc, &scale(sign, &rotate(&private_key.0, k)));
    }
    PublicKey(acc)
}

/// Squared norm over the squared largest extremum; 0 for the zero vector.
pub fn score(public_key: &[i32]) -> f64 {
    let (Some(&min), Some(&max)) = (public_key.iter().min(), public_key.iter().max()) else {
        return 0.0;
    };
    let t = (i64::from(min) * i64::from(min)).max(i64::from(max) * i64::from(max));
    if t == 0 {
        return 0.0;
    }
    norm_squared(public_key) as f64 / t as f64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyPair {
    pub length: usize,
    pub private: PrivateKey,
    pub public: PublicKey,
    pub score: f64,
    /// Public-key candidates drawn before one was kept.
    pub attempts: u32,
    /// Whether the kept candidate met the score threshold.
    pub accepted: bool,
}

impl KeyPair {
    pub fn private_columns(&self) -> Vec<Column> {
        self.private.columns()
    }

    pub fn public_columns(&self) -> Vec<Column> {
        self.public.columns()
    }
}

/// Picks the first public key scoring at least `threshold`, or the best of
/// `max_attempts` candidates.
pub fn select_public_key<R: Rng + ?Sized>(
    private_key: &PrivateKey,
    repetitions: u32,
    threshold: f64,
    max_attempts: u32,
    rng: &mut R,
) -> KeyPair {
    let length = private_key.len();
    let mut best: Option<(PublicKey, f64)> = None;

    for attempt in 1..=max_attempts.max(1) {
        let candidate = generate_public_key(length, private_key, repetitions, rng);
        let candidate_score = candidate.score();
        if candidate_score >= threshold {
            info!(length, attempt, score = candidate_score, "accepted public key");
            return KeyPair {
                length,
                private: private_key.clone(),
                public: candidate,
                score: candidate_score,
                attempts: attempt,
                accepted: true,
            };
        }
        if best.as_ref().is_none_or(|(_, s)| candidate_score > *s) {
            best = Some((candidate, candidate_score));
        }
    }

    let (public, best_score) = best.unwrap_or_else(|| (PublicKey(private_key.0.clone()), 0.0));
    warn!(
        length,
        max_attempts,
        score = best_score,
        threshold,
        "no public key met the playability threshold, keeping best candidate"
    );
    KeyPair {
        length,
        private: private_key.clone(),
        public,
        score: best_score,
        attempts: max_attempts.max(1),
        accepted: false,
    }
}

pub fn generate_key_pair<R: Rng + ?Sized>(
    length: usize,
    config: &GameConfig,
    rng: &mut R,
) -> Result<KeyPair, ConfigError> {
    let params = config.params(length)?;
    let private = generate_private_key(length, config.max_fixup_attempts, rng);
    Ok(select_public_key(
        &private,
        params.public_key_repetitions,
        config.score_threshold,
        config.max_key_attempts,
        rng,
    ))
}

/// One key pair per authorized board length.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyRing {
    pairs: BTreeMap<usize, KeyPair>,
}

impl KeyRing {
    pub fn get(&self, length: usize) -> Option<&KeyPair> {
        self.pairs.get(&length)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &KeyPair> {
        self.pairs.values()
    }

    pub fn public_keys(&self) -> BTreeMap<usize, PublicKey> {
        self.pairs
            .iter()
            .map(|(&length, pair)| (length, pair.public.clone()))
            .collect()
    }
}

pub fn generate_key_ring<R: Rng + ?Sized>(
    config: &GameConfig,
    rng: &mut R,
) -> Result<KeyRing, ConfigError> {
    let mut pairs = BTreeMap::new();
    for length in AUTHORIZED_LENGTHS {
        pairs.insert(length, generate_key_pair(length, config, rng)?);
    }
    Ok(KeyRing { pairs })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn private_keys_sum_to_one_for_every_length_and_seed() {
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for length in AUTHORIZED_LENGTHS {
                let key = generate_private_key(length, 1000, &mut rng);
                assert_eq!(key.len(), length);
                assert_eq!(key.as_slice().iter().sum::<i32>(), 1, "seed={seed} len={length}");
            }
        }
    }

    #[test]
    fn private_key_peak_sits_at_index_zero() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..50 {
            let key = generate_private_key(10, 1000, &mut rng);
            let peak = key.as_slice()[0];
            assert!((PEAK_MIN..=PEAK_MAX).contains(&peak));
            assert!(key.as_slice()[1..].iter().all(|&x| x >= ENTRY_FLOOR && x <= 0));
        }
    }

    #[test]
    fn balancing_only_touches_offset_slots() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..50 {
            let key = generate_private_key(8, 1000, &mut rng);
            for (i, &x) in key.as_slice().iter().enumerate() {
                if ![0, 2, 3].contains(&i) {
                    assert_eq!(x, 0, "unexpected entry at {i}: {key:?}");
                }
            }
        }
    }

    #[test]
    fn exhausted_balancing_still_sums_to_one() {
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            let key = generate_private_key(12, 1, &mut rng);
            assert_eq!(key.as_slice().iter().sum::<i32>(), 1);
            assert!(key.as_slice()[1..].iter().all(|&x| x >= ENTRY_FLOOR));
        }
    }

    #[test]
    fn public_key_with_zero_repetitions_is_the_private_key() {
        let private = pregenerated_private_key(8).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let public = generate_public_key(8, &private, 0, &mut rng);
        assert_eq!(public.as_slice(), private.as_slice());
    }

    #[test]
    fn public_key_sum_tracks_signed_repetitions() {
        // Every rotation of a sum-1 key also sums to 1, so the public key's
        // sum is 1 plus the net sign of the repetitions: odd total => parity.
        let private = pregenerated_private_key(10).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let public = generate_public_key(10, &private, 7, &mut rng);
            let total: i32 = public.as_slice().iter().sum();
            assert!((-6..=8).contains(&total));
            assert_eq!((total - 1).rem_euclid(2), 1);
        }
    }

    #[test]
    fn score_matches_definition() {
        assert_eq!(score(&[0, 0, 0]), 0.0);
        assert_eq!(score(&[2, -1, 0, 1]), 6.0 / 4.0);
        assert_eq!(score(&[-3, 1, 1]), 11.0 / 9.0);
        assert_eq!(score(&[]), 0.0);
    }

    #[test]
    fn selection_terminates_within_budget_for_length_8() {
        let config = GameConfig::default();
        let mut rng = SmallRng::seed_from_u64(2024);
        let pair = generate_key_pair(8, &config, &mut rng).unwrap();

        assert!(pair.attempts >= 1 && pair.attempts <= config.max_key_attempts);
        if pair.accepted {
            assert!(pair.score >= config.score_threshold);
        }
        assert_eq!(pair.score, pair.public.score());
    }

    #[test]
    fn unreachable_threshold_keeps_best_candidate() {
        let private = pregenerated_private_key(8).unwrap();
        let mut rng = SmallRng::seed_from_u64(8);
        let pair = select_public_key(&private, 3, 1_000.0, 100, &mut rng);

        assert!(!pair.accepted);
        assert_eq!(pair.attempts, 100);
        assert!(pair.score < 1_000.0);
        assert_eq!(pair.score, pair.public.score());
    }

    #[test]
    fn key_ring_covers_every_authorized_length() {
        let mut rng = SmallRng::seed_from_u64(77);
        let ring = generate_key_ring(&GameConfig::default(), &mut rng).unwrap();
        for length in AUTHORIZED_LENGTHS {
            let pair = ring.get(length).expect("pair for length");
            assert_eq!(pair.private.len(), length);
            assert_eq!(pair.public.len(), length);
        }
        assert_eq!(ring.public_keys().len(), AUTHORIZED_LENGTHS.len());
    }

    #[test]
    fn pregenerated_keys_are_valid() {
        for length in AUTHORIZED_LENGTHS {
            let key = pregenerated_private_key(length).expect("pregenerated key");
            assert_eq!(key.len(), length);
        }
        assert!(pregenerated_private_key(9).is_none());
        assert!(PrivateKey::from_vec(vec![1, 1]).is_none());
    }

    #[test]
    fn deserializing_rejects_keys_that_do_not_sum_to_one() {
        assert!(serde_json::from_str::<PrivateKey>("[4,0,0,0,0,0,0,0]").is_err());
        assert!(serde_json::from_str::<PrivateKey>("[]").is_err());

        let key = pregenerated_private_key(8).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(serde_json::from_str::<PrivateKey>(&json).unwrap(), key);
    }
}
