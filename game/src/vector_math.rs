//! Circular integer-vector algebra shared by key and puzzle generation.
//!
//! Every operation returns a fresh vector; inputs are never mutated.

pub const MIN_BOARD_LENGTH: usize = 8;
pub const MEDIUM_BOARD_LENGTH: usize = 10;
pub const MAX_BOARD_LENGTH: usize = 12;
pub const SUPER_MAX_BOARD_LENGTH: usize = 14;
pub const MEGA_MAX_BOARD_LENGTH: usize = 16;

pub const AUTHORIZED_LENGTHS: [usize; 5] = [
    MIN_BOARD_LENGTH,
    MEDIUM_BOARD_LENGTH,
    MAX_BOARD_LENGTH,
    SUPER_MAX_BOARD_LENGTH,
    MEGA_MAX_BOARD_LENGTH,
];

pub fn is_authorized_length(length: usize) -> bool {
    AUTHORIZED_LENGTHS.contains(&length)
}

/// `((x % n) + n) % n`, always in `[0, n)`.
pub fn positive_modulo(x: i64, n: i64) -> i64 {
    ((x % n) + n) % n
}

/// Wraps a signed index into `[0, len)`.
pub fn wrap_index(index: i64, len: usize) -> usize {
    positive_modulo(index, len as i64) as usize
}

/// Left rotation by `k mod len`: `rotate(v, k)[i] == v[(i + k) mod len]`.
pub fn rotate(v: &[i32], k: i64) -> Vec<i32> {
    if v.is_empty() {
        return Vec::new();
    }
    let shift = wrap_index(k, v.len());
    let mut out = Vec::with_capacity(v.len());
    out.extend_from_slice(&v[shift..]);
    out.extend_from_slice(&v[..shift]);
    out
}

pub fn sum(a: &[i32], b: &[i32]) -> Vec<i32> {
    assert_eq!(a.len(), b.len(), "vector length mismatch in sum");
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn scale(a: i32, v: &[i32]) -> Vec<i32> {
    v.iter().map(|x| a * x).collect()
}

pub fn norm_squared(v: &[i32]) -> i64 {
    v.iter().map(|&x| i64::from(x) * i64::from(x)).sum()
}

/// Index of the first entry with the largest magnitude.
pub fn spike_index(v: &[i32]) -> usize {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if x.abs() > v[best].abs() {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_modulo_wraps_negatives() {
        assert_eq!(positive_modulo(-1, 8), 7);
        assert_eq!(positive_modulo(-17, 8), 7);
        assert_eq!(positive_modulo(9, 8), 1);
        assert_eq!(positive_modulo(0, 8), 0);
    }

    #[test]
    fn rotate_moves_entries_left() {
        let v = [1, 2, 3, 4];
        assert_eq!(rotate(&v, 1), vec![2, 3, 4, 1]);
        assert_eq!(rotate(&v, 4), v.to_vec());
        assert_eq!(rotate(&v, -1), vec![4, 1, 2, 3]);
        assert_eq!(rotate(&v, 9), vec![2, 3, 4, 1]);
    }

    #[test]
    fn rotation_is_invertible_for_every_shift() {
        let v = [3, 0, -1, 0, -1, 0, 0, 0, 2, -2];
        let len = v.len() as i64;
        for k in -12..=12 {
            let back = rotate(&rotate(&v, k), len - k);
            assert_eq!(back, v.to_vec(), "k={k}");
        }
    }

    #[test]
    fn adding_a_vector_to_its_negation_gives_zero() {
        let v = [5, -3, 0, 2, -1, 4, 0, -7];
        let zero = sum(&scale(1, &v), &scale(-1, &v));
        assert!(zero.iter().all(|&x| x == 0));
    }

    #[test]
    #[should_panic(expected = "vector length mismatch")]
    fn sum_rejects_mismatched_lengths() {
        let _ = sum(&[1, 2], &[1, 2, 3]);
    }

    #[test]
    fn norm_squared_sums_squares() {
        assert_eq!(norm_squared(&[3, -4, 0]), 25);
        assert_eq!(norm_squared(&[]), 0);
    }

    #[test]
    fn spike_index_prefers_first_largest_magnitude() {
        assert_eq!(spike_index(&[1, -4, 4, 0]), 1);
        assert_eq!(spike_index(&[0, 0, 0]), 0);
    }
}
