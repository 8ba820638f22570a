//! Text <-> ternary conversions and the toy text encryption used by the
//! story mode. Each board symbol is four balanced-ternary digits.

use rand::Rng;

use crate::keygen::PublicKey;
use crate::vector_math::{positive_modulo, rotate, scale, sum};

pub const DIGITS_PER_SYMBOL: usize = 4;

pub const BOARD_SYMBOLS: [char; 81] = [
    ' ', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
    'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A',
    'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T',
    'U', 'V', 'W', 'X', 'Y', 'Z', ';', '.', ',', '!', '?', '&', '#', '\'', '\\', '"', '(', ')',
    '+', '-', '*', '/', '|', '□',
];

/// Stand-in for characters outside the table.
pub const FALLBACK_SYMBOL: char = BOARD_SYMBOLS[BOARD_SYMBOLS.len() - 1];

/// Maps any integer to a balanced ternary digit by its residue mod 3.
pub fn integer_mod3_to_ternary(x: i64) -> i32 {
    match positive_modulo(x, 3) {
        2 => -1,
        y => y as i32,
    }
}

pub fn ternary_to_symbol(digits: [i32; DIGITS_PER_SYMBOL]) -> char {
    let index = digits
        .iter()
        .rev()
        .fold(0i64, |acc, &d| acc * 3 + positive_modulo(i64::from(d), 3));
    BOARD_SYMBOLS
        .get(index as usize)
        .copied()
        .unwrap_or(FALLBACK_SYMBOL)
}

/// Least significant digit first.
pub fn symbol_to_ternary(symbol: char) -> [i32; DIGITS_PER_SYMBOL] {
    let mut index = BOARD_SYMBOLS
        .iter()
        .position(|&s| s == symbol)
        .unwrap_or(BOARD_SYMBOLS.len() - 1) as i64;
    let mut digits = [0; DIGITS_PER_SYMBOL];
    for digit in &mut digits {
        let residue = positive_modulo(index, 3);
        *digit = integer_mod3_to_ternary(residue);
        index = (index - residue) / 3;
    }
    digits
}

pub fn string_to_ternary(text: &str) -> Vec<i32> {
    text.chars().flat_map(symbol_to_ternary).collect()
}

/// Inverse of [`string_to_ternary`]. Values are reduced mod 3 first, so a
/// decrypted board can be fed in directly; a trailing partial group is
/// zero-padded.
pub fn decode_ternary(values: &[i32]) -> String {
    values
        .chunks(DIGITS_PER_SYMBOL)
        .map(|chunk| {
            let mut digits = [0; DIGITS_PER_SYMBOL];
            for (slot, &v) in digits.iter_mut().zip(chunk) {
                *slot = integer_mod3_to_ternary(i64::from(v));
            }
            ternary_to_symbol(digits)
        })
        .collect()
}

/// One digit per character: letters cycle -1, 0, 1 from `A`; everything
/// else is 0.
pub fn simple_string_to_ternary(text: &str) -> Vec<i32> {
    text.chars()
        .map(|c| match c.to_ascii_uppercase() {
            upper @ 'A'..='Z' => (upper as i32 - 'A' as i32) % 3 - 1,
            _ => 0,
        })
        .collect()
}

/// Fits `text` to the key length and hides it under `repetitions` random
/// signed rotations of `public_key`.
pub fn encrypt_simple_message<R: Rng + ?Sized>(
    text: &str,
    public_key: &PublicKey,
    repetitions: u32,
    rng: &mut R,
) -> Vec<i32> {
    let length = public_key.len();
    let mut encrypted = simple_string_to_ternary(text);
    encrypted.resize(length, 0);

    for _ in 0..repetitions {
        let k = rng.gen_range(0..=length) as i64;
        let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
        encrypted = sum(&encrypted, &scale(sign, &rotate(public_key.as_slice(), k)));
    }
    encrypted
}
