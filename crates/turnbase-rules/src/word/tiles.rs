//! Letter values and the standard tile distribution.

use rand::Rng;
use rand::seq::SliceRandom;

/// Points for one letter. Case-insensitive; anything that is not an ASCII
/// letter scores 0.
pub fn letter_value(letter: char) -> u32 {
    match letter.to_ascii_uppercase() {
        'A' | 'E' | 'I' | 'L' | 'N' | 'O' | 'R' | 'S' | 'T' | 'U' => 1,
        'D' | 'G' => 2,
        'B' | 'C' | 'M' | 'P' => 3,
        'F' | 'H' | 'V' | 'W' | 'Y' => 4,
        'K' => 5,
        'J' | 'X' => 8,
        'Q' | 'Z' => 10,
        _ => 0,
    }
}

/// Sum of the letter values of a word.
pub fn word_value(word: &str) -> u32 {
    word.chars().map(letter_value).sum()
}

/// How many of each letter the standard English set holds (blanks omitted).
pub const STANDARD_DISTRIBUTION: [(char, usize); 26] = [
    ('A', 9),
    ('B', 2),
    ('C', 2),
    ('D', 4),
    ('E', 12),
    ('F', 2),
    ('G', 3),
    ('H', 2),
    ('I', 9),
    ('J', 1),
    ('K', 1),
    ('L', 4),
    ('M', 2),
    ('N', 6),
    ('O', 8),
    ('P', 2),
    ('Q', 1),
    ('R', 6),
    ('S', 4),
    ('T', 6),
    ('U', 4),
    ('V', 2),
    ('W', 2),
    ('X', 1),
    ('Y', 2),
    ('Z', 1),
];

/// The unshuffled standard set, in alphabetical order.
pub fn standard_bag() -> Vec<char> {
    STANDARD_DISTRIBUTION
        .iter()
        .flat_map(|&(letter, count)| std::iter::repeat_n(letter, count))
        .collect()
}

/// The standard set in random order.
pub fn shuffled_standard_bag<R: Rng + ?Sized>(rng: &mut R) -> Vec<char> {
    let mut bag = standard_bag();
    bag.shuffle(rng);
    bag
}
