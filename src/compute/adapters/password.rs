//! Random admin password generator.

use crate::compute::ports::PasswordGenerator;
use rand::seq::SliceRandom;

/// Symbol groups passwords draw from; visually ambiguous characters such as
/// `0`, `O`, `1`, `l` and `I` are excluded.
const SYMBOL_GROUPS: [&[u8]; 3] = [
    b"23456789",
    b"ABCDEFGHJKLMNPQRSTUVWXYZ",
    b"abcdefghijkmnopqrstuvwxyz",
];

/// Thread-local RNG backed password generator.
///
/// Passwords of at least three characters contain one symbol from every
/// group.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPasswordGenerator;

impl RandomPasswordGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        let all_symbols = SYMBOL_GROUPS.concat();

        let mut symbols: Vec<u8> = SYMBOL_GROUPS
            .iter()
            .filter_map(|group| group.choose(&mut rng).copied())
            .take(length)
            .collect();
        let remaining = length.saturating_sub(symbols.len());
        symbols.extend((0..remaining).filter_map(|_| all_symbols.choose(&mut rng).copied()));
        symbols.shuffle(&mut rng);

        symbols.into_iter().map(char::from).collect()
    }
}
