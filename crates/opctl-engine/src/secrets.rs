//! Random secret generation
//!
//! Generated values (storage secret keys, database credentials, the metallb
//! memberlist key) are produced fresh on every run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Character sets for secret generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretCharset {
    /// a-zA-Z0-9 (default)
    #[default]
    Alphanumeric,
    /// a-zA-Z
    Alpha,
}

impl SecretCharset {
    pub const fn chars(&self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
            Self::Alpha => b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
        }
    }
}

/// Generator of random strings
pub struct SecretGenerator {
    rng: StdRng,
}

impl SecretGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Deterministic generator, for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, length: usize, charset: SecretCharset) -> String {
        let chars = charset.chars();
        (0..length)
            .map(|_| {
                let idx = self.rng.random_range(0..chars.len());
                chars[idx] as char
            })
            .collect()
    }
}

impl Default for SecretGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_chars() {
        assert_eq!(SecretCharset::Alphanumeric.chars().len(), 62);
        assert_eq!(SecretCharset::Alpha.chars().len(), 52);
    }

    #[test]
    fn test_generate_length_and_charset() {
        let mut generator = SecretGenerator::new();

        let alpha = generator.generate(16, SecretCharset::Alpha);
        assert_eq!(alpha.len(), 16);
        assert!(alpha.chars().all(|c| c.is_ascii_alphabetic()));

        let alnum = generator.generate(128, SecretCharset::Alphanumeric);
        assert_eq!(alnum.len(), 128);
        assert!(alnum.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let first = SecretGenerator::seeded(7).generate(32, SecretCharset::Alphanumeric);
        let second = SecretGenerator::seeded(7).generate(32, SecretCharset::Alphanumeric);

        assert_eq!(first, second);
    }
}
