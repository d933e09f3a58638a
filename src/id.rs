//! Id Generator
//!
//! Produces the short random tokens that address stored entries.

use rand_core::{OsRng, RngCore};

// == Public Constants ==
/// Alphabet ids are drawn from, indexed by `byte % 62`.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of every generated id
pub const ID_LENGTH: usize = 12;

/// Longest key a backend will accept
pub const MAX_ID_LENGTH: usize = 64;

// == Random Source ==
/// Provider of random bytes for id generation.
///
/// Production code uses [`OsRandom`]; tests inject fixed bytes.
pub trait RandomSource: Send + Sync {
    /// Fills `dest` with random bytes.
    fn fill(&self, dest: &mut [u8]);
}

/// Cryptographically secure random source backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

// == Id Generator ==
/// Generates fixed-length alphanumeric ids from a [`RandomSource`].
///
/// No uniqueness check is made against existing keys.
pub struct IdGenerator {
    source: Box<dyn RandomSource>,
    length: usize,
}

impl IdGenerator {
    /// Creates a generator producing ids of [`ID_LENGTH`] characters.
    pub fn new(source: impl RandomSource + 'static) -> Self {
        Self::with_length(source, ID_LENGTH)
    }

    /// Creates a generator producing ids of `length` characters.
    pub fn with_length(source: impl RandomSource + 'static, length: usize) -> Self {
        Self {
            source: Box::new(source),
            length,
        }
    }

    /// Returns a fresh id.
    pub fn generate(&self) -> String {
        generate_id(self.source.as_ref(), self.length)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(OsRandom)
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Draws `length` bytes from `source` and maps each onto [`ALPHABET`].
pub fn generate_id(source: &dyn RandomSource, length: usize) -> String {
    let mut bytes = vec![0u8; length];
    source.fill(&mut bytes);
    bytes
        .iter()
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect()
}

/// Returns true if `id` is safe to use as a storage key.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
