//! Randomness source handed explicitly to every consumer of entropy.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
use thiserror::Error;

/// Raised when the operating system cannot supply seed material.
#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("entropy source unavailable: {0}")]
    Unavailable(String),
}

/// Uniform, independent bits consumed sequentially by the simulation.
///
/// The core never assumes anything about the generator behind this trait;
/// tests substitute scripted sources.
pub trait RandomSource: RngCore {
    fn next_u8(&mut self) -> u8 {
        self.next_u32() as u8
    }

    fn next_u16(&mut self) -> u16 {
        self.next_u32() as u16
    }

    fn fill(&mut self, buffer: &mut [u8]) {
        self.fill_bytes(buffer);
    }

    /// Replace the generator state with fresh external entropy.
    fn reseed(&mut self) -> Result<(), EntropyError>;
}

/// Default generator: ChaCha-backed `StdRng`, reseedable from the OS.
pub struct CellRng {
    inner: StdRng,
    seed: Option<u64>,
}

impl fmt::Debug for CellRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRng").field("seed", &self.seed).finish()
    }
}

impl CellRng {
    /// Seed from operating system entropy.
    pub fn from_entropy() -> Result<Self, EntropyError> {
        Ok(Self {
            inner: os_seeded()?,
            seed: None,
        })
    }

    /// Deterministic generator for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Use `seed` when present, OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Result<Self, EntropyError> {
        match seed {
            Some(seed) => Ok(Self::seeded(seed)),
            None => Self::from_entropy(),
        }
    }

    /// Seed this generator was created from, if it was deterministic.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

fn os_seeded() -> Result<StdRng, EntropyError> {
    StdRng::try_from_os_rng().map_err(|err| EntropyError::Unavailable(err.to_string()))
}

impl RngCore for CellRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.inner.fill_bytes(dst);
    }
}

impl RandomSource for CellRng {
    fn reseed(&mut self) -> Result<(), EntropyError> {
        self.inner = os_seeded()?;
        self.seed = None;
        Ok(())
    }
}

/// Replays a fixed sequence of words, cycling when exhausted.
///
/// Handy for pinning down exactly which branch a consumer takes.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    words: Vec<u64>,
    cursor: usize,
}

impl ScriptedSource {
    /// An empty script yields zeros.
    #[must_use]
    pub fn new(words: impl Into<Vec<u64>>) -> Self {
        Self {
            words: words.into(),
            cursor: 0,
        }
    }

    /// Number of words consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }

    fn advance(&mut self) -> u64 {
        if self.words.is_empty() {
            return 0;
        }
        let word = self.words[self.cursor % self.words.len()];
        self.cursor += 1;
        word
    }
}

impl RngCore for ScriptedSource {
    fn next_u32(&mut self) -> u32 {
        self.advance() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.advance()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl RandomSource for ScriptedSource {
    fn reseed(&mut self) -> Result<(), EntropyError> {
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_generators_agree() {
        let mut a = CellRng::seeded(99);
        let mut b = CellRng::seeded(99);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert_eq!(a.seed(), Some(99));
    }

    #[test]
    fn narrow_draws_truncate_a_word() {
        let mut source = ScriptedSource::new([0x1234_5678_9abc_def0]);
        assert_eq!(source.next_u8(), 0xf0);
        assert_eq!(source.next_u16(), 0xdef0);
        assert_eq!(source.next_u32(), 0x9abc_def0);
        assert_eq!(source.consumed(), 3);
    }

    #[test]
    fn fill_covers_partial_chunks() {
        let mut source = ScriptedSource::new([u64::from_le_bytes([1, 2, 3, 4, 5, 6, 7, 8])]);
        let mut buffer = [0u8; 11];
        source.fill(&mut buffer);
        assert_eq!(buffer, [1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 3]);
    }

    #[test]
    fn reseed_forgets_the_deterministic_seed() {
        let mut rng = CellRng::seeded(5);
        if rng.reseed().is_ok() {
            assert_eq!(rng.seed(), None);
        }
    }

    #[test]
    fn scripted_reseed_rewinds() {
        let mut source = ScriptedSource::new([7, 8]);
        assert_eq!(source.next_u64(), 7);
        source.reseed().expect("scripted reseed");
        assert_eq!(source.next_u64(), 7);
        assert_eq!(source.next_u64(), 8);
        assert_eq!(source.next_u64(), 7);
    }

    #[test]
    fn empty_script_yields_zeros() {
        let mut source = ScriptedSource::new(Vec::<u64>::new());
        assert_eq!(source.next_u64(), 0);
        assert_eq!(source.next_u8(), 0);
        let mut buffer = [0xffu8; 5];
        source.fill(&mut buffer);
        assert_eq!(buffer, [0; 5]);
        assert_eq!(source.consumed(), 0);
    }
}
