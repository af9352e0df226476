//! Credential generation from the OS CSPRNG.
//!
//! Generated credentials are fixed-length and guaranteed to contain at least
//! one character from each required class. Every random draw, including the
//! final shuffle, reads the OS entropy source directly; an entropy failure
//! is reported as [`RotationError::Entropy`], never degraded to a weaker
//! source.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{RotationError, RotationResult};

const DIGITS: &[u8] = b"0123456789";
const UPPERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
// Symbols the portal accepts; it rejects ?<>()/\& space and quote characters.
const SYMBOLS: &[u8] = b"~=+%^*[]{}!@#$|";

/// Length of every generated credential.
pub const CREDENTIAL_LENGTH: usize = 12;

/// Stateless generator for portal credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialGenerator;

impl CredentialGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generate one credential: one character from each required class, the
    /// remaining positions drawn from the union alphabet, order shuffled.
    pub fn generate(&self) -> RotationResult<String> {
        let union: Vec<u8> = [DIGITS, SYMBOLS, UPPERS, LOWERS].concat();

        let mut buf = Vec::with_capacity(CREDENTIAL_LENGTH);
        buf.push(pick(DIGITS)?);
        buf.push(pick(SYMBOLS)?);
        buf.push(pick(UPPERS)?);
        buf.push(pick(LOWERS)?);
        while buf.len() < CREDENTIAL_LENGTH {
            buf.push(pick(&union)?);
        }
        shuffle(&mut buf)?;

        // The alphabets are all ASCII, so the buffer is valid UTF-8.
        Ok(String::from_utf8(buf).expect("credential alphabet is ASCII"))
    }
}

fn pick(alphabet: &[u8]) -> RotationResult<u8> {
    Ok(alphabet[secure_index(alphabet.len())?])
}

/// Fisher-Yates shuffle driven by the OS CSPRNG.
fn shuffle(buf: &mut [u8]) -> RotationResult<()> {
    for i in (1..buf.len()).rev() {
        let j = secure_index(i + 1)?;
        buf.swap(i, j);
    }
    Ok(())
}

/// Uniform index in `0..bound`, using rejection sampling to avoid modulo
/// bias.
fn secure_index(bound: usize) -> RotationResult<usize> {
    debug_assert!(bound > 0 && bound <= u32::MAX as usize);
    let bound = bound as u32;
    let zone = u32::MAX - (u32::MAX % bound);
    loop {
        let mut bytes = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(RotationError::Entropy)?;
        let value = u32::from_be_bytes(bytes);
        if value < zone {
            return Ok((value % bound) as usize);
        }
    }
}
