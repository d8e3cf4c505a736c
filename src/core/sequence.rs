use crate::error::Result;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counter used to make authenticators and encrypted timestamps unique.
/// Its low six decimal digits are sent as the microseconds of the
/// timestamps.
#[derive(Debug)]
pub struct SequenceGenerator {
    counter: AtomicU32,
}

impl SequenceGenerator {
    /// Creates a generator with a random seed taken from the OS.
    pub fn new() -> Result<Self> {
        let mut seed = [0 as u8; 4];
        OsRng.try_fill_bytes(&mut seed).map_err(|err| {
            format!("Unable to seed the sequence generator: {}", err)
        })?;

        return Ok(Self::from_seed(u32::from_be_bytes(seed)));
    }

    pub fn from_seed(seed: u32) -> Self {
        return Self {
            counter: AtomicU32::new(seed),
        };
    }

    /// Returns the following number of the sequence. Safe to be called
    /// from several threads.
    pub fn next(&self) -> u32 {
        return self.counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
    }
}

/// Microseconds field derived from a sequence number
pub fn seqnum_to_microseconds(seqnum: u32) -> u32 {
    return seqnum % 1_000_000;
}
