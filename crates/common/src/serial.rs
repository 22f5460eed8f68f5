//! Message serial numbers
//!
//! Messages in the same conversation must not share a serial number, so
//! time-based numbers are out. Serial numbers start at a random point and
//! count up, wrapping back to 1.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// Largest serial number handed out
pub const MAX_SERIAL_NUMBER: u32 = 0x7fff_ffff;

/// Lock-free generator of serial numbers in `1..=MAX_SERIAL_NUMBER`
#[derive(Debug)]
pub struct SerialNumberGenerator {
    current: AtomicU32,
}

impl SerialNumberGenerator {
    /// Generator whose first number follows `seed`
    pub fn new(seed: u32) -> Self {
        Self {
            current: AtomicU32::new(seed),
        }
    }

    /// Generator starting from a random point
    pub fn random() -> Self {
        Self::new(rand::random::<u32>() & MAX_SERIAL_NUMBER)
    }

    /// Next serial number, never 0
    pub fn next(&self) -> u32 {
        let advance = |current: u32| {
            if current < MAX_SERIAL_NUMBER {
                Some(current + 1)
            } else {
                Some(1)
            }
        };
        match self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, advance)
        {
            Ok(previous) | Err(previous) => advance(previous).unwrap_or(1),
        }
    }
}

/// Next number from the process-wide generator
pub fn next_serial_number() -> u32 {
    static SHARED: OnceLock<SerialNumberGenerator> = OnceLock::new();
    SHARED.get_or_init(SerialNumberGenerator::random).next()
}
