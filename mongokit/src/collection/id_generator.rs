use crate::collection::Identifier;
use log::info;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Generates [Identifier]s for this process.
///
/// Each identifier is the current time in seconds, a per-process random
/// discriminator and a 24 bit counter. The counter starts at a random value
/// and wraps, so identifiers from one second are unique for up to 2^24 calls.
pub struct IdentifierGenerator {
    discriminator: [u8; 5],
    counter: AtomicU32,
}

impl IdentifierGenerator {
    pub fn new() -> Self {
        let discriminator = IdentifierGenerator::process_discriminator();
        let start = OsRng.gen::<u32>() & COUNTER_MASK;
        info!(
            "Initialized identifier generator with discriminator {:02x?}",
            discriminator
        );

        IdentifierGenerator {
            discriminator,
            counter: AtomicU32::new(start),
        }
    }

    pub fn next_identifier(&self) -> Identifier {
        let seconds = chrono::Utc::now().timestamp().max(0) as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.discriminator);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Identifier::from_bytes(bytes)
    }

    fn process_discriminator() -> [u8; 5] {
        let uuid = uuid::Uuid::new_v4();
        let uid = uuid.as_bytes();
        let noise = OsRng.gen::<[u8; 5]>();

        let mut discriminator = [0u8; 5];
        for (i, byte) in discriminator.iter_mut().enumerate() {
            *byte = uid[uid.len() - 1 - i] ^ noise[i];
        }
        discriminator
    }
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        IdentifierGenerator::new()
    }
}
