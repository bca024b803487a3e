use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

/// Smallest drawable number.
pub const MIN_NUMBER: u16 = 1;
/// Largest drawable number.
pub const MAX_NUMBER: u16 = 999;
/// Size of the drawable range.
pub const POOL_SIZE: usize = (MAX_NUMBER - MIN_NUMBER + 1) as usize;
/// Samples tried per slot before a collision is accepted.
pub const MAX_ATTEMPTS_PER_SLOT: u32 = 1000;

/// Words at or above this bound are rejected so `word % POOL_SIZE` stays uniform.
const UNBIASED_BOUND: u32 = (u32::MAX / POOL_SIZE as u32) * POOL_SIZE as u32;

/// Deterministic random stream: SHA-256 in counter mode over a 32-byte seed.
///
/// `block_i = sha256(seed || i_be)`, consumed 4 bytes at a time.
#[derive(Clone, Debug)]
pub struct NumberStream {
    seed: [u8; 32],
    counter: u64,
    block: [u8; 32],
    offset: usize,
}

impl NumberStream {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: 0,
            block: [0u8; 32],
            // Forces a refill on first use.
            offset: 32,
        }
    }

    /// Seed the stream with `sha256(part_0 || part_1 || ...)`.
    pub fn from_entropy(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self::new(hasher.finalize().into())
    }

    fn next_u32(&mut self) -> u32 {
        if self.offset + 4 > self.block.len() {
            let mut hasher = Sha256::new();
            hasher.update(self.seed);
            hasher.update(self.counter.to_be_bytes());
            self.block = hasher.finalize().into();
            self.counter += 1;
            self.offset = 0;
        }
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.block[self.offset..self.offset + 4]);
        self.offset += 4;
        u32::from_be_bytes(word)
    }

    /// Uniform number in `[MIN_NUMBER, MAX_NUMBER]`.
    pub fn next_number(&mut self) -> u16 {
        loop {
            let word = self.next_u32();
            if word < UNBIASED_BOUND {
                return MIN_NUMBER + (word % POOL_SIZE as u32) as u16;
            }
        }
    }
}

/// Result of one batch draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    pub numbers: Vec<u16>,
    /// Slots where every attempt collided and the last sample was kept anyway.
    pub forced_duplicates: u32,
}

/// Draw `count` numbers avoiding `excluded` and each other.
///
/// Each slot is sampled independently until an unused value turns up. After
/// [`MAX_ATTEMPTS_PER_SLOT`] collisions the last sample is accepted as a
/// duplicate and counted in [`DrawOutcome::forced_duplicates`].
pub fn draw_numbers(stream: &mut NumberStream, count: usize, excluded: &[u16]) -> DrawOutcome {
    let excluded: BTreeSet<u16> = excluded.iter().copied().collect();
    let mut batch = BTreeSet::new();
    let mut numbers = Vec::with_capacity(count);
    let mut forced_duplicates = 0;

    for _ in 0..count {
        let mut candidate = stream.next_number();
        let mut attempts = 1;
        while excluded.contains(&candidate) || batch.contains(&candidate) {
            if attempts >= MAX_ATTEMPTS_PER_SLOT {
                forced_duplicates += 1;
                break;
            }
            candidate = stream.next_number();
            attempts += 1;
        }
        batch.insert(candidate);
        numbers.push(candidate);
    }

    DrawOutcome {
        numbers,
        forced_duplicates,
    }
}

/// How many drawable numbers are not in `used`.
pub fn remaining_pool(used: &[u16]) -> usize {
    let distinct: BTreeSet<u16> = used
        .iter()
        .copied()
        .filter(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n))
        .collect();
    POOL_SIZE - distinct.len()
}
