use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::{DrawOrder, Prize};

/// Rank given to a regular prize whose name carries no number.
pub const UNRANKED_PRIZE: u32 = 999;

/// Prefix used for generated prize names ("prize no.").
pub const PRIZE_NAME_PREFIX: &str = "รางวัลที่";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrizeError {
    #[error("invalid input: prize name must not be blank")]
    BlankName,

    #[error("invalid input: prize quantity must be at least 1")]
    ZeroQuantity,
}

/// Reject blank names and empty quantities.
pub fn validate_prize(name: &str, quantity: u32) -> Result<(), PrizeError> {
    if name.trim().is_empty() {
        return Err(PrizeError::BlankName);
    }
    if quantity == 0 {
        return Err(PrizeError::ZeroQuantity);
    }
    Ok(())
}

/// First run of ASCII digits in `name`, or [`UNRANKED_PRIZE`] when there is none.
///
/// Values that overflow saturate at `u32::MAX`.
pub fn leading_number(name: &str) -> u32 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return UNRANKED_PRIZE;
    }
    digits.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    })
}

/// Draw-ordered prize list.
///
/// Regular prizes are ranked by the number in their name (stable), reversed
/// for [`DrawOrder::Descending`], and followed by every special prize in
/// insertion order regardless of the draw order.
pub fn sequence(regular: &[Prize], special: &[Prize], order: DrawOrder) -> Vec<Prize> {
    let mut ranked: Vec<(u32, &Prize)> = regular
        .iter()
        .map(|prize| (leading_number(&prize.name), prize))
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    if order == DrawOrder::Descending {
        ranked.reverse();
    }

    ranked
        .into_iter()
        .map(|(_, prize)| prize.clone())
        .chain(special.iter().cloned())
        .collect()
}

/// Name for the next prize added in setup: one past the highest
/// "รางวัลที่ N" in the catalog, or the catalog length plus one.
pub fn next_prize_name(prizes: &[Prize]) -> String {
    let highest = prizes
        .iter()
        .filter_map(|prize| numbered_prize(&prize.name))
        .filter(|n| *n > 0)
        .max();
    let next = match highest {
        Some(n) => n.saturating_add(1),
        None => prizes.len() as u32 + 1,
    };
    format!("{PRIZE_NAME_PREFIX} {next}")
}

fn numbered_prize(name: &str) -> Option<u32> {
    let start = name.find(PRIZE_NAME_PREFIX)? + PRIZE_NAME_PREFIX.len();
    let rest = name[start..].strip_prefix(' ')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Catalog used when the controller is instantiated without prizes.
pub fn default_prizes() -> Vec<Prize> {
    [(1, 1), (2, 3), (3, 5)]
        .into_iter()
        .map(|(n, quantity)| Prize {
            id: n.to_string(),
            name: format!("{PRIZE_NAME_PREFIX} {n}"),
            quantity,
        })
        .collect()
}

/// Opaque id for a prize or winner.
///
/// `id = hex(sha256(kind || seq_be || nanos_be))[..16]`
pub fn derive_id(kind: &str, seq: u64, nanos: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(seq.to_be_bytes());
    hasher.update(nanos.to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
