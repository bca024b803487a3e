use cosmwasm_schema::cw_serde;

use crate::types::Winner;

/// Winners of one prize, in confirmation order.
#[cw_serde]
pub struct PrizeWinners {
    pub prize_name: String,
    pub winners: Vec<Winner>,
}

/// One row of the winners export: `[sequence, prize name, number, timestamp]`.
#[cw_serde]
pub struct ExportRow {
    /// 1-based position in the ledger.
    pub sequence: u32,
    pub prize_name: String,
    pub number: u16,
    /// Confirmation time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Record of confirmed winners for a session.
///
/// Only grows during a session, except when an operator takes a confirmation back.
#[cw_serde]
#[derive(Default)]
pub struct WinnerLedger {
    winners: Vec<Winner>,
}

impl WinnerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, winner: Winner) {
        self.winners.push(winner);
    }

    /// Remove the most recent winner holding `number`.
    pub fn remove(&mut self, number: u16) -> Option<Winner> {
        let idx = self.winners.iter().rposition(|w| w.number == number)?;
        Some(self.winners.remove(idx))
    }

    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Winners grouped by prize name, groups ordered by first appearance.
    pub fn group_by_prize(&self) -> Vec<PrizeWinners> {
        let mut groups: Vec<PrizeWinners> = Vec::new();
        for winner in &self.winners {
            match groups.iter_mut().find(|g| g.prize_name == winner.prize_name) {
                Some(group) => group.winners.push(winner.clone()),
                None => groups.push(PrizeWinners {
                    prize_name: winner.prize_name.clone(),
                    winners: vec![winner.clone()],
                }),
            }
        }
        groups
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.winners
            .iter()
            .enumerate()
            .map(|(i, w)| ExportRow {
                sequence: i as u32 + 1,
                prize_name: w.prize_name.clone(),
                number: w.number,
                timestamp: w.timestamp,
            })
            .collect()
    }
}
