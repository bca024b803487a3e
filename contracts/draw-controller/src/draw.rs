use cosmwasm_std::Timestamp;
use prize_draw_common::catalog::{derive_id, sequence, validate_prize};
use prize_draw_common::drawer::{draw_numbers, remaining_pool, DrawOutcome, NumberStream};
use prize_draw_common::{DrawOrder, GameState, Prize, Winner, WinnerLedger};

use crate::error::ContractError;
use crate::state::{DrawPhase, DrawSession, PrizeRound};

/// Result of asking for a new batch.
#[derive(Debug, PartialEq, Eq)]
pub enum BatchStart {
    Started { quantity: u32 },
    /// Every winner of the prize is already confirmed; nothing changed.
    /// The round stays `Pending` so its confirmed numbers remain on screen.
    Skipped,
}

impl PrizeRound {
    fn new(total_needed: u32) -> Self {
        Self {
            total_needed,
            drawn: Vec::new(),
            confirmed: Vec::new(),
        }
    }

    pub fn confirmed_count(&self) -> u32 {
        self.confirmed.len() as u32
    }

    pub fn pending(&self) -> Vec<u16> {
        self.drawn
            .iter()
            .copied()
            .filter(|n| !self.confirmed.contains(n))
            .collect()
    }

    pub fn remaining(&self) -> u32 {
        self.total_needed.saturating_sub(self.confirmed_count())
    }

    pub fn is_complete(&self) -> bool {
        self.total_needed > 0 && self.confirmed_count() >= self.total_needed
    }

    /// Drop unconfirmed numbers from the screen, keeping draw order.
    fn discard_pending(&mut self) {
        let confirmed = &self.confirmed;
        self.drawn.retain(|n| confirmed.contains(n));
    }
}

fn millis(time: Timestamp) -> u64 {
    time.nanos() / 1_000_000
}

impl DrawSession {
    pub fn new(draw_order: DrawOrder, regular: &[Prize]) -> Self {
        let phase = if regular.is_empty() {
            DrawPhase::Done
        } else {
            DrawPhase::Idle
        };
        Self {
            draw_order,
            special_prizes: Vec::new(),
            current_prize_index: 0,
            phase,
            used_numbers: Vec::new(),
            ledger: WinnerLedger::new(),
            observed_prize_count: regular.len() as u32,
            batch_nonce: 0,
            winner_seq: 0,
        }
    }

    pub fn sequence(&self, regular: &[Prize]) -> Vec<Prize> {
        sequence(regular, &self.special_prizes, self.draw_order)
    }

    pub fn current_prize(&self, regular: &[Prize]) -> Option<Prize> {
        self.sequence(regular)
            .into_iter()
            .nth(self.current_prize_index as usize)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.phase, DrawPhase::Drawing { .. })
    }

    pub fn round(&self) -> Option<&PrizeRound> {
        match &self.phase {
            DrawPhase::Drawing { round, .. } | DrawPhase::Pending { round } => Some(round),
            DrawPhase::Idle | DrawPhase::Done => None,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            DrawPhase::Idle => "idle",
            DrawPhase::Drawing { .. } => "drawing",
            DrawPhase::Pending { .. } => "pending",
            DrawPhase::Done => "done",
        }
    }

    /// Rejects every mutation that must not interleave with a batch in flight.
    pub fn ensure_not_drawing(&self) -> Result<(), ContractError> {
        if self.is_drawing() {
            return Err(ContractError::DrawInProgress);
        }
        Ok(())
    }

    /// `Idle | Pending -> Drawing`.
    ///
    /// Pending numbers leave the screen right away, confirmed ones stay.
    pub fn start_batch(
        &mut self,
        regular: &[Prize],
        now: Timestamp,
    ) -> Result<BatchStart, ContractError> {
        self.ensure_not_drawing()?;
        let prize = self
            .current_prize(regular)
            .ok_or(ContractError::NoCurrentPrize)?;

        let mut round = match &self.phase {
            DrawPhase::Pending { round } => round.clone(),
            DrawPhase::Idle => PrizeRound::new(prize.quantity),
            DrawPhase::Drawing { .. } => return Err(ContractError::DrawInProgress),
            DrawPhase::Done => return Err(ContractError::NoCurrentPrize),
        };

        let quantity = round.remaining();
        if quantity == 0 {
            return Ok(BatchStart::Skipped);
        }

        let available = remaining_pool(&self.used_numbers) as u32;
        if available < quantity {
            return Err(ContractError::DrawExhaustion {
                needed: quantity,
                available,
            });
        }

        round.discard_pending();
        self.batch_nonce += 1;
        self.phase = DrawPhase::Drawing {
            round,
            started_at: now,
            quantity,
        };
        Ok(BatchStart::Started { quantity })
    }

    /// `Drawing -> Pending` once `delay_seconds` have passed since the start.
    pub fn finalize_batch(
        &mut self,
        stream: &mut NumberStream,
        now: Timestamp,
        delay_seconds: u64,
    ) -> Result<DrawOutcome, ContractError> {
        let (mut round, started_at, quantity) = match &self.phase {
            DrawPhase::Drawing {
                round,
                started_at,
                quantity,
            } => (round.clone(), *started_at, *quantity),
            _ => return Err(ContractError::NotDrawing),
        };

        let ready_at = started_at.plus_seconds(delay_seconds);
        if now < ready_at {
            return Err(ContractError::DrawDelayPending { ready_at });
        }

        let outcome = draw_numbers(stream, quantity as usize, &self.used_numbers);
        round.drawn.extend(outcome.numbers.iter().copied());
        self.phase = DrawPhase::Pending { round };
        Ok(outcome)
    }

    /// Abandon the batch in flight. Confirmed numbers stay on screen.
    pub fn cancel_batch(&mut self) -> Result<(), ContractError> {
        match std::mem::replace(&mut self.phase, DrawPhase::Idle) {
            DrawPhase::Drawing { round, .. } => {
                if !round.confirmed.is_empty() {
                    self.phase = DrawPhase::Pending { round };
                }
                Ok(())
            }
            other => {
                self.phase = other;
                Err(ContractError::NotDrawing)
            }
        }
    }

    /// Confirm one pending number. Returns `false` when it was already confirmed.
    pub fn confirm_number(
        &mut self,
        regular: &[Prize],
        number: u16,
        now: Timestamp,
    ) -> Result<bool, ContractError> {
        self.ensure_not_drawing()?;
        let round = self
            .round()
            .ok_or(ContractError::NumberNotDrawn { number })?;
        if !round.drawn.contains(&number) {
            return Err(ContractError::NumberNotDrawn { number });
        }
        if round.confirmed.contains(&number) {
            return Ok(false);
        }
        let prize_name = self.current_prize_name(regular)?;
        self.record_confirmation(&prize_name, number, now);
        Ok(true)
    }

    /// Confirm every pending number, in screen order.
    pub fn confirm_all(
        &mut self,
        regular: &[Prize],
        now: Timestamp,
    ) -> Result<Vec<u16>, ContractError> {
        self.ensure_not_drawing()?;
        let pending = match self.round() {
            Some(round) => round.pending(),
            None => return Ok(Vec::new()),
        };
        if pending.is_empty() {
            return Ok(pending);
        }
        let prize_name = self.current_prize_name(regular)?;
        for number in &pending {
            self.record_confirmation(&prize_name, *number, now);
        }
        Ok(pending)
    }

    fn current_prize_name(&self, regular: &[Prize]) -> Result<String, ContractError> {
        self.current_prize(regular)
            .map(|prize| prize.name)
            .ok_or(ContractError::NoCurrentPrize)
    }

    fn record_confirmation(&mut self, prize_name: &str, number: u16, now: Timestamp) {
        let DrawSession {
            phase,
            used_numbers,
            ledger,
            winner_seq,
            ..
        } = self;
        let DrawPhase::Pending { round } = phase else {
            return;
        };
        if round.confirmed.contains(&number) {
            return;
        }
        round.confirmed.push(number);
        if !used_numbers.contains(&number) {
            used_numbers.push(number);
        }
        let seq = *winner_seq;
        *winner_seq += 1;
        ledger.append(Winner {
            id: derive_id("winner", seq, now.nanos()),
            prize_name: prize_name.to_string(),
            number,
            timestamp: millis(now),
        });
    }

    /// Take a confirmation back. The number stays in the used pool.
    ///
    /// Returns `false` when the number was pending already.
    pub fn unconfirm_number(&mut self, number: u16) -> Result<bool, ContractError> {
        self.ensure_not_drawing()?;
        let DrawPhase::Pending { round } = &mut self.phase else {
            return Err(ContractError::NumberNotDrawn { number });
        };
        if !round.drawn.contains(&number) {
            return Err(ContractError::NumberNotDrawn { number });
        }
        let Some(idx) = round.confirmed.iter().position(|n| *n == number) else {
            return Ok(false);
        };
        round.confirmed.remove(idx);
        self.ledger.remove(number);
        Ok(true)
    }

    /// Take back every confirmation for the current prize.
    pub fn unconfirm_all(&mut self) -> Result<Vec<u16>, ContractError> {
        self.ensure_not_drawing()?;
        let DrawPhase::Pending { round } = &mut self.phase else {
            return Ok(Vec::new());
        };
        let released = std::mem::take(&mut round.confirmed);
        for number in &released {
            self.ledger.remove(*number);
        }
        Ok(released)
    }

    /// Move on once every winner of the current prize is confirmed.
    pub fn advance(&mut self, regular: &[Prize]) -> Result<(), ContractError> {
        self.ensure_not_drawing()?;
        match &self.phase {
            DrawPhase::Pending { round } if round.is_complete() => {}
            DrawPhase::Pending { round } => {
                return Err(ContractError::PrizeIncomplete {
                    confirmed: round.confirmed_count(),
                    needed: round.total_needed,
                })
            }
            DrawPhase::Idle => {
                return Err(ContractError::PrizeIncomplete {
                    confirmed: 0,
                    needed: 0,
                })
            }
            DrawPhase::Done | DrawPhase::Drawing { .. } => {
                return Err(ContractError::NoCurrentPrize)
            }
        }

        self.current_prize_index += 1;
        self.phase = if (self.current_prize_index as usize) < self.sequence(regular).len() {
            DrawPhase::Idle
        } else {
            DrawPhase::Done
        };
        Ok(())
    }

    /// Append a prize created mid-session and jump straight to it.
    pub fn add_special_prize(
        &mut self,
        regular: &[Prize],
        prize: Prize,
    ) -> Result<(), ContractError> {
        validate_prize(&prize.name, prize.quantity)?;
        let id = prize.id.clone();
        self.special_prizes.push(prize);
        self.observe_catalog(regular, Some(&id));
        Ok(())
    }

    /// Growth detection. When the combined catalog grew since the last
    /// check, the index moves to `added_id` (or the last entry) and a fresh
    /// round starts, abandoning any batch in flight.
    pub fn observe_catalog(&mut self, regular: &[Prize], added_id: Option<&str>) -> bool {
        let seq = self.sequence(regular);
        let count = seq.len() as u32;
        let grew = count > self.observed_prize_count;
        self.observed_prize_count = count;
        if !grew {
            return false;
        }

        let index = added_id
            .and_then(|id| seq.iter().position(|prize| prize.id == id))
            .unwrap_or(seq.len() - 1);
        self.current_prize_index = index as u32;
        self.phase = DrawPhase::Idle;
        true
    }

    /// Flat projection published to replicas.
    pub fn snapshot(&self) -> GameState {
        let round = self.round();
        GameState {
            winners: self.ledger.winners().to_vec(),
            current_prize_index: self.current_prize_index,
            is_drawing: self.is_drawing(),
            drawn_numbers: round.map(|r| r.drawn.clone()).unwrap_or_default(),
            confirmed_numbers: round.map(|r| r.confirmed.clone()).unwrap_or_default(),
            confirmed_count: round.map_or(0, PrizeRound::confirmed_count),
            total_needed: round.map_or(0, |r| r.total_needed),
            used_numbers: self.used_numbers.clone(),
            special_prizes: self.special_prizes.clone(),
        }
    }
}
