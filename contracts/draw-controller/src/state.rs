use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::Item;
use prize_draw_common::types::{DRAW_ORDER_KEY, GAME_STATE_KEY, PRIZES_KEY};
use prize_draw_common::{DrawOrder, GameState, Prize, WinnerLedger};

pub const CONFIG: Item<ControllerConfig> = Item::new("config");
pub const SESSION: Item<DrawSession> = Item::new("session");
pub const NEXT_ID: Item<u64> = Item::new("next_id");

/// Replicated slots. Written only through `crate::sync`.
pub const PRIZES: Item<Vec<Prize>> = Item::new(PRIZES_KEY);
pub const DRAW_ORDER: Item<DrawOrder> = Item::new(DRAW_ORDER_KEY);
pub const GAME_STATE: Item<GameState> = Item::new(GAME_STATE_KEY);

/// Default suspension between starting and finalizing a batch.
pub const DEFAULT_DRAW_DELAY_SECONDS: u64 = 2;
pub const MAX_DRAW_DELAY_SECONDS: u64 = 60;

#[cw_serde]
pub struct ControllerConfig {
    pub admin: Addr,
    /// The only address allowed to drive the draw.
    pub operator: Addr,
    pub draw_delay_seconds: u64,
}

/// Progress on the prize being drawn.
///
/// `confirmed` is always a subset of `drawn`; the confirmed count is its length.
#[cw_serde]
pub struct PrizeRound {
    pub total_needed: u32,
    /// Numbers on screen, confirmed and pending, in draw order.
    pub drawn: Vec<u16>,
    /// Confirmed numbers in confirmation order.
    pub confirmed: Vec<u16>,
}

#[cw_serde]
pub enum DrawPhase {
    /// Current prize not started yet.
    Idle,
    /// Batch in flight; numbers land at `started_at + draw_delay_seconds`.
    Drawing {
        round: PrizeRound,
        started_at: Timestamp,
        quantity: u32,
    },
    /// Numbers on screen waiting for confirmation or another batch.
    Pending { round: PrizeRound },
    /// Every prize in the sequence has been drawn.
    Done,
}

/// Authoritative controller state. Replicas only ever see its
/// [`GameState`] projection.
#[cw_serde]
pub struct DrawSession {
    pub draw_order: DrawOrder,
    pub special_prizes: Vec<Prize>,
    pub current_prize_index: u32,
    pub phase: DrawPhase,
    /// Every number confirmed this session, in first-use order.
    pub used_numbers: Vec<u16>,
    pub ledger: WinnerLedger,
    /// Combined catalog size when last checked, for growth detection.
    pub observed_prize_count: u32,
    pub batch_nonce: u64,
    /// Confirmations ever recorded this session. Never decreases, so winner
    /// ids stay unique across unconfirm/confirm cycles.
    #[serde(default)]
    pub winner_seq: u64,
}
