//! Controller side of the replication channel.
//!
//! The controller is the single writer. Every mutation ends with a full
//! snapshot written to the game-state slot; replicas replace their copy on
//! each notification. There is no acknowledgement and no merge: the last
//! published snapshot wins.

use cosmwasm_std::{to_json_vec, Event, StdResult, Storage};
use prize_draw_common::slot::{announce_slot, clear_slot, write_slot};
use prize_draw_common::types::{DRAW_ORDER_KEY, GAME_STATE_KEY, PRIZES_KEY};
use prize_draw_common::{DrawOrder, Prize};

use crate::state::DrawSession;

/// Publish the session snapshot. Yields an event only when the slot changed.
pub fn publish_game_state(
    storage: &mut dyn Storage,
    session: &DrawSession,
) -> StdResult<Option<Event>> {
    let bytes = to_json_vec(&session.snapshot())?;
    Ok(write_slot(storage, GAME_STATE_KEY, bytes).map(|change| change.to_event()))
}

/// Clear the game-state slot, sending replicas to standby.
pub fn reset_game_state(storage: &mut dyn Storage) -> Option<Event> {
    clear_slot(storage, GAME_STATE_KEY).map(|change| change.to_event())
}

pub fn publish_prizes(storage: &mut dyn Storage, prizes: &[Prize]) -> StdResult<Option<Event>> {
    let bytes = to_json_vec(&prizes)?;
    Ok(write_slot(storage, PRIZES_KEY, bytes).map(|change| change.to_event()))
}

/// Write both config slots and notify unconditionally, so replicas started
/// after the last setup edit still pick up the catalog and order.
pub fn announce_config(
    storage: &mut dyn Storage,
    prizes: &[Prize],
    order: DrawOrder,
) -> StdResult<Vec<Event>> {
    let prizes = announce_slot(storage, PRIZES_KEY, to_json_vec(&prizes)?);
    let order = announce_slot(storage, DRAW_ORDER_KEY, to_json_vec(&order)?);
    Ok(vec![prizes.to_event(), order.to_event()])
}
