use cosmwasm_std::{to_json_binary, Binary, Deps, Env, StdResult};
use prize_draw_common::Prize;

use crate::msg::StatusResponse;
use crate::state::{DrawPhase, CONFIG, DRAW_ORDER, GAME_STATE, PRIZES, SESSION};

fn load_prizes(deps: Deps) -> StdResult<Vec<Prize>> {
    Ok(PRIZES.may_load(deps.storage)?.unwrap_or_default())
}

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_prizes(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&load_prizes(deps)?)
}

pub fn query_draw_order(deps: Deps) -> StdResult<Binary> {
    let order = DRAW_ORDER.may_load(deps.storage)?;
    to_json_binary(&order)
}

/// Reads the published slot, the same bytes a replica hydrates from.
pub fn query_game_state(deps: Deps) -> StdResult<Binary> {
    let state = GAME_STATE.may_load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_status(deps: Deps, _env: Env) -> StdResult<Binary> {
    to_json_binary(&status(deps)?)
}

fn status(deps: Deps) -> StdResult<StatusResponse> {
    let config = CONFIG.load(deps.storage)?;
    let prizes = load_prizes(deps)?;

    let Some(session) = SESSION.may_load(deps.storage)? else {
        return Ok(StatusResponse {
            phase: "setup".to_string(),
            current_prize: None,
            current_prize_index: 0,
            total_prizes: prizes.len() as u32,
            total_needed: 0,
            confirmed_count: 0,
            remaining: 0,
            draw_ready_at: None,
        });
    };

    let current_prize = session.current_prize(&prizes);
    let (total_needed, confirmed_count) = match session.round() {
        Some(round) => (round.total_needed, round.confirmed_count()),
        None => (current_prize.as_ref().map_or(0, |p| p.quantity), 0),
    };
    let draw_ready_at = match &session.phase {
        DrawPhase::Drawing { started_at, .. } => {
            Some(started_at.plus_seconds(config.draw_delay_seconds))
        }
        _ => None,
    };

    Ok(StatusResponse {
        phase: session.phase_name().to_string(),
        current_prize_index: session.current_prize_index,
        total_prizes: session.sequence(&prizes).len() as u32,
        total_needed,
        confirmed_count,
        remaining: total_needed.saturating_sub(confirmed_count),
        current_prize,
        draw_ready_at,
    })
}

/// Combined sequence. Outside a session, specials are empty and the
/// published order (or the default) applies.
pub fn query_sequenced_prizes(deps: Deps) -> StdResult<Binary> {
    let prizes = load_prizes(deps)?;
    let sequenced = match SESSION.may_load(deps.storage)? {
        Some(session) => session.sequence(&prizes),
        None => {
            let order = DRAW_ORDER.may_load(deps.storage)?.unwrap_or_default();
            prize_draw_common::sequence(&prizes, &[], order)
        }
    };
    to_json_binary(&sequenced)
}

pub fn query_winners(deps: Deps) -> StdResult<Binary> {
    let rows = SESSION
        .may_load(deps.storage)?
        .map(|session| session.ledger.winners().to_vec())
        .unwrap_or_default();
    to_json_binary(&rows)
}

pub fn query_winners_by_prize(deps: Deps) -> StdResult<Binary> {
    let rows = SESSION
        .may_load(deps.storage)?
        .map(|session| session.ledger.group_by_prize())
        .unwrap_or_default();
    to_json_binary(&rows)
}

pub fn query_export_rows(deps: Deps) -> StdResult<Binary> {
    let rows = SESSION
        .may_load(deps.storage)?
        .map(|session| session.ledger.export_rows())
        .unwrap_or_default();
    to_json_binary(&rows)
}
