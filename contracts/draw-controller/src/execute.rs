use cosmwasm_std::{DepsMut, Env, Event, MessageInfo, Response, StdResult, Storage};
use prize_draw_common::catalog::{derive_id, next_prize_name, validate_prize};
use prize_draw_common::{DrawOrder, NumberStream, Prize};

use crate::draw::BatchStart;
use crate::error::ContractError;
use crate::state::{
    ControllerConfig, DrawSession, CONFIG, MAX_DRAW_DELAY_SECONDS, NEXT_ID, PRIZES, SESSION,
};
use crate::sync::{announce_config, publish_game_state, publish_prizes, reset_game_state};

/// Only the operator drives the draw; everyone else is a read-only replica.
fn ensure_operator(config: &ControllerConfig, info: &MessageInfo) -> Result<(), ContractError> {
    if info.sender != config.operator {
        return Err(ContractError::Unauthorized {
            reason: "only the operator can change the draw".to_string(),
        });
    }
    Ok(())
}

fn ensure_setup(storage: &dyn Storage) -> Result<(), ContractError> {
    if SESSION.may_load(storage)?.is_some() {
        return Err(ContractError::SessionActive);
    }
    Ok(())
}

fn load_session(storage: &dyn Storage) -> Result<DrawSession, ContractError> {
    SESSION
        .may_load(storage)?
        .ok_or(ContractError::NoActiveSession)
}

fn load_prizes(storage: &dyn Storage) -> StdResult<Vec<Prize>> {
    Ok(PRIZES.may_load(storage)?.unwrap_or_default())
}

pub fn validate_draw_delay(seconds: u64) -> Result<(), ContractError> {
    if seconds == 0 || seconds > MAX_DRAW_DELAY_SECONDS {
        return Err(ContractError::InvalidInput {
            reason: format!("draw delay must be between 1 and {MAX_DRAW_DELAY_SECONDS} seconds"),
        });
    }
    Ok(())
}

fn next_id(storage: &mut dyn Storage, env: &Env, kind: &str) -> StdResult<String> {
    let seq = NEXT_ID.may_load(storage)?.unwrap_or(0);
    NEXT_ID.save(storage, &(seq + 1))?;
    Ok(derive_id(kind, seq, env.block.time.nanos()))
}

/// Entropy for one batch. Not meant to be unpredictable to the chain.
fn batch_stream(env: &Env, session: &DrawSession) -> NumberStream {
    let tx_index = env.transaction.as_ref().map_or(0, |tx| tx.index);
    NumberStream::from_entropy(&[
        b"prize-draw/batch",
        &env.block.height.to_be_bytes(),
        &env.block.time.nanos().to_be_bytes(),
        &tx_index.to_be_bytes(),
        env.contract.address.as_str().as_bytes(),
        &session.batch_nonce.to_be_bytes(),
        &session.current_prize_index.to_be_bytes(),
    ])
}

fn with_event(response: Response, event: Option<Event>) -> Response {
    match event {
        Some(event) => response.add_event(event),
        None => response,
    }
}

/// Save the session and publish its snapshot.
fn commit(
    storage: &mut dyn Storage,
    session: &DrawSession,
    response: Response,
) -> Result<Response, ContractError> {
    SESSION.save(storage, session)?;
    let published = publish_game_state(storage, session)?;
    Ok(with_event(response, published))
}

fn join_numbers(numbers: &[u16]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// ─── Setup ───

pub fn add_prize(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    name: Option<String>,
    quantity: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_setup(deps.storage)?;

    let mut prizes = load_prizes(deps.storage)?;
    let name = match name {
        Some(name) => name.trim().to_string(),
        None => next_prize_name(&prizes),
    };
    let quantity = quantity.unwrap_or(1);
    validate_prize(&name, quantity)?;

    let id = next_id(deps.storage, &env, "prize")?;
    prizes.push(Prize {
        id: id.clone(),
        name: name.clone(),
        quantity,
    });
    let published = publish_prizes(deps.storage, &prizes)?;

    Ok(with_event(
        Response::new()
            .add_attribute("action", "add_prize")
            .add_attribute("prize_id", id)
            .add_attribute("name", name)
            .add_attribute("quantity", quantity.to_string()),
        published,
    ))
}

pub fn update_prize(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    id: String,
    name: Option<String>,
    quantity: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_setup(deps.storage)?;

    let mut prizes = load_prizes(deps.storage)?;
    let prize = prizes
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| ContractError::PrizeNotFound { id: id.clone() })?;
    if let Some(name) = name {
        prize.name = name.trim().to_string();
    }
    if let Some(quantity) = quantity {
        prize.quantity = quantity;
    }
    validate_prize(&prize.name, prize.quantity)?;
    let updated = prize.clone();
    let published = publish_prizes(deps.storage, &prizes)?;

    Ok(with_event(
        Response::new()
            .add_attribute("action", "update_prize")
            .add_attribute("prize_id", id)
            .add_attribute("name", updated.name)
            .add_attribute("quantity", updated.quantity.to_string()),
        published,
    ))
}

pub fn remove_prize(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_setup(deps.storage)?;

    let mut prizes = load_prizes(deps.storage)?;
    let before = prizes.len();
    prizes.retain(|p| p.id != id);
    if prizes.len() == before {
        return Err(ContractError::PrizeNotFound { id });
    }
    let published = publish_prizes(deps.storage, &prizes)?;

    Ok(with_event(
        Response::new()
            .add_attribute("action", "remove_prize")
            .add_attribute("prize_id", id),
        published,
    ))
}

// ─── Session ───

/// Open a session: lock the catalog, publish config slots and the empty snapshot.
pub fn start_draw(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    order: DrawOrder,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_setup(deps.storage)?;

    let prizes = load_prizes(deps.storage)?;
    if prizes.is_empty() {
        return Err(ContractError::EmptyCatalog);
    }
    for prize in &prizes {
        validate_prize(&prize.name, prize.quantity)?;
    }

    let session = DrawSession::new(order, &prizes);
    let config_events = announce_config(deps.storage, &prizes, order)?;

    let response = Response::new()
        .add_attribute("action", "start_draw")
        .add_attribute("order", order.as_str())
        .add_attribute("prizes", prizes.len().to_string())
        .add_event(
            Event::new("prize_draw_session_started")
                .add_attribute("order", order.as_str())
                .add_attribute("prizes", prizes.len().to_string()),
        )
        .add_events(config_events);
    commit(deps.storage, &session, response)
}

/// Back to setup. Clearing the slot puts every display on standby.
pub fn reset_to_setup(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    let winners = SESSION
        .may_load(deps.storage)?
        .map_or(0, |session| session.ledger.len());
    SESSION.remove(deps.storage);
    let cleared = reset_game_state(deps.storage);

    Ok(with_event(
        Response::new()
            .add_attribute("action", "reset_to_setup")
            .add_attribute("winners", winners.to_string()),
        cleared,
    ))
}

// ─── Draw ───

pub fn start_batch(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;
    let prizes = load_prizes(deps.storage)?;

    let quantity = match session.start_batch(&prizes, env.block.time)? {
        BatchStart::Started { quantity } => quantity,
        BatchStart::Skipped => {
            return Ok(Response::new()
                .add_attribute("action", "start_batch")
                .add_attribute("skipped", "true"));
        }
    };
    let prize = session.current_prize(&prizes).ok_or(ContractError::NoCurrentPrize)?;
    let ready_at = env.block.time.plus_seconds(config.draw_delay_seconds);

    let response = Response::new()
        .add_attribute("action", "start_batch")
        .add_attribute("quantity", quantity.to_string())
        .add_event(
            Event::new("prize_draw_batch_started")
                .add_attribute("prize", prize.name)
                .add_attribute("quantity", quantity.to_string())
                .add_attribute("batch", session.batch_nonce.to_string())
                .add_attribute("ready_at", ready_at.seconds().to_string()),
        );
    commit(deps.storage, &session, response)
}

pub fn finalize_batch(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;

    let mut stream = batch_stream(&env, &session);
    let outcome = session.finalize_batch(&mut stream, env.block.time, config.draw_delay_seconds)?;
    let numbers = join_numbers(&outcome.numbers);

    let response = Response::new()
        .add_attribute("action", "finalize_batch")
        .add_attribute("numbers", numbers.clone())
        .add_event(
            Event::new("prize_draw_batch_finalized")
                .add_attribute("batch", session.batch_nonce.to_string())
                .add_attribute("numbers", numbers)
                .add_attribute("forced_duplicates", outcome.forced_duplicates.to_string()),
        );
    commit(deps.storage, &session, response)
}

pub fn cancel_batch(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;

    session.cancel_batch()?;

    let response = Response::new()
        .add_attribute("action", "cancel_batch")
        .add_attribute("batch", session.batch_nonce.to_string());
    commit(deps.storage, &session, response)
}

pub fn confirm_number(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    number: u16,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;
    let prizes = load_prizes(deps.storage)?;

    let newly = session.confirm_number(&prizes, number, env.block.time)?;

    let mut response = Response::new()
        .add_attribute("action", "confirm_number")
        .add_attribute("number", number.to_string());
    if newly {
        response = response.add_event(
            Event::new("prize_draw_winner_confirmed")
                .add_attribute("numbers", number.to_string())
                .add_attribute("prize_index", session.current_prize_index.to_string()),
        );
    }
    commit(deps.storage, &session, response)
}

pub fn confirm_all(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;
    let prizes = load_prizes(deps.storage)?;

    let confirmed = session.confirm_all(&prizes, env.block.time)?;

    let mut response = Response::new()
        .add_attribute("action", "confirm_all")
        .add_attribute("confirmed", confirmed.len().to_string());
    if !confirmed.is_empty() {
        response = response.add_event(
            Event::new("prize_draw_winner_confirmed")
                .add_attribute("numbers", join_numbers(&confirmed))
                .add_attribute("prize_index", session.current_prize_index.to_string()),
        );
    }
    commit(deps.storage, &session, response)
}

pub fn unconfirm_number(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    number: u16,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;

    let released = session.unconfirm_number(number)?;

    let response = Response::new()
        .add_attribute("action", "unconfirm_number")
        .add_attribute("number", number.to_string())
        .add_attribute("released", released.to_string());
    commit(deps.storage, &session, response)
}

pub fn unconfirm_all(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;

    let released = session.unconfirm_all()?;

    let response = Response::new()
        .add_attribute("action", "unconfirm_all")
        .add_attribute("released", released.len().to_string());
    commit(deps.storage, &session, response)
}

pub fn advance_prize(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;
    let prizes = load_prizes(deps.storage)?;

    session.advance(&prizes)?;

    let response = Response::new()
        .add_attribute("action", "advance_prize")
        .add_attribute("prize_index", session.current_prize_index.to_string())
        .add_event(
            Event::new("prize_draw_prize_advanced")
                .add_attribute("prize_index", session.current_prize_index.to_string())
                .add_attribute("phase", session.phase_name()),
        );
    commit(deps.storage, &session, response)
}

pub fn add_special_prize(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    name: String,
    quantity: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    let mut session = load_session(deps.storage)?;
    let prizes = load_prizes(deps.storage)?;

    let name = name.trim().to_string();
    validate_prize(&name, quantity)?;
    let id = next_id(deps.storage, &env, "special")?;
    session.add_special_prize(
        &prizes,
        Prize {
            id: id.clone(),
            name: name.clone(),
            quantity,
        },
    )?;

    let response = Response::new()
        .add_attribute("action", "add_special_prize")
        .add_attribute("prize_id", id.clone())
        .add_event(
            Event::new("prize_draw_special_prize_added")
                .add_attribute("prize_id", id)
                .add_attribute("name", name)
                .add_attribute("quantity", quantity.to_string())
                .add_attribute("prize_index", session.current_prize_index.to_string()),
        );
    commit(deps.storage, &session, response)
}

// ─── Admin ───

pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    operator: Option<String>,
    draw_delay_seconds: Option<u64>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(operator) = operator {
        config.operator = deps.api.addr_validate(&operator)?;
    }
    if let Some(seconds) = draw_delay_seconds {
        validate_draw_delay(seconds)?;
        config.draw_delay_seconds = seconds;
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("operator", config.operator.to_string())
        .add_attribute("draw_delay_seconds", config.draw_delay_seconds.to_string()))
}
