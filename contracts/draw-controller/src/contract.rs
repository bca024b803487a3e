use cosmwasm_std::{entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};
use cw2::{get_contract_version, set_contract_version};
use prize_draw_common::catalog::{default_prizes, validate_prize};

use crate::error::ContractError;
use crate::execute;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{ControllerConfig, CONFIG, DEFAULT_DRAW_DELAY_SECONDS, NEXT_ID};
use crate::sync::publish_prizes;

const CONTRACT_NAME: &str = "crates.io:prize-draw-controller";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let operator = deps.api.addr_validate(&msg.operator)?;
    let draw_delay_seconds = msg.draw_delay_seconds.unwrap_or(DEFAULT_DRAW_DELAY_SECONDS);
    execute::validate_draw_delay(draw_delay_seconds)?;

    let prizes = msg.prizes.unwrap_or_else(default_prizes);
    for (i, prize) in prizes.iter().enumerate() {
        validate_prize(&prize.name, prize.quantity)?;
        if prizes[..i].iter().any(|p| p.id == prize.id) {
            return Err(ContractError::InvalidInput {
                reason: format!("duplicate prize id {}", prize.id),
            });
        }
    }

    let config = ControllerConfig {
        admin: info.sender.clone(),
        operator,
        draw_delay_seconds,
    };
    CONFIG.save(deps.storage, &config)?;
    NEXT_ID.save(deps.storage, &0u64)?;
    let published = publish_prizes(deps.storage, &prizes)?;

    let response = Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "prize-draw-controller")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute("operator", config.operator.to_string())
        .add_attribute("prizes", prizes.len().to_string());
    Ok(match published {
        Some(event) => response.add_event(event),
        None => response,
    })
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::AddPrize { name, quantity } => {
            execute::add_prize(deps, env, info, name, quantity)
        }
        ExecuteMsg::UpdatePrize { id, name, quantity } => {
            execute::update_prize(deps, env, info, id, name, quantity)
        }
        ExecuteMsg::RemovePrize { id } => execute::remove_prize(deps, env, info, id),
        ExecuteMsg::StartDraw { order } => execute::start_draw(deps, env, info, order),
        ExecuteMsg::StartBatch {} => execute::start_batch(deps, env, info),
        ExecuteMsg::FinalizeBatch {} => execute::finalize_batch(deps, env, info),
        ExecuteMsg::CancelBatch {} => execute::cancel_batch(deps, env, info),
        ExecuteMsg::ConfirmNumber { number } => {
            execute::confirm_number(deps, env, info, number)
        }
        ExecuteMsg::ConfirmAll {} => execute::confirm_all(deps, env, info),
        ExecuteMsg::UnconfirmNumber { number } => {
            execute::unconfirm_number(deps, env, info, number)
        }
        ExecuteMsg::UnconfirmAll {} => execute::unconfirm_all(deps, env, info),
        ExecuteMsg::AdvancePrize {} => execute::advance_prize(deps, env, info),
        ExecuteMsg::AddSpecialPrize { name, quantity } => {
            execute::add_special_prize(deps, env, info, name, quantity)
        }
        ExecuteMsg::ResetToSetup {} => execute::reset_to_setup(deps, env, info),
        ExecuteMsg::UpdateConfig {
            operator,
            draw_delay_seconds,
        } => execute::update_config(deps, env, info, operator, draw_delay_seconds),
    }
}

#[entry_point]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Prizes {} => query::query_prizes(deps),
        QueryMsg::DrawOrder {} => query::query_draw_order(deps),
        QueryMsg::GameState {} => query::query_game_state(deps),
        QueryMsg::Status {} => query::query_status(deps, env),
        QueryMsg::SequencedPrizes {} => query::query_sequenced_prizes(deps),
        QueryMsg::Winners {} => query::query_winners(deps),
        QueryMsg::WinnersByPrize {} => query::query_winners_by_prize(deps),
        QueryMsg::ExportRows {} => query::query_export_rows(deps),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "cannot migrate from a different contract".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
