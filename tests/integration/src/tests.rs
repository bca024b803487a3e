//! End-to-end tests for the prize draw controller and its display replicas.
//!
//! The controller is driven through its entry points with
//! `cosmwasm_std::testing` mocks. Replicas follow the slot notifications
//! carried in each response, or re-read the slots straight from storage.
//!
//! Run:
//! ```bash
//! cargo test -p prize-draw-integration-tests
//! ```

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{from_json, Deps, Env, MemoryStorage, OwnedDeps, Response};
use prize_draw_common::slot::SlotChange;
use prize_draw_common::types::GAME_STATE_KEY;
use prize_draw_common::{
    DisplayReplica, DrawOrder, ExportRow, GameState, Prize, PrizeWinners, ReplicaUpdate, SlotSource,
};
use prize_draw_controller::contract::{execute, instantiate, query};
use prize_draw_controller::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, StatusResponse};
use prize_draw_controller::ContractError;

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Helpers ───

fn prize(id: &str, name: &str, quantity: u32) -> Prize {
    Prize {
        id: id.to_string(),
        name: name.to_string(),
        quantity,
    }
}

fn setup_controller(deps: &mut TestDeps, prizes: Vec<Prize>) -> Response {
    let admin = deps.api.addr_make("admin");
    let msg = InstantiateMsg {
        operator: deps.api.addr_make("operator").to_string(),
        prizes: Some(prizes),
        draw_delay_seconds: None,
    };
    instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap()
}

fn env_at(seconds_later: u64) -> Env {
    let mut env = mock_env();
    env.block.time = env.block.time.plus_seconds(seconds_later);
    env.block.height += seconds_later;
    env
}

fn operator_exec(
    deps: &mut TestDeps,
    env: Env,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    let operator = deps.api.addr_make("operator");
    execute(deps.as_mut(), env, message_info(&operator, &[]), msg)
}

/// Start a batch, then finalize it once the delay has passed.
fn draw_batch(deps: &mut TestDeps, replica: &mut DisplayReplica, at: u64) {
    let res = operator_exec(deps, env_at(at), ExecuteMsg::StartBatch {}).unwrap();
    replica.apply_events(&res.events);
    let res = operator_exec(deps, env_at(at + 2), ExecuteMsg::FinalizeBatch {}).unwrap();
    replica.apply_events(&res.events);
}

fn game_state(deps: Deps) -> Option<GameState> {
    from_json(query(deps, mock_env(), QueryMsg::GameState {}).unwrap()).unwrap()
}

fn status(deps: Deps) -> StatusResponse {
    from_json(query(deps, mock_env(), QueryMsg::Status {}).unwrap()).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_single_prize_session_with_replica() {
    let mut deps = mock_dependencies();
    let mut replica = DisplayReplica::new();
    let res = setup_controller(&mut deps, vec![prize("a", "รางวัลที่ 1", 3)]);
    replica.apply_events(&res.events);
    assert_eq!(replica.prizes().len(), 1);
    assert!(replica.is_standby());

    let res = operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Descending,
        },
    )
    .unwrap();
    replica.apply_events(&res.events);
    assert_eq!(replica.current_prize().unwrap().id, "a");

    // Batch in flight: replica animates placeholders.
    let res = operator_exec(&mut deps, env_at(0), ExecuteMsg::StartBatch {}).unwrap();
    assert_eq!(replica.apply_events(&res.events), vec![ReplicaUpdate::Hydrated]);
    assert!(replica.game_state().unwrap().is_drawing);
    let animation = replica.animation_mut().unwrap();
    assert_eq!(animation.slots(), 3);
    assert!(animation
        .next_frame()
        .iter()
        .all(|n| (1..=999).contains(n)));

    let res = operator_exec(&mut deps, env_at(2), ExecuteMsg::FinalizeBatch {}).unwrap();
    replica.apply_events(&res.events);
    assert!(replica.animation_mut().is_none());

    let state = replica.game_state().unwrap().clone();
    assert!(!state.is_drawing);
    assert_eq!(state.drawn_numbers.len(), 3);
    assert_eq!(state.pending_numbers(), state.drawn_numbers);

    let res = operator_exec(&mut deps, env_at(3), ExecuteMsg::ConfirmAll {}).unwrap();
    replica.apply_events(&res.events);
    let res = operator_exec(&mut deps, env_at(4), ExecuteMsg::AdvancePrize {}).unwrap();
    replica.apply_events(&res.events);

    let state = replica.game_state().unwrap();
    assert_eq!(state.winners.len(), 3);
    assert_eq!(state.current_prize_index, 1);
    assert!(replica.current_prize().is_none());
    assert_eq!(Some(state.clone()), game_state(deps.as_ref()));
    assert_eq!(status(deps.as_ref()).phase, "done");

    let rows: Vec<ExportRow> =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::ExportRows {}).unwrap()).unwrap();
    let sequences: Vec<u32> = rows.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert!(rows.iter().all(|r| r.prize_name == "รางวัลที่ 1"));
}

#[test]
fn test_replica_self_heals_from_storage() {
    let mut deps = mock_dependencies();
    setup_controller(
        &mut deps,
        vec![prize("1", "รางวัลที่ 1", 1), prize("2", "รางวัลที่ 2", 2)],
    );
    let mut live = DisplayReplica::new();
    let mut late = DisplayReplica::new();

    let res = operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Ascending,
        },
    )
    .unwrap();
    live.apply_events(&res.events);
    draw_batch(&mut deps, &mut live, 0);
    let res = operator_exec(&mut deps, env_at(3), ExecuteMsg::ConfirmAll {}).unwrap();
    live.apply_events(&res.events);

    // `late` missed every notification so far.
    assert!(late.game_state().is_none());
    let updates = late.reload(&deps.storage);
    assert_eq!(
        updates,
        vec![
            ReplicaUpdate::ConfigUpdated,
            ReplicaUpdate::ConfigUpdated,
            ReplicaUpdate::Hydrated
        ]
    );
    assert_eq!(late.game_state(), live.game_state());
    assert_eq!(late.draw_order(), DrawOrder::Ascending);
    assert_eq!(late.current_prize().unwrap().id, "1");

    // A stale notification replayed after a reload is still a full replacement.
    let stale = SlotChange {
        key: GAME_STATE_KEY.to_string(),
        old_value: None,
        new_value: Some(r#"{"currentPrizeIndex":0}"#.to_string()),
    };
    assert_eq!(late.apply(&stale), ReplicaUpdate::Hydrated);
    assert!(late.game_state().unwrap().winners.is_empty());
    late.reload(&deps.storage);
    assert_eq!(late.game_state(), live.game_state());

    // Reset: both replicas fall back to standby.
    let res = operator_exec(&mut deps, env_at(4), ExecuteMsg::ResetToSetup {}).unwrap();
    assert_eq!(live.apply_events(&res.events), vec![ReplicaUpdate::Standby]);
    late.reload(&deps.storage);
    assert!(live.is_standby());
    assert!(late.is_standby());
    assert!(deps.storage.read_slot(GAME_STATE_KEY).is_none());
}

#[test]
fn test_viewer_cannot_drive_the_draw() {
    let mut deps = mock_dependencies();
    setup_controller(&mut deps, vec![prize("a", "Only", 2)]);
    operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Descending,
        },
    )
    .unwrap();
    let before = deps.storage.read_slot(GAME_STATE_KEY);

    let viewer = deps.api.addr_make("viewer");
    for msg in [
        ExecuteMsg::StartBatch {},
        ExecuteMsg::ConfirmAll {},
        ExecuteMsg::AddSpecialPrize {
            name: "Bonus".to_string(),
            quantity: 1,
        },
        ExecuteMsg::ResetToSetup {},
    ] {
        let err = execute(deps.as_mut(), mock_env(), message_info(&viewer, &[]), msg).unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized { .. }));
    }
    assert_eq!(deps.storage.read_slot(GAME_STATE_KEY), before);
}

#[test]
fn test_sequence_with_special_prize() {
    let mut deps = mock_dependencies();
    setup_controller(
        &mut deps,
        vec![
            prize("p3", "รางวัลที่ 3", 1),
            prize("p1", "รางวัลที่ 1", 1),
            prize("x", "Consolation", 1),
            prize("p2", "รางวัลที่ 2", 1),
        ],
    );
    // Joined after instantiate: learns the catalog from StartDraw alone.
    let mut replica = DisplayReplica::new();
    let res = operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Descending,
        },
    )
    .unwrap();
    replica.apply_events(&res.events);

    let ids = |prizes: Vec<Prize>| prizes.into_iter().map(|p| p.id).collect::<Vec<_>>();
    let sequenced: Vec<Prize> = from_json(
        query(deps.as_ref(), mock_env(), QueryMsg::SequencedPrizes {}).unwrap(),
    )
    .unwrap();
    // Unranked names sort as 999: first when descending.
    assert_eq!(ids(sequenced), vec!["x", "p3", "p2", "p1"]);
    assert_eq!(ids(replica.sequenced_prizes()), vec!["x", "p3", "p2", "p1"]);

    draw_batch(&mut deps, &mut replica, 0);
    let res = operator_exec(&mut deps, env_at(3), ExecuteMsg::ConfirmAll {}).unwrap();
    replica.apply_events(&res.events);
    let res = operator_exec(&mut deps, env_at(4), ExecuteMsg::AdvancePrize {}).unwrap();
    replica.apply_events(&res.events);
    assert_eq!(replica.current_prize().unwrap().id, "p3");

    // Mid-session addition: appended last and drawn next.
    let res = operator_exec(
        &mut deps,
        env_at(5),
        ExecuteMsg::AddSpecialPrize {
            name: " Lucky Bonus ".to_string(),
            quantity: 2,
        },
    )
    .unwrap();
    replica.apply_events(&res.events);

    let st = status(deps.as_ref());
    assert_eq!(st.phase, "idle");
    assert_eq!(st.current_prize_index, 4);
    assert_eq!(st.total_prizes, 5);
    let current = st.current_prize.unwrap();
    assert_eq!(current.name, "Lucky Bonus");
    assert_eq!(replica.current_prize(), Some(current));

    draw_batch(&mut deps, &mut replica, 6);
    let res = operator_exec(&mut deps, env_at(9), ExecuteMsg::ConfirmAll {}).unwrap();
    replica.apply_events(&res.events);

    let groups: Vec<PrizeWinners> = from_json(
        query(deps.as_ref(), mock_env(), QueryMsg::WinnersByPrize {}).unwrap(),
    )
    .unwrap();
    let names: Vec<&str> = groups.iter().map(|g| g.prize_name.as_str()).collect();
    assert_eq!(names, vec!["Consolation", "Lucky Bonus"]);
    assert_eq!(groups[1].winners.len(), 2);

    let err = operator_exec(
        &mut deps,
        env_at(10),
        ExecuteMsg::AddSpecialPrize {
            name: "   ".to_string(),
            quantity: 1,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Prize(_)));
}

#[test]
fn test_unconfirmed_number_is_not_redrawn() {
    let mut deps = mock_dependencies();
    setup_controller(&mut deps, vec![prize("a", "Only", 1)]);
    let mut replica = DisplayReplica::new();
    operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Descending,
        },
    )
    .unwrap();

    draw_batch(&mut deps, &mut replica, 0);
    let first = replica.game_state().unwrap().drawn_numbers[0];

    let res = operator_exec(
        &mut deps,
        env_at(3),
        ExecuteMsg::ConfirmNumber { number: first },
    )
    .unwrap();
    replica.apply_events(&res.events);
    assert_eq!(replica.game_state().unwrap().winners.len(), 1);

    let res = operator_exec(
        &mut deps,
        env_at(4),
        ExecuteMsg::UnconfirmNumber { number: first },
    )
    .unwrap();
    replica.apply_events(&res.events);

    let state = replica.game_state().unwrap();
    assert!(state.winners.is_empty());
    assert_eq!(state.confirmed_count, 0);
    assert_eq!(state.pending_numbers(), vec![first]);
    // Taking a confirmation back leaves the number spent.
    assert_eq!(state.used_numbers, vec![first]);

    let err = operator_exec(&mut deps, env_at(5), ExecuteMsg::AdvancePrize {}).unwrap_err();
    assert!(matches!(err, ContractError::PrizeIncomplete { .. }));

    draw_batch(&mut deps, &mut replica, 6);
    let state = replica.game_state().unwrap();
    assert_eq!(state.drawn_numbers.len(), 1);
    assert_ne!(state.drawn_numbers[0], first);

    let err = operator_exec(
        &mut deps,
        env_at(9),
        ExecuteMsg::ConfirmNumber { number: first },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::NumberNotDrawn { .. }));
}

#[test]
fn test_delay_is_enforced() {
    let mut deps = mock_dependencies();
    setup_controller(&mut deps, vec![prize("a", "Only", 1)]);
    operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Descending,
        },
    )
    .unwrap();

    operator_exec(&mut deps, env_at(10), ExecuteMsg::StartBatch {}).unwrap();
    let err = operator_exec(&mut deps, env_at(10), ExecuteMsg::StartBatch {}).unwrap_err();
    assert!(matches!(err, ContractError::DrawInProgress));

    let err = operator_exec(&mut deps, env_at(11), ExecuteMsg::FinalizeBatch {}).unwrap_err();
    match err {
        ContractError::DrawDelayPending { ready_at } => {
            assert_eq!(ready_at, env_at(12).block.time);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        status(deps.as_ref()).draw_ready_at,
        Some(env_at(12).block.time)
    );

    operator_exec(&mut deps, env_at(12), ExecuteMsg::FinalizeBatch {}).unwrap();
    let err = operator_exec(&mut deps, env_at(13), ExecuteMsg::FinalizeBatch {}).unwrap_err();
    assert!(matches!(err, ContractError::NotDrawing));
}

#[test]
fn test_replica_drops_animation_on_cancel_and_reset() {
    let mut deps = mock_dependencies();
    setup_controller(&mut deps, vec![prize("a", "Only", 2)]);
    let mut replica = DisplayReplica::new();
    let res = operator_exec(
        &mut deps,
        mock_env(),
        ExecuteMsg::StartDraw {
            order: DrawOrder::Descending,
        },
    )
    .unwrap();
    replica.apply_events(&res.events);

    let res = operator_exec(&mut deps, env_at(0), ExecuteMsg::StartBatch {}).unwrap();
    replica.apply_events(&res.events);
    assert_eq!(replica.animation_mut().unwrap().slots(), 2);

    let res = operator_exec(&mut deps, env_at(1), ExecuteMsg::CancelBatch {}).unwrap();
    assert_eq!(replica.apply_events(&res.events), vec![ReplicaUpdate::Hydrated]);
    assert!(replica.animation_mut().is_none());
    assert!(replica.is_standby());

    let res = operator_exec(&mut deps, env_at(2), ExecuteMsg::StartBatch {}).unwrap();
    replica.apply_events(&res.events);
    assert!(replica.animation_mut().is_some());

    let res = operator_exec(&mut deps, env_at(3), ExecuteMsg::ResetToSetup {}).unwrap();
    assert_eq!(replica.apply_events(&res.events), vec![ReplicaUpdate::Standby]);
    assert!(replica.animation_mut().is_none());
}
