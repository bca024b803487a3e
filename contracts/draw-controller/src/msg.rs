use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Timestamp;
use prize_draw_common::{DrawOrder, ExportRow, GameState, Prize, PrizeWinners, Winner};

use crate::state::ControllerConfig;

#[cw_serde]
pub struct InstantiateMsg {
    /// Address allowed to drive the draw.
    pub operator: String,
    /// Regular prize catalog. Defaults to three numbered prizes.
    pub prizes: Option<Vec<Prize>>,
    /// Seconds between starting and finalizing a batch (default 2).
    pub draw_delay_seconds: Option<u64>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Add a regular prize during setup. Name defaults to the next numbered prize.
    AddPrize {
        name: Option<String>,
        quantity: Option<u32>,
    },
    /// Edit a regular prize during setup.
    UpdatePrize {
        id: String,
        name: Option<String>,
        quantity: Option<u32>,
    },
    /// Remove a regular prize during setup.
    RemovePrize { id: String },
    /// Leave setup and open a draw session.
    StartDraw { order: DrawOrder },
    /// Begin drawing numbers for the current prize.
    StartBatch {},
    /// Land the numbers of the batch in flight once the delay has passed.
    FinalizeBatch {},
    /// Abandon the batch in flight.
    CancelBatch {},
    ConfirmNumber { number: u16 },
    ConfirmAll {},
    UnconfirmNumber { number: u16 },
    UnconfirmAll {},
    /// Move to the next prize once the current one is complete.
    AdvancePrize {},
    /// Add a prize mid-session; the draw jumps to it.
    AddSpecialPrize { name: String, quantity: u32 },
    /// End the session and send every display back to standby.
    ResetToSetup {},
    /// Update configuration. Admin only.
    UpdateConfig {
        operator: Option<String>,
        draw_delay_seconds: Option<u64>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ControllerConfig)]
    Config {},
    /// Regular prize catalog.
    #[returns(Vec<Prize>)]
    Prizes {},
    #[returns(Option<DrawOrder>)]
    DrawOrder {},
    /// Published snapshot; `None` while no session runs.
    #[returns(Option<GameState>)]
    GameState {},
    #[returns(StatusResponse)]
    Status {},
    #[returns(Vec<Prize>)]
    SequencedPrizes {},
    #[returns(Vec<Winner>)]
    Winners {},
    #[returns(Vec<PrizeWinners>)]
    WinnersByPrize {},
    #[returns(Vec<ExportRow>)]
    ExportRows {},
}

#[cw_serde]
pub struct StatusResponse {
    /// One of `setup`, `idle`, `drawing`, `pending`, `done`.
    pub phase: String,
    pub current_prize: Option<Prize>,
    pub current_prize_index: u32,
    pub total_prizes: u32,
    pub total_needed: u32,
    pub confirmed_count: u32,
    pub remaining: u32,
    /// Earliest time the batch in flight can be finalized.
    pub draw_ready_at: Option<Timestamp>,
}
