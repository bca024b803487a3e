use cosmwasm_std::{StdError, Timestamp};
use prize_draw_common::PrizeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("invalid input: {0}")]
    Prize(#[from] PrizeError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("prize {id} not found")]
    PrizeNotFound { id: String },

    #[error("prize catalog is empty")]
    EmptyCatalog,

    #[error("no draw session is active")]
    NoActiveSession,

    #[error("a draw session is already active")]
    SessionActive,

    #[error("a batch is being drawn")]
    DrawInProgress,

    #[error("no batch is being drawn")]
    NotDrawing,

    #[error("batch not ready to finalize (ready at {ready_at})")]
    DrawDelayPending { ready_at: Timestamp },

    #[error("no prize left to draw")]
    NoCurrentPrize,

    #[error("number {number} is not on screen")]
    NumberNotDrawn { number: u16 },

    #[error("prize incomplete: {confirmed} of {needed} winners confirmed")]
    PrizeIncomplete { confirmed: u32, needed: u32 },

    #[error("draw exhausted: need {needed} numbers, only {available} left")]
    DrawExhaustion { needed: u32, available: u32 },
}
