pub mod contract;
pub mod draw;
pub mod error;
pub mod execute;
pub mod msg;
pub mod query;
pub mod state;
pub mod sync;

pub use crate::error::ContractError;
