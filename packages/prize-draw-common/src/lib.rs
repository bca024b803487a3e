pub mod catalog;
pub mod drawer;
pub mod ledger;
pub mod replica;
pub mod slot;
pub mod types;

pub use catalog::{sequence, validate_prize, PrizeError};
pub use drawer::{draw_numbers, DrawOutcome, NumberStream};
pub use ledger::{ExportRow, PrizeWinners, WinnerLedger};
pub use replica::{DisplayReplica, DrawingAnimation, ReplicaUpdate};
pub use slot::{SlotChange, SlotSource};
pub use types::{DrawOrder, GameState, Prize, Winner};
