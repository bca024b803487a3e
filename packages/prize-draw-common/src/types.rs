use std::fmt;
use std::str::FromStr;

use cosmwasm_schema::cw_serde;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Slot holding the full replicated [`GameState`]. Absent while no session runs.
pub const GAME_STATE_KEY: &str = "lottery_game_state";
/// Slot holding the regular prize catalog as a JSON array of [`Prize`].
pub const PRIZES_KEY: &str = "lottery_prizes";
/// Slot holding the session [`DrawOrder`].
pub const DRAW_ORDER_KEY: &str = "lottery_draw_order";

/// A prize with the number of winners to draw for it.
///
/// Unknown fields are ignored so replicas keep parsing catalogs written by a
/// newer controller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct Prize {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

/// Order in which regular prizes are drawn. Fixed for a whole session.
#[cw_serde]
#[derive(Copy, Default)]
pub enum DrawOrder {
    Ascending,
    #[default]
    Descending,
}

impl DrawOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawOrder::Ascending => "ascending",
            DrawOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for DrawOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ascending" => Ok(DrawOrder::Ascending),
            "descending" => Ok(DrawOrder::Descending),
            other => Err(format!("unknown draw order: {other}")),
        }
    }
}

/// A confirmed winning number.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub id: String,
    pub prize_name: String,
    pub number: u16,
    /// Confirmation time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// The snapshot the controller publishes after every mutation.
///
/// Replicas replace their copy wholesale on every change. Every field
/// defaults when absent and unknown fields are ignored, so older and newer
/// protocol versions parse each other's snapshots.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub winners: Vec<Winner>,
    pub current_prize_index: u32,
    pub is_drawing: bool,
    pub drawn_numbers: Vec<u16>,
    pub confirmed_numbers: Vec<u16>,
    pub confirmed_count: u32,
    pub total_needed: u32,
    pub used_numbers: Vec<u16>,
    pub special_prizes: Vec<Prize>,
}

impl GameState {
    /// Numbers on screen that have not been confirmed yet.
    pub fn pending_numbers(&self) -> Vec<u16> {
        self.drawn_numbers
            .iter()
            .copied()
            .filter(|n| !self.confirmed_numbers.contains(n))
            .collect()
    }
}
