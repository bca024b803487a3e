use std::time::Duration;

use cosmwasm_std::Event;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::catalog::{default_prizes, sequence};
use crate::drawer::NumberStream;
use crate::slot::{slot_changes, SlotChange, SlotSource};
use crate::types::{DrawOrder, GameState, Prize, DRAW_ORDER_KEY, GAME_STATE_KEY, PRIZES_KEY};

/// Interval between animation frames on a display, in milliseconds.
pub const ANIMATION_FRAME_MS: u64 = 50;

/// What a replica did with one notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaUpdate {
    /// The game state was replaced by the published snapshot.
    Hydrated,
    /// The game-state slot was cleared; the replica is back on standby.
    Standby,
    /// The prize catalog or draw order changed.
    ConfigUpdated,
    /// Not a watched key, or nothing to apply.
    Ignored,
    /// The value could not be parsed; the previous state is kept.
    Rejected { key: String, reason: String },
}

/// Placeholder numbers shown while a batch is being drawn.
///
/// Lives only as long as the replica sees `isDrawing`; it is never persisted
/// or published and has no effect on drawn or confirmed numbers.
#[derive(Clone, Debug)]
pub struct DrawingAnimation {
    stream: NumberStream,
    slots: usize,
    frames: u64,
}

impl DrawingAnimation {
    pub fn new(seed: [u8; 32], slots: usize) -> Self {
        Self {
            stream: NumberStream::new(seed),
            slots,
            frames: 0,
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// How long a display holds each frame before asking for the next.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(ANIMATION_FRAME_MS)
    }

    /// Time the animation has been shown so far.
    pub fn elapsed(&self) -> Duration {
        self.frame_interval().saturating_mul(self.frames.min(u32::MAX as u64) as u32)
    }

    /// The next frame: one random number per slot, repeats allowed.
    pub fn next_frame(&mut self) -> Vec<u16> {
        self.frames += 1;
        (0..self.slots).map(|_| self.stream.next_number()).collect()
    }
}

/// Read-only mirror of the controller's published state.
///
/// Every game-state notification replaces the whole local copy. Clearing the
/// slot sends the replica to standby. Malformed values are logged and
/// dropped.
#[derive(Clone, Debug)]
pub struct DisplayReplica {
    game: Option<GameState>,
    prizes: Vec<Prize>,
    draw_order: DrawOrder,
    animation: Option<DrawingAnimation>,
}

impl Default for DisplayReplica {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayReplica {
    pub fn new() -> Self {
        Self {
            game: None,
            prizes: default_prizes(),
            draw_order: DrawOrder::default(),
            animation: None,
        }
    }

    /// Re-read every slot directly. Used at startup and to recover from
    /// missed notifications.
    pub fn reload(&mut self, source: &impl SlotSource) -> Vec<ReplicaUpdate> {
        [PRIZES_KEY, DRAW_ORDER_KEY, GAME_STATE_KEY]
            .into_iter()
            .map(|key| {
                let value = source.read_slot(key);
                // An absent config slot keeps the current config.
                if value.is_none() && key != GAME_STATE_KEY {
                    return ReplicaUpdate::Ignored;
                }
                self.apply(&SlotChange {
                    key: key.to_string(),
                    old_value: None,
                    new_value: value,
                })
            })
            .collect()
    }

    /// Apply every slot notification found in `events`.
    pub fn apply_events(&mut self, events: &[Event]) -> Vec<ReplicaUpdate> {
        slot_changes(events)
            .iter()
            .map(|change| self.apply(change))
            .collect()
    }

    pub fn apply(&mut self, change: &SlotChange) -> ReplicaUpdate {
        match change.key.as_str() {
            GAME_STATE_KEY => match &change.new_value {
                Some(raw) => self.hydrate(raw),
                None => {
                    debug!("game state slot cleared, entering standby");
                    self.game = None;
                    self.animation = None;
                    ReplicaUpdate::Standby
                }
            },
            PRIZES_KEY => match &change.new_value {
                Some(raw) => match serde_json::from_str::<Vec<Prize>>(raw) {
                    Ok(prizes) => {
                        self.prizes = prizes;
                        ReplicaUpdate::ConfigUpdated
                    }
                    Err(err) => reject(PRIZES_KEY, err.to_string()),
                },
                None => ReplicaUpdate::Ignored,
            },
            DRAW_ORDER_KEY => match &change.new_value {
                Some(raw) => match parse_draw_order(raw) {
                    Ok(order) => {
                        self.draw_order = order;
                        ReplicaUpdate::ConfigUpdated
                    }
                    Err(reason) => reject(DRAW_ORDER_KEY, reason),
                },
                None => ReplicaUpdate::Ignored,
            },
            _ => ReplicaUpdate::Ignored,
        }
    }

    fn hydrate(&mut self, raw: &str) -> ReplicaUpdate {
        let state = match serde_json::from_str::<GameState>(raw) {
            Ok(state) => state,
            Err(err) => return reject(GAME_STATE_KEY, err.to_string()),
        };
        debug!(
            prize_index = state.current_prize_index,
            drawing = state.is_drawing,
            winners = state.winners.len(),
            "game state hydrated"
        );

        if state.is_drawing {
            let slots = self.animation_slots(&state);
            let running = matches!(&self.animation, Some(animation) if animation.slots == slots);
            if !running {
                let seed: [u8; 32] = Sha256::digest(raw.as_bytes()).into();
                self.animation = Some(DrawingAnimation::new(seed, slots));
            }
        } else {
            self.animation = None;
        }
        self.game = Some(state);
        ReplicaUpdate::Hydrated
    }

    fn animation_slots(&self, state: &GameState) -> usize {
        if state.total_needed > 0 {
            return state.total_needed.saturating_sub(state.confirmed_count) as usize;
        }
        self.sequenced_prizes_for(state)
            .get(state.current_prize_index as usize)
            .map_or(0, |prize| prize.quantity as usize)
    }

    fn sequenced_prizes_for(&self, state: &GameState) -> Vec<Prize> {
        sequence(&self.prizes, &state.special_prizes, self.draw_order)
    }

    /// Last hydrated snapshot, or `None` on standby.
    pub fn game_state(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn draw_order(&self) -> DrawOrder {
        self.draw_order
    }

    pub fn sequenced_prizes(&self) -> Vec<Prize> {
        match &self.game {
            Some(state) => self.sequenced_prizes_for(state),
            None => sequence(&self.prizes, &[], self.draw_order),
        }
    }

    /// The prize being drawn, `None` on standby or once every prize is done.
    pub fn current_prize(&self) -> Option<Prize> {
        let state = self.game.as_ref()?;
        self.sequenced_prizes_for(state)
            .into_iter()
            .nth(state.current_prize_index as usize)
    }

    /// Nothing to show: no session, or no batch drawing and no numbers on screen.
    pub fn is_standby(&self) -> bool {
        match &self.game {
            None => true,
            Some(state) => {
                !state.is_drawing
                    && state.drawn_numbers.is_empty()
                    && state.confirmed_numbers.is_empty()
            }
        }
    }

    /// The animation for the batch in flight, if any.
    pub fn animation_mut(&mut self) -> Option<&mut DrawingAnimation> {
        self.animation.as_mut()
    }
}

fn reject(key: &str, reason: String) -> ReplicaUpdate {
    warn!(key, %reason, "ignoring malformed slot value");
    ReplicaUpdate::Rejected {
        key: key.to_string(),
        reason,
    }
}

/// Accepts the JSON string form (`"ascending"`) and the bare literal.
fn parse_draw_order(raw: &str) -> Result<DrawOrder, String> {
    match serde_json::from_str::<DrawOrder>(raw) {
        Ok(order) => Ok(order),
        Err(_) => raw.parse(),
    }
}
