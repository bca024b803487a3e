//! Shared key/value slots and their change notifications.
//!
//! The controller owns the slots. After each write whose bytes differ from
//! the stored value it emits one [`SlotChange`] as a `lottery_slot_changed`
//! event. Delivery is fire-and-forget: no acknowledgement, no ordering beyond
//! the event stream's own, and the last published value wins. A replica that
//! missed a notification recovers by reading the slots through a
//! [`SlotSource`].

use cosmwasm_std::{Event, Storage};

pub const SLOT_CHANGED_EVENT: &str = "lottery_slot_changed";

const ATTR_KEY: &str = "key";
const ATTR_OLD_VALUE: &str = "old_value";
const ATTR_NEW_VALUE: &str = "new_value";

/// Notification that a slot's value changed.
///
/// `new_value == None` means the slot was cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotChange {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl SlotChange {
    pub fn to_event(&self) -> Event {
        let mut event = Event::new(SLOT_CHANGED_EVENT).add_attribute(ATTR_KEY, &self.key);
        if let Some(old) = &self.old_value {
            event = event.add_attribute(ATTR_OLD_VALUE, old);
        }
        if let Some(new) = &self.new_value {
            event = event.add_attribute(ATTR_NEW_VALUE, new);
        }
        event
    }

    /// Parse a notification back out of an event.
    ///
    /// Accepts the bare event type and the `wasm-` prefixed form chains emit.
    pub fn from_event(event: &Event) -> Option<Self> {
        let ty = event.ty.strip_prefix("wasm-").unwrap_or(&event.ty);
        if ty != SLOT_CHANGED_EVENT {
            return None;
        }
        let attr = |name: &str| {
            event
                .attributes
                .iter()
                .find(|a| a.key == name)
                .map(|a| a.value.clone())
        };
        Some(Self {
            key: attr(ATTR_KEY)?,
            old_value: attr(ATTR_OLD_VALUE),
            new_value: attr(ATTR_NEW_VALUE),
        })
    }
}

/// Every slot change carried by `events`, in emission order.
pub fn slot_changes(events: &[Event]) -> Vec<SlotChange> {
    events.iter().filter_map(SlotChange::from_event).collect()
}

/// Direct read access to the current slot values.
pub trait SlotSource {
    fn read_slot(&self, key: &str) -> Option<String>;
}

impl<S: Storage + ?Sized> SlotSource for S {
    fn read_slot(&self, key: &str) -> Option<String> {
        self.get(key.as_bytes())
            .map(|raw| String::from_utf8_lossy(&raw).into_owned())
    }
}

/// Write `value` into the slot `key`.
///
/// Returns the notification to emit, or `None` when the stored bytes are
/// already identical.
pub fn write_slot(storage: &mut dyn Storage, key: &str, value: Vec<u8>) -> Option<SlotChange> {
    if storage.get(key.as_bytes()).as_deref() == Some(value.as_slice()) {
        return None;
    }
    Some(announce_slot(storage, key, value))
}

/// Write `value` into the slot `key` and always report it, even when the
/// stored bytes are unchanged. Replicas that joined after the previous write
/// only learn the value this way.
pub fn announce_slot(storage: &mut dyn Storage, key: &str, value: Vec<u8>) -> SlotChange {
    let old = storage.get(key.as_bytes());
    storage.set(key.as_bytes(), &value);
    SlotChange {
        key: key.to_string(),
        old_value: old.map(|raw| String::from_utf8_lossy(&raw).into_owned()),
        new_value: Some(String::from_utf8_lossy(&value).into_owned()),
    }
}

/// Remove the slot `key`. Returns `None` when it was already absent.
pub fn clear_slot(storage: &mut dyn Storage, key: &str) -> Option<SlotChange> {
    let old = storage.get(key.as_bytes())?;
    storage.remove(key.as_bytes());
    Some(SlotChange {
        key: key.to_string(),
        old_value: Some(String::from_utf8_lossy(&old).into_owned()),
        new_value: None,
    })
}
