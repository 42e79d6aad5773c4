use std::cell::RefCell;

use crate::common::collections::HashMap;
use crate::model::zone::{ZoneId, ZoneSet};
use crate::sys::window::WindowId;

/// Number of zone indices a window marker can carry.
pub const MARKER_CAPACITY: usize = 128;

/// Zone membership packed into two fixed-width slots, the shape in which it
/// is stamped onto the window as an OS-visible property. The marker is what
/// lets an assignment survive a restart of this process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZoneBitmask(pub [u64; 2]);

impl ZoneBitmask {
    /// Packs an index set. Returns `None` when any id has no slot under
    /// [`MARKER_CAPACITY`]; callers skip stamping in that case.
    pub fn encode(set: &ZoneSet) -> Option<ZoneBitmask> {
        let mut slots = [0u64; 2];
        for id in set.iter() {
            let index = id.index().filter(|&i| i < MARKER_CAPACITY)?;
            slots[index / 64] |= 1 << (index % 64);
        }
        Some(ZoneBitmask(slots))
    }

    pub fn decode(&self) -> ZoneSet {
        (0..MARKER_CAPACITY)
            .filter(|i| self.0[i / 64] & (1 << (i % 64)) != 0)
            .map(|i| ZoneId(i as i64))
            .collect()
    }

    pub fn is_empty(&self) -> bool { self.0 == [0, 0] }
}

/// Per-window properties the core persists through the platform layer: the
/// zone-membership marker and the tab sort key that orders windows sharing
/// an index set.
pub trait WindowPropertyStore {
    fn set_marker(&self, window: WindowId, marker: ZoneBitmask) -> bool;
    fn marker(&self, window: WindowId) -> Option<ZoneBitmask>;
    fn clear_marker(&self, window: WindowId);

    fn set_tab_sort_key(&self, window: WindowId, key: u64);
    fn tab_sort_key(&self, window: WindowId) -> Option<u64>;
    fn clear_tab_sort_key(&self, window: WindowId);
}

/// Property store backed by plain maps. The production store writes real
/// window properties; this one backs tests and the inspection CLI.
#[derive(Default)]
pub struct InMemoryPropertyStore {
    markers: RefCell<HashMap<WindowId, ZoneBitmask>>,
    sort_keys: RefCell<HashMap<WindowId, u64>>,
}

impl WindowPropertyStore for InMemoryPropertyStore {
    fn set_marker(&self, window: WindowId, marker: ZoneBitmask) -> bool {
        self.markers.borrow_mut().insert(window, marker);
        true
    }

    fn marker(&self, window: WindowId) -> Option<ZoneBitmask> {
        self.markers.borrow().get(&window).copied()
    }

    fn clear_marker(&self, window: WindowId) {
        self.markers.borrow_mut().remove(&window);
    }

    fn set_tab_sort_key(&self, window: WindowId, key: u64) {
        self.sort_keys.borrow_mut().insert(window, key);
    }

    fn tab_sort_key(&self, window: WindowId) -> Option<u64> {
        self.sort_keys.borrow().get(&window).copied()
    }

    fn clear_tab_sort_key(&self, window: WindowId) {
        self.sort_keys.borrow_mut().remove(&window);
    }
}
