use tracing::trace;

use crate::common::collections::HashMap;
use crate::model::zone::{ZoneId, ZoneSet};
use crate::sys::marker::WindowPropertyStore;
use crate::sys::window::{WindowId, WindowOracle, WindowPlacement};

/// Per-work-area bookkeeping of which windows sit in which zones, plus the
/// tab order of windows sharing one index set. A window appears in at most
/// one index set's list at a time.
#[derive(Debug, Default)]
pub struct LayoutAssignedWindows {
    window_sets: HashMap<WindowId, ZoneSet>,
    tab_lists: HashMap<ZoneSet, Vec<WindowId>>,
    /// Next sort key to mint; always ahead of every persisted key seen.
    next_sort_key: u64,
}

impl LayoutAssignedWindows {
    pub fn new() -> LayoutAssignedWindows { LayoutAssignedWindows::default() }

    /// Replaces the window's assignment with `set` and threads it into the
    /// set's tab list. The insert position comes from the persisted sort
    /// key, so a window rejoining a set lands where it used to be; windows
    /// seen for the first time go to the back and get a fresh key.
    pub fn assign(&mut self, window: WindowId, set: ZoneSet, props: &dyn WindowPropertyStore) {
        if set.is_empty() {
            return;
        }
        self.remove_from_tab_list(window);

        let key = match props.tab_sort_key(window) {
            Some(key) => key,
            None => {
                let key = self.next_sort_key;
                props.set_tab_sort_key(window, key);
                key
            }
        };
        self.next_sort_key = self.next_sort_key.max(key + 1);

        let list = self.tab_lists.entry(set.clone()).or_default();
        let pos = list
            .iter()
            .position(|w| props.tab_sort_key(*w).unwrap_or(u64::MAX) > key)
            .unwrap_or(list.len());
        list.insert(pos, window);
        self.window_sets.insert(window, set);
    }

    /// Forgets the window entirely, dropping its tab list when it was the
    /// last occupant and clearing the persisted sort key.
    pub fn dismiss(&mut self, window: WindowId, props: &dyn WindowPropertyStore) {
        self.remove_from_tab_list(window);
        self.window_sets.remove(&window);
        props.clear_tab_sort_key(window);
    }

    fn remove_from_tab_list(&mut self, window: WindowId) {
        let Some(set) = self.window_sets.get(&window) else {
            return;
        };
        if let Some(list) = self.tab_lists.get_mut(set) {
            list.retain(|w| *w != window);
            if list.is_empty() {
                let set = set.clone();
                self.tab_lists.remove(&set);
            }
        }
    }

    pub fn assigned_zones(&self, window: WindowId) -> Option<&ZoneSet> {
        self.window_sets.get(&window)
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &ZoneSet)> + '_ {
        self.window_sets.iter().map(|(w, s)| (*w, s))
    }

    pub fn is_empty(&self) -> bool { self.window_sets.is_empty() }

    /// True iff no assigned window's index set contains `zone`.
    pub fn is_zone_empty(&self, zone: ZoneId) -> bool {
        !self.window_sets.values().any(|set| set.contains(zone))
    }

    /// Advances focus to the next (or previous) window in the tab order of
    /// `window`'s index set, wrapping at the ends. Handles that no longer
    /// name a live window are dismissed on the way past; the surviving
    /// candidate is asked to take focus.
    pub fn cycle_windows(
        &mut self,
        window: WindowId,
        reverse: bool,
        oracle: &dyn WindowOracle,
        placement: &dyn WindowPlacement,
        props: &dyn WindowPropertyStore,
    ) -> Option<WindowId> {
        let set = self.window_sets.get(&window)?.clone();
        loop {
            let list = self.tab_lists.get(&set)?;
            let len = list.len();
            let pos = list.iter().position(|w| *w == window).unwrap_or(0);
            let next = if reverse { (pos + len - 1) % len } else { (pos + 1) % len };
            let candidate = list[next];
            if candidate != window && !oracle.is_window(candidate) {
                trace!(?candidate, "dropping stale window while cycling");
                self.dismiss(candidate, props);
                continue;
            }
            placement.focus(candidate);
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::collections::HashSet;
    use crate::model::geometry::Rect;
    use crate::sys::marker::InMemoryPropertyStore;
    use crate::sys::window::FrameAdjustment;

    struct Oracle {
        dead: HashSet<WindowId>,
    }

    impl Oracle {
        fn all_alive() -> Oracle { Oracle { dead: HashSet::default() } }
    }

    impl WindowOracle for Oracle {
        fn is_zoning_candidate(&self, _window: WindowId) -> bool { true }

        fn is_elevated(&self, _window: WindowId) -> bool { false }

        fn has_visible_owner(&self, _window: WindowId) -> bool { false }

        fn is_standard(&self, _window: WindowId) -> bool { true }

        fn is_window(&self, window: WindowId) -> bool { !self.dead.contains(&window) }
    }

    #[derive(Default)]
    struct Focuser {
        focused: RefCell<Vec<WindowId>>,
    }

    impl WindowPlacement for Focuser {
        fn rect(&self, _window: WindowId) -> Option<Rect> { None }

        fn set_rect(&self, _window: WindowId, _rect: Rect) -> bool { true }

        fn frame_adjustment(&self, _window: WindowId) -> FrameAdjustment {
            FrameAdjustment::default()
        }

        fn is_maximized(&self, _window: WindowId) -> bool { false }

        fn focus(&self, window: WindowId) -> bool {
            self.focused.borrow_mut().push(window);
            true
        }

        fn set_transparent(&self, _window: WindowId, _transparent: bool) {}
    }

    fn w(id: u64) -> WindowId { WindowId::new(id) }

    #[test]
    fn assign_then_dismiss_empties_every_zone() {
        let props = InMemoryPropertyStore::default();
        let mut assigned = LayoutAssignedWindows::new();

        assigned.assign(w(1), vec![0, 1].into(), &props);
        assert!(!assigned.is_zone_empty(ZoneId(0)));
        assert!(!assigned.is_zone_empty(ZoneId(1)));
        assert!(assigned.is_zone_empty(ZoneId(2)));

        assigned.dismiss(w(1), &props);
        assert!(assigned.is_zone_empty(ZoneId(0)));
        assert!(assigned.is_zone_empty(ZoneId(1)));
        assert!(assigned.is_empty());
        assert!(assigned.tab_lists.is_empty());
        assert_eq!(props.tab_sort_key(w(1)), None);
    }

    #[test]
    fn reassignment_moves_the_window() {
        let props = InMemoryPropertyStore::default();
        let mut assigned = LayoutAssignedWindows::new();

        assigned.assign(w(1), vec![0].into(), &props);
        assigned.assign(w(1), vec![2].into(), &props);

        assert_eq!(assigned.assigned_zones(w(1)), Some(&vec![2].into()));
        assert!(assigned.is_zone_empty(ZoneId(0)));
        assert_eq!(assigned.tab_lists.len(), 1);
    }

    #[test]
    fn tab_order_follows_persisted_sort_keys() {
        let props = InMemoryPropertyStore::default();
        let mut assigned = LayoutAssignedWindows::new();
        let set: ZoneSet = vec![3].into();

        assigned.assign(w(1), set.clone(), &props);
        assigned.assign(w(2), set.clone(), &props);
        assigned.assign(w(3), set.clone(), &props);
        assert_eq!(assigned.tab_lists[&set], vec![w(1), w(2), w(3)]);

        // Window 2 leaves its list but keeps its key (it was not
        // dismissed), so it comes back to the middle.
        assigned.assign(w(2), vec![4].into(), &props);
        assigned.assign(w(2), set.clone(), &props);
        assert_eq!(assigned.tab_lists[&set], vec![w(1), w(2), w(3)]);
    }

    #[test]
    fn cycle_wraps_in_both_directions() {
        let props = InMemoryPropertyStore::default();
        let oracle = Oracle::all_alive();
        let placement = Focuser::default();
        let mut assigned = LayoutAssignedWindows::new();
        let set: ZoneSet = vec![0].into();

        for id in 1..=3 {
            assigned.assign(w(id), set.clone(), &props);
        }

        assert_eq!(assigned.cycle_windows(w(1), false, &oracle, &placement, &props), Some(w(2)));
        assert_eq!(assigned.cycle_windows(w(2), false, &oracle, &placement, &props), Some(w(3)));
        assert_eq!(assigned.cycle_windows(w(3), false, &oracle, &placement, &props), Some(w(1)));
        assert_eq!(assigned.cycle_windows(w(1), true, &oracle, &placement, &props), Some(w(3)));
        assert_eq!(placement.focused.borrow().as_slice(), &[w(2), w(3), w(1), w(3)]);
    }

    #[test]
    fn cycle_skips_and_dismisses_dead_windows() {
        let props = InMemoryPropertyStore::default();
        let mut oracle = Oracle::all_alive();
        oracle.dead.insert(w(2));
        let placement = Focuser::default();
        let mut assigned = LayoutAssignedWindows::new();
        let set: ZoneSet = vec![0].into();

        for id in 1..=3 {
            assigned.assign(w(id), set.clone(), &props);
        }

        assert_eq!(assigned.cycle_windows(w(1), false, &oracle, &placement, &props), Some(w(3)));
        assert_eq!(assigned.assigned_zones(w(2)), None);
    }

    #[test]
    fn cycle_without_assignment_is_a_no_op() {
        let props = InMemoryPropertyStore::default();
        let oracle = Oracle::all_alive();
        let placement = Focuser::default();
        let mut assigned = LayoutAssignedWindows::new();

        assert_eq!(assigned.cycle_windows(w(9), false, &oracle, &placement, &props), None);
        assert!(placement.focused.borrow().is_empty());
    }
}
