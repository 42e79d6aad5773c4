use std::cell::RefCell;

use crate::common::collections::HashMap;
use crate::model::zone::ZoneSet;
use crate::sys::display::WorkAreaId;
use crate::sys::window::WindowId;

/// Key under which a window's last zone assignment is remembered. The same
/// window can hold a record per (work area, layout) pair, so switching
/// layouts back and forth restores the older assignment too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub window: WindowId,
    pub work_area: WorkAreaId,
    pub layout_uuid: String,
}

/// Last-zone bookkeeping behind the app-history collaborator. Encoding the
/// records to disk belongs to the implementation, not the core.
pub trait AppZoneHistory {
    fn record_last_zone(&self, key: HistoryKey, set: ZoneSet);
    fn remove_last_zone(&self, key: &HistoryKey);
    fn lookup_last_zone(&self, key: &HistoryKey) -> Option<ZoneSet>;
}

/// History kept in a plain map for tests and the inspection CLI.
#[derive(Default)]
pub struct InMemoryHistory {
    records: RefCell<HashMap<HistoryKey, ZoneSet>>,
}

impl InMemoryHistory {
    pub fn len(&self) -> usize { self.records.borrow().len() }

    pub fn is_empty(&self) -> bool { self.records.borrow().is_empty() }
}

impl AppZoneHistory for InMemoryHistory {
    fn record_last_zone(&self, key: HistoryKey, set: ZoneSet) {
        self.records.borrow_mut().insert(key, set);
    }

    fn remove_last_zone(&self, key: &HistoryKey) {
        self.records.borrow_mut().remove(key);
    }

    fn lookup_last_zone(&self, key: &HistoryKey) -> Option<ZoneSet> {
        self.records.borrow().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::display::DesktopId;

    fn key(window: u64) -> HistoryKey {
        HistoryKey {
            window: WindowId::new(window),
            work_area: WorkAreaId::combined(DesktopId::new(1)),
            layout_uuid: "layout-a".to_string(),
        }
    }

    #[test]
    fn record_lookup_remove() {
        let history = InMemoryHistory::default();
        let set: ZoneSet = vec![2, 3].into();

        history.record_last_zone(key(1), set.clone());
        assert_eq!(history.lookup_last_zone(&key(1)), Some(set));
        assert_eq!(history.lookup_last_zone(&key(2)), None);

        history.remove_last_zone(&key(1));
        assert!(history.is_empty());
    }

    #[test]
    fn records_are_scoped_per_layout() {
        let history = InMemoryHistory::default();
        let mut other = key(1);
        other.layout_uuid = "layout-b".to_string();

        history.record_last_zone(key(1), vec![0].into());
        history.record_last_zone(other.clone(), vec![1].into());

        assert_eq!(history.lookup_last_zone(&key(1)), Some(vec![0].into()));
        assert_eq!(history.lookup_last_zone(&other), Some(vec![1].into()));
    }
}
