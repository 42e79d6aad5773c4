use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::collections::BTreeMap;
use crate::model::geometry::Rect;

/// Identifies one zone within one layout. Builtin generators assign dense
/// ids `0..N-1`; custom layouts may carry arbitrary non-negative ids.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct ZoneId(pub i64);

impl ZoneId {
    pub fn get(&self) -> i64 { self.0 }

    /// The bitmask slot this id occupies, if it has one.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// One rectangular region of a work area. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    id: ZoneId,
    rect: Rect,
}

impl Zone {
    /// Returns `None` when the rectangle cannot be a zone (non-positive
    /// extent or coordinates under the floor).
    pub fn new(id: ZoneId, rect: Rect) -> Option<Zone> {
        rect.is_valid().then_some(Zone { id, rect })
    }

    pub fn id(&self) -> ZoneId { self.id }

    pub fn rect(&self) -> Rect { self.rect }

    pub fn area(&self) -> i64 { self.rect.area() }
}

/// Zone id → zone, with deterministic (ascending id) iteration order.
pub type ZonesMap = BTreeMap<ZoneId, Zone>;

/// An ordered, duplicate-free set of zone ids. This is the unit of
/// assignment: a window snapped across several zones carries one of these.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneSet(Vec<ZoneId>);

impl ZoneSet {
    pub fn new() -> ZoneSet { ZoneSet(Vec::new()) }

    pub fn single(id: ZoneId) -> ZoneSet { ZoneSet(vec![id]) }

    pub fn insert(&mut self, id: ZoneId) -> bool {
        match self.0.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, id);
                true
            }
        }
    }

    pub fn contains(&self, id: ZoneId) -> bool { self.0.binary_search(&id).is_ok() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn iter(&self) -> impl Iterator<Item = ZoneId> + '_ { self.0.iter().copied() }

    pub fn as_slice(&self) -> &[ZoneId] { &self.0 }
}

impl FromIterator<ZoneId> for ZoneSet {
    fn from_iter<I: IntoIterator<Item = ZoneId>>(iter: I) -> ZoneSet {
        let mut ids: Vec<ZoneId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        ZoneSet(ids)
    }
}

impl From<Vec<i64>> for ZoneSet {
    fn from(ids: Vec<i64>) -> ZoneSet { ids.into_iter().map(ZoneId).collect() }
}
