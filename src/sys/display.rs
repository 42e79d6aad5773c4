use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::model::geometry::Rect;

/// Identity of one physical display, as reported by the platform layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DisplayId(pub u32);

/// Identity of one virtual desktop. Desktop 0 is not a thing on any
/// platform we target, so the niche is free.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DesktopId(NonZeroU64);

impl DesktopId {
    pub const fn new(id: u64) -> DesktopId { DesktopId(NonZeroU64::new(id).unwrap()) }

    pub fn get(&self) -> u64 { self.0.get() }
}

/// Composite key identifying one work area. A `None` display denotes the
/// all-monitors-combined work area used when zones span displays.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkAreaId {
    pub display: Option<DisplayId>,
    pub desktop: DesktopId,
}

impl WorkAreaId {
    pub fn new(display: DisplayId, desktop: DesktopId) -> WorkAreaId {
        WorkAreaId { display: Some(display), desktop }
    }

    pub fn combined(desktop: DesktopId) -> WorkAreaId {
        WorkAreaId { display: None, desktop }
    }
}

/// Snapshot of one display's usable area, in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInfo {
    pub id: DisplayId,
    /// Usable rectangle excluding reserved OS chrome.
    pub work_rect: Rect,
    /// DPI scale factor relative to 1.0 = 96dpi.
    pub scale: f64,
}

/// Topology notifications delivered by the identity provider. Lookups
/// backing these are too slow for the per-frame drag path; the core only
/// reacts to pushed changes.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyEvent {
    DisplaysChanged(Vec<DisplayInfo>),
    DesktopRemoved(DesktopId),
    DesktopSwitched(DesktopId),
}
