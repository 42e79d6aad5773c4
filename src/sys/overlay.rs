use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::geometry::Rect;
use crate::model::zone::{ZoneSet, ZonesMap};
use crate::sys::display::WorkAreaId;

/// Immutable snapshot handed to the overlay renderer. The render loop owns
/// its own pacing; the core only publishes the latest frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub zones: Vec<Rect>,
    pub highlighted: ZoneSet,
}

impl OverlayFrame {
    pub fn new(zones: &ZonesMap, highlighted: ZoneSet) -> OverlayFrame {
        OverlayFrame {
            zones: zones.values().map(|z| z.rect()).collect(),
            highlighted,
        }
    }
}

/// Overlay surface contract. `show` replaces whatever the renderer was
/// displaying for that work area; the core never waits on the renderer.
pub trait OverlayRenderer {
    fn show(&self, work_area: WorkAreaId, frame: OverlayFrame);
    fn hide(&self, work_area: WorkAreaId);
    fn hide_all(&self);
    fn flash(&self, work_area: WorkAreaId, frame: OverlayFrame);
}

/// Single-slot frame exchange between the core and an external render loop.
/// The renderer polls `take`; the core overwrites with `publish`. Holding
/// the lock only for the swap keeps the drag path free of render stalls.
#[derive(Default, Clone)]
pub struct SharedFrame {
    slot: Arc<Mutex<Option<(WorkAreaId, OverlayFrame)>>>,
}

impl SharedFrame {
    pub fn publish(&self, work_area: WorkAreaId, frame: OverlayFrame) {
        *self.slot.lock() = Some((work_area, frame));
    }

    pub fn clear(&self) { *self.slot.lock() = None; }

    pub fn take(&self) -> Option<(WorkAreaId, OverlayFrame)> { self.slot.lock().take() }
}

/// Renderer that publishes frames into a [`SharedFrame`] and otherwise does
/// nothing. Useful headless and in the inspection CLI.
#[derive(Default, Clone)]
pub struct FrameBufferRenderer {
    pub frames: SharedFrame,
}

impl OverlayRenderer for FrameBufferRenderer {
    fn show(&self, work_area: WorkAreaId, frame: OverlayFrame) {
        self.frames.publish(work_area, frame);
    }

    fn hide(&self, _work_area: WorkAreaId) { self.frames.clear(); }

    fn hide_all(&self) { self.frames.clear(); }

    fn flash(&self, work_area: WorkAreaId, frame: OverlayFrame) {
        self.frames.publish(work_area, frame);
    }
}

/// Renderer that drops everything. Stands in when overlays are disabled.
#[derive(Default, Clone, Copy)]
pub struct NullRenderer;

impl OverlayRenderer for NullRenderer {
    fn show(&self, _work_area: WorkAreaId, _frame: OverlayFrame) {}

    fn hide(&self, _work_area: WorkAreaId) {}

    fn hide_all(&self) {}

    fn flash(&self, _work_area: WorkAreaId, _frame: OverlayFrame) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::display::DesktopId;

    #[test]
    fn shared_frame_keeps_latest_only() {
        let shared = SharedFrame::default();
        let id = WorkAreaId::combined(DesktopId::new(1));

        let a = OverlayFrame { zones: vec![], highlighted: ZoneSet::new() };
        let b = OverlayFrame {
            zones: vec![Rect::new(0, 0, 10, 10)],
            highlighted: vec![0].into(),
        };
        shared.publish(id, a);
        shared.publish(id, b.clone());

        assert_eq!(shared.take(), Some((id, b)));
        assert_eq!(shared.take(), None);
    }
}
