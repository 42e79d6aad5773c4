//! Fake collaborators shared by the drag and keyboard tests.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::common::collections::{HashMap, HashSet};
use crate::common::config::{Config, LayoutSettings, Settings};
use crate::layout_engine::{LayoutDescriptor, LayoutKind, OverlapAlgorithm};
use crate::model::geometry::Rect;
use crate::model::work_area::WorkAreaRegistry;
use crate::sys::display::{DesktopId, DisplayId, DisplayInfo, TopologyEvent, WorkAreaId};
use crate::sys::history::InMemoryHistory;
use crate::sys::marker::InMemoryPropertyStore;
use crate::sys::overlay::{OverlayFrame, OverlayRenderer};
use crate::sys::window::{FrameAdjustment, WindowId, WindowOracle, WindowPlacement};
use crate::sys::Services;

pub(crate) const DESKTOP: DesktopId = DesktopId::new(1);

/// The layout every fixture installs: a 3x3 grid with no spacing on a
/// 300x300 display, so zone rectangles are easy to reason about.
pub(crate) fn grid_descriptor() -> LayoutDescriptor {
    LayoutSettings {
        kind: LayoutKind::Grid,
        zone_count: 9,
        show_spacing: false,
        spacing: 0,
        sensitivity_radius: 20,
        overlap_algorithm: OverlapAlgorithm::default(),
    }
    .to_descriptor()
}

/// Two 300x300 displays side by side on one desktop.
pub(crate) fn two_display_registry() -> WorkAreaRegistry {
    let mut registry = WorkAreaRegistry::new();
    registry.handle_topology(TopologyEvent::DisplaysChanged(vec![
        DisplayInfo {
            id: DisplayId(1),
            work_rect: Rect::new(0, 0, 300, 300),
            scale: 1.0,
        },
        DisplayInfo {
            id: DisplayId(2),
            work_rect: Rect::new(300, 0, 600, 300),
            scale: 1.0,
        },
    ]));
    registry
}

#[derive(Default)]
pub(crate) struct FakeOracle {
    rejected: RefCell<HashSet<WindowId>>,
    elevated: RefCell<HashSet<WindowId>>,
    nonstandard: RefCell<HashSet<WindowId>>,
    owned: RefCell<HashSet<WindowId>>,
    dead: RefCell<HashSet<WindowId>>,
}

impl FakeOracle {
    pub(crate) fn reject(&self, window: WindowId) {
        self.rejected.borrow_mut().insert(window);
    }

    pub(crate) fn elevate(&self, window: WindowId) {
        self.elevated.borrow_mut().insert(window);
    }

    pub(crate) fn make_nonstandard(&self, window: WindowId) {
        self.nonstandard.borrow_mut().insert(window);
    }

    pub(crate) fn kill(&self, window: WindowId) { self.dead.borrow_mut().insert(window); }
}

impl WindowOracle for FakeOracle {
    fn is_zoning_candidate(&self, window: WindowId) -> bool {
        !self.rejected.borrow().contains(&window)
    }

    fn is_elevated(&self, window: WindowId) -> bool { self.elevated.borrow().contains(&window) }

    fn has_visible_owner(&self, window: WindowId) -> bool {
        self.owned.borrow().contains(&window)
    }

    fn is_standard(&self, window: WindowId) -> bool {
        !self.nonstandard.borrow().contains(&window)
    }

    fn is_window(&self, window: WindowId) -> bool { !self.dead.borrow().contains(&window) }
}

#[derive(Default)]
pub(crate) struct FakePlacement {
    rects: RefCell<HashMap<WindowId, Rect>>,
    maximized: RefCell<HashSet<WindowId>>,
    transparent: RefCell<HashSet<WindowId>>,
    focused: RefCell<Vec<WindowId>>,
    pub(crate) fail_set_rect: Cell<bool>,
}

impl FakePlacement {
    pub(crate) fn place(&self, window: WindowId, rect: Rect) {
        self.rects.borrow_mut().insert(window, rect);
    }

    pub(crate) fn maximize(&self, window: WindowId) {
        self.maximized.borrow_mut().insert(window);
    }

    pub(crate) fn is_transparent(&self, window: WindowId) -> bool {
        self.transparent.borrow().contains(&window)
    }

    pub(crate) fn focused(&self) -> Vec<WindowId> { self.focused.borrow().clone() }
}

impl WindowPlacement for FakePlacement {
    fn rect(&self, window: WindowId) -> Option<Rect> {
        self.rects.borrow().get(&window).copied()
    }

    fn set_rect(&self, window: WindowId, rect: Rect) -> bool {
        if self.fail_set_rect.get() {
            return false;
        }
        self.rects.borrow_mut().insert(window, rect);
        true
    }

    fn frame_adjustment(&self, _window: WindowId) -> FrameAdjustment {
        FrameAdjustment::default()
    }

    fn is_maximized(&self, window: WindowId) -> bool {
        self.maximized.borrow().contains(&window)
    }

    fn focus(&self, window: WindowId) -> bool {
        self.focused.borrow_mut().push(window);
        true
    }

    fn set_transparent(&self, window: WindowId, transparent: bool) {
        if transparent {
            self.transparent.borrow_mut().insert(window);
        } else {
            self.transparent.borrow_mut().remove(&window);
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingOverlay {
    shown: RefCell<Vec<(WorkAreaId, OverlayFrame)>>,
    hidden: RefCell<Vec<WorkAreaId>>,
    hide_all: Cell<usize>,
    flashed: RefCell<Vec<WorkAreaId>>,
}

impl RecordingOverlay {
    pub(crate) fn shown_count(&self) -> usize { self.shown.borrow().len() }

    pub(crate) fn shown_work_areas(&self) -> Vec<WorkAreaId> {
        self.shown.borrow().iter().map(|(id, _)| *id).collect()
    }

    pub(crate) fn hidden(&self) -> Vec<WorkAreaId> { self.hidden.borrow().clone() }

    pub(crate) fn hide_all_count(&self) -> usize { self.hide_all.get() }

    pub(crate) fn flashed(&self) -> Vec<WorkAreaId> { self.flashed.borrow().clone() }
}

impl OverlayRenderer for RecordingOverlay {
    fn show(&self, work_area: WorkAreaId, frame: OverlayFrame) {
        self.shown.borrow_mut().push((work_area, frame));
    }

    fn hide(&self, work_area: WorkAreaId) { self.hidden.borrow_mut().push(work_area); }

    fn hide_all(&self) { self.hide_all.set(self.hide_all.get() + 1); }

    fn flash(&self, work_area: WorkAreaId, _frame: OverlayFrame) {
        self.flashed.borrow_mut().push(work_area);
    }
}

pub(crate) struct Fixture {
    pub(crate) oracle: FakeOracle,
    pub(crate) placement: FakePlacement,
    pub(crate) props: InMemoryPropertyStore,
    pub(crate) history: InMemoryHistory,
    pub(crate) overlay: RecordingOverlay,
    pub(crate) config: Arc<Config>,
}

impl Fixture {
    pub(crate) fn new() -> Fixture {
        let mut config = Config::default();
        config.settings.layout = LayoutSettings {
            kind: LayoutKind::Grid,
            zone_count: 9,
            show_spacing: false,
            spacing: 0,
            sensitivity_radius: 20,
            overlap_algorithm: OverlapAlgorithm::default(),
        };
        Fixture {
            oracle: FakeOracle::default(),
            placement: FakePlacement::default(),
            props: InMemoryPropertyStore::default(),
            history: InMemoryHistory::default(),
            overlay: RecordingOverlay::default(),
            config: Arc::new(config),
        }
    }

    pub(crate) fn set_config(&mut self, f: impl FnOnce(&mut Settings)) {
        let mut config = (*self.config).clone();
        f(&mut config.settings);
        self.config = Arc::new(config);
    }

    pub(crate) fn services(&self) -> Services<'_> {
        Services {
            oracle: &self.oracle,
            placement: &self.placement,
            props: &self.props,
            history: &self.history,
            overlay: &self.overlay,
        }
    }
}
