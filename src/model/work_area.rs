use thiserror::Error;
use tracing::{debug, error, warn};

use crate::common::collections::HashMap;
use crate::layout_engine::{Layout, LayoutDescriptor};
use crate::model::assigned::LayoutAssignedWindows;
use crate::model::geometry::{Point, Rect, bounding_rect};
use crate::model::zone::{ZoneId, ZoneSet};
use crate::sys::display::{DisplayId, DisplayInfo, TopologyEvent, WorkAreaId};
use crate::sys::history::HistoryKey;
use crate::sys::marker::ZoneBitmask;
use crate::sys::overlay::OverlayFrame;
use crate::sys::window::WindowId;
use crate::sys::Services;

#[derive(Debug, Error, PartialEq)]
pub enum WorkAreaError {
    #[error("work area {0:?} refers to unknown display")]
    UnknownDisplay(WorkAreaId),
    #[error("no displays are connected")]
    NoDisplays,
}

/// Composition root for one (display, virtual desktop) pair: one layout,
/// one set of window assignments. Zones are kept monitor-local; every
/// public method speaks virtual-screen coordinates and converts at the
/// boundary.
#[derive(Debug)]
pub struct WorkArea {
    id: WorkAreaId,
    work_rect: Rect,
    display_scale: f64,
    descriptor: LayoutDescriptor,
    layout: Option<Layout>,
    assigned: LayoutAssignedWindows,
}

impl WorkArea {
    pub fn new(
        id: WorkAreaId,
        work_rect: Rect,
        display_scale: f64,
        descriptor: LayoutDescriptor,
    ) -> WorkArea {
        let local = Rect::from_size(0, 0, work_rect.width(), work_rect.height());
        let layout = Layout::new(descriptor.clone(), local, display_scale);
        if layout.is_none() {
            error!(?id, uuid = %descriptor.uuid, "work area created without a usable layout");
        }
        WorkArea {
            id,
            work_rect,
            display_scale,
            descriptor,
            layout,
            assigned: LayoutAssignedWindows::new(),
        }
    }

    pub fn id(&self) -> WorkAreaId { self.id }

    pub fn work_rect(&self) -> Rect { self.work_rect }

    pub fn layout(&self) -> Option<&Layout> { self.layout.as_ref() }

    pub fn assigned(&self) -> &LayoutAssignedWindows { &self.assigned }

    fn to_local(&self, p: Point) -> Point {
        Point::new(p.x - self.work_rect.left, p.y - self.work_rect.top)
    }

    fn to_global(&self, r: Rect) -> Rect { r.translate(self.work_rect.left, self.work_rect.top) }

    /// Hover resolution in virtual-screen coordinates.
    pub fn zones_from_point(&self, point: Point) -> ZoneSet {
        match &self.layout {
            Some(layout) => layout.zones_from_point(self.to_local(point)),
            None => ZoneSet::new(),
        }
    }

    /// Zone rectangles in virtual-screen coordinates, id order.
    pub fn global_zone_rects(&self) -> Vec<(ZoneId, Rect)> {
        match &self.layout {
            Some(layout) => layout
                .zones()
                .values()
                .map(|z| (z.id(), self.to_global(z.rect())))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Overlay snapshot for this work area, or `None` without a layout.
    pub fn overlay_frame(&self, highlighted: ZoneSet) -> Option<OverlayFrame> {
        self.layout.as_ref().map(|layout| OverlayFrame {
            zones: layout.zones().values().map(|z| self.to_global(z.rect())).collect(),
            highlighted,
        })
    }

    /// Assigns `window` to `set`, records history, stamps the marker, and
    /// (optionally) moves the window onto the union of the zones. Returns
    /// false with no mutation for an absent layout, an empty set, an
    /// unknown id, or a failed placement call.
    pub fn snap(
        &mut self,
        window: WindowId,
        set: ZoneSet,
        update_position: bool,
        svc: Services<'_>,
    ) -> bool {
        let Some(layout) = &self.layout else {
            error!(id = ?self.id, "snap requested but no layout is installed");
            return false;
        };
        if set.is_empty() {
            debug!(?window, "snap with an empty zone set is a no-op");
            return false;
        }
        if !layout.contains_all(&set) {
            warn!(?window, ?set, "snap rejected: set names zones outside the layout");
            return false;
        }

        if update_position {
            let Some(target) = layout.bounding_rect_of(&set) else {
                return false;
            };
            let target = svc.placement.frame_adjustment(window).apply(self.to_global(target));
            if !svc.placement.set_rect(window, target) {
                warn!(?window, "placement call failed; snap not applied");
                return false;
            }
        }

        self.assigned.assign(window, set.clone(), svc.props);
        svc.history.record_last_zone(
            HistoryKey {
                window,
                work_area: self.id,
                layout_uuid: layout.uuid().to_string(),
            },
            set.clone(),
        );
        match ZoneBitmask::encode(&set) {
            Some(mask) => {
                if !svc.props.set_marker(window, mask) {
                    warn!(?window, "marker store rejected the zone stamp");
                }
            }
            None => warn!(?window, ?set, "zone set exceeds marker capacity; not stamped"),
        }
        true
    }

    /// Clears the window's assignment, its history record, and its marker.
    pub fn unsnap(&mut self, window: WindowId, svc: Services<'_>) -> bool {
        let Some(layout) = &self.layout else {
            error!(id = ?self.id, "unsnap requested but no layout is installed");
            return false;
        };
        let key = HistoryKey {
            window,
            work_area: self.id,
            layout_uuid: layout.uuid().to_string(),
        };
        self.assigned.dismiss(window, svc.props);
        svc.history.remove_last_zone(&key);
        svc.props.clear_marker(window);
        true
    }

    /// Re-snaps every assigned window into its current zones. Issued after
    /// a layout or resolution change.
    pub fn update_window_positions(&mut self, svc: Services<'_>) {
        let snapshot: Vec<(WindowId, ZoneSet)> =
            self.assigned.windows().map(|(w, s)| (w, s.clone())).collect();
        for (window, set) in snapshot {
            self.snap(window, set, true, svc);
        }
    }

    /// Re-derives assignments for `windows` from their persisted markers
    /// (falling back to the history record for this work area + layout).
    /// Used when a work area is recreated; nothing is ever copied from the
    /// previous incarnation.
    pub fn restore_snapped_windows(&mut self, windows: &[WindowId], svc: Services<'_>) {
        let Some(layout) = &self.layout else {
            return;
        };
        let layout_uuid = layout.uuid().to_string();
        for &window in windows {
            let set = svc
                .props
                .marker(window)
                .map(|mask| mask.decode())
                .filter(|set| !set.is_empty())
                .or_else(|| {
                    svc.history.lookup_last_zone(&HistoryKey {
                        window,
                        work_area: self.id,
                        layout_uuid: layout_uuid.clone(),
                    })
                });
            if let Some(set) = set {
                if !self.snap(window, set, true, svc) {
                    debug!(?window, "stale zone record ignored during restore");
                }
            }
        }
    }

    /// Installs a new descriptor. A failing generation keeps the previous
    /// layout in place and reports false.
    pub fn apply_descriptor(&mut self, descriptor: LayoutDescriptor, svc: Services<'_>) -> bool {
        let local = Rect::from_size(0, 0, self.work_rect.width(), self.work_rect.height());
        let Some(layout) = Layout::new(descriptor.clone(), local, self.display_scale) else {
            return false;
        };
        self.descriptor = descriptor;
        self.drop_orphaned_assignments(&layout, svc);
        self.layout = Some(layout);
        self.update_window_positions(svc);
        true
    }

    /// Reacts to the monitor rectangle (or scale) changing.
    pub fn update_geometry(&mut self, work_rect: Rect, display_scale: f64, svc: Services<'_>) {
        self.work_rect = work_rect;
        self.display_scale = display_scale;
        let local = Rect::from_size(0, 0, work_rect.width(), work_rect.height());
        match Layout::new(self.descriptor.clone(), local, display_scale) {
            Some(layout) => {
                self.drop_orphaned_assignments(&layout, svc);
                self.layout = Some(layout);
                self.update_window_positions(svc);
            }
            None => {
                error!(id = ?self.id, "layout regeneration failed; keeping stale layout");
            }
        }
    }

    /// Windows whose sets no longer resolve against `layout` are dismissed
    /// before it is installed; their last zones stay in history.
    fn drop_orphaned_assignments(&mut self, layout: &Layout, svc: Services<'_>) {
        let orphaned: Vec<WindowId> = self
            .assigned
            .windows()
            .filter(|(_, set)| !layout.contains_all(set))
            .map(|(w, _)| w)
            .collect();
        for window in orphaned {
            warn!(?window, "assignment does not fit the new layout; dismissing");
            self.assigned.dismiss(window, svc.props);
            svc.props.clear_marker(window);
        }
    }

    pub fn cycle_windows(
        &mut self,
        window: WindowId,
        reverse: bool,
        svc: Services<'_>,
    ) -> Option<WindowId> {
        self.assigned.cycle_windows(window, reverse, svc.oracle, svc.placement, svc.props)
    }
}

/// All live work areas, created on first observation of a (display,
/// desktop) pair and torn down on topology changes. Keeps the current
/// display snapshot so the drag path never queries the identity provider.
#[derive(Debug, Default)]
pub struct WorkAreaRegistry {
    displays: Vec<DisplayInfo>,
    work_areas: HashMap<WorkAreaId, WorkArea>,
}

impl WorkAreaRegistry {
    pub fn new() -> WorkAreaRegistry { WorkAreaRegistry::default() }

    pub fn displays(&self) -> &[DisplayInfo] { &self.displays }

    pub fn display_info(&self, id: DisplayId) -> Option<&DisplayInfo> {
        self.displays.iter().find(|d| d.id == id)
    }

    /// The display whose work rectangle contains `point`.
    pub fn display_at(&self, point: Point) -> Option<DisplayId> {
        self.displays.iter().find(|d| d.work_rect.contains(point)).map(|d| d.id)
    }

    /// Union of every display's work rectangle.
    pub fn combined_rect(&self) -> Option<Rect> {
        bounding_rect(self.displays.iter().map(|d| &d.work_rect))
    }

    pub fn handle_topology(&mut self, event: TopologyEvent) {
        match event {
            TopologyEvent::DisplaysChanged(displays) => {
                debug!(count = displays.len(), "display topology changed; dropping work areas");
                self.displays = displays;
                // Assignments are never carried across a topology change;
                // they come back from the persisted markers on recreation.
                self.work_areas.clear();
            }
            TopologyEvent::DesktopRemoved(desktop) => {
                self.work_areas.retain(|id, _| id.desktop != desktop);
            }
            TopologyEvent::DesktopSwitched(_) => {}
        }
    }

    /// Fetches the work area for `id`, creating it on first observation.
    pub fn ensure(
        &mut self,
        id: WorkAreaId,
        descriptor: &LayoutDescriptor,
    ) -> Result<&mut WorkArea, WorkAreaError> {
        let (rect, scale) = match id.display {
            Some(display) => {
                let info =
                    self.display_info(display).ok_or(WorkAreaError::UnknownDisplay(id))?;
                (info.work_rect, info.scale)
            }
            None => (self.combined_rect().ok_or(WorkAreaError::NoDisplays)?, 1.0),
        };
        Ok(self
            .work_areas
            .entry(id)
            .or_insert_with(|| WorkArea::new(id, rect, scale, descriptor.clone())))
    }

    pub fn get(&self, id: WorkAreaId) -> Option<&WorkArea> { self.work_areas.get(&id) }

    pub fn get_mut(&mut self, id: WorkAreaId) -> Option<&mut WorkArea> {
        self.work_areas.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkArea> { self.work_areas.values() }

    pub fn len(&self) -> usize { self.work_areas.len() }

    pub fn is_empty(&self) -> bool { self.work_areas.is_empty() }
}
