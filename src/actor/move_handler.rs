use std::mem::replace;
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::actor::keyboard::ExtendSession;
use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::common::log::trace_misc;
use crate::layout_engine::LayoutDescriptor;
use crate::model::geometry::{Point, Rect};
use crate::model::highlight::HighlightedZones;
use crate::model::work_area::WorkAreaRegistry;
use crate::model::zone::ZoneSet;
use crate::sys::display::{DesktopId, DisplayId, DisplayInfo, TopologyEvent, WorkAreaId};
use crate::sys::window::WindowId;
use crate::sys::Services;

/// Modifier keys the input layer reports alongside drag events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DragModifiers {
    /// The snapping toggle (Shift by convention).
    pub snap_toggle: bool,
    /// The select-many modifier that grows a multi-zone selection.
    pub select_many: bool,
}

#[derive(Debug)]
pub(crate) enum DragState {
    Idle,
    Moving(MoveState),
}

/// Per-drag fields, dropped wholesale when the drag ends.
#[derive(Debug)]
pub(crate) struct MoveState {
    pub(crate) window: WindowId,
    pub(crate) desktop: DesktopId,
    pub(crate) work_area: WorkAreaId,
    pub(crate) snapping: bool,
    origin_rect: Option<Rect>,
    /// Whether the window was standard and ownerless when the drag began;
    /// flipping to non-standard mid-drag is the detached-tab tell.
    was_standard_ownerless: bool,
}

/// Top-level drag/keyboard state machine. One instance per process; it
/// orchestrates Snap/Unsnap across monitor crossings and guarantees every
/// drag start is matched by a cleanup no matter how the drag terminates.
pub struct WindowMoveHandler {
    pub(crate) config: Arc<Config>,
    /// Whether this process runs elevated; dragging an elevated window
    /// from a non-elevated process cannot be hooked reliably.
    process_elevated: bool,
    pub(crate) state: DragState,
    pub(crate) highlight: HighlightedZones,
    modifiers: DragModifiers,
    /// Middle-click latch giving non-keyboard users the same toggle.
    mouse_toggle: bool,
    warned_elevation: bool,
    /// Pre-snap window sizes, so leaving a zone can restore them.
    restore_rects: HashMap<WindowId, Rect>,
    pub(crate) extend: Option<ExtendSession>,
}

impl WindowMoveHandler {
    pub fn new(config: Arc<Config>, process_elevated: bool) -> WindowMoveHandler {
        WindowMoveHandler {
            config,
            process_elevated,
            state: DragState::Idle,
            highlight: HighlightedZones::new(),
            modifiers: DragModifiers::default(),
            mouse_toggle: false,
            warned_elevation: false,
            restore_rects: HashMap::default(),
            extend: None,
        }
    }

    pub fn is_dragging(&self) -> bool { matches!(self.state, DragState::Moving(_)) }

    pub fn is_snapping(&self) -> bool {
        matches!(&self.state, DragState::Moving(ms) if ms.snapping)
    }

    /// Latest modifier state from the input hook. Takes effect on the next
    /// `move_size_update`, which is the next event anyway.
    pub fn set_modifiers(&mut self, modifiers: DragModifiers) { self.modifiers = modifiers; }

    /// A secondary/middle click mid-drag toggles snapping when enabled.
    pub fn on_secondary_click(&mut self) {
        if self.config.settings.mouse_switch && self.is_dragging() {
            self.mouse_toggle = !self.mouse_toggle;
        }
    }

    /// The snapping sub-state: modifier (keyboard or mouse latch) XOR the
    /// configured polarity.
    fn effective_snapping(&self) -> bool {
        (self.modifiers.snap_toggle ^ self.mouse_toggle) ^ !self.config.settings.shift_drag
    }

    pub(crate) fn work_area_id(&self, display: DisplayId, desktop: DesktopId) -> WorkAreaId {
        if self.config.settings.span_zones_across_monitors {
            WorkAreaId::combined(desktop)
        } else {
            WorkAreaId::new(display, desktop)
        }
    }

    /// A drag begins. Returns whether the handler is tracking it; windows
    /// that are not zoning candidates (or elevated beyond us) are left to
    /// the OS.
    pub fn move_size_start(
        &mut self,
        window: WindowId,
        display: DisplayId,
        point: Point,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        if self.is_dragging() {
            warn!("drag started while another was active; cleaning up the old one");
            self.abort_move_size(svc);
        }
        if !svc.oracle.is_zoning_candidate(window) {
            trace!(?window, "not a zoning candidate");
            return false;
        }
        if svc.oracle.is_elevated(window) && !self.process_elevated {
            if !self.warned_elevation {
                warn!(?window, "cannot zone an elevated window from a non-elevated process");
                self.warned_elevation = true;
            }
            return false;
        }

        self.extend = None;
        let work_area = self.work_area_id(display, desktop);
        let descriptor = self.config.settings.layout.to_descriptor();
        if let Err(e) = registry.ensure(work_area, &descriptor) {
            warn!(%e, "cannot begin drag without a work area");
            return false;
        }

        let origin_rect = svc.placement.rect(window);
        let was_standard_ownerless =
            svc.oracle.is_standard(window) && !svc.oracle.has_visible_owner(window);

        if let Some(area) = registry.get_mut(work_area) {
            area.unsnap(window, svc);
        }

        self.mouse_toggle = false;
        let snapping = self.effective_snapping();
        self.state = DragState::Moving(MoveState {
            window,
            desktop,
            work_area,
            snapping,
            origin_rect,
            was_standard_ownerless,
        });
        trace!(?window, ?work_area, snapping, "drag started");
        if snapping {
            self.begin_snapping(point, registry, svc);
        }
        true
    }

    /// Per-frame drag update: re-evaluates the modifier, tracks display
    /// crossings, and keeps the highlight + overlay current.
    pub fn move_size_update(
        &mut self,
        display: DisplayId,
        point: Point,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) {
        let (was_snapping, window, desktop, current) = match &self.state {
            DragState::Moving(ms) => (ms.snapping, ms.window, ms.desktop, ms.work_area),
            DragState::Idle => return,
        };

        let now_snapping = self.effective_snapping();
        if now_snapping != was_snapping {
            if let DragState::Moving(ms) = &mut self.state {
                ms.snapping = now_snapping;
            }
        }
        if now_snapping && !was_snapping {
            self.begin_snapping(point, registry, svc);
            return;
        }
        if !now_snapping {
            if was_snapping {
                self.end_snapping(window, svc);
            }
            return;
        }

        let desired = self.work_area_id(display, desktop);
        if desired != current {
            trace!(from = ?current, to = ?desired, "drag crossed to another display");
            self.highlight.reset();
            svc.overlay.hide(current);
            let descriptor = self.config.settings.layout.to_descriptor();
            if let Err(e) = registry.ensure(desired, &descriptor) {
                warn!(%e, "lost the work area mid-drag");
                return;
            }
            if let DragState::Moving(ms) = &mut self.state {
                ms.work_area = desired;
            }
            self.refresh_highlight(point, registry, svc, true);
        } else {
            self.refresh_highlight(point, registry, svc, false);
        }
    }

    /// The drag ended over `window`'s final position. Returns whether the
    /// window was snapped.
    pub fn move_size_end(
        &mut self,
        window: WindowId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        let ms = match replace(&mut self.state, DragState::Idle) {
            DragState::Moving(ms) => ms,
            DragState::Idle => {
                trace!(?window, "drag end without a tracked drag");
                return false;
            }
        };

        let mut snapped = false;
        if ms.snapping {
            let still_standard = svc.oracle.is_standard(window);
            let owned = svc.oracle.has_visible_owner(window);
            if ms.was_standard_ownerless && !still_standard && !owned {
                // The drag tore a tab out into a new window; zoning it
                // would fight the application.
                debug!(?window, "detached-tab heuristic: finishing as a plain move");
            } else if svc.placement.is_maximized(window) {
                // The OS edge-snap got there first.
                debug!(?window, "window maximized during drag; not snapping");
            } else if !self.highlight.is_empty() {
                match registry.get_mut(ms.work_area) {
                    Some(area) => {
                        let set = self.highlight.current().clone();
                        if area.snap(window, set, true, svc) {
                            snapped = true;
                            if let Some(origin) = ms.origin_rect {
                                self.restore_rects.entry(window).or_insert(origin);
                            }
                        }
                    }
                    None => {
                        error!(work_area = ?ms.work_area, "work area vanished before drop");
                    }
                }
            }
            self.end_snapping(window, svc);
        } else {
            self.maybe_restore_size(window, ms.origin_rect, svc);
        }

        self.mouse_toggle = false;
        snapped
    }

    /// Cleanup for drags that never get a proper end: destroyed window,
    /// monitor loss, abrupt cancellation. Never snaps, never restores.
    pub fn abort_move_size(&mut self, svc: Services<'_>) {
        if let DragState::Moving(ms) = replace(&mut self.state, DragState::Idle) {
            debug!(window = ?ms.window, "drag aborted");
            if ms.snapping {
                self.end_snapping(ms.window, svc);
            }
            self.highlight.reset();
            self.mouse_toggle = false;
        }
    }

    /// Side effects of snapping turning on: transparency, overlays on the
    /// relevant displays, and an immediate highlight pass.
    fn begin_snapping(
        &mut self,
        point: Point,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) {
        let (window, desktop, work_area) = match &self.state {
            DragState::Moving(ms) => (ms.window, ms.desktop, ms.work_area),
            DragState::Idle => return,
        };
        if self.config.settings.make_dragged_window_transparent {
            svc.placement.set_transparent(window, true);
        }
        if self.config.settings.show_zones_on_all_monitors && work_area.display.is_some() {
            let descriptor = self.config.settings.layout.to_descriptor();
            let others: Vec<DisplayId> = registry
                .displays()
                .iter()
                .map(|d| d.id)
                .filter(|d| Some(*d) != work_area.display)
                .collect();
            for display in others {
                let id = WorkAreaId::new(display, desktop);
                match registry.ensure(id, &descriptor) {
                    Ok(area) => {
                        if let Some(frame) = area.overlay_frame(ZoneSet::new()) {
                            svc.overlay.show(id, frame);
                        }
                    }
                    Err(e) => warn!(%e, "skipping overlay for unavailable display"),
                }
            }
        }
        self.refresh_highlight(point, registry, svc, true);
    }

    /// Side effects of snapping turning off (or the drag ending).
    fn end_snapping(&mut self, window: WindowId, svc: Services<'_>) {
        if self.config.settings.make_dragged_window_transparent {
            svc.placement.set_transparent(window, false);
        }
        svc.overlay.hide_all();
        self.highlight.reset();
    }

    /// Recomputes the highlighted set against the active work area and
    /// redraws only when it changed (or a redraw is forced).
    fn refresh_highlight(
        &mut self,
        point: Point,
        registry: &WorkAreaRegistry,
        svc: Services<'_>,
        force_show: bool,
    ) {
        let work_area = match &self.state {
            DragState::Moving(ms) => ms.work_area,
            DragState::Idle => return,
        };
        let Some(area) = registry.get(work_area) else {
            error!(?work_area, "active work area missing during drag update");
            return;
        };
        let Some(layout) = area.layout() else {
            error!(?work_area, "active work area has no layout");
            return;
        };
        let local = Point::new(
            point.x - area.work_rect().left,
            point.y - area.work_rect().top,
        );
        let select_many = self.modifiers.select_many;
        let changed =
            trace_misc("highlight_update", || self.highlight.update(layout, local, select_many));
        if changed || force_show {
            if let Some(frame) = area.overlay_frame(self.highlight.current().clone()) {
                svc.overlay.show(work_area, frame);
            }
        }
    }

    /// Installs a new layout on one work area, flashing its overlay when
    /// the quick-switch affordance is enabled.
    pub fn apply_layout(
        &mut self,
        work_area: WorkAreaId,
        descriptor: LayoutDescriptor,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        let Some(area) = registry.get_mut(work_area) else {
            warn!(?work_area, "cannot apply a layout to an unknown work area");
            return false;
        };
        if !area.apply_descriptor(descriptor, svc) {
            return false;
        }
        if self.config.settings.flash_zones_on_layout_change {
            if let Some(frame) = area.overlay_frame(ZoneSet::new()) {
                svc.overlay.flash(work_area, frame);
            }
        }
        true
    }

    /// Display topology changed: abort any in-flight drag, rebuild the
    /// registry, and re-derive each window's assignment from its persisted
    /// zone record (each window on the display it currently occupies).
    pub fn on_displays_changed(
        &mut self,
        displays: Vec<DisplayInfo>,
        desktop: DesktopId,
        windows: &[WindowId],
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) {
        if self.is_dragging() {
            self.abort_move_size(svc);
        }
        self.extend = None;
        registry.handle_topology(TopologyEvent::DisplaysChanged(displays));
        if !self.config.settings.restore_last_zones {
            return;
        }
        let descriptor = self.config.settings.layout.to_descriptor();
        let targets: Vec<WorkAreaId> = if self.config.settings.span_zones_across_monitors {
            vec![WorkAreaId::combined(desktop)]
        } else {
            registry
                .displays()
                .iter()
                .map(|d| WorkAreaId::new(d.id, desktop))
                .collect()
        };
        for id in targets {
            let area = match registry.ensure(id, &descriptor) {
                Ok(area) => area,
                Err(e) => {
                    warn!(%e, "cannot restore windows on an unavailable work area");
                    continue;
                }
            };
            let rect = area.work_rect();
            let here: Vec<WindowId> = windows
                .iter()
                .copied()
                .filter(|w| {
                    svc.placement
                        .rect(*w)
                        .map(|r| rect.contains(r.center()))
                        .unwrap_or(false)
                })
                .collect();
            area.restore_snapped_windows(&here, svc);
        }
    }

    /// After a plain (non-snapping) drag: give a previously snapped window
    /// its pre-snap size back, unless the drag itself resized it or the
    /// window ended up maximized.
    fn maybe_restore_size(&mut self, window: WindowId, origin: Option<Rect>, svc: Services<'_>) {
        if !self.config.settings.restore_size {
            return;
        }
        let Some(stored) = self.restore_rects.get(&window).copied() else {
            return;
        };
        let current = svc.placement.rect(window);
        if let (Some(cur), Some(origin)) = (current, origin) {
            if cur.width() != origin.width() || cur.height() != origin.height() {
                // The end was a resize gesture; the user's size wins.
                self.restore_rects.remove(&window);
                return;
            }
        }
        if svc.placement.is_maximized(window) {
            return;
        }
        if let Some(cur) = current {
            let target = Rect::from_size(cur.left, cur.top, stored.width(), stored.height());
            if svc.placement.set_rect(window, target) {
                self.restore_rects.remove(&window);
            } else {
                warn!(?window, "failed to restore pre-snap size");
            }
        }
    }
}
