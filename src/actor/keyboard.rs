//! Keyboard-driven snapping: direct arrow moves (by position or by index)
//! and the extend gesture that grows a snapped window zone by zone.

use tracing::{trace, warn};

use crate::actor::move_handler::WindowMoveHandler;
use crate::layout_engine::{Direction, choose_in_direction};
use crate::model::geometry::{Rect, bounding_rect};
use crate::model::work_area::WorkAreaRegistry;
use crate::model::zone::{ZoneId, ZoneSet};
use crate::sys::display::{DesktopId, DisplayId, WorkAreaId};
use crate::sys::window::WindowId;
use crate::sys::Services;

/// State of one extend gesture. The anchor is the window's zone when the
/// gesture started; the frontier advances with each keystroke, and the
/// snapped set is always the range spanned by the two.
#[derive(Debug)]
pub(crate) struct ExtendSession {
    window: WindowId,
    work_area: WorkAreaId,
    anchor: ZoneId,
    frontier: ZoneId,
    /// Zones the session has already covered; the frontier search skips
    /// them so repeated keystrokes keep making progress.
    used: ZoneSet,
}

impl WindowMoveHandler {
    /// Arrow-key snap without Alt: position-based or index-based per the
    /// configuration. Ends any extend session.
    pub fn snap_hotkey(
        &mut self,
        window: WindowId,
        direction: Direction,
        display: DisplayId,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        self.extend = None;
        if self.config.settings.move_windows_based_on_position {
            self.snap_by_position(window, direction, display, desktop, registry, svc)
        } else {
            self.snap_by_index(window, direction, display, desktop, registry, svc)
        }
    }

    /// Ctrl+Alt+arrow: extend the snapped window towards `direction`.
    pub fn extend_window(
        &mut self,
        window: WindowId,
        direction: Direction,
        display: DisplayId,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        let work_area = self.work_area_id(display, desktop);
        let descriptor = self.config.settings.layout.to_descriptor();
        if let Err(e) = registry.ensure(work_area, &descriptor) {
            warn!(%e, "cannot extend without a work area");
            return false;
        }

        let session_matches = matches!(
            &self.extend,
            Some(s) if s.window == window && s.work_area == work_area
        );
        if !session_matches {
            let current = registry
                .get(work_area)
                .and_then(|a| a.assigned().assigned_zones(window))
                .cloned();
            let Some(current) = current else {
                // Nothing to extend from; behave like a directional snap.
                return self.snap_by_position(window, direction, display, desktop, registry, svc);
            };
            let Some(anchor) = current.iter().next() else {
                return false;
            };
            self.extend = Some(ExtendSession {
                window,
                work_area,
                anchor,
                frontier: anchor,
                used: current,
            });
        }

        let (anchor, used) = match &self.extend {
            Some(s) => (s.anchor, s.used.clone()),
            None => return false,
        };
        let Some(area) = registry.get(work_area) else {
            return false;
        };
        let Some(layout) = area.layout() else {
            warn!(?work_area, "cannot extend without a layout");
            return false;
        };

        let zone_rects = area.global_zone_rects();
        let origin = svc.placement.rect(window).or_else(|| {
            bounding_rect(
                zone_rects.iter().filter(|(id, _)| used.contains(*id)).map(|(_, r)| r),
            )
        });
        let Some(origin) = origin else {
            return false;
        };
        let candidates: Vec<(ZoneId, Rect)> =
            zone_rects.into_iter().filter(|(id, _)| !used.contains(*id)).collect();
        let Some(frontier) = choose_in_direction(direction, origin, candidates) else {
            trace!(?direction, "no zone to extend into");
            return false;
        };

        let set =
            layout.combined_zone_range(&ZoneSet::single(anchor), &ZoneSet::single(frontier));
        if !self.snap_to(window, work_area, set.clone(), registry, svc) {
            return false;
        }
        if let Some(session) = &mut self.extend {
            session.frontier = frontier;
            for id in set.iter() {
                session.used.insert(id);
            }
        }
        true
    }

    /// Geometry-driven arrow snap: nearest aligned zone on the current
    /// display, then any other display in shared coordinates, then once
    /// more after wrapping around the combined desktop rectangle.
    fn snap_by_position(
        &mut self,
        window: WindowId,
        direction: Direction,
        display: DisplayId,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        let work_area = self.work_area_id(display, desktop);
        let descriptor = self.config.settings.layout.to_descriptor();
        if let Err(e) = registry.ensure(work_area, &descriptor) {
            warn!(%e, "cannot snap without a work area");
            return false;
        }
        let Some(window_rect) = svc.placement.rect(window) else {
            warn!(?window, "cannot snap a window with no rectangle");
            return false;
        };

        // The window's own zones are not candidates; a freshly snapped
        // window must always move somewhere new.
        let current_set = registry
            .get(work_area)
            .and_then(|a| a.assigned().assigned_zones(window))
            .cloned()
            .unwrap_or_default();
        let local: Vec<(ZoneId, Rect)> = registry
            .get(work_area)
            .map(|a| a.global_zone_rects())
            .unwrap_or_default()
            .into_iter()
            .filter(|(id, _)| !current_set.contains(*id))
            .collect();
        if let Some(zone) = choose_in_direction(direction, window_rect, local) {
            return self.snap_to(window, work_area, ZoneSet::single(zone), registry, svc);
        }

        // Every display's zones, already in virtual-screen coordinates.
        if work_area.display.is_some() {
            let others: Vec<((WorkAreaId, ZoneId), Rect)> = self
                .desktop_zone_candidates(desktop, registry)
                .into_iter()
                .filter(|((wa, _), _)| *wa != work_area)
                .collect();
            if let Some((target, zone)) = choose_in_direction(direction, window_rect, others) {
                return self.snap_across(window, work_area, target, zone, registry, svc);
            }
        }

        // Wrap the window rectangle to the opposite edge of the combined
        // desktop rectangle and try once more against everything.
        let Some(combined) = registry.combined_rect() else {
            return false;
        };
        let wrapped = wrap_rect(window_rect, combined, direction);
        let everything: Vec<((WorkAreaId, ZoneId), Rect)> = self
            .desktop_zone_candidates(desktop, registry)
            .into_iter()
            .filter(|((wa, id), _)| !(*wa == work_area && current_set.contains(*id)))
            .collect();
        if let Some((target, zone)) = choose_in_direction(direction, wrapped, everything) {
            return self.snap_across(window, work_area, target, zone, registry, svc);
        }
        false
    }

    /// Index-driven arrow snap: previous/next zone id with wraparound,
    /// optionally hopping to the neighboring display at either end.
    fn snap_by_index(
        &mut self,
        window: WindowId,
        direction: Direction,
        display: DisplayId,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        let work_area = self.work_area_id(display, desktop);
        let descriptor = self.config.settings.layout.to_descriptor();
        if let Err(e) = registry.ensure(work_area, &descriptor) {
            warn!(%e, "cannot snap without a work area");
            return false;
        }
        let Some(area) = registry.get(work_area) else {
            return false;
        };
        let Some(layout) = area.layout() else {
            warn!(?work_area, "cannot snap without a layout");
            return false;
        };
        let ids: Vec<ZoneId> = layout.zones().keys().copied().collect();
        let n = ids.len();
        let forward = matches!(direction, Direction::Right | Direction::Down);

        let current = area
            .assigned()
            .assigned_zones(window)
            .and_then(|set| set.iter().next())
            .and_then(|id| ids.iter().position(|z| *z == id));
        let target = match current {
            None => {
                if forward {
                    0
                } else {
                    n - 1
                }
            }
            Some(i) => {
                let at_edge = if forward { i + 1 == n } else { i == 0 };
                if at_edge
                    && self.config.settings.move_windows_across_monitors
                    && work_area.display.is_some()
                {
                    return self.hop_display(window, direction, work_area, desktop, registry, svc);
                }
                if forward { (i + 1) % n } else { (i + n - 1) % n }
            }
        };
        self.snap_to(window, work_area, ZoneSet::single(ids[target]), registry, svc)
    }

    /// Moves the window into the neighboring display's first (or last)
    /// zone when an index walk runs off either end.
    fn hop_display(
        &mut self,
        window: WindowId,
        direction: Direction,
        from: WorkAreaId,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        let forward = matches!(direction, Direction::Right | Direction::Down);
        let mut displays: Vec<(DisplayId, Rect)> =
            registry.displays().iter().map(|d| (d.id, d.work_rect)).collect();
        match direction {
            Direction::Left | Direction::Right => displays.sort_by_key(|(_, r)| (r.left, r.top)),
            Direction::Up | Direction::Down => displays.sort_by_key(|(_, r)| (r.top, r.left)),
        }
        let Some(pos) = displays.iter().position(|(d, _)| Some(*d) == from.display) else {
            return false;
        };
        let count = displays.len();
        let next = if forward { (pos + 1) % count } else { (pos + count - 1) % count };
        let target_area = WorkAreaId::new(displays[next].0, desktop);

        let descriptor = self.config.settings.layout.to_descriptor();
        let target_zone = match registry.ensure(target_area, &descriptor) {
            Ok(area) => area.layout().and_then(|l| {
                if forward {
                    l.zones().keys().next().copied()
                } else {
                    l.zones().keys().next_back().copied()
                }
            }),
            Err(e) => {
                warn!(%e, "cannot hop to the next display");
                None
            }
        };
        let Some(zone) = target_zone else {
            return false;
        };
        self.snap_across(window, from, target_area, zone, registry, svc)
    }

    /// Zones of every per-display work area on `desktop`, keyed by their
    /// owning work area, in one shared coordinate space.
    fn desktop_zone_candidates(
        &self,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
    ) -> Vec<((WorkAreaId, ZoneId), Rect)> {
        let descriptor = self.config.settings.layout.to_descriptor();
        let displays: Vec<DisplayId> = registry.displays().iter().map(|d| d.id).collect();
        let mut out = Vec::new();
        for display in displays {
            let id = WorkAreaId::new(display, desktop);
            match registry.ensure(id, &descriptor) {
                Ok(area) => {
                    out.extend(
                        area.global_zone_rects().into_iter().map(|(z, r)| ((id, z), r)),
                    );
                }
                Err(e) => warn!(%e, "skipping display while collecting zones"),
            }
        }
        out
    }

    fn snap_to(
        &mut self,
        window: WindowId,
        work_area: WorkAreaId,
        set: ZoneSet,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        match registry.get_mut(work_area) {
            Some(area) => area.snap(window, set, true, svc),
            None => false,
        }
    }

    /// Snap into a different work area, clearing the old assignment first.
    fn snap_across(
        &mut self,
        window: WindowId,
        from: WorkAreaId,
        to: WorkAreaId,
        zone: ZoneId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> bool {
        if from != to {
            if let Some(area) = registry.get_mut(from) {
                area.unsnap(window, svc);
            }
        }
        self.snap_to(window, to, ZoneSet::single(zone), registry, svc)
    }

    /// Cycles focus through the windows sharing the focused window's index
    /// set.
    pub fn cycle_tabs(
        &mut self,
        window: WindowId,
        reverse: bool,
        display: DisplayId,
        desktop: DesktopId,
        registry: &mut WorkAreaRegistry,
        svc: Services<'_>,
    ) -> Option<WindowId> {
        let work_area = self.work_area_id(display, desktop);
        registry.get_mut(work_area)?.cycle_windows(window, reverse, svc)
    }
}

/// Translates the window rectangle to just beyond the opposite edge of the
/// combined desktop rectangle, so a directional search wraps around.
fn wrap_rect(rect: Rect, combined: Rect, direction: Direction) -> Rect {
    match direction {
        Direction::Right => rect.translate(combined.left - rect.right, 0),
        Direction::Left => rect.translate(combined.right - rect.left, 0),
        Direction::Down => rect.translate(0, combined.top - rect.bottom),
        Direction::Up => rect.translate(0, combined.bottom - rect.top),
    }
}
