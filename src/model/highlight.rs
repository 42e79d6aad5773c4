use crate::layout_engine::Layout;
use crate::model::geometry::Point;
use crate::model::zone::ZoneSet;

/// Drag-time accumulator turning hover position plus the select-many
/// modifier into the zone set a drop would snap to. Lives only for the
/// duration of one drag on one work area.
#[derive(Debug, Default)]
pub struct HighlightedZones {
    /// Where the select-many gesture started; `None` until the modifier is
    /// held over a zone.
    anchor: Option<ZoneSet>,
    current: ZoneSet,
}

impl HighlightedZones {
    pub fn new() -> HighlightedZones { HighlightedZones::default() }

    pub fn current(&self) -> &ZoneSet { &self.current }

    pub fn is_empty(&self) -> bool { self.current.is_empty() }

    /// Recomputes the highlight for a hover point. Returns whether the
    /// visible set changed, which is what gates overlay redraws.
    pub fn update(&mut self, layout: &Layout, point: Point, select_many: bool) -> bool {
        let hovered = layout.zones_from_point(point);
        let next = if select_many {
            match &self.anchor {
                None => {
                    if !hovered.is_empty() {
                        self.anchor = Some(hovered.clone());
                    }
                    hovered
                }
                Some(anchor) => layout.combined_zone_range(anchor, &hovered),
            }
        } else {
            self.anchor = None;
            hovered
        };
        if next == self.current {
            return false;
        }
        self.current = next;
        true
    }

    /// Drops all transient state: drag end, work-area crossing, or the
    /// modifier being released.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.current = ZoneSet::new();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::{LayoutDescriptor, LayoutKind, OverlapAlgorithm};
    use crate::model::geometry::Rect;
    use crate::model::zone::ZoneId;

    fn grid_3x3() -> Layout {
        let descriptor = LayoutDescriptor {
            uuid: "grid".to_string(),
            kind: LayoutKind::Grid,
            zone_count: 9,
            show_spacing: false,
            spacing: 0,
            sensitivity_radius: 20,
            overlap_algorithm: OverlapAlgorithm::default(),
            custom: None,
        };
        Layout::new(descriptor, Rect::new(0, 0, 300, 300), 1.0).unwrap()
    }

    #[test]
    fn plain_hover_tracks_the_point() {
        let layout = grid_3x3();
        let mut highlight = HighlightedZones::new();

        assert!(highlight.update(&layout, Point::new(50, 50), false));
        assert_eq!(highlight.current(), &ZoneSet::single(ZoneId(0)));

        // Same zone again: no visible change, no redraw.
        assert!(!highlight.update(&layout, Point::new(60, 60), false));

        assert!(highlight.update(&layout, Point::new(250, 50), false));
        assert_eq!(highlight.current(), &ZoneSet::single(ZoneId(2)));
    }

    #[test]
    fn select_many_grows_from_the_anchor() {
        let layout = grid_3x3();
        let mut highlight = HighlightedZones::new();

        assert!(highlight.update(&layout, Point::new(50, 50), true));
        assert_eq!(highlight.current(), &ZoneSet::single(ZoneId(0)));

        // Hovering the opposite corner with the modifier held selects the
        // whole bounding box.
        assert!(highlight.update(&layout, Point::new(250, 250), true));
        assert_eq!(highlight.current(), &(0..9).map(ZoneId).collect::<ZoneSet>());

        // Back near the anchor shrinks the range again.
        assert!(highlight.update(&layout, Point::new(250, 50), true));
        assert_eq!(highlight.current(), &vec![0, 1, 2].into());
    }

    #[test]
    fn releasing_the_modifier_drops_the_anchor() {
        let layout = grid_3x3();
        let mut highlight = HighlightedZones::new();

        highlight.update(&layout, Point::new(50, 50), true);
        highlight.update(&layout, Point::new(250, 250), true);
        assert!(highlight.update(&layout, Point::new(250, 250), false));
        assert_eq!(highlight.current(), &ZoneSet::single(ZoneId(8)));

        // The next select-many gesture anchors afresh.
        assert!(highlight.update(&layout, Point::new(150, 150), true));
        assert_eq!(highlight.current(), &ZoneSet::single(ZoneId(4)));
    }

    #[test]
    fn anchor_waits_for_a_real_hover() {
        let layout = grid_3x3();
        let mut highlight = HighlightedZones::new();

        // Outside every zone: nothing highlighted, no anchor taken.
        assert!(!highlight.update(&layout, Point::new(400, 400), true));
        assert!(highlight.is_empty());

        assert!(highlight.update(&layout, Point::new(50, 150), true));
        assert_eq!(highlight.current(), &ZoneSet::single(ZoneId(3)));
    }

    #[test]
    fn reset_clears_everything() {
        let layout = grid_3x3();
        let mut highlight = HighlightedZones::new();

        highlight.update(&layout, Point::new(50, 50), true);
        highlight.reset();
        assert!(highlight.is_empty());
        assert!(highlight.anchor.is_none());
    }
}
