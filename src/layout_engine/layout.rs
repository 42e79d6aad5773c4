use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::warn;

use crate::layout_engine::generator::{self, LayoutDescriptor};
use crate::model::geometry::{Point, Rect, bounding_rect};
use crate::model::zone::{Zone, ZoneId, ZoneSet, ZonesMap};

/// Squared center distance under which two zones count as equally close and
/// the smaller one wins.
const CENTER_TIE_EPSILON: i64 = 64;

/// How a multi-capture collapses to a single zone when the captured zones
/// genuinely overlap.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OverlapAlgorithm {
    #[default]
    Smallest,
    Largest,
    ClosestCenter,
    Positional,
}

/// One generated zone map bound to one work area, plus the descriptor that
/// produced it. Rebuilt whenever the descriptor or the monitor rectangle
/// changes; never mutated in place.
#[derive(Debug, Clone)]
pub struct Layout {
    descriptor: LayoutDescriptor,
    zones: ZonesMap,
}

impl Layout {
    /// Generates the zone map. `None` means the layout failed and must not
    /// be installed.
    pub fn new(descriptor: LayoutDescriptor, work_rect: Rect, display_scale: f64) -> Option<Layout> {
        let zones = generator::generate_layout(&descriptor, work_rect, display_scale);
        if zones.is_empty() {
            warn!(uuid = %descriptor.uuid, kind = %descriptor.kind, "layout generation failed");
            return None;
        }
        Some(Layout { descriptor, zones })
    }

    pub fn descriptor(&self) -> &LayoutDescriptor { &self.descriptor }

    pub fn uuid(&self) -> &str { &self.descriptor.uuid }

    pub fn zones(&self) -> &ZonesMap { &self.zones }

    pub fn zone_count(&self) -> usize { self.zones.len() }

    pub fn contains(&self, id: ZoneId) -> bool { self.zones.contains_key(&id) }

    /// True iff every id in `set` names a zone of this layout.
    pub fn contains_all(&self, set: &ZoneSet) -> bool {
        set.iter().all(|id| self.contains(id))
    }

    /// Minimal rectangle covering every zone in `set`; `None` when the set
    /// has no zone of this layout.
    pub fn bounding_rect_of(&self, set: &ZoneSet) -> Option<Rect> {
        let rects: Vec<Rect> =
            set.iter().filter_map(|id| self.zones.get(&id)).map(|z| z.rect()).collect();
        bounding_rect(rects.iter())
    }

    /// Resolves a hover point to the zone set it captures.
    ///
    /// A zone captures the point when its rectangle inflated by the
    /// sensitivity radius contains it; it strictly captures when the raw
    /// rectangle does. A single captured zone that is not strictly captured
    /// is too far away to count. Overlapping multi-captures collapse to one
    /// zone via the descriptor's tie-break; disjoint multi-captures are the
    /// point of multi-zone spanning and are returned whole.
    pub fn zones_from_point(&self, point: Point) -> ZoneSet {
        let radius = self.descriptor.sensitivity_radius.max(0);
        let captured: Vec<&Zone> = self
            .zones
            .values()
            .filter(|z| z.rect().inflate(radius).contains(point))
            .collect();
        match captured.len() {
            0 => ZoneSet::new(),
            1 => {
                if captured[0].rect().contains(point) {
                    ZoneSet::single(captured[0].id())
                } else {
                    ZoneSet::new()
                }
            }
            _ => {
                if self.any_pair_overlaps(&captured, radius) {
                    match self.resolve_overlap(&captured, point, radius) {
                        Some(id) => ZoneSet::single(id),
                        None => ZoneSet::new(),
                    }
                } else {
                    captured.iter().map(|z| z.id()).collect()
                }
            }
        }
    }

    /// Two captured zones overlap when their inflated rectangles intersect
    /// by more than the sensitivity radius on both axes; anything less is
    /// just adjacency seen through the inflation.
    fn any_pair_overlaps(&self, captured: &[&Zone], radius: i32) -> bool {
        for (i, a) in captured.iter().enumerate() {
            for b in &captured[i + 1..] {
                if let Some(overlap) =
                    a.rect().inflate(radius).intersection(&b.rect().inflate(radius))
                {
                    if overlap.width() > radius && overlap.height() > radius {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn resolve_overlap(&self, captured: &[&Zone], point: Point, radius: i32) -> Option<ZoneId> {
        match self.descriptor.overlap_algorithm {
            OverlapAlgorithm::Smallest => {
                captured.iter().min_by_key(|z| (z.area(), z.id())).map(|z| z.id())
            }
            OverlapAlgorithm::Largest => {
                captured.iter().max_by_key(|z| (z.area(), std::cmp::Reverse(z.id()))).map(|z| z.id())
            }
            OverlapAlgorithm::ClosestCenter => closest_center(captured, point),
            OverlapAlgorithm::Positional => positional(captured, point, radius)
                .or_else(|| captured.iter().min_by_key(|z| (z.area(), z.id())).map(|z| z.id())),
        }
    }

    /// Every zone whose rectangle lies fully inside the bounding rectangle
    /// of `a`'s and `b`'s zones, in id order. This is how a held modifier
    /// grows a selection smoothly between two hovered zones.
    pub fn combined_zone_range(&self, a: &ZoneSet, b: &ZoneSet) -> ZoneSet {
        let rects: Vec<Rect> = a
            .iter()
            .chain(b.iter())
            .filter_map(|id| self.zones.get(&id))
            .map(|z| z.rect())
            .collect();
        let Some(bounds) = bounding_rect(rects.iter()) else {
            return ZoneSet::new();
        };
        self.zones
            .values()
            .filter(|z| bounds.contains_rect(&z.rect()))
            .map(|z| z.id())
            .collect()
    }
}

fn squared_distance(a: Point, b: Point) -> i64 {
    let dx = i64::from(a.x - b.x);
    let dy = i64::from(a.y - b.y);
    dx * dx + dy * dy
}

fn closest_center(captured: &[&Zone], point: Point) -> Option<ZoneId> {
    let mut best: Option<(&Zone, i64)> = None;
    for &zone in captured {
        let dist = squared_distance(zone.rect().center(), point);
        best = match best {
            None => Some((zone, dist)),
            Some((cur, cur_dist)) => {
                if (dist - cur_dist).abs() <= CENTER_TIE_EPSILON {
                    // Effectively equidistant; the smaller zone is the one
                    // the user is aiming at.
                    if zone.area() < cur.area() {
                        Some((zone, dist))
                    } else {
                        Some((cur, cur_dist))
                    }
                } else if dist < cur_dist {
                    Some((zone, dist))
                } else {
                    Some((cur, cur_dist))
                }
            }
        };
    }
    best.map(|(z, _)| z.id())
}

/// Splits the common intersection of the inflated rectangles into one equal
/// band per captured zone along the longer axis and picks the band under
/// the point. Candidates are taken in id order, so the bands have a stable
/// meaning for a given layout.
fn positional(captured: &[&Zone], point: Point, radius: i32) -> Option<ZoneId> {
    let mut iter = captured.iter();
    let first = iter.next()?;
    let mut common = first.rect().inflate(radius);
    for zone in iter {
        common = common.intersection(&zone.rect().inflate(radius))?;
    }
    let n = captured.len() as i64;
    let band = if common.width() >= common.height() {
        i64::from(point.x - common.left) * n / i64::from(common.width())
    } else {
        i64::from(point.y - common.top) * n / i64::from(common.height())
    };
    let band = band.clamp(0, n - 1) as usize;
    captured.get(band).map(|z| z.id())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::generator::{
        CanvasLayout, CanvasZone, CustomLayout, LayoutKind,
    };

    const WORK: Rect = Rect { left: 0, top: 0, right: 300, bottom: 300 };

    fn grid_3x3(radius: i32) -> Layout {
        let descriptor = LayoutDescriptor {
            uuid: "grid-3x3".to_string(),
            kind: LayoutKind::Grid,
            zone_count: 9,
            show_spacing: false,
            spacing: 0,
            sensitivity_radius: radius,
            overlap_algorithm: OverlapAlgorithm::default(),
            custom: None,
        };
        Layout::new(descriptor, WORK, 1.0).unwrap()
    }

    fn canvas(zones: Vec<CanvasZone>, radius: i32, algorithm: OverlapAlgorithm) -> Layout {
        let descriptor = LayoutDescriptor {
            uuid: "canvas".to_string(),
            kind: LayoutKind::Custom,
            zone_count: zones.len(),
            show_spacing: false,
            spacing: 0,
            sensitivity_radius: radius,
            overlap_algorithm: algorithm,
            custom: Some(CustomLayout::Canvas(CanvasLayout {
                ref_width: 300,
                ref_height: 300,
                ref_scale: 1.0,
                zones,
            })),
        };
        Layout::new(descriptor, WORK, 1.0).unwrap()
    }

    #[test]
    fn failed_generation_is_not_installed() {
        let descriptor = LayoutDescriptor {
            uuid: "broken".to_string(),
            kind: LayoutKind::Custom,
            zone_count: 0,
            show_spacing: false,
            spacing: 0,
            sensitivity_radius: 0,
            overlap_algorithm: OverlapAlgorithm::default(),
            custom: None,
        };
        assert!(Layout::new(descriptor, WORK, 1.0).is_none());
    }

    #[test]
    fn point_inside_one_zone_returns_it_alone() {
        let layout = grid_3x3(20);
        assert_eq!(layout.zones_from_point(Point::new(50, 50)), ZoneSet::single(ZoneId(0)));
        assert_eq!(layout.zones_from_point(Point::new(250, 250)), ZoneSet::single(ZoneId(8)));
    }

    #[test]
    fn point_outside_every_expanded_zone_returns_empty() {
        let layout = grid_3x3(20);
        assert!(layout.zones_from_point(Point::new(400, 400)).is_empty());
    }

    #[test]
    fn lone_soft_capture_returns_empty() {
        // A single zone far from its neighbors: inside the inflated rect
        // but outside the raw one means "not close enough".
        let layout = canvas(
            vec![CanvasZone { x: 0, y: 0, width: 50, height: 50 }],
            20,
            OverlapAlgorithm::default(),
        );
        assert!(layout.zones_from_point(Point::new(60, 25)).is_empty());
        assert_eq!(
            layout.zones_from_point(Point::new(40, 25)),
            ZoneSet::single(ZoneId(0))
        );
    }

    #[test]
    fn smallest_wins_an_overlap() {
        // Areas 100 and 400, both capturing the point.
        let layout = canvas(
            vec![
                CanvasZone { x: 0, y: 0, width: 10, height: 10 },
                CanvasZone { x: 5, y: 5, width: 20, height: 20 },
            ],
            5,
            OverlapAlgorithm::Smallest,
        );
        assert_eq!(layout.zones_from_point(Point::new(7, 7)), ZoneSet::single(ZoneId(0)));
    }

    #[test]
    fn largest_wins_when_configured() {
        let layout = canvas(
            vec![
                CanvasZone { x: 0, y: 0, width: 10, height: 10 },
                CanvasZone { x: 5, y: 5, width: 20, height: 20 },
            ],
            5,
            OverlapAlgorithm::Largest,
        );
        assert_eq!(layout.zones_from_point(Point::new(7, 7)), ZoneSet::single(ZoneId(1)));
    }

    #[test]
    fn closest_center_breaks_near_ties_by_area() {
        // Same center, different sizes: distances tie, the smaller zone wins.
        let layout = canvas(
            vec![
                CanvasZone { x: 40, y: 40, width: 120, height: 120 },
                CanvasZone { x: 70, y: 70, width: 60, height: 60 },
            ],
            10,
            OverlapAlgorithm::ClosestCenter,
        );
        assert_eq!(layout.zones_from_point(Point::new(100, 100)), ZoneSet::single(ZoneId(1)));
    }

    #[test]
    fn positional_picks_the_band_under_the_point() {
        // Two fully overlapping zones; the intersection is wider than tall,
        // so the left half maps to zone 0 and the right half to zone 1.
        let layout = canvas(
            vec![
                CanvasZone { x: 0, y: 0, width: 200, height: 100 },
                CanvasZone { x: 0, y: 0, width: 200, height: 100 },
            ],
            5,
            OverlapAlgorithm::Positional,
        );
        assert_eq!(layout.zones_from_point(Point::new(30, 50)), ZoneSet::single(ZoneId(0)));
        assert_eq!(layout.zones_from_point(Point::new(170, 50)), ZoneSet::single(ZoneId(1)));
    }

    #[test]
    fn disjoint_multi_capture_is_returned_whole() {
        // Zones 22px apart with a 12px radius: the point between them is
        // captured by both, but the inflated overlap is under the radius.
        let layout = canvas(
            vec![
                CanvasZone { x: 0, y: 0, width: 100, height: 100 },
                CanvasZone { x: 122, y: 0, width: 100, height: 100 },
            ],
            12,
            OverlapAlgorithm::Smallest,
        );
        let set = layout.zones_from_point(Point::new(111, 50));
        assert_eq!(set, vec![0, 1].into());
    }

    #[test]
    fn combined_range_on_a_grid_is_the_bounding_box() {
        let layout = grid_3x3(20);
        // Zones 2 and 5 are the right column's top two cells.
        let range = layout.combined_zone_range(
            &ZoneSet::single(ZoneId(2)),
            &ZoneSet::single(ZoneId(5)),
        );
        assert_eq!(range, vec![2, 5].into());

        // Opposite corners cover the whole grid.
        let range = layout.combined_zone_range(
            &ZoneSet::single(ZoneId(0)),
            &ZoneSet::single(ZoneId(8)),
        );
        assert_eq!(range, (0..9).map(ZoneId).collect::<ZoneSet>());
    }

    #[test]
    fn combined_range_with_unknown_ids_is_empty() {
        let layout = grid_3x3(20);
        let range = layout.combined_zone_range(&ZoneSet::single(ZoneId(99)), &ZoneSet::new());
        assert!(range.is_empty());
    }

    #[test]
    fn snapping_rejects_sets_with_unknown_ids() {
        let layout = grid_3x3(20);
        assert!(layout.contains_all(&vec![0, 8].into()));
        assert!(!layout.contains_all(&vec![0, 9].into()));
    }
}
