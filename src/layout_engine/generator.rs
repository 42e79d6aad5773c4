use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::warn;

use crate::layout_engine::layout::OverlapAlgorithm;
use crate::model::geometry::Rect;
use crate::model::zone::{Zone, ZoneId, ZonesMap};

/// Percent tables are expressed in this basis (one hundredth of a percent),
/// so integer partitioning stays exact.
pub const PERCENT_BASIS: i64 = 10_000;

/// Side length of a focus zone relative to the work area, in tenths.
const FOCUS_FRACTION: i32 = 4;
/// Pixel offset between consecutive focus zones.
const FOCUS_STEP: i32 = 50;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutKind {
    Focus,
    Columns,
    Rows,
    Grid,
    #[default]
    PriorityGrid,
    Custom,
}

/// Everything needed to produce one zone map for one work area. One
/// descriptor yields exactly one map per (work-area rect, display scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub uuid: String,
    pub kind: LayoutKind,
    pub zone_count: usize,
    pub show_spacing: bool,
    pub spacing: i32,
    pub sensitivity_radius: i32,
    pub overlap_algorithm: OverlapAlgorithm,
    /// Present iff `kind` is [`LayoutKind::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomLayout>,
}

impl LayoutDescriptor {
    pub fn effective_spacing(&self) -> i32 {
        if self.show_spacing { self.spacing.max(0) } else { 0 }
    }
}

/// Editor-authored layout payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomLayout {
    Canvas(CanvasLayout),
    Grid(GridLayout),
}

/// Absolute rectangles authored against a reference resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasLayout {
    pub ref_width: i32,
    pub ref_height: i32,
    /// Scale factor of the display the layout was authored on.
    #[serde(default = "default_ref_scale")]
    pub ref_scale: f64,
    pub zones: Vec<CanvasZone>,
}

fn default_ref_scale() -> f64 { 1.0 }

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasZone {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Percent rows/columns plus a cell map merging cells into zones. Also the
/// internal representation for the builtin Grid and PriorityGrid kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: usize,
    pub columns: usize,
    pub rows_percents: Vec<i32>,
    pub columns_percents: Vec<i32>,
    /// `cell_child_map[row][column]` = zone index occupying that cell.
    pub cell_child_map: Vec<Vec<usize>>,
}

impl GridLayout {
    /// Structural validity: matching dimensions, percents summing to the
    /// basis, and a dense zone index range starting at 0.
    fn validate(&self) -> bool {
        if self.rows == 0 || self.columns == 0 {
            return false;
        }
        if self.rows_percents.len() != self.rows || self.columns_percents.len() != self.columns {
            return false;
        }
        if self.rows_percents.iter().map(|&p| i64::from(p)).sum::<i64>() != PERCENT_BASIS
            || self.columns_percents.iter().map(|&p| i64::from(p)).sum::<i64>() != PERCENT_BASIS
        {
            return false;
        }
        if self.rows_percents.iter().chain(&self.columns_percents).any(|&p| p <= 0) {
            return false;
        }
        if self.cell_child_map.len() != self.rows
            || self.cell_child_map.iter().any(|r| r.len() != self.columns)
        {
            return false;
        }
        let max = self.cell_child_map.iter().flatten().copied().max();
        match max {
            Some(max) => {
                (0..=max).all(|i| self.cell_child_map.iter().flatten().any(|&c| c == i))
            }
            None => false,
        }
    }

    fn zone_count(&self) -> usize {
        self.cell_child_map.iter().flatten().copied().max().map_or(0, |m| m + 1)
    }
}

/// Produces the zone map for a descriptor on one work area. Any invalid
/// zone poisons the whole result: an empty map means "layout failed" and
/// must not be installed.
pub fn generate_layout(
    descriptor: &LayoutDescriptor,
    work_rect: Rect,
    display_scale: f64,
) -> ZonesMap {
    if !work_rect.is_valid() {
        warn!(?work_rect, "refusing to generate a layout for a degenerate work area");
        return ZonesMap::new();
    }
    let spacing = descriptor.effective_spacing();
    let n = descriptor.zone_count;
    if n == 0 && descriptor.kind != LayoutKind::Custom {
        return ZonesMap::new();
    }
    match descriptor.kind {
        LayoutKind::Focus => focus(work_rect, n),
        LayoutKind::Columns => rows_or_columns(work_rect, n, spacing, false),
        LayoutKind::Rows => rows_or_columns(work_rect, n, spacing, true),
        LayoutKind::Grid => grid_zones(work_rect, &minimal_grid(n), spacing),
        LayoutKind::PriorityGrid => match priority_grid(n) {
            Some(grid) => grid_zones(work_rect, &grid, spacing),
            None => grid_zones(work_rect, &minimal_grid(n), spacing),
        },
        LayoutKind::Custom => match &descriptor.custom {
            Some(CustomLayout::Canvas(canvas)) => canvas_zones(work_rect, canvas, display_scale),
            Some(CustomLayout::Grid(grid)) => {
                if grid.validate() {
                    grid_zones(work_rect, grid, spacing)
                } else {
                    warn!(uuid = %descriptor.uuid, "rejecting malformed custom grid layout");
                    ZonesMap::new()
                }
            }
            None => {
                warn!(uuid = %descriptor.uuid, "custom descriptor without a payload");
                ZonesMap::new()
            }
        },
    }
}

/// Collects zones, enforcing the all-or-nothing contract. Duplicate ids or
/// rejected rectangles empty the result.
fn build_map(zones: impl IntoIterator<Item = (ZoneId, Rect)>) -> ZonesMap {
    let mut map = ZonesMap::new();
    for (id, rect) in zones {
        let Some(zone) = Zone::new(id, rect) else {
            warn!(%id, ?rect, "generated zone is degenerate; discarding layout");
            return ZonesMap::new();
        };
        if map.insert(id, zone).is_some() {
            warn!(%id, "duplicate zone id; discarding layout");
            return ZonesMap::new();
        }
    }
    map
}

/// Slice boundary `i` of `n` over `extent`: cumulative so slices always sum
/// to the whole extent, with no per-slice rounding drift.
fn slice_boundary(extent: i32, i: usize, n: usize) -> i32 {
    (i64::from(extent) * i as i64 / n as i64) as i32
}

/// Spacing taken off a zone's leading/trailing edge along one axis. Outer
/// edges keep the full spacing; a shared internal edge splits it so the gap
/// between neighbors is exactly `spacing`.
fn edge_insets(spacing: i32, first: bool, last: bool) -> (i32, i32) {
    let lead = if first { spacing } else { spacing - spacing / 2 };
    let trail = if last { spacing } else { spacing / 2 };
    (lead, trail)
}

fn rows_or_columns(work: Rect, n: usize, spacing: i32, horizontal_slices: bool) -> ZonesMap {
    if n == 0 {
        return ZonesMap::new();
    }
    let extent = if horizontal_slices { work.height() } else { work.width() };
    let zones = (0..n).map(|i| {
        let from = slice_boundary(extent, i, n);
        let to = slice_boundary(extent, i + 1, n);
        let (lead, trail) = edge_insets(spacing, i == 0, i == n - 1);
        let rect = if horizontal_slices {
            Rect {
                left: work.left + spacing,
                top: work.top + from + lead,
                right: work.right - spacing,
                bottom: work.top + to - trail,
            }
        } else {
            Rect {
                left: work.left + from + lead,
                top: work.top + spacing,
                right: work.left + to - trail,
                bottom: work.bottom - spacing,
            }
        };
        (ZoneId(i as i64), rect)
    });
    build_map(zones)
}

fn focus(work: Rect, n: usize) -> ZonesMap {
    if n == 0 {
        return ZonesMap::new();
    }
    let zw = work.width() * FOCUS_FRACTION / 10;
    let zh = work.height() * FOCUS_FRACTION / 10;
    // Center the whole stack rather than the first zone, so deep stacks
    // stay on screen.
    let shift = FOCUS_STEP * (n as i32 - 1) / 2;
    let left0 = work.left + (work.width() - zw) / 2 - shift;
    let top0 = work.top + (work.height() - zh) / 2 - shift;
    let zones = (0..n).map(|i| {
        let offset = FOCUS_STEP * i as i32;
        (
            ZoneId(i as i64),
            Rect::from_size(left0 + offset, top0 + offset, zw, zh),
        )
    });
    build_map(zones)
}

/// Near-square grid: the most rows R still satisfying `N/R >= R`, columns
/// rounded up, cells filled row-major with the overshoot clamped onto the
/// last zone.
fn minimal_grid(n: usize) -> GridLayout {
    let mut rows = 1;
    while n / (rows + 1) >= rows + 1 {
        rows += 1;
    }
    let columns = if n == 0 { 1 } else { n.div_ceil(rows) };
    let cell_child_map = (0..rows)
        .map(|r| (0..columns).map(|c| (r * columns + c).min(n.saturating_sub(1))).collect())
        .collect();
    GridLayout {
        rows,
        columns,
        rows_percents: equal_percents(rows),
        columns_percents: equal_percents(columns),
        cell_child_map,
    }
}

fn equal_percents(n: usize) -> Vec<i32> {
    (0..n)
        .map(|i| {
            (PERCENT_BASIS * (i as i64 + 1) / n as i64 - PERCENT_BASIS * i as i64 / n as i64)
                as i32
        })
        .collect()
}

/// Hand-tuned asymmetric layouts for small zone counts: a dominant middle
/// column and merges that keep one large primary zone. Larger counts fall
/// back to the near-square grid.
fn priority_grid(n: usize) -> Option<GridLayout> {
    let (rows_percents, columns_percents, map): (Vec<i32>, Vec<i32>, Vec<Vec<usize>>) = match n {
        1 => (vec![10000], vec![10000], vec![vec![0]]),
        2 => (vec![10000], vec![6667, 3333], vec![vec![0, 1]]),
        3 => (vec![10000], vec![2500, 5000, 2500], vec![vec![0, 1, 2]]),
        4 => (
            vec![5000, 5000],
            vec![2500, 5000, 2500],
            vec![vec![0, 1, 2], vec![0, 1, 3]],
        ),
        5 => (
            vec![5000, 5000],
            vec![2500, 5000, 2500],
            vec![vec![0, 1, 2], vec![3, 1, 4]],
        ),
        6 => (
            vec![3333, 3334, 3333],
            vec![2500, 5000, 2500],
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![4, 1, 5]],
        ),
        7 => (
            vec![3333, 3334, 3333],
            vec![2500, 5000, 2500],
            vec![vec![0, 1, 2], vec![3, 1, 4], vec![5, 1, 6]],
        ),
        8 => (
            vec![3333, 3334, 3333],
            vec![2000, 4000, 2000, 2000],
            vec![vec![0, 1, 2, 3], vec![4, 1, 5, 3], vec![6, 1, 7, 3]],
        ),
        9 => (
            vec![3333, 3334, 3333],
            vec![2000, 4000, 2000, 2000],
            vec![vec![0, 1, 2, 3], vec![4, 1, 5, 6], vec![7, 1, 8, 6]],
        ),
        10 => (
            vec![3333, 3334, 3333],
            vec![2000, 4000, 2000, 2000],
            vec![vec![0, 1, 2, 3], vec![4, 1, 5, 6], vec![7, 1, 8, 9]],
        ),
        11 => (
            vec![3333, 3334, 3333],
            vec![2000, 4000, 2000, 2000],
            vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9, 10, 7]],
        ),
        _ => return None,
    };
    Some(GridLayout {
        rows: rows_percents.len(),
        columns: columns_percents.len(),
        rows_percents,
        columns_percents,
        cell_child_map: map,
    })
}

/// Percent boundaries for one axis: `len+1` positions from `origin` to
/// `origin + extent`, exact at both ends.
fn percent_boundaries(origin: i32, extent: i32, percents: &[i32]) -> Vec<i32> {
    let mut cum = 0i64;
    let mut out = Vec::with_capacity(percents.len() + 1);
    out.push(origin);
    for &p in percents {
        cum += i64::from(p);
        out.push(origin + (i64::from(extent) * cum / PERCENT_BASIS) as i32);
    }
    out
}

fn grid_zones(work: Rect, grid: &GridLayout, spacing: i32) -> ZonesMap {
    let n = grid.zone_count();
    if n == 0 {
        return ZonesMap::new();
    }
    let xs = percent_boundaries(work.left, work.width(), &grid.columns_percents);
    let ys = percent_boundaries(work.top, work.height(), &grid.rows_percents);

    let zones = (0..n).map(|index| {
        // Span of cells carrying this index. The editor guarantees the
        // span is rectangular; a ragged span still unions into its
        // bounding cells.
        let mut min_row = usize::MAX;
        let mut max_row = 0;
        let mut min_col = usize::MAX;
        let mut max_col = 0;
        for (r, row) in grid.cell_child_map.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell == index {
                    min_row = min_row.min(r);
                    max_row = max_row.max(r);
                    min_col = min_col.min(c);
                    max_col = max_col.max(c);
                }
            }
        }
        if min_row == usize::MAX {
            // Hole in the index range; build_map rejects via a degenerate rect.
            return (ZoneId(index as i64), Rect::default());
        }
        let (lead_x, trail_x) = edge_insets(spacing, min_col == 0, max_col == grid.columns - 1);
        let (lead_y, trail_y) = edge_insets(spacing, min_row == 0, max_row == grid.rows - 1);
        let rect = Rect {
            left: xs[min_col] + lead_x,
            top: ys[min_row] + lead_y,
            right: xs[max_col + 1] - trail_x,
            bottom: ys[max_row + 1] - trail_y,
        };
        (ZoneId(index as i64), rect)
    });
    build_map(zones)
}

fn canvas_zones(work: Rect, canvas: &CanvasLayout, display_scale: f64) -> ZonesMap {
    if canvas.ref_width <= 0 || canvas.ref_height <= 0 || canvas.ref_scale <= 0.0 {
        warn!(?canvas.ref_width, ?canvas.ref_height, "canvas layout has a degenerate reference");
        return ZonesMap::new();
    }
    // Authored coordinates are converted to the current display's scale
    // first, then stretched proportionally onto the work area.
    let dpi = display_scale / canvas.ref_scale;
    let fx = f64::from(work.width()) / (f64::from(canvas.ref_width) * dpi);
    let fy = f64::from(work.height()) / (f64::from(canvas.ref_height) * dpi);
    let zones = canvas.zones.iter().enumerate().map(|(i, z)| {
        let left = work.left + (f64::from(z.x) * dpi * fx).round() as i32;
        let top = work.top + (f64::from(z.y) * dpi * fy).round() as i32;
        let width = (f64::from(z.width) * dpi * fx).round() as i32;
        let height = (f64::from(z.height) * dpi * fy).round() as i32;
        (ZoneId(i as i64), Rect::from_size(left, top, width, height))
    });
    build_map(zones)
}
