use serde::{Deserialize, Serialize};

use crate::model::geometry::Rect;

/// Candidates more than this far off-axis (as a tangent) are not "in" the
/// requested direction at all.
const TANGENT_LIMIT: f64 = 10.0;

/// Off-axis distance counts double when ranking candidates, which is an
/// ellipse of eccentricity 2 fitted to the direction axis: a well-aligned
/// zone beats a merely-near one.
const PERP_WEIGHT: f64 = 2.0;

/// Per-candidate center perturbation so exact geometric ties resolve the
/// same way every time.
const TIE_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn vector(self) -> (f64, f64) {
        match self {
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Picks the candidate whose center is best placed in `direction` from the
/// window's center, or `None` when nothing lies that way. All rectangles
/// must share one coordinate space; callers translate cross-display zones
/// before asking.
pub fn choose_in_direction<K: Copy>(
    direction: Direction,
    window_rect: Rect,
    candidates: impl IntoIterator<Item = (K, Rect)>,
) -> Option<K> {
    let (dir_x, dir_y) = direction.vector();
    let origin = window_rect.center();
    let (ox, oy) = (f64::from(origin.x), f64::from(origin.y));

    let mut best: Option<(K, f64)> = None;
    for (i, (key, rect)) in candidates.into_iter().enumerate() {
        let center = rect.center();
        let eps = i as f64 * TIE_EPSILON;
        let dx = f64::from(center.x) + eps - ox;
        let dy = f64::from(center.y) + eps - oy;

        let along = dx * dir_x + dy * dir_y;
        if along <= 0.0 {
            continue;
        }
        let perp = (dx * dir_y - dy * dir_x).abs();
        if perp / along > TANGENT_LIMIT {
            continue;
        }
        let cost = (along * along + (PERP_WEIGHT * perp) * (PERP_WEIGHT * perp)).sqrt();
        match best {
            Some((_, best_cost)) if best_cost <= cost => {}
            _ => best = Some((key, cost)),
        }
    }
    best.map(|(key, _)| key)
}
