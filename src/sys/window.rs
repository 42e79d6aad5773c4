use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::model::geometry::Rect;

/// Opaque handle to one top-level window, as minted by the platform layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WindowId(NonZeroU64);

impl WindowId {
    pub fn new(id: u64) -> WindowId { WindowId(NonZeroU64::new(id).unwrap()) }

    pub fn get(&self) -> u64 { self.0.get() }
}

/// Classification queries the core consults before touching a window.
/// Implemented by the platform layer; answers may change over a window's
/// lifetime (the detached-tab heuristic depends on exactly that).
pub trait WindowOracle {
    /// Standard window test + exclusion list + resize-cursor check.
    fn is_zoning_candidate(&self, window: WindowId) -> bool;
    /// Whether the window belongs to an elevated process.
    fn is_elevated(&self, window: WindowId) -> bool;
    /// Whether the window has a visible owner window.
    fn has_visible_owner(&self, window: WindowId) -> bool;
    /// Standard-window test alone, without the exclusion list.
    fn is_standard(&self, window: WindowId) -> bool;
    /// Whether the handle still refers to a live window.
    fn is_window(&self, window: WindowId) -> bool;
}

/// Difference between a window's visible frame and the rectangle the OS
/// wants for placement calls (drop shadows, invisible resize borders).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameAdjustment {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FrameAdjustment {
    /// Expands a target rectangle so that the window's visible frame lands
    /// exactly on it.
    pub fn apply(&self, rect: Rect) -> Rect {
        Rect {
            left: rect.left - self.left,
            top: rect.top - self.top,
            right: rect.right + self.right,
            bottom: rect.bottom + self.bottom,
        }
    }
}

/// Window placement calls the core issues. Every method can fail at the OS
/// boundary; failures are surfaced as `false`/`None` and logged by callers.
pub trait WindowPlacement {
    fn rect(&self, window: WindowId) -> Option<Rect>;
    fn set_rect(&self, window: WindowId, rect: Rect) -> bool;
    fn frame_adjustment(&self, window: WindowId) -> FrameAdjustment;
    fn is_maximized(&self, window: WindowId) -> bool;
    fn focus(&self, window: WindowId) -> bool;
    /// Applies or reverts drag transparency. Purely cosmetic; errors are
    /// swallowed by implementations.
    fn set_transparent(&self, window: WindowId, transparent: bool);
}

/// Case-insensitive match of a window's application name against the
/// configured exclusion list. Platform oracles call this so all of them
/// agree on the matching rule.
pub fn matches_exclusion(app_name: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|e| app_name.eq_ignore_ascii_case(e))
}
