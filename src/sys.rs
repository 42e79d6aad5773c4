//! Contracts for the platform collaborators the core consumes. Real
//! implementations live with the platform layer; every trait here ships an
//! in-memory or null implementation for tests and headless use.

pub mod display;
pub mod history;
pub mod marker;
pub mod overlay;
pub mod window;

pub use display::{DesktopId, DisplayId, DisplayInfo, TopologyEvent, WorkAreaId};
pub use history::{AppZoneHistory, HistoryKey, InMemoryHistory};
pub use marker::{InMemoryPropertyStore, WindowPropertyStore, ZoneBitmask};
pub use overlay::{FrameBufferRenderer, NullRenderer, OverlayFrame, OverlayRenderer, SharedFrame};
pub use window::{FrameAdjustment, WindowId, WindowOracle, WindowPlacement};

/// Borrowed bundle of every collaborator an operation may touch. One store
/// of each kind exists per process and is passed in explicitly; nothing in
/// the core reaches for a global.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub oracle: &'a dyn WindowOracle,
    pub placement: &'a dyn WindowPlacement,
    pub props: &'a dyn WindowPropertyStore,
    pub history: &'a dyn AppZoneHistory,
    pub overlay: &'a dyn OverlayRenderer,
}
