pub mod assigned;
pub mod geometry;
pub mod highlight;
pub mod work_area;
pub mod zone;

pub use assigned::LayoutAssignedWindows;
pub use geometry::{Point, Rect};
pub use highlight::HighlightedZones;
pub use work_area::{WorkArea, WorkAreaError, WorkAreaRegistry};
pub use zone::{Zone, ZoneId, ZoneSet, ZonesMap};
