pub mod direction;
pub mod generator;
pub mod layout;

pub use direction::{Direction, choose_in_direction};
pub use generator::{
    CanvasLayout, CanvasZone, CustomLayout, GridLayout, LayoutDescriptor, LayoutKind,
    generate_layout,
};
pub use layout::{Layout, OverlapAlgorithm};
