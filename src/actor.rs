pub mod keyboard;
pub mod move_handler;

#[cfg(test)]
pub(crate) mod test_support;

pub use move_handler::{DragModifiers, WindowMoveHandler};
