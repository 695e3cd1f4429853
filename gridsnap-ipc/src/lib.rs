pub mod command;
pub mod layout;

pub use command::{Command, Response};
pub use layout::{Layout, LayoutRequest, Rectangle, MAX_RECTANGLES};
