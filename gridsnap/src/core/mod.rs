mod display;
mod window;

pub use display::*;
pub use window::*;
