//! Seams to the windowing system.
//!
//! Every call may fail; callers decide per call site whether a failure is
//! fatal. The reconciler never lets one failed call stop the rest of a batch.

use async_trait::async_trait;

use crate::core::{Display, Rect, WindowDescriptor, WindowId, WindowState};
use crate::error::Result;

#[async_trait]
pub trait WindowProvider: Send + Sync {
    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>>;

    /// The window the user is acting from.
    async fn current_window(&self) -> Result<WindowDescriptor>;

    async fn create_window(&self, bounds: Rect) -> Result<WindowDescriptor>;

    /// Moves and resizes; also restores the window to the normal state.
    async fn resize_window(&self, id: WindowId, bounds: Rect) -> Result<()>;

    async fn set_window_state(&self, id: WindowId, state: WindowState) -> Result<()>;
}

#[async_trait]
pub trait DisplayProvider: Send + Sync {
    async fn list_displays(&self) -> Result<Vec<Display>>;
}
