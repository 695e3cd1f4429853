//! Turns grid selections into window operations.
//!
//! Slot `i` of the target list is matched with window `i` of the existing
//! windows once the reference window has been moved to the front. Matched
//! windows are resized, missing ones are created, and when fewer targets than
//! windows were drawn, every window left unplaced is minimized.

use gridsnap_ipc::Rectangle;

use crate::core::{Rect, WindowDescriptor, WindowId, WindowState};
use crate::effect::{BatchReport, OperationOutcome, WindowOperation};
use crate::error::{Error, Result};
use crate::provider::WindowProvider;

/// Gutter applied around every window when padding is on.
pub const PADDING_PX: i32 = 10;

/// Pixel size of one grid cell on a work area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGeometry {
    cell_width: f64,
    cell_height: f64,
    origin_x: f64,
    origin_y: f64,
    padding: f64,
}

impl CellGeometry {
    pub fn new(work_area: &Rect, grid_size: u32, padding: bool) -> Result<Self> {
        if grid_size == 0 {
            return Err(Error::precondition("grid size must be positive"));
        }

        let padding = if padding { PADDING_PX } else { 0 };
        let percentage_per_cell = 100.0 / f64::from(grid_size);
        let usable_width = f64::from(work_area.width - padding);
        let usable_height = f64::from(work_area.height - padding);

        Ok(Self {
            cell_width: usable_width * percentage_per_cell / 100.0,
            cell_height: usable_height * percentage_per_cell / 100.0,
            origin_x: f64::from(work_area.left + padding),
            origin_y: f64::from(work_area.top + padding),
            padding: f64::from(padding),
        })
    }

    /// Flooring keeps the window inside the work area. Padding shrinks the size
    /// only; the origin already carries the leading gutter.
    pub fn window_bounds(&self, target: &Rectangle) -> Rect {
        Rect::new(
            (self.cell_width * f64::from(target.x) + self.origin_x).floor() as i32,
            (self.cell_height * f64::from(target.y) + self.origin_y).floor() as i32,
            (self.cell_width * f64::from(target.width) - self.padding).floor() as i32,
            (self.cell_height * f64::from(target.height) - self.padding).floor() as i32,
        )
    }
}

/// Puts the reference window first, keeping everything else in order.
pub fn reorder_windows(
    windows: Vec<WindowDescriptor>,
    reference: Option<WindowId>,
) -> Vec<WindowDescriptor> {
    let Some(reference) = reference else {
        return windows;
    };
    let Some(index) = windows.iter().position(|w| w.id == reference) else {
        return windows;
    };

    let mut ordered = Vec::with_capacity(windows.len());
    ordered.push(windows[index].clone());
    ordered.extend(
        windows
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, w)| w),
    );
    ordered
}

pub struct Reconciler {
    slots: Vec<Rect>,
    windows: Vec<WindowDescriptor>,
}

impl Reconciler {
    pub fn new(
        targets: &[Rectangle],
        grid_size: u32,
        work_area: &Rect,
        existing: Vec<WindowDescriptor>,
        reference: Option<WindowId>,
        padding: bool,
    ) -> Result<Self> {
        let geometry = CellGeometry::new(work_area, grid_size, padding)?;
        let slots = targets.iter().map(|t| geometry.window_bounds(t)).collect();

        Ok(Self {
            slots,
            windows: reorder_windows(existing, reference),
        })
    }

    /// Existing windows in slot order.
    #[cfg(test)]
    pub fn windows(&self) -> &[WindowDescriptor] {
        &self.windows
    }

    fn minimizes_surplus(&self) -> bool {
        !self.slots.is_empty() && self.slots.len() < self.windows.len()
    }

    fn slot_operations(&self) -> impl Iterator<Item = WindowOperation> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(slot, bounds)| match self.windows.get(slot) {
                Some(window) => WindowOperation::Resize {
                    slot,
                    window_id: window.id,
                    bounds: *bounds,
                },
                None => WindowOperation::Create {
                    slot,
                    bounds: *bounds,
                },
            })
    }

    fn minimize_operations<'a>(
        &'a self,
        placed: &'a [bool],
    ) -> impl Iterator<Item = WindowOperation> + 'a {
        self.windows
            .iter()
            .zip(placed)
            .filter(|(_, placed)| !**placed)
            .map(|(window, _)| WindowOperation::Minimize {
                window_id: window.id,
            })
    }

    /// The operations issued when every resize succeeds.
    pub fn plan(&self) -> Vec<WindowOperation> {
        let mut operations: Vec<_> = self.slot_operations().collect();
        if self.minimizes_surplus() {
            let placed: Vec<bool> = (0..self.windows.len())
                .map(|i| i < self.slots.len())
                .collect();
            operations.extend(self.minimize_operations(&placed));
        }
        operations
    }

    /// Issues the operations one at a time. A failed call is recorded and the
    /// next one still runs; a window whose resize failed counts as unplaced.
    pub async fn execute<P>(&self, provider: &P) -> BatchReport
    where
        P: WindowProvider + ?Sized,
    {
        let mut report = BatchReport::default();
        let mut placed = vec![false; self.windows.len()];

        for operation in self.slot_operations() {
            let resized_slot = match operation {
                WindowOperation::Resize { slot, .. } => Some(slot),
                _ => None,
            };
            let outcome = issue(provider, operation).await;
            if let (Some(slot), true) = (resized_slot, outcome.is_ok()) {
                placed[slot] = true;
            }
            report.push(outcome);
        }

        if self.minimizes_surplus() {
            for operation in self.minimize_operations(&placed) {
                report.push(issue(provider, operation).await);
            }
        }

        let failed = report.failures().count();
        if failed > 0 {
            tracing::warn!(
                "Layout applied with {} of {} operations failing",
                failed,
                report.outcomes.len()
            );
        } else {
            tracing::info!("Layout applied: {} operations", report.outcomes.len());
        }
        report
    }
}

async fn issue<P>(provider: &P, operation: WindowOperation) -> OperationOutcome
where
    P: WindowProvider + ?Sized,
{
    let result = match &operation {
        WindowOperation::Resize {
            window_id, bounds, ..
        } => provider
            .resize_window(*window_id, *bounds)
            .await
            .map(|()| None),
        WindowOperation::Create { bounds, .. } => {
            provider.create_window(*bounds).await.map(|w| Some(w.id))
        }
        WindowOperation::Minimize { window_id } => provider
            .set_window_state(*window_id, WindowState::Minimized)
            .await
            .map(|()| None),
    };

    match result {
        Ok(Some(window_id)) => {
            tracing::debug!("Created window {} for {:?}", window_id, operation);
            OperationOutcome::created(operation, window_id)
        }
        Ok(None) => {
            tracing::debug!("Applied {:?}", operation);
            OperationOutcome::ok(operation)
        }
        Err(e) => {
            tracing::warn!("Operation {:?} failed: {}", operation, e);
            OperationOutcome::failed(operation, e)
        }
    }
}
