use gridsnap_ipc::{Command, LayoutRequest, MAX_RECTANGLES};
use std::sync::Arc;

use crate::core::{select_display, WindowId};
use crate::effect::{BatchReport, WindowOperation};
use crate::error::{Error, Result};
use crate::provider::{DisplayProvider, WindowProvider};
use crate::reconcile::Reconciler;
use crate::store::{LayoutStore, PreferenceStore, Preferences};

/// Runs layout requests against the providers, one at a time.
pub struct Handler {
    windows: Arc<dyn WindowProvider>,
    displays: Arc<dyn DisplayProvider>,
    preferences: PreferenceStore,
    layouts: LayoutStore,
}

impl Handler {
    pub fn new(
        windows: Arc<dyn WindowProvider>,
        displays: Arc<dyn DisplayProvider>,
        preferences: PreferenceStore,
        layouts: LayoutStore,
    ) -> Self {
        Self {
            windows,
            displays,
            preferences,
            layouts,
        }
    }

    /// Returns `None` for commands that carry no layout.
    pub async fn handle(&self, command: Command) -> Result<Option<BatchReport>> {
        match command {
            Command::ApplyLayout(request) => self.apply(&request).await.map(Some),
            Command::ApplySaved {
                id,
                current_window_id,
            } => self.apply_saved(&id, current_window_id).await.map(Some),
            Command::Ping | Command::Quit => Ok(None),
        }
    }

    pub async fn apply(&self, request: &LayoutRequest) -> Result<BatchReport> {
        let reconciler = self.prepare(request).await?;
        Ok(reconciler.execute(self.windows.as_ref()).await)
    }

    /// The operations `apply` would issue if every call succeeded.
    pub async fn plan(&self, request: &LayoutRequest) -> Result<Vec<WindowOperation>> {
        Ok(self.prepare(request).await?.plan())
    }

    async fn prepare(&self, request: &LayoutRequest) -> Result<Reconciler> {
        if request.grid_size == 0 {
            return Err(Error::precondition("grid size must be positive"));
        }
        if request.rectangles.len() > MAX_RECTANGLES {
            return Err(Error::LimitReached {
                what: "rectangle",
                limit: MAX_RECTANGLES,
            });
        }

        // Read once; nothing below queries the windows again.
        let existing = match self.windows.list_windows().await {
            Ok(windows) => windows,
            Err(e) => {
                tracing::warn!("Failed to list windows: {}", e);
                Vec::new()
            }
        };

        // Without an explicit id the window the user is acting from anchors the layout.
        let reference_id = match request.current_window_id {
            Some(id) => Some(id),
            None => self.current_window_id().await,
        };
        let reference = reference_id
            .and_then(|id| existing.iter().find(|w| w.id == id))
            .map(|w| w.frame);
        if let (Some(id), None) = (reference_id, reference) {
            tracing::debug!("Reference window {} is not among the current windows", id);
        }

        let displays = match self.displays.list_displays().await {
            Ok(displays) => displays,
            Err(e) => {
                tracing::warn!("Failed to list displays: {}", e);
                Vec::new()
            }
        };
        let target_display = select_display(&displays, reference.as_ref())
            .ok_or_else(|| Error::precondition("no connected displays"))?;

        let padding = self.resolve_padding(request.padding);
        tracing::info!(
            "Placing {} rectangles on a {}x{} grid on display {} ({} existing windows, padding {})",
            request.rectangles.len(),
            request.grid_size,
            request.grid_size,
            target_display.id,
            existing.len(),
            padding
        );

        Reconciler::new(
            &request.rectangles,
            request.grid_size,
            &target_display.work_area,
            existing,
            reference_id,
            padding,
        )
    }

    pub async fn apply_saved(
        &self,
        id: &str,
        current_window_id: Option<WindowId>,
    ) -> Result<BatchReport> {
        let layout = self.layouts.find(id)?;
        tracing::info!("Applying saved layout [{}] {}", layout.id, layout.name);

        let mut request = LayoutRequest::from(&layout);
        request.current_window_id = current_window_id;
        self.apply(&request).await
    }

    /// The request's flag wins; otherwise the stored preference.
    fn resolve_padding(&self, requested: Option<bool>) -> bool {
        if let Some(padding) = requested {
            return padding;
        }
        match self.preferences.load() {
            Ok(prefs) => prefs.win_padding,
            Err(e) => {
                tracing::warn!("Failed to load preferences: {}", e);
                Preferences::default().win_padding
            }
        }
    }

    async fn current_window_id(&self) -> Option<WindowId> {
        match self.windows.current_window().await {
            Ok(window) => Some(window.id),
            Err(e) => {
                tracing::debug!("No current window: {}", e);
                None
            }
        }
    }
}
