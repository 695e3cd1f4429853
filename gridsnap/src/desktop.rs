//! A desktop described by a JSON file.
//!
//! Implements both providers over a list of displays and windows, writing the
//! file back after every mutation. The daemon drives it headless; tests use
//! the in-memory form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::core::{Display, Rect, WindowDescriptor, WindowId, WindowState};
use crate::error::{Error, Result};
use crate::provider::{DisplayProvider, WindowProvider};
use crate::store;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesktopState {
    #[serde(default)]
    pub displays: Vec<Display>,
    #[serde(default)]
    pub windows: Vec<WindowDescriptor>,
    #[serde(default)]
    pub focused: Option<WindowId>,
}

impl DesktopState {
    pub fn window(&self, id: WindowId) -> Option<&WindowDescriptor> {
        self.windows.iter().find(|w| w.id == id)
    }

    fn window_mut(&mut self, id: WindowId) -> Result<&mut WindowDescriptor> {
        self.windows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::provider(format!("no window with id {}", id)))
    }

    fn next_window_id(&self) -> WindowId {
        self.windows.iter().map(|w| w.id).max().map_or(1, |id| id + 1)
    }
}

pub struct SnapshotDesktop {
    path: Option<PathBuf>,
    state: Mutex<DesktopState>,
}

impl SnapshotDesktop {
    pub fn open(path: &Path) -> Result<Self> {
        let state: DesktopState = store::read_json(path)?.unwrap_or_default();
        tracing::info!(
            "Desktop loaded from {}: {} displays, {} windows",
            path.display(),
            state.displays.len(),
            state.windows.len()
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    #[cfg(test)]
    pub fn in_memory(state: DesktopState) -> Self {
        Self {
            path: None,
            state: Mutex::new(state),
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> DesktopState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Changes become visible only once they are on disk.
    fn mutate<T>(&self, f: impl FnOnce(&mut DesktopState) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        let mut next = state.clone();
        let value = f(&mut next)?;
        if let Some(path) = &self.path {
            store::write_json(path, &next).map_err(|e| Error::provider(e.to_string()))?;
        }
        *state = next;
        Ok(value)
    }
}

#[async_trait]
impl WindowProvider for SnapshotDesktop {
    async fn list_windows(&self) -> Result<Vec<WindowDescriptor>> {
        Ok(self.lock().windows.clone())
    }

    async fn current_window(&self) -> Result<WindowDescriptor> {
        let state = self.lock();
        let window = match state.focused {
            Some(id) => state.window(id),
            None => state.windows.first(),
        };
        window
            .cloned()
            .ok_or_else(|| Error::provider("no current window"))
    }

    async fn create_window(&self, bounds: Rect) -> Result<WindowDescriptor> {
        self.mutate(|state| {
            let window = WindowDescriptor::new(state.next_window_id(), bounds);
            state.windows.push(window.clone());
            tracing::debug!("Window created: [{}] {:?}", window.id, bounds);
            Ok(window)
        })
    }

    async fn resize_window(&self, id: WindowId, bounds: Rect) -> Result<()> {
        self.mutate(|state| {
            let window = state.window_mut(id)?;
            if !window.kind.is_resizable() {
                return Err(Error::provider(format!(
                    "window {} of type {:?} cannot be resized",
                    id, window.kind
                )));
            }
            window.frame = bounds;
            window.state = WindowState::Normal;
            Ok(())
        })
    }

    async fn set_window_state(&self, id: WindowId, state: WindowState) -> Result<()> {
        self.mutate(|desktop| {
            desktop.window_mut(id)?.state = state;
            Ok(())
        })
    }
}

#[async_trait]
impl DisplayProvider for SnapshotDesktop {
    async fn list_displays(&self) -> Result<Vec<Display>> {
        Ok(self.lock().displays.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WindowKind;
    use tempfile::TempDir;

    const DESKTOP_JSON: &str = r#"{
        "displays": [
            {"id": "main", "bounds": {"left": 0, "top": 0, "width": 1440, "height": 900},
             "workArea": {"left": 0, "top": 25, "width": 1440, "height": 875}}
        ],
        "windows": [
            {"id": 4, "left": 10, "top": 40, "width": 800, "height": 600},
            {"id": 9, "left": 0, "top": 0, "width": 300, "height": 200, "type": "popup"}
        ],
        "focused": 9
    }"#;

    #[tokio::test]
    async fn test_open_and_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desktop.json");
        std::fs::write(&path, DESKTOP_JSON).unwrap();

        let desktop = SnapshotDesktop::open(&path).unwrap();
        assert_eq!(desktop.list_displays().await.unwrap().len(), 1);
        assert_eq!(desktop.current_window().await.unwrap().id, 9);

        let created = desktop
            .create_window(Rect::new(0, 25, 720, 875))
            .await
            .unwrap();
        assert_eq!(created.id, 10);
        desktop
            .set_window_state(4, WindowState::Minimized)
            .await
            .unwrap();

        let reopened = SnapshotDesktop::open(&path).unwrap().snapshot();
        assert_eq!(reopened.windows.len(), 3);
        assert_eq!(reopened.window(4).unwrap().state, WindowState::Minimized);
        assert_eq!(reopened.window(9).unwrap().kind, WindowKind::Popup);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_empty_desktop() {
        let dir = TempDir::new().unwrap();
        let desktop = SnapshotDesktop::open(&dir.path().join("absent.json")).unwrap();
        assert!(desktop.list_windows().await.unwrap().is_empty());
        assert!(desktop.current_window().await.is_err());
    }

    #[tokio::test]
    async fn test_resize_restores_minimized_window() {
        let mut window = WindowDescriptor::new(1, Rect::new(0, 0, 10, 10));
        window.state = WindowState::Minimized;
        let desktop = SnapshotDesktop::in_memory(DesktopState {
            windows: vec![window],
            ..Default::default()
        });

        desktop
            .resize_window(1, Rect::new(5, 5, 100, 100))
            .await
            .unwrap();
        let window = desktop.snapshot().windows[0].clone();
        assert_eq!(window.frame, Rect::new(5, 5, 100, 100));
        assert_eq!(window.state, WindowState::Normal);
    }

    #[tokio::test]
    async fn test_unknown_and_popup_windows_fail() {
        let desktop = SnapshotDesktop::in_memory(serde_json::from_str(DESKTOP_JSON).unwrap());
        let err = desktop
            .resize_window(77, Rect::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(desktop.resize_window(9, Rect::default()).await.is_err());
        assert!(desktop
            .set_window_state(77, WindowState::Minimized)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let before: DesktopState = serde_json::from_str(DESKTOP_JSON).unwrap();
        let desktop = SnapshotDesktop {
            path: Some(blocker.join("desktop.json")),
            state: Mutex::new(before.clone()),
        };

        let err = desktop
            .resize_window(4, Rect::new(5, 5, 500, 500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(desktop.create_window(Rect::default()).await.is_err());
        assert_eq!(desktop.snapshot(), before);
    }
}
