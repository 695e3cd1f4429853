use gridsnap_ipc::{Layout, Rectangle, MAX_RECTANGLES};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};

pub const MAX_LAYOUTS: usize = 50;

/// Reads a JSON file; `None` when it does not exist yet.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Writes through a sibling temp file so readers never see a partial document.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub grid_size: u32,
    pub win_padding: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            grid_size: 6,
            win_padding: true,
        }
    }
}

pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Preferences> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        write_json(&self.path, prefs)?;
        tracing::debug!("Preferences saved: {:?}", prefs);
        Ok(())
    }
}

pub struct LayoutStore {
    path: PathBuf,
}

impl LayoutStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Vec<Layout>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    pub fn save(&self, layouts: &[Layout]) -> Result<()> {
        write_json(&self.path, layouts)
    }

    pub fn find(&self, id: &str) -> Result<Layout> {
        self.load()?
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::layout_not_found(id))
    }

    pub fn add(
        &self,
        name: &str,
        rectangles: Vec<Rectangle>,
        grid_size: u32,
        padding: Option<bool>,
    ) -> Result<Layout> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::precondition("layout name must not be empty"));
        }
        if rectangles.is_empty() {
            return Err(Error::precondition("layout has no rectangles"));
        }
        if rectangles.len() > MAX_RECTANGLES {
            return Err(Error::LimitReached {
                what: "rectangle",
                limit: MAX_RECTANGLES,
            });
        }

        let mut layouts = self.load()?;
        if layouts.len() >= MAX_LAYOUTS {
            return Err(Error::LimitReached {
                what: "layout",
                limit: MAX_LAYOUTS,
            });
        }

        let layout = Layout {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            layout: rectangles,
            grid_size,
            padding,
        };
        layouts.push(layout.clone());
        self.save(&layouts)?;
        tracing::info!("Layout saved: [{}] {}", layout.id, layout.name);
        Ok(layout)
    }

    pub fn remove(&self, id: &str) -> Result<Layout> {
        let mut layouts = self.load()?;
        let index = layouts
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| Error::layout_not_found(id))?;
        let removed = layouts.remove(index);
        self.save(&layouts)?;
        tracing::info!("Layout removed: [{}] {}", removed.id, removed.name);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout_store(dir: &TempDir) -> LayoutStore {
        LayoutStore::new(dir.path().join("layouts.json"))
    }

    fn halves() -> Vec<Rectangle> {
        vec![Rectangle::new(0, 0, 3, 6), Rectangle::new(3, 0, 3, 6)]
    }

    #[test]
    fn test_preferences_default_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(dir.path().join("preferences.json"));
        assert_eq!(store.load().unwrap(), Preferences::default());

        let prefs = Preferences {
            grid_size: 9,
            win_padding: false,
        };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn test_preferences_fill_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"grid_size": 8}"#).unwrap();
        let prefs = PreferenceStore::new(path).load().unwrap();
        assert_eq!(prefs.grid_size, 8);
        assert!(prefs.win_padding);
    }

    #[test]
    fn test_add_find_remove() {
        let dir = TempDir::new().unwrap();
        let store = layout_store(&dir);
        assert!(store.load().unwrap().is_empty());

        let first = store.add("halves", halves(), 6, None).unwrap();
        let second = store.add(" thirds ", halves(), 9, Some(false)).unwrap();
        assert_eq!(second.name, "thirds");
        assert_ne!(first.id, second.id);

        assert_eq!(store.find(&first.id).unwrap(), first);
        assert_eq!(store.remove(&first.id).unwrap(), first);
        assert_eq!(store.load().unwrap(), vec![second]);
        assert!(matches!(
            store.remove(&first.id),
            Err(Error::NotFound { kind: "layout", .. })
        ));
    }

    #[test]
    fn test_layout_cap() {
        let dir = TempDir::new().unwrap();
        let store = layout_store(&dir);
        for i in 0..MAX_LAYOUTS {
            store.add(&format!("layout {}", i), halves(), 6, None).unwrap();
        }
        let err = store.add("one too many", halves(), 6, None).unwrap_err();
        assert!(matches!(
            err,
            Error::LimitReached {
                what: "layout",
                limit: MAX_LAYOUTS
            }
        ));
        assert_eq!(store.load().unwrap().len(), MAX_LAYOUTS);
    }

    #[test]
    fn test_rejects_blank_name_and_empty_layout() {
        let dir = TempDir::new().unwrap();
        let store = layout_store(&dir);
        assert!(store.add("  ", halves(), 6, None).is_err());
        assert!(store.add("empty", vec![], 6, None).is_err());
    }

    #[test]
    fn test_rectangle_cap() {
        let dir = TempDir::new().unwrap();
        let store = layout_store(&dir);
        let cells = |n: u32| (0..n).map(|i| Rectangle::new(i, 0, 1, 1)).collect::<Vec<_>>();

        let layout = store.add("ten", cells(10), 12, None).unwrap();
        assert_eq!(layout.layout.len(), MAX_RECTANGLES);

        let err = store.add("eleven", cells(11), 12, None).unwrap_err();
        assert!(matches!(
            err,
            Error::LimitReached {
                what: "rectangle",
                limit: MAX_RECTANGLES
            }
        ));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_ids_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let first = layout_store(&dir).add("a", halves(), 6, None).unwrap();
        let second = layout_store(&dir).add("b", halves(), 6, None).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(layout_store(&dir).find(&second.id).unwrap().name, "b");
    }
}
