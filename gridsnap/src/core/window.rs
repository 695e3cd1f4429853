use serde::{Deserialize, Serialize};

pub type WindowId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Normal,
    Popup,
    Panel,
    App,
    Devtools,
}

impl WindowKind {
    /// Only normal windows accept arbitrary bounds.
    pub fn is_resizable(self) -> bool {
        matches!(self, WindowKind::Normal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub id: WindowId,
    #[serde(flatten)]
    pub frame: Rect,
    #[serde(rename = "type", default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub state: WindowState,
}

impl WindowDescriptor {
    pub fn new(id: WindowId, frame: Rect) -> Self {
        Self {
            id,
            frame,
            kind: WindowKind::Normal,
            state: WindowState::Normal,
        }
    }
}

/// Absolute screen rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    /// Top-left, top-right, bottom-left, bottom-right, as (x, y).
    pub fn corners(&self) -> [(i32, i32); 4] {
        [
            (self.left, self.top),
            (self.right(), self.top),
            (self.left, self.bottom()),
            (self.right(), self.bottom()),
        ]
    }

    /// Edges are inclusive on all four sides.
    pub fn contains_point(&self, (x, y): (i32, i32)) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}
