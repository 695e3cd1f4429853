use super::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub bounds: Rect,
    pub work_area: Rect,
}

impl Display {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, bounds: Rect, work_area: Rect) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            bounds,
            work_area,
        }
    }

    fn corners_contained(&self, window: &Rect) -> usize {
        window
            .corners()
            .iter()
            .filter(|corner| self.bounds.contains_point(**corner))
            .count()
    }
}

/// Picks the display holding the most corners of `reference`.
///
/// Ties keep the earlier display. Without a reference window, or when no
/// display holds any corner, the first display is returned. `None` only for
/// an empty list.
pub fn select_display<'a>(displays: &'a [Display], reference: Option<&Rect>) -> Option<&'a Display> {
    let first = displays.first()?;
    let Some(window) = reference else {
        return Some(first);
    };

    let mut selected = first;
    let mut max_corners = 0;
    for display in displays {
        let corners = display.corners_contained(window);
        if corners > max_corners {
            selected = display;
            max_corners = corners;
        }
    }

    tracing::debug!(
        "Selected display {} ({} of 4 corners)",
        selected.id,
        max_corners
    );
    Some(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual_displays() -> Vec<Display> {
        vec![
            Display::new(
                "left",
                Rect::new(0, 0, 1920, 1080),
                Rect::new(0, 25, 1920, 1055),
            ),
            Display::new(
                "right",
                Rect::new(1920, 0, 2560, 1440),
                Rect::new(1920, 0, 2560, 1400),
            ),
        ]
    }

    #[test]
    fn test_window_fully_inside_one_display() {
        let displays = dual_displays();
        let window = Rect::new(2000, 100, 800, 600);
        let selected = select_display(&displays, Some(&window)).unwrap();
        assert_eq!(selected.id, "right");
    }

    #[test]
    fn test_straddling_window_prefers_most_corners() {
        let displays = dual_displays();
        // Bottom corners fall below the left display but inside the taller right one.
        let window = Rect::new(1800, 900, 400, 400);
        let selected = select_display(&displays, Some(&window)).unwrap();
        assert_eq!(selected.id, "right");
    }

    #[test]
    fn test_tie_keeps_first_display() {
        let displays = dual_displays();
        // Two corners on each side.
        let window = Rect::new(1700, 100, 400, 300);
        let selected = select_display(&displays, Some(&window)).unwrap();
        assert_eq!(selected.id, "left");
    }

    #[test]
    fn test_window_off_every_display_falls_back_to_first() {
        let displays = dual_displays();
        let window = Rect::new(-5000, -5000, 100, 100);
        let selected = select_display(&displays, Some(&window)).unwrap();
        assert_eq!(selected.id, "left");
    }

    #[test]
    fn test_far_away_window_does_not_overflow() {
        let displays = dual_displays();
        let window = Rect::new(i32::MAX - 5, i32::MAX - 5, 1000, 1000);
        let selected = select_display(&displays, Some(&window)).unwrap();
        assert_eq!(selected.id, "left");
    }

    #[test]
    fn test_no_reference_window() {
        let displays = dual_displays();
        assert_eq!(select_display(&displays, None).unwrap().id, "left");
    }

    #[test]
    fn test_no_displays() {
        assert!(select_display(&[], Some(&Rect::new(0, 0, 10, 10))).is_none());
    }
}
