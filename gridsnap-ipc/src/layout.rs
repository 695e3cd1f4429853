use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most rectangles a single selection may hold.
pub const MAX_RECTANGLES: usize = 10;

/// A selection on the square layout grid, in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the selection spanned by two corner cells given as (column, row),
    /// in either drag direction.
    pub fn from_corners(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            x: start.0.min(end.0),
            y: start.1.min(end.1),
            width: start.0.abs_diff(end.0) + 1,
            height: start.1.abs_diff(end.1) + 1,
        }
    }

    /// Whether the selection is non-empty and lies inside a `grid_size` grid.
    pub fn fits(&self, grid_size: u32) -> bool {
        self.width >= 1
            && self.height >= 1
            && self.x.saturating_add(self.width) <= grid_size
            && self.y.saturating_add(self.height) <= grid_size
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Rectangle {
    type Err = String;

    /// Parses `x,y,width,height`, or two corner cells as `col,row:col,row`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((start, end)) = s.split_once(':') {
            let [c1, r1] = parse_numbers::<2>(start)?;
            let [c2, r2] = parse_numbers::<2>(end)?;
            return Ok(Self::from_corners((c1, r1), (c2, r2)));
        }

        let [x, y, width, height] = parse_numbers::<4>(s)
            .map_err(|e| format!("expected x,y,width,height or col,row:col,row: {}", e))?;
        if width == 0 || height == 0 {
            return Err(format!("empty selection '{}'", s));
        }
        Ok(Self::new(x, y, width, height))
    }
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[u32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} numbers but got '{}'", N, s));
    }

    let mut values = [0u32; N];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|_| format!("invalid number '{}' in '{}'", part, s))?;
    }
    Ok(values)
}

/// A named arrangement kept in the layout store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: String,
    pub name: String,
    pub layout: Vec<Rectangle>,
    pub grid_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<bool>,
}

/// The inbound trigger: apply `rectangles` around the window that asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub rectangles: Vec<Rectangle>,
    pub grid_size: u32,
    #[serde(default)]
    pub current_window_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<bool>,
}

impl From<&Layout> for LayoutRequest {
    fn from(layout: &Layout) -> Self {
        Self {
            rectangles: layout.layout.clone(),
            grid_size: layout.grid_size,
            current_window_id: None,
            padding: layout.padding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes_drag_direction() {
        let forward = Rectangle::from_corners((1, 2), (3, 5));
        let backward = Rectangle::from_corners((3, 5), (1, 2));
        assert_eq!(forward, Rectangle::new(1, 2, 3, 4));
        assert_eq!(forward, backward);
        assert_eq!(Rectangle::from_corners((4, 4), (4, 4)), Rectangle::new(4, 4, 1, 1));
    }

    #[test]
    fn test_fits() {
        assert!(Rectangle::new(0, 0, 6, 6).fits(6));
        assert!(Rectangle::new(3, 0, 3, 6).fits(6));
        assert!(!Rectangle::new(4, 0, 3, 1).fits(6));
        assert!(!Rectangle::new(0, 0, 0, 1).fits(6));
    }

    #[test]
    fn test_parse_rectangle() {
        assert_eq!("0,0,3,6".parse::<Rectangle>(), Ok(Rectangle::new(0, 0, 3, 6)));
        assert_eq!(" 1, 2, 3, 4".parse::<Rectangle>(), Ok(Rectangle::new(1, 2, 3, 4)));
        assert!("1,2,3".parse::<Rectangle>().is_err());
        assert!("1,2,x,4".parse::<Rectangle>().is_err());
        assert!("1,2,0,4".parse::<Rectangle>().is_err());
    }

    #[test]
    fn test_parse_corner_cells() {
        assert_eq!("3,5:1,2".parse::<Rectangle>(), Ok(Rectangle::new(1, 2, 3, 4)));
        assert_eq!("0,0:0,0".parse::<Rectangle>(), Ok(Rectangle::new(0, 0, 1, 1)));
        assert!("0,0:1".parse::<Rectangle>().is_err());
        assert!("0,0,1:1,1".parse::<Rectangle>().is_err());
    }

    #[test]
    fn test_layout_request_wire_format() {
        let json = r#"{"rectangles":[{"x":0,"y":0,"width":3,"height":6}],"gridSize":6,"currentWindowId":7}"#;
        let req: LayoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.grid_size, 6);
        assert_eq!(req.current_window_id, Some(7));
        assert_eq!(req.padding, None);
        assert_eq!(req.rectangles, vec![Rectangle::new(0, 0, 3, 6)]);
    }

    #[test]
    fn test_saved_layout_without_padding() {
        let json = r#"{"id":"a1","name":"halves","layout":[],"gridSize":8}"#;
        let layout: Layout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.padding, None);

        let out = serde_json::to_string(&layout).unwrap();
        assert!(!out.contains("padding"));
    }
}
