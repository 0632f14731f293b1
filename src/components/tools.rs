use std::collections::VecDeque;

use crate::canvas::{Layer, Pixel};

// ============================================================================
// TOOL SELECTION
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum EditorTool {
    #[default]
    Pencil,
    Eraser,
    Fill,
    Eyedropper,
    Line,
}

impl EditorTool {
    pub fn all() -> &'static [EditorTool] {
        &[
            EditorTool::Pencil,
            EditorTool::Eraser,
            EditorTool::Fill,
            EditorTool::Eyedropper,
            EditorTool::Line,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EditorTool::Pencil => "Pencil",
            EditorTool::Eraser => "Eraser",
            EditorTool::Fill => "Fill",
            EditorTool::Eyedropper => "Eyedropper",
            EditorTool::Line => "Line",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EditorTool::Pencil => "✏",
            EditorTool::Eraser => "⌫",
            EditorTool::Fill => "🪣",
            EditorTool::Eyedropper => "💉",
            EditorTool::Line => "╱",
        }
    }

    /// Look a tool up by display name (case-insensitive). Unknown names fall
    /// back to the pencil.
    pub fn from_name(name: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.display_name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }
}

/// Which pointer button started a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
}

// ============================================================================
// LINE – Bresenham
// ============================================================================

/// Integer Bresenham walk from `start` to `end`, both endpoints included.
///
/// Coordinates are not clipped; callers bounds-check each point.
#[derive(Clone, Debug)]
pub struct BresenhamLine {
    x: i64,
    y: i64,
    x1: i64,
    y1: i64,
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    done: bool,
}

impl BresenhamLine {
    pub fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        let (x0, y0) = (start.0 as i64, start.1 as i64);
        let (x1, y1) = (end.0 as i64, end.1 as i64);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        Self {
            x: x0,
            y: y0,
            x1,
            y1,
            dx,
            dy,
            sx: if x0 < x1 { 1 } else { -1 },
            sy: if y0 < y1 { 1 } else { -1 },
            err: dx - dy,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let point = (self.x as i32, self.y as i32);
        if self.x == self.x1 && self.y == self.y1 {
            self.done = true;
            return Some(point);
        }

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }
        Some(point)
    }
}

// ============================================================================
// FLOOD FILL
// ============================================================================

/// 4-connected flood fill on a single layer using exact pixel equality.
///
/// Returns the number of pixels repainted; zero when the seed is out of
/// bounds or already holds `color`.
pub fn flood_fill(layer: &mut Layer, x: i32, y: i32, color: Pixel) -> usize {
    let width = layer.width() as usize;
    let Some(seed) = layer.pixels().index_of(x, y) else {
        return 0;
    };
    let target = layer.get_pixel(x, y);
    if target == color {
        return 0;
    }

    let height = layer.height() as usize;
    let mut visited = vec![false; width * height];
    let mut queue = VecDeque::new();
    visited[seed] = true;
    queue.push_back((x, y));

    let mut filled = 0;
    while let Some((px, py)) = queue.pop_front() {
        layer.set_pixel(px, py, color);
        filled += 1;

        for (nx, ny) in [(px + 1, py), (px - 1, py), (px, py + 1), (px, py - 1)] {
            let Some(ni) = layer.pixels().index_of(nx, ny) else {
                continue;
            };
            if visited[ni] || layer.get_pixel(nx, ny) != target {
                continue;
            }
            visited[ni] = true;
            queue.push_back((nx, ny));
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelGrid;

    const RED: Pixel = 0xFFFF_0000;
    const WHITE: Pixel = 0xFFFF_FFFF;

    fn line(start: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
        BresenhamLine::new(start, end).collect()
    }

    #[test]
    fn line_single_point() {
        assert_eq!(line((0, 0), (0, 0)), [(0, 0)]);
    }

    #[test]
    fn line_horizontal_vertical_diagonal() {
        assert_eq!(line((0, 0), (4, 0)), [(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
        assert_eq!(line((2, 3), (2, 0)), [(2, 3), (2, 2), (2, 1), (2, 0)]);
        assert_eq!(line((0, 0), (3, 3)), [(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(line((3, 0), (0, 3)), [(3, 0), (2, 1), (1, 2), (0, 3)]);
    }

    #[test]
    fn line_shallow_and_steep_slopes() {
        assert_eq!(line((0, 0), (4, 2)), [(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)]);
        assert_eq!(line((0, 0), (2, 4)), [(0, 0), (0, 1), (1, 2), (1, 3), (2, 4)]);
    }

    #[test]
    fn line_is_gapless_in_every_octant() {
        let ends = [
            (7, 2), (2, 7), (-2, 7), (-7, 2),
            (-7, -2), (-2, -7), (2, -7), (7, -2),
        ];
        for end in ends {
            let pts = line((0, 0), end);
            assert_eq!(pts.first(), Some(&(0, 0)));
            assert_eq!(pts.last(), Some(&end));
            let major = end.0.abs().max(end.1.abs()) as usize;
            assert_eq!(pts.len(), major + 1, "end {:?}", end);
            for pair in pts.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!((a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1);
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn fill_uniform_layer_then_refill_is_noop() {
        let mut layer = Layer::from_pixels("L", PixelGrid::new_filled(5, 4, WHITE));
        assert_eq!(flood_fill(&mut layer, 2, 2, RED), 20);
        assert!(layer.pixels().as_slice().iter().all(|&p| p == RED));
        assert_eq!(flood_fill(&mut layer, 0, 0, RED), 0);
    }

    #[test]
    fn fill_transparent_layer() {
        let mut layer = Layer::new("L", 3, 3);
        assert_eq!(flood_fill(&mut layer, 0, 0, RED), 9);
        assert!(layer.pixels().as_slice().iter().all(|&p| p == RED));
    }

    #[test]
    fn fill_stops_at_boundaries() {
        // Vertical wall at x = 2 splits the layer in two
        let mut layer = Layer::new("L", 5, 3);
        for y in 0..3 {
            layer.set_pixel(2, y, WHITE);
        }
        assert_eq!(flood_fill(&mut layer, 0, 0, RED), 6);
        assert_eq!(layer.get_pixel(3, 0), 0);
        assert_eq!(layer.get_pixel(2, 1), WHITE);

        // Alpha-0 pixels with different RGB are distinct colours
        let mut layer = Layer::new("L", 2, 1);
        layer.set_pixel(1, 0, 0x00FF_FFFF);
        assert_eq!(flood_fill(&mut layer, 0, 0, RED), 1);
        assert_eq!(layer.get_pixel(1, 0), 0x00FF_FFFF);
    }

    #[test]
    fn fill_does_not_cross_diagonals() {
        let mut layer = Layer::from_pixels("L", PixelGrid::new_filled(2, 2, WHITE));
        layer.set_pixel(0, 0, 0);
        layer.set_pixel(1, 1, 0);
        assert_eq!(flood_fill(&mut layer, 0, 0, RED), 1);
        assert_eq!(layer.get_pixel(0, 0), RED);
        assert_eq!(layer.get_pixel(1, 1), 0);
        assert_eq!(layer.get_pixel(1, 0), WHITE);
    }

    #[test]
    fn fill_out_of_bounds_seed_is_noop() {
        let mut layer = Layer::new("L", 2, 2);
        assert_eq!(flood_fill(&mut layer, -1, 0, RED), 0);
        assert_eq!(flood_fill(&mut layer, 0, 2, RED), 0);
        assert!(layer.is_empty());
    }

    #[test]
    fn tool_names_round_trip() {
        for tool in EditorTool::all() {
            assert_eq!(EditorTool::from_name(tool.display_name()), *tool);
        }
        assert_eq!(EditorTool::from_name("fill"), EditorTool::Fill);
        assert_eq!(EditorTool::from_name("Brush"), EditorTool::Pencil);
    }
}
