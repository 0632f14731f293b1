use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::canvas::{Pixel, PixelGrid, TRANSPARENT};
use crate::components::colors::SharedColorHistory;
use crate::components::tools::{EditorTool, PointerButton};
use crate::log_info;
use crate::pixel_canvas::{EraseOutcome, PixelCanvas};
use crate::settings::EditorSettings;

pub const LAYER_EMPTY_NOTICE: &str = "Layer is already completely empty!";

/// What a pointer event did, for the host to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Nothing changed.
    Nothing,
    /// Pixels on the active layer changed.
    Painted,
    /// The eyedropper picked this colour.
    Picked(Pixel),
    /// First click of a line; waiting for the end point.
    LineStarted,
    /// A message the host should surface to the user.
    Notice(&'static str),
}

// ============================================================================
// NOTICE THROTTLE
// ============================================================================

/// Suppresses repeats of the same notice within a cooldown window.
#[derive(Clone, Debug)]
pub struct NoticeThrottle {
    cooldown: Duration,
    last_shown: HashMap<&'static str, Instant>,
}

impl NoticeThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_shown: HashMap::new(),
        }
    }

    /// True (and records `now`) when `notice` has not been shown within the
    /// cooldown.
    pub fn allow(&mut self, notice: &'static str, now: Instant) -> bool {
        if let Some(&last) = self.last_shown.get(notice)
            && now.saturating_duration_since(last) < self.cooldown
        {
            return false;
        }
        self.last_shown.insert(notice, now);
        true
    }
}

// ============================================================================
// EDIT SESSION
// ============================================================================

/// One open image: its canvas plus the tool state driving it.
pub struct EditSession {
    pub id: Uuid,
    /// Display name chosen by the host.
    pub name: String,
    canvas: PixelCanvas,
    colors: SharedColorHistory,
    tool: EditorTool,
    color: Pixel,
    line_anchor: Option<(i32, i32)>,
    /// Colour of the pencil stroke opened by the last press.
    stroke_color: Option<Pixel>,
    /// Pixels the session was opened with, for reset.
    original: PixelGrid,
    notices: NoticeThrottle,
}

impl EditSession {
    pub fn new(
        name: impl Into<String>,
        source: PixelGrid,
        colors: SharedColorHistory,
        settings: &EditorSettings,
    ) -> Self {
        let name = name.into();
        let (w, h) = source.dimensions();
        log_info!("Open session '{}' ({}x{})", name, w, h);
        Self {
            id: Uuid::new_v4(),
            name,
            canvas: PixelCanvas::from_pixels(source.clone()).with_settings(settings),
            colors,
            tool: settings.default_tool,
            color: settings.default_color,
            line_anchor: None,
            stroke_color: None,
            original: source,
            notices: NoticeThrottle::new(Duration::from_millis(settings.notice_cooldown_ms)),
        }
    }

    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut PixelCanvas {
        &mut self.canvas
    }

    pub fn colors(&self) -> &SharedColorHistory {
        &self.colors
    }

    pub fn tool(&self) -> EditorTool {
        self.tool
    }

    /// Switch tools, abandoning any half-finished line.
    pub fn select_tool(&mut self, tool: EditorTool) {
        self.tool = tool;
        self.line_anchor = None;
        self.stroke_color = None;
    }

    pub fn color(&self) -> Pixel {
        self.color
    }

    /// Choose a drawing colour (palette, hex input) and remember it.
    pub fn set_color(&mut self, color: Pixel) {
        self.color = color;
        self.remember_color();
    }

    pub fn line_anchor(&self) -> Option<(i32, i32)> {
        self.line_anchor
    }

    fn remember_color(&self) {
        self.colors.borrow_mut().add_color(self.color);
    }

    fn in_canvas(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.canvas.width() && (y as u32) < self.canvas.height()
    }

    /// A click at canvas coordinates `(x, y)`. Every editing click records
    /// exactly one undo step before changing pixels.
    pub fn press(&mut self, x: i32, y: i32, button: PointerButton) -> ToolOutcome {
        self.stroke_color = None;
        if !self.in_canvas(x, y) {
            return ToolOutcome::Nothing;
        }
        match self.tool {
            EditorTool::Pencil => {
                let color = match button {
                    PointerButton::Primary => self.color,
                    PointerButton::Secondary => TRANSPARENT,
                };
                self.canvas.save_snapshot();
                self.canvas.draw_pixel(x, y, color);
                self.stroke_color = Some(color);
                self.remember_color();
                ToolOutcome::Painted
            }
            EditorTool::Eraser => {
                if self.canvas.active_layer_is_empty() {
                    return self.layer_empty_notice();
                }
                self.canvas.save_snapshot();
                self.erase(x, y)
            }
            EditorTool::Fill => {
                if self.canvas.pick_color(x, y) == self.color {
                    return ToolOutcome::Nothing;
                }
                self.canvas.save_snapshot();
                self.canvas.flood_fill(x, y, self.color);
                self.remember_color();
                ToolOutcome::Painted
            }
            EditorTool::Eyedropper => {
                self.color = self.canvas.pick_color(x, y);
                ToolOutcome::Picked(self.color)
            }
            EditorTool::Line => match self.line_anchor.take() {
                None => {
                    self.line_anchor = Some((x, y));
                    ToolOutcome::LineStarted
                }
                Some((x0, y0)) => {
                    self.canvas.save_snapshot();
                    self.canvas.draw_line(x0, y0, x, y, self.color);
                    self.remember_color();
                    ToolOutcome::Painted
                }
            },
        }
    }

    /// Pointer moved with the button held: continues a pencil or eraser
    /// stroke inside the undo step its press opened.
    pub fn drag(&mut self, x: i32, y: i32) -> ToolOutcome {
        if !self.in_canvas(x, y) {
            return ToolOutcome::Nothing;
        }
        match self.tool {
            EditorTool::Pencil => match self.stroke_color {
                Some(color) => {
                    self.canvas.draw_pixel(x, y, color);
                    ToolOutcome::Painted
                }
                None => ToolOutcome::Nothing,
            },
            EditorTool::Eraser => self.erase(x, y),
            _ => ToolOutcome::Nothing,
        }
    }

    fn erase(&mut self, x: i32, y: i32) -> ToolOutcome {
        match self.canvas.erase_pixel(x, y) {
            EraseOutcome::Erased => ToolOutcome::Painted,
            EraseOutcome::LayerEmpty => self.layer_empty_notice(),
            EraseOutcome::Skipped => ToolOutcome::Nothing,
        }
    }

    fn layer_empty_notice(&mut self) -> ToolOutcome {
        if self.notices.allow(LAYER_EMPTY_NOTICE, Instant::now()) {
            ToolOutcome::Notice(LAYER_EMPTY_NOTICE)
        } else {
            ToolOutcome::Nothing
        }
    }

    /// Put the active layer back to the pixels the session opened with, as a
    /// single undoable step.
    pub fn reset_to_original(&mut self) {
        self.canvas.save_snapshot();
        if let Err(e) = self.canvas.replace_active_layer(self.original.clone()) {
            crate::log_err!("Session '{}': reset failed: {}", self.name, e);
        }
    }

    pub fn undo(&mut self) -> bool {
        self.canvas.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.canvas.redo()
    }

    pub fn is_dirty(&self) -> bool {
        self.canvas.is_dirty()
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty() {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::colors::ColorHistory;

    const RED: Pixel = 0xFFFF_0000;
    const BLUE: Pixel = 0xFF00_00FF;
    const WHITE: Pixel = 0xFFFF_FFFF;

    fn session(grid: PixelGrid) -> EditSession {
        let settings = EditorSettings {
            default_color: RED,
            ..EditorSettings::default()
        };
        EditSession::new("test", grid, ColorHistory::shared(20), &settings)
    }

    #[test]
    fn throttle_suppresses_repeats_within_cooldown() {
        let mut throttle = NoticeThrottle::new(Duration::from_millis(5000));
        let t0 = Instant::now();
        assert!(throttle.allow("a", t0));
        assert!(!throttle.allow("a", t0 + Duration::from_millis(4999)));
        assert!(throttle.allow("b", t0 + Duration::from_millis(1)));
        assert!(throttle.allow("a", t0 + Duration::from_millis(5000)));
    }

    #[test]
    fn pencil_click_is_one_undo_step() {
        let mut s = session(PixelGrid::new(4, 4));
        assert_eq!(s.press(1, 1, PointerButton::Primary), ToolOutcome::Painted);
        s.drag(2, 1);
        s.drag(3, 1);
        assert_eq!(s.canvas().get_pixel(3, 1), RED);
        assert_eq!(s.canvas().history().undo_count(), 1);
        assert_eq!(s.colors().borrow().colors(), [RED]);

        assert!(s.undo());
        assert!(s.canvas().layer_stack().active_layer().unwrap().is_empty());
    }

    #[test]
    fn secondary_pencil_draws_transparent() {
        let mut s = session(PixelGrid::new_filled(2, 2, WHITE));
        s.press(0, 0, PointerButton::Secondary);
        assert_eq!(s.canvas().get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn drag_keeps_the_pressed_button_colour() {
        let mut s = session(PixelGrid::new_filled(3, 1, WHITE));
        s.press(0, 0, PointerButton::Secondary);
        assert_eq!(s.drag(1, 0), ToolOutcome::Painted);
        assert_eq!(s.canvas().get_pixel(1, 0), TRANSPARENT);
        assert_eq!(s.canvas().history().undo_count(), 1);

        s.press(2, 0, PointerButton::Primary);
        s.drag(1, 0);
        assert_eq!(s.canvas().get_pixel(1, 0), RED);

        s.select_tool(EditorTool::Pencil);
        assert_eq!(s.drag(0, 0), ToolOutcome::Nothing);
        assert_eq!(s.canvas().get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn clicks_outside_canvas_do_nothing() {
        let mut s = session(PixelGrid::new(2, 2));
        assert_eq!(s.press(2, 0, PointerButton::Primary), ToolOutcome::Nothing);
        assert!(!s.canvas().can_undo());
    }

    #[test]
    fn eraser_on_empty_layer_notifies_once() {
        let mut s = session(PixelGrid::new(2, 2));
        s.select_tool(EditorTool::Eraser);
        assert_eq!(
            s.press(0, 0, PointerButton::Primary),
            ToolOutcome::Notice(LAYER_EMPTY_NOTICE)
        );
        assert_eq!(s.press(0, 0, PointerButton::Primary), ToolOutcome::Nothing);
        assert!(!s.canvas().can_undo());
    }

    #[test]
    fn eraser_clears_pixels() {
        let mut s = session(PixelGrid::new_filled(2, 2, WHITE));
        s.select_tool(EditorTool::Eraser);
        assert_eq!(s.press(0, 0, PointerButton::Primary), ToolOutcome::Painted);
        assert_eq!(s.drag(1, 0), ToolOutcome::Painted);
        assert_eq!(s.canvas().get_pixel(1, 0), TRANSPARENT);
        assert_eq!(s.canvas().get_pixel(1, 1), WHITE);
    }

    #[test]
    fn fill_and_eyedropper() {
        let mut s = session(PixelGrid::new_filled(3, 3, WHITE));
        s.select_tool(EditorTool::Fill);
        assert_eq!(s.press(1, 1, PointerButton::Primary), ToolOutcome::Painted);
        assert_eq!(s.canvas().get_pixel(2, 2), RED);
        assert_eq!(s.press(1, 1, PointerButton::Primary), ToolOutcome::Nothing);
        assert_eq!(s.canvas().history().undo_count(), 1);

        s.canvas_mut().layer_stack_mut().add_layer("Top");
        s.set_color(BLUE);
        s.select_tool(EditorTool::Eyedropper);
        assert_eq!(s.press(0, 0, PointerButton::Primary), ToolOutcome::Picked(TRANSPARENT));
        assert_eq!(s.color(), TRANSPARENT);
        assert_eq!(s.colors().borrow().colors(), [BLUE, RED]);
    }

    #[test]
    fn line_takes_two_clicks_and_one_snapshot() {
        let mut s = session(PixelGrid::new(5, 5));
        s.select_tool(EditorTool::Line);
        assert_eq!(s.press(0, 0, PointerButton::Primary), ToolOutcome::LineStarted);
        assert_eq!(s.line_anchor(), Some((0, 0)));
        assert!(!s.canvas().can_undo());

        assert_eq!(s.press(4, 4, PointerButton::Primary), ToolOutcome::Painted);
        assert_eq!(s.line_anchor(), None);
        assert_eq!(s.canvas().history().undo_count(), 1);
        assert!((0..5).all(|i| s.canvas().get_pixel(i, i) == RED));

        s.press(1, 0, PointerButton::Primary);
        s.select_tool(EditorTool::Line);
        assert_eq!(s.line_anchor(), None);
    }

    #[test]
    fn reset_restores_source_and_is_undoable() {
        let mut s = session(PixelGrid::new_filled(2, 2, WHITE));
        s.press(0, 0, PointerButton::Primary);
        s.reset_to_original();
        assert_eq!(s.canvas().get_pixel(0, 0), WHITE);
        assert!(s.undo());
        assert_eq!(s.canvas().get_pixel(0, 0), RED);
    }

    #[test]
    fn sessions_share_color_history() {
        let shared = ColorHistory::shared(20);
        let settings = EditorSettings::default();
        let mut a = EditSession::new("a", PixelGrid::new(1, 1), shared.clone(), &settings);
        let b = EditSession::new("b", PixelGrid::new(1, 1), shared.clone(), &settings);
        a.set_color(BLUE);
        assert_eq!(b.colors().borrow().most_recent(), Some(BLUE));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn title_marks_unsaved_changes() {
        let mut s = session(PixelGrid::new(1, 1));
        assert_eq!(s.display_title(), "test");
        s.press(0, 0, PointerButton::Primary);
        assert_eq!(s.display_title(), "test*");
        s.canvas_mut().set_dirty(false);
        assert_eq!(s.display_title(), "test");
    }
}
