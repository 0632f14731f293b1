use std::cell::OnceCell;

use crate::canvas::{Layer, LayerStack, Pixel, PixelGrid, TRANSPARENT};
use crate::components::history::{HistoryManager, LayerSnapshot};
use crate::components::tools::{BresenhamLine, flood_fill};
use crate::error::EditError;
use crate::settings::EditorSettings;

/// Result of an erase request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseOutcome {
    /// The pixel was cleared.
    Erased,
    /// Nothing to erase: the active layer is already fully transparent.
    LayerEmpty,
    /// No active layer or the coordinate is outside the canvas.
    Skipped,
}

/// Editable image: a layer stack, per-layer undo/redo and a lazily
/// recomputed composite.
///
/// Drawing operations target the active layer only; reads through
/// [`get_pixel`](Self::get_pixel) see the composite of all visible layers.
/// Callers take a snapshot with [`save_snapshot`](Self::save_snapshot)
/// before each gesture; nothing here snapshots automatically.
#[derive(Debug)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    layers: LayerStack,
    history: HistoryManager,
    /// Flattened layers; empty means stale.
    composite: OnceCell<PixelGrid>,
    dirty: bool,
}

impl PixelCanvas {
    /// Blank canvas with a single transparent "Base" layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_layers(LayerStack::new(width, height))
    }

    /// Canvas whose "Base" layer is the host-supplied pixel source.
    pub fn from_pixels(base: PixelGrid) -> Self {
        Self::from_layers(LayerStack::from_pixels(base))
    }

    fn from_layers(layers: LayerStack) -> Self {
        Self {
            width: layers.width(),
            height: layers.height(),
            layers,
            history: HistoryManager::default(),
            composite: OnceCell::new(),
            dirty: false,
        }
    }

    /// Apply the configured undo depth.
    pub fn with_settings(mut self, settings: &EditorSettings) -> Self {
        self.set_max_undo(settings.max_undo_steps);
        self
    }

    pub fn set_max_undo(&mut self, max_undo: usize) {
        self.history.set_capacity(max_undo);
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn layer_stack(&self) -> &LayerStack {
        &self.layers
    }

    /// Mutable access for structural edits (add/remove/reorder/visibility).
    /// The composite is invalidated up front since any of these can change it.
    pub fn layer_stack_mut(&mut self) -> &mut LayerStack {
        self.invalidate_cache();
        &mut self.layers
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Drop the cached composite; the next read recomputes it.
    pub fn invalidate_cache(&mut self) {
        self.composite.take();
    }

    fn mark_changed(&mut self) {
        self.dirty = true;
        self.invalidate_cache();
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    // ---- composite reads ----------------------------------------------------

    /// All visible layers flattened, recomputed only after a change.
    pub fn get_pixels(&self) -> &PixelGrid {
        self.composite.get_or_init(|| self.layers.flatten())
    }

    /// Composited colour at `(x, y)`; transparent outside the canvas.
    pub fn get_pixel(&self, x: i32, y: i32) -> Pixel {
        if !self.in_bounds(x, y) {
            return TRANSPARENT;
        }
        self.get_pixels().get_pixel(x, y)
    }

    // ---- undo / redo --------------------------------------------------------

    /// Record the active layer's current pixels as an undo step. Clears redo.
    pub fn save_snapshot(&mut self) {
        let index = self.layers.active_index();
        if let Some(layer) = self.layers.active_layer() {
            self.history.push(LayerSnapshot::capture(index, layer));
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the most recent undo step. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_undo() else {
            return false;
        };
        if let Some(current) = self.swap_in(snapshot) {
            self.history.push_redo(current);
        }
        self.mark_changed();
        true
    }

    /// Re-apply the most recently undone step. Returns false when there is none.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop_redo() else {
            return false;
        };
        if let Some(current) = self.swap_in(snapshot) {
            self.history.push_undo(current);
        }
        self.mark_changed();
        true
    }

    /// Write a snapshot back into the layer at its recorded index, returning
    /// the pixels it replaced. A layer that no longer exists is skipped.
    fn swap_in(&mut self, snapshot: LayerSnapshot) -> Option<LayerSnapshot> {
        let index = snapshot.layer_index();
        let layer = self.layers.layer_mut(index)?;
        let current = LayerSnapshot::capture(index, layer);
        layer.restore(snapshot.into_pixels()).ok()?;
        Some(current)
    }

    // ---- drawing tools ------------------------------------------------------

    fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.active_layer_mut()
    }

    /// Write to the active layer.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Pixel) {
        if !self.in_bounds(x, y) {
            return;
        }
        let Some(layer) = self.active_layer_mut() else {
            return;
        };
        layer.set_pixel(x, y, color);
        self.mark_changed();
    }

    /// Pencil.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Pixel) {
        self.set_pixel(x, y, color);
    }

    pub fn active_layer_is_empty(&self) -> bool {
        self.layers.active_layer().is_none_or(Layer::is_empty)
    }

    /// Clear a pixel on the active layer. An already-empty layer is reported
    /// rather than touched.
    pub fn erase_pixel(&mut self, x: i32, y: i32) -> EraseOutcome {
        let Some(layer) = self.layers.active_layer() else {
            return EraseOutcome::Skipped;
        };
        if layer.is_empty() {
            return EraseOutcome::LayerEmpty;
        }
        if !self.in_bounds(x, y) {
            return EraseOutcome::Skipped;
        }
        self.set_pixel(x, y, TRANSPARENT);
        EraseOutcome::Erased
    }

    /// Exact-match 4-connected fill on the active layer. Returns the number
    /// of pixels repainted.
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Pixel) -> usize {
        let Some(layer) = self.active_layer_mut() else {
            return 0;
        };
        let filled = flood_fill(layer, x, y, color);
        if filled > 0 {
            self.mark_changed();
        }
        filled
    }

    /// Bresenham line on the active layer, both endpoints included. Points
    /// that fall outside the canvas are dropped individually.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Pixel) {
        for (x, y) in BresenhamLine::new((x0, y0), (x1, y1)) {
            self.set_pixel(x, y, color);
        }
    }

    /// Eyedropper: the active layer's own pixel, not the composite.
    pub fn pick_color(&self, x: i32, y: i32) -> Pixel {
        match self.layers.active_layer() {
            Some(layer) => layer.get_pixel(x, y),
            None => self.get_pixel(x, y),
        }
    }

    /// Overwrite the whole active layer with `pixels` (same size required).
    pub fn replace_active_layer(&mut self, pixels: PixelGrid) -> Result<(), EditError> {
        let (index, len) = (self.layers.active_index(), self.layers.len());
        let layer = self
            .layers
            .layer_mut(index)
            .ok_or(EditError::LayerIndexOutOfRange { index, len })?;
        layer.restore(pixels)?;
        self.mark_changed();
        Ok(())
    }
}
