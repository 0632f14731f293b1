use std::collections::VecDeque;

use crate::canvas::{Layer, PixelGrid};

/// Default number of undo steps kept.
pub const DEFAULT_MAX_UNDO: usize = 50;

// ============================================================================
// LAYER SNAPSHOT
// ============================================================================

/// Full copy of one layer's pixels, addressed by stack index.
///
/// The index is positional: if layers are reordered or removed between the
/// capture and the undo, it may name a different logical layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSnapshot {
    layer_index: usize,
    pixels: PixelGrid,
}

impl LayerSnapshot {
    pub fn capture(layer_index: usize, layer: &Layer) -> Self {
        Self {
            layer_index,
            pixels: layer.snapshot(),
        }
    }

    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    pub fn pixels(&self) -> &PixelGrid {
        &self.pixels
    }

    pub fn into_pixels(self) -> PixelGrid {
        self.pixels
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.memory_bytes()
    }
}

// ============================================================================
// HISTORY MANAGER - bounded undo/redo stacks
// ============================================================================

/// Undo/redo stacks of layer snapshots. The newest entry sits at the back
/// of each deque; overflow evicts from the front (oldest first).
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<LayerSnapshot>,
    redo_stack: VecDeque<LayerSnapshot>,
    max_history_size: usize,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            total_memory: 0,
        }
    }

    /// Record a new edit. Clears the redo stack.
    pub fn push(&mut self, snapshot: LayerSnapshot) {
        for snap in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
        }
        self.push_undo(snapshot);
    }

    /// Push onto the undo stack without touching redo (used by redo).
    pub fn push_undo(&mut self, snapshot: LayerSnapshot) {
        self.total_memory += snapshot.memory_size();
        self.undo_stack.push_back(snapshot);
        self.prune();
    }

    pub fn push_redo(&mut self, snapshot: LayerSnapshot) {
        self.total_memory += snapshot.memory_size();
        self.redo_stack.push_back(snapshot);
    }

    pub fn pop_undo(&mut self) -> Option<LayerSnapshot> {
        let snap = self.undo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
        Some(snap)
    }

    pub fn pop_redo(&mut self) -> Option<LayerSnapshot> {
        let snap = self.redo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
        Some(snap)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_history_size
    }

    /// Change the depth limit, evicting the oldest entries if it shrinks.
    /// Change the undo depth; never below one step.
    pub fn set_capacity(&mut self, max_history_size: usize) {
        self.max_history_size = max_history_size.max(1);
        self.prune();
    }

    /// Bytes held by both stacks (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
    }
}
