//! Layered raster editing kernel.
//!
//! A [`PixelCanvas`] owns a [`LayerStack`] of fixed-size ARGB layers,
//! composites the visible ones on demand and keeps bounded per-layer
//! undo/redo. Drawing tools (pencil, eraser, flood fill, line, eyedropper)
//! act on the active layer. [`EditSession`] wires a canvas to tool state and
//! the process-wide [`ColorHistory`].

#[macro_use]
pub mod logger;

pub mod canvas;
pub mod components;
pub mod error;
pub mod pixel_canvas;
pub mod session;
pub mod settings;

pub use canvas::{Layer, LayerStack, Pixel, PixelGrid, TRANSPARENT, argb, blend_over};
pub use components::colors::{ColorHistory, SharedColorHistory};
pub use components::history::{HistoryManager, LayerSnapshot};
pub use components::tools::{EditorTool, PointerButton};
pub use error::EditError;
pub use pixel_canvas::{EraseOutcome, PixelCanvas};
pub use session::{EditSession, ToolOutcome};
pub use settings::EditorSettings;
