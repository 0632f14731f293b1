use std::cell::RefCell;
use std::rc::Rc;

use crate::canvas::{Pixel, channels};

/// Default number of remembered colours.
pub const DEFAULT_HISTORY_SIZE: usize = 20;

// ============================================================================
// ColorHistory — most-recently-used colours
// ============================================================================

/// Bounded, duplicate-free list of recently used colours, most recent first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorHistory {
    colors: Vec<Pixel>,
    max_size: usize,
}

/// One history shared by every session in the process.
///
/// `Rc<RefCell<_>>` confines it to the editing thread; hosts that run
/// sessions on several threads must wrap their own lock around it instead.
pub type SharedColorHistory = Rc<RefCell<ColorHistory>>;

impl Default for ColorHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl ColorHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            colors: Vec::with_capacity(max_size),
            max_size,
        }
    }

    /// Convenience constructor for the process-wide shared instance.
    pub fn shared(max_size: usize) -> SharedColorHistory {
        Rc::new(RefCell::new(Self::new(max_size)))
    }

    /// Move `color` to the front, dropping any earlier occurrence and
    /// trimming the oldest entries past the bound.
    pub fn add_color(&mut self, color: Pixel) {
        self.colors.retain(|&c| c != color);
        self.colors.insert(0, color);
        self.colors.truncate(self.max_size);
    }

    /// Most recent first.
    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    pub fn most_recent(&self) -> Option<Pixel> {
        self.colors.first().copied()
    }

    pub fn size(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

// ============================================================================
// Hex helpers
// ============================================================================

/// Format as `#AARRGGBB`.
pub fn format_hex(color: Pixel) -> String {
    let [a, r, g, b] = channels(color);
    format!("#{:02X}{:02X}{:02X}{:02X}", a, r, g, b)
}

/// Parse `#RRGGBB` (opaque) or `#AARRGGBB`; the `#` is optional.
pub fn parse_hex(text: &str) -> Option<Pixel> {
    let hex = text.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        6 => Some(0xFF00_0000 | value),
        8 => Some(value),
        _ => None,
    }
}
