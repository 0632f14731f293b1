use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::EditError;
use crate::{log_info, log_warn};

// ============================================================================
// PIXELS – 32-bit ARGB packed as 0xAARRGGBB
// ============================================================================

/// A packed ARGB pixel: alpha in the top byte, then red, green, blue.
pub type Pixel = u32;

/// Fully transparent pixel, returned for every out-of-bounds read.
pub const TRANSPARENT: Pixel = 0x0000_0000;

#[inline]
pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Pixel {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub const fn alpha(p: Pixel) -> u8 {
    (p >> 24) as u8
}

/// Split a pixel into `[a, r, g, b]`.
#[inline]
pub const fn channels(p: Pixel) -> [u8; 4] {
    [(p >> 24) as u8, (p >> 16) as u8, (p >> 8) as u8, p as u8]
}

/// Convert to the `image` crate's RGBA ordering.
#[inline]
pub fn to_rgba(p: Pixel) -> Rgba<u8> {
    let [a, r, g, b] = channels(p);
    Rgba([r, g, b, a])
}

#[inline]
pub fn from_rgba(px: Rgba<u8>) -> Pixel {
    let [r, g, b, a] = px.0;
    argb(a, r, g, b)
}

/// Source-over blend of `src` onto `dst` with straight (non-premultiplied)
/// alpha, in integer arithmetic with truncating division.
pub fn blend_over(src: Pixel, dst: Pixel) -> Pixel {
    let [src_a, src_r, src_g, src_b] = channels(src).map(u32::from);
    // Fast paths: nothing to paint, or an opaque overwrite
    if src_a == 0 {
        return dst;
    }
    if src_a == 255 {
        return src;
    }

    let [dst_a, dst_r, dst_g, dst_b] = channels(dst).map(u32::from);
    let inv = 255 - src_a;
    let out_a = src_a + dst_a * inv / 255;
    if out_a == 0 {
        return TRANSPARENT;
    }

    let channel = |s: u32, d: u32| -> u8 {
        ((s * src_a + d * dst_a * inv / 255) / out_a).min(255) as u8
    };
    argb(
        out_a.min(255) as u8,
        channel(src_r, dst_r),
        channel(src_g, dst_g),
        channel(src_b, dst_b),
    )
}

// ============================================================================
// PIXEL GRID – contiguous row-major raster
// ============================================================================

/// Fixed-size raster stored as one contiguous buffer indexed by `y * width + x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Create a fully transparent grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self::new_filled(width, height, TRANSPARENT)
    }

    pub fn new_filled(width: u32, height: u32, color: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wrap an existing row-major buffer supplied by the host.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self, EditError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(EditError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Import from an `image` RGBA buffer.
    pub fn from_rgba_image(src: &RgbaImage) -> Self {
        Self {
            width: src.width(),
            height: src.height(),
            pixels: src.pixels().map(|px| from_rgba(*px)).collect(),
        }
    }

    /// Export to an `image` RGBA buffer.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (dst, &src) in out.pixels_mut().zip(&self.pixels) {
            *dst = to_rgba(src);
        }
        out
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Flat index of `(x, y)`, or `None` when outside the grid.
    #[inline]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Pixel {
        self.index_of(x, y).map_or(TRANSPARENT, |i| self.pixels[i])
    }

    /// Write a pixel; out-of-bounds writes are dropped.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Pixel) {
        if let Some(i) = self.index_of(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn as_slice(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn as_mut_slice(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn fill(&mut self, color: Pixel) {
        self.pixels.fill(color);
    }

    /// True when every pixel has zero alpha.
    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|&p| alpha(p) == 0)
    }

    /// Approximate memory usage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Pixel>()
    }
}

// ============================================================================
// LAYER
// ============================================================================

#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pixels: PixelGrid,
}

impl Layer {
    /// New blank (fully transparent) layer.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::from_pixels(name, PixelGrid::new(width, height))
    }

    pub fn from_pixels(name: impl Into<String>, pixels: PixelGrid) -> Self {
        Self {
            name: name.into(),
            visible: true,
            pixels,
        }
    }

    pub fn width(&self) -> u32 { self.pixels.width() }

    pub fn height(&self) -> u32 { self.pixels.height() }

    pub fn get_pixel(&self, x: i32, y: i32) -> Pixel {
        self.pixels.get_pixel(x, y)
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Pixel) {
        self.pixels.put_pixel(x, y, color);
    }

    pub fn pixels(&self) -> &PixelGrid {
        &self.pixels
    }

    /// True iff every pixel is fully transparent.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_transparent()
    }

    /// Full copy of the pixel data.
    pub fn snapshot(&self) -> PixelGrid {
        self.pixels.clone()
    }

    /// Replace the whole grid. A grid of a different size is rejected and
    /// the layer is left untouched.
    pub fn restore(&mut self, pixels: PixelGrid) -> Result<(), EditError> {
        if pixels.dimensions() != self.pixels.dimensions() {
            let err = EditError::DimensionMismatch {
                expected: self.pixels.dimensions(),
                actual: pixels.dimensions(),
            };
            log_warn!("Layer '{}': restore rejected: {}", self.name, err);
            return Err(err);
        }
        self.pixels = pixels;
        Ok(())
    }
}

// ============================================================================
// LAYER STACK
// ============================================================================

/// Ordered layers, bottom (index 0) to top, with an active-layer cursor.
///
/// The stack is never empty and `active_index` always names an existing
/// layer.
#[derive(Clone, Debug)]
pub struct LayerStack {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    active_index: usize,
}

impl LayerStack {
    /// Stack with a single blank "Base" layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_pixels(PixelGrid::new(width, height))
    }

    /// Stack whose "Base" layer is the given pixel source; the stack takes
    /// its dimensions from the grid.
    pub fn from_pixels(base: PixelGrid) -> Self {
        let (width, height) = base.dimensions();
        Self {
            width,
            height,
            layers: vec![Layer::from_pixels("Base", base)],
            active_index: 0,
        }
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn set_active_index(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.layers.len() {
            return Err(self.out_of_range(index));
        }
        self.active_index = index;
        Ok(())
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_index)
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.get_mut(self.active_index)
    }

    /// Append a blank layer on top and make it active.
    pub fn add_layer(&mut self, name: impl Into<String>) {
        let layer = Layer::new(name, self.width, self.height);
        log_info!("Add layer '{}' at {}", layer.name, self.layers.len());
        self.layers.push(layer);
        self.active_index = self.layers.len() - 1;
    }

    /// Insert a blank layer directly above the active one and make it active.
    pub fn add_layer_above_active(&mut self, name: impl Into<String>) {
        let layer = Layer::new(name, self.width, self.height);
        let insert_at = (self.active_index + 1).min(self.layers.len());
        log_info!("Add layer '{}' at {}", layer.name, insert_at);
        self.layers.insert(insert_at, layer);
        self.active_index = insert_at;
    }

    pub fn remove_layer(&mut self, index: usize) -> Result<(), EditError> {
        if self.layers.len() <= 1 {
            log_warn!("LayerStack: refusing to remove the last layer");
            return Err(EditError::LastLayer);
        }
        if index >= self.layers.len() {
            return Err(self.out_of_range(index));
        }
        let removed = self.layers.remove(index);
        log_info!("Remove layer '{}' at {}", removed.name, index);
        if self.active_index >= self.layers.len() {
            self.active_index = self.layers.len() - 1;
        }
        Ok(())
    }

    /// Swap the layer at `index` with the one above it (toward the top of
    /// paint order). Returns false at the top boundary or for a bad index.
    pub fn move_layer_up(&mut self, index: usize) -> bool {
        if index + 1 >= self.layers.len() {
            return false;
        }
        self.swap_adjacent(index, index + 1);
        true
    }

    /// Swap the layer at `index` with the one below it. Returns false at the
    /// bottom boundary or for a bad index.
    pub fn move_layer_down(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.layers.len() {
            return false;
        }
        self.swap_adjacent(index - 1, index);
        true
    }

    /// Keeps the cursor on the same logical layer.
    fn swap_adjacent(&mut self, lower: usize, upper: usize) {
        self.layers.swap(lower, upper);
        if self.active_index == lower {
            self.active_index = upper;
        } else if self.active_index == upper {
            self.active_index = lower;
        }
    }

    /// Composite every visible layer bottom-to-top with source-over.
    /// Rows are processed in parallel; within a pixel the fold order is fixed.
    pub fn flatten(&self) -> PixelGrid {
        let mut result = PixelGrid::new(self.width, self.height);
        let row_len = self.width as usize;
        if row_len == 0 {
            return result;
        }

        let visible: Vec<&[Pixel]> = self
            .layers
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.pixels.as_slice())
            .collect();

        result
            .as_mut_slice()
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let start = y * row_len;
                for src_pixels in &visible {
                    let src_row = &src_pixels[start..start + row_len];
                    for (dst, &src) in row.iter_mut().zip(src_row) {
                        *dst = blend_over(src, *dst);
                    }
                }
            });

        result
    }

    fn out_of_range(&self, index: usize) -> EditError {
        let err = EditError::LayerIndexOutOfRange {
            index,
            len: self.layers.len(),
        };
        log_warn!("LayerStack: {}", err);
        err
    }
}
