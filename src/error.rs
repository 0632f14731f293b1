use thiserror::Error;

/// Structural misuse of a layer stack or canvas.
///
/// Every operation that returns one of these leaves its receiver exactly as
/// it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cannot remove the last remaining layer")]
    LastLayer,

    #[error("layer index {index} out of range (stack has {len} layers)")]
    LayerIndexOutOfRange { index: usize, len: usize },

    #[error("pixel data is {}x{}, expected {}x{}", actual.0, actual.1, expected.0, expected.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("expected {expected} pixels, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
}
