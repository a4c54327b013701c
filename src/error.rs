use std::time::Duration;

/// Everything that can go wrong while loading a scene or producing a frame.
///
/// Only `InvalidColorComponent` and `OutOfBoundsPixel` can arise per pixel;
/// the frame driver records those and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("color component {channel} is {value}, expected a number in [0, 255]")]
    InvalidColorComponent { channel: char, value: f64 },

    #[error("pixel ({x}, {y}) lies outside the {width}x{height} raster")]
    OutOfBoundsPixel { x: usize, y: usize, width: usize, height: usize },

    #[error("degenerate ellipsoid: {reason}")]
    DegenerateEllipsoid { reason: String },

    #[error("invalid ellipsoid record #{index}: {source}")]
    InvalidEllipsoid {
        index: usize,
        #[source]
        source: Box<RenderError>,
    },

    #[error("scene did not finish loading within {0:?}")]
    LoadTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("a {width}x{height} canvas is too large to export")]
    ImageTooLarge { width: usize, height: usize },

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("a render worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, RenderError>;
