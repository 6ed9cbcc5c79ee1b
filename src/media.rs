/// Printable area of the installed label stock, in device pixels.
///
/// The rasterizer always resamples to exactly this size, whatever the aspect
/// ratio of the input. Pre-crop the image if distortion matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    /// 48mm x 24mm label at 203 DPI.
    pub const LABEL_48X24: Geometry = Geometry {
        width: 384,
        height: 192,
    };

    /// Widest printable area whose raster width, margin included, still
    /// fits the 16 bit width-in-bytes header field.
    pub const MAX_WIDTH: u32 = u16::MAX as u32 * 8 - crate::raster::PADDING_MARGIN;

    /// Tallest raster the 16 bit height header field can describe.
    pub const MAX_HEIGHT: u32 = u16::MAX as u32;

    pub fn new(width: u32, height: u32) -> Self {
        Geometry { width, height }
    }

    /// Limit both sides to what the raster header can carry.
    pub fn clamped(self) -> Self {
        Geometry {
            width: self.width.min(Self::MAX_WIDTH),
            height: self.height.min(Self::MAX_HEIGHT),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::LABEL_48X24
    }
}
