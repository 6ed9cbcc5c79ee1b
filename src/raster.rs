//! Image to raster command conversion.
//!
//! The output is a complete command buffer for the printer firmware:
//!
//! ```text
//! 1B 40                  ESC @      reset
//! 1D 76 30 00            GS v 0     raster bit image, normal density
//! xL xH                  width in bytes, little endian
//! yL yH                  height in dots, little endian
//! d1 ... dk              k = width_bytes * height, MSB = leftmost dot
//! 0A 0A                  two line feeds to flush the head
//! ```

use image::{
    imageops::{self, FilterType},
    DynamicImage, Rgba, RgbaImage,
};
use log::debug;

use crate::{error::Error, media::Geometry};

/// Extra dots appended to the right of every raster row.
///
/// The target printer family expects the declared raster to be 125 dots wider
/// than the printable area. The margin is always sent unprinted.
pub const PADDING_MARGIN: u32 = 125;

/// Gray values strictly below this are printed black.
pub const DEFAULT_THRESHOLD: u8 = 128;

pub const RESET: [u8; 2] = [0x1B, 0x40];
pub const RASTER_MODE: [u8; 4] = [0x1D, 0x76, 0x30, 0x00];
pub const TRAILER: [u8; 2] = [0x0A, 0x0A];

/// Length of reset + raster mode selector + width + height.
pub const HEADER_LEN: usize = RESET.len() + RASTER_MODE.len() + 4;

/// Converts images into raster command buffers for a fixed label geometry.
///
/// Pure and cheap to copy, so it can be shared freely between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rasterizer {
    geometry: Geometry,
    threshold: u8,
}

impl Rasterizer {
    /// Geometry larger than the raster header can describe is clamped.
    pub fn new(geometry: Geometry) -> Self {
        Rasterizer {
            geometry: geometry.clamped(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn threshold(self, threshold: u8) -> Self {
        Rasterizer { threshold, ..self }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Raster width declared to the printer: printable width plus the margin.
    pub fn working_width(&self) -> u32 {
        self.geometry.width + PADDING_MARGIN
    }

    pub fn width_bytes(&self) -> u32 {
        (self.working_width() + 7) / 8
    }

    /// Resample, threshold and pack `image` into a command buffer.
    ///
    /// Never fails. The image is stretched to the geometry regardless of its
    /// aspect ratio.
    pub fn rasterize(&self, image: &DynamicImage) -> Vec<u8> {
        let resampled = self.resample(image);
        let (width, height) = resampled.dimensions();
        let width_bytes = (width + PADDING_MARGIN + 7) / 8;

        debug!(
            "rasterize {}x{} -> {}x{} ({} bytes per row, threshold {})",
            image.width(),
            image.height(),
            width,
            height,
            width_bytes,
            self.threshold
        );

        let payload_len = (width_bytes * height) as usize;
        let mut buf: Vec<u8> = Vec::with_capacity(HEADER_LEN + payload_len + TRAILER.len());

        buf.extend_from_slice(&RESET);
        buf.extend_from_slice(&RASTER_MODE);
        // Both fit 16 bits because the geometry is clamped.
        buf.extend_from_slice(&(width_bytes as u16).to_le_bytes());
        buf.extend_from_slice(&(height as u16).to_le_bytes());

        for y in 0..height {
            for x_byte in 0..width_bytes {
                let mut byte: u8 = 0x00;
                for bit in 0..8 {
                    let x = x_byte * 8 + bit;
                    // Dots in the padding margin stay white.
                    if x < width && gray(resampled.get_pixel(x, y)) < self.threshold {
                        byte |= 1 << (7 - bit);
                    }
                }
                buf.push(byte);
            }
        }

        buf.extend_from_slice(&TRAILER);
        buf
    }

    fn resample(&self, image: &DynamicImage) -> RgbaImage {
        let Geometry { width, height } = self.geometry;

        if self.geometry.is_empty() || image.width() == 0 || image.height() == 0 {
            return RgbaImage::from_pixel(width, height, Rgba([0xFF; 4]));
        }

        imageops::resize(&image.to_rgba8(), width, height, FilterType::CatmullRom)
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(Geometry::default())
    }
}

/// Rasterize with the default label geometry and threshold.
pub fn rasterize(image: &DynamicImage) -> Vec<u8> {
    Rasterizer::default().rasterize(image)
}

/// Luma of an alpha-premultiplied pixel, ITU-R 601 weights on 16 bit channels.
///
/// Transparent pixels come out black, so a PNG with a transparent background
/// prints as a solid block.
pub fn gray(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, a] = pixel.0;
    let alpha = u32::from(a) * 0x101;
    let premultiply = |c: u8| u32::from(c) * 0x101 * alpha / 0xFFFF;

    let y = (19595 * premultiply(r) + 38470 * premultiply(g) + 7471 * premultiply(b) + (1 << 15))
        >> 24;
    y as u8
}

/// Read-only view over a command buffer produced by [`Rasterizer`].
#[derive(Debug, Clone, Copy)]
pub struct Raster<'a> {
    width_bytes: u16,
    height: u16,
    payload: &'a [u8],
}

impl<'a> Raster<'a> {
    /// Check the framing of `buf` and split out its header fields and payload.
    pub fn parse(buf: &'a [u8]) -> Result<Self, Error> {
        if buf.len() < HEADER_LEN + TRAILER.len() {
            return Err(Error::InvalidRaster(format!(
                "buffer too short: {} bytes",
                buf.len()
            )));
        }
        if buf[..2] != RESET || buf[2..6] != RASTER_MODE {
            return Err(Error::InvalidRaster(format!(
                "unexpected header {:02X?}",
                &buf[..6]
            )));
        }

        let width_bytes = u16::from_le_bytes([buf[6], buf[7]]);
        let height = u16::from_le_bytes([buf[8], buf[9]]);
        let payload_len = usize::from(width_bytes) * usize::from(height);
        let expected = HEADER_LEN + payload_len + TRAILER.len();

        if buf.len() != expected {
            return Err(Error::InvalidRaster(format!(
                "expected {} bytes for {}x{} raster, got {}",
                expected,
                width_bytes,
                height,
                buf.len()
            )));
        }
        if buf[expected - TRAILER.len()..] != TRAILER {
            return Err(Error::InvalidRaster("missing trailing line feeds".to_string()));
        }

        Ok(Raster {
            width_bytes,
            height,
            payload: &buf[HEADER_LEN..HEADER_LEN + payload_len],
        })
    }

    pub fn width_bytes(&self) -> u16 {
        self.width_bytes
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        // chunks() panics on zero, and a zero-width raster has no payload anyway.
        self.payload.chunks(usize::from(self.width_bytes).max(1))
    }

    /// Whether the dot at (`x`, `y`) will be printed black.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        if x >= u32::from(self.width_bytes) * 8 || y >= u32::from(self.height) {
            return false;
        }
        let index = y as usize * usize::from(self.width_bytes) + (x / 8) as usize;
        self.payload[index] & (0x80 >> (x % 8)) != 0
    }
}
