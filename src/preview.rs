//! Render a command buffer back into an image for inspection.

use image::{GrayImage, Luma};

use crate::{error::Error, raster::Raster};

/// Draw what the printer will put on paper: black dots as 0, everything else
/// as 255. The image covers the full declared raster, padding margin included.
pub fn render(buf: &[u8]) -> Result<GrayImage, Error> {
    let raster = Raster::parse(buf)?;
    let width = u32::from(raster.width_bytes()) * 8;
    let height = u32::from(raster.height());

    Ok(GrayImage::from_fn(width, height, |x, y| {
        if raster.is_black(x, y) {
            Luma([0x00])
        } else {
            Luma([0xFF])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{media::Geometry, raster::Rasterizer};
    use image::DynamicImage;

    #[test]
    fn black_label_shows_white_margin() {
        let geometry = Geometry::new(16, 4);
        let black = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 4, Luma([0])));
        let buf = Rasterizer::new(geometry).rasterize(&black);

        let image = render(&buf).unwrap();
        // 16 + 125 = 141 dots, rounded up to 18 bytes.
        assert_eq!(image.dimensions(), (144, 4));
        assert_eq!(image.get_pixel(0, 0), &Luma([0]));
        assert_eq!(image.get_pixel(15, 3), &Luma([0]));
        assert_eq!(image.get_pixel(16, 0), &Luma([0xFF]));
        assert_eq!(image.get_pixel(143, 3), &Luma([0xFF]));
    }

    #[test]
    fn rejects_foreign_bytes() {
        assert!(matches!(
            render(b"hello, printer"),
            Err(Error::InvalidRaster(_))
        ));
    }
}
