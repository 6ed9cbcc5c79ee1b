//! # Raster Command Tests
//!
//! Checks the command stream against the byte layout the printer firmware
//! expects, using images decoded from real PNG bytes.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use label_agent::{
    raster::{HEADER_LEN, RASTER_MODE, RESET, TRAILER},
    rasterize, Geometry, Raster, Rasterizer, PADDING_MARGIN,
};
use pretty_assertions::assert_eq;
use std::io::Cursor;

/// Bytes per row that carry image dots for the default label (384 / 8).
const IMAGE_BYTES: usize = 48;

fn png(image: DynamicImage) -> DynamicImage {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    image::load_from_memory(bytes.get_ref()).unwrap()
}

fn solid_gray(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
}

#[test]
fn black_label_end_to_end() {
    let buf = rasterize(&png(solid_gray(384, 192, 0x00)));

    assert_eq!(buf.len(), 8 + 64 * 192 + 2);
    assert_eq!(
        &buf[..HEADER_LEN],
        &[0x1B, 0x40, 0x1D, 0x76, 0x30, 0x00, 64, 0, 192, 0]
    );
    assert_eq!(&buf[buf.len() - 2..], &[0x0A, 0x0A]);

    let raster = Raster::parse(&buf).unwrap();
    for row in raster.rows() {
        assert!(row[..IMAGE_BYTES].iter().all(|&b| b == 0xFF));
        assert!(row[IMAGE_BYTES..].iter().all(|&b| b == 0x00));
    }
}

#[test]
fn single_white_pixel_fills_label_with_nothing() {
    let buf = rasterize(&png(solid_gray(1, 1, 0xFF)));
    let black = rasterize(&png(solid_gray(384, 192, 0x00)));

    assert_eq!(&buf[..HEADER_LEN], &black[..HEADER_LEN]);
    assert_eq!(buf.len(), black.len());

    let raster = Raster::parse(&buf).unwrap();
    assert!(raster.payload().iter().all(|&b| b == 0x00));
}

#[test]
fn header_prefixes_are_constant() {
    let inputs = [
        solid_gray(1, 1, 0x00),
        solid_gray(1000, 20, 0x80),
        DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 300, Rgb([200, 10, 10]))),
    ];

    for image in inputs.iter() {
        let buf = rasterize(image);
        assert_eq!(&buf[..2], &RESET);
        assert_eq!(&buf[2..6], &RASTER_MODE);
        assert_eq!(&buf[buf.len() - 2..], &TRAILER);
    }
}

#[test]
fn payload_length_follows_working_width() {
    for &(width, height) in &[(384, 192), (203, 100), (8, 1), (1, 1), (576, 24)] {
        let rasterizer = Rasterizer::new(Geometry::new(width, height));
        let buf = rasterizer.rasterize(&solid_gray(50, 50, 0x00));
        let raster = Raster::parse(&buf).unwrap();

        let width_bytes = (width + PADDING_MARGIN + 7) / 8;
        assert_eq!(u32::from(raster.width_bytes()), width_bytes);
        assert_eq!(u32::from(raster.height()), height);
        assert_eq!(raster.payload().len(), (width_bytes * height) as usize);
    }
}

#[test]
fn width_and_height_are_little_endian() {
    // 2000 + 125 = 2125 dots -> 266 bytes, 300 rows.
    let buf = Rasterizer::new(Geometry::new(2000, 300)).rasterize(&solid_gray(2, 2, 0xFF));

    assert_eq!(&buf[6..10], &[0x0A, 0x01, 0x2C, 0x01]);
    assert_eq!(u16::from_le_bytes([buf[6], buf[7]]), 266);
    assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 300);
}

#[test]
fn margin_is_never_printed() {
    let geometry = Geometry::new(100, 40);
    let mut noise = GrayImage::new(64, 64);
    for (x, y, pixel) in noise.enumerate_pixels_mut() {
        *pixel = Luma([((x * 37 + y * 91) % 256) as u8]);
    }

    for image in [solid_gray(5, 5, 0x00), DynamicImage::ImageLuma8(noise)].iter() {
        let buf = Rasterizer::new(geometry).rasterize(image);
        let raster = Raster::parse(&buf).unwrap();

        for y in 0..geometry.height {
            for x in geometry.width..u32::from(raster.width_bytes()) * 8 {
                assert!(!raster.is_black(x, y), "dot ({}, {}) in margin", x, y);
            }
        }
    }
}

#[test]
fn photo_like_input_is_stable() {
    let mut gradient = RgbImage::new(640, 480);
    for (x, y, pixel) in gradient.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
    }
    let image = png(DynamicImage::ImageRgb8(gradient));
    let rasterizer = Rasterizer::default();

    assert_eq!(rasterizer.rasterize(&image), rasterizer.rasterize(&image));
}

#[test]
fn left_half_black_prints_left_half() {
    let mut image = GrayImage::from_pixel(768, 384, Luma([0xFF]));
    for y in 0..384 {
        for x in 0..384 {
            image.put_pixel(x, y, Luma([0x00]));
        }
    }

    let buf = rasterize(&png(DynamicImage::ImageLuma8(image)));
    let raster = Raster::parse(&buf).unwrap();

    // Away from the edge the interpolation has settled.
    for y in 0..192 {
        assert!(raster.is_black(10, y));
        assert!(raster.is_black(180, y));
        assert!(!raster.is_black(204, y));
        assert!(!raster.is_black(370, y));
    }
}
