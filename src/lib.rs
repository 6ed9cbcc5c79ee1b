//! Label Print Agent
//!
//! This crate converts arbitrary images into raster command streams for
//! thermal label printers and sends them over USB, one job at a time.
//!
//! # Example
//!
//! ```rust,no_run
//! use label_agent::{Config, Geometry, Printer, PrinterId, Rasterizer, Transport};
//!
//! let image = image::open("label.png").unwrap();
//! let buf = Rasterizer::new(Geometry::LABEL_48X24).rasterize(&image);
//!
//! let printer = Printer::new(Config::new(PrinterId::DEFAULT));
//! printer.transmit(&buf).unwrap();
//! ```

mod error;
mod media;
mod model;
pub mod preview;
mod printer;
pub mod raster;
pub mod server;

pub use crate::{
    error::{Error, WriteError},
    media::Geometry,
    model::PrinterId,
    printer::{Config, Printer, Transport, DEFAULT_WRITE_TIMEOUT},
    raster::{rasterize, Raster, Rasterizer, DEFAULT_THRESHOLD, PADDING_MARGIN},
};
