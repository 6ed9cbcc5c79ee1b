//! Error types for label agent operations.
//!
//! Every failure originates in decoding the inbound image or in talking to the
//! printer over USB. Rasterizing never fails.

use crate::PrinterId;
use thiserror::Error;

/// Main error type for label agent operations.
#[derive(Error, Debug)]
pub enum Error {
    /// USB communication error outside of a claim or a write.
    ///
    /// Usually libusb failing to initialise a context or to list devices,
    /// which on Linux is most often a permission problem.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// No attached device matches the configured vendor/product pair.
    #[error("No printer found with id {0}")]
    DeviceNotFound(PrinterId),

    #[error("Device is missing a bulk OUT endpoint")]
    MissingEndpoint,

    /// The interface is held by another process or can not be configured.
    #[error("Failed to claim printer interface: {0}")]
    InterfaceClaimError(rusb::Error),

    /// A bulk write did not go through completely. Nothing is retried.
    #[error("Failed to write to printer: {0}")]
    TransmissionError(WriteError),

    /// Inbound payload is not an image the decoder understands.
    #[error("Invalid image: {0}")]
    DecodeError(#[from] image::ImageError),

    /// A byte buffer does not carry the raster framing the encoder produces.
    #[error("Invalid raster command: {0}")]
    InvalidRaster(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// True when the printer is absent or busy rather than broken mid-job.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_) | Self::InterfaceClaimError(_) | Self::MissingEndpoint
        )
    }

    /// True for failures that happened while bytes were going over the wire.
    pub fn is_transmission(&self) -> bool {
        matches!(self, Self::TransmissionError(_))
    }
}

/// Why a bulk write to the printer failed.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Transport level failure: timeout, stall, unplugged cable.
    #[error(transparent)]
    Usb(rusb::Error),

    /// The printer accepted fewer bytes than were sent.
    #[error("short write, {written} of {expected} bytes")]
    Short { written: usize, expected: usize },
}
