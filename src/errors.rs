// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can stop a frame from reaching the screen.  The
//! configuration variants are raised before any thread is started;
//! the rest are raised by a frame in flight, and all of them abort
//! the frame rather than hand a partial image to persistence.

use failure::Fail;

/// The failures a render request can end in.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The viewport must span some positive, finite amount of the plane.
    #[fail(display = "Viewport extent must be positive and finite (got {})", extent)]
    InvalidExtent {
        /// The rejected extent.
        extent: f64,
    },

    /// The viewport center must be a finite point on the plane.
    #[fail(display = "Viewport center must be finite (got {},{})", re, im)]
    InvalidCenter {
        /// The rejected real part.
        re: f64,
        /// The rejected imaginary part.
        im: f64,
    },

    /// Both image dimensions must be positive.
    #[fail(display = "Image dimensions must be positive (got {}x{})", width, height)]
    InvalidDimensions {
        /// The rejected width.
        width: u32,
        /// The rejected height.
        height: u32,
    },

    /// The escape-time bound must allow at least one iteration.
    #[fail(display = "Maximum iteration count must be positive")]
    InvalidIterations,

    /// Zooming must scale the extent by a positive, finite amount.
    #[fail(display = "Zoom factor must be positive and finite (got {})", factor)]
    InvalidZoom {
        /// The rejected zoom factor.
        factor: f64,
    },

    /// Worker and aggregator counts must be between one and the row count.
    #[fail(display = "Thread configuration rejected: {}", _0)]
    InvalidThreads(String),

    /// A pixel result named a pixel outside the framebuffer.
    #[fail(display = "Pixel {},{} lies outside the frame", x, y)]
    PixelOutOfBounds {
        /// Column of the offending result.
        x: u32,
        /// Row of the offending result.
        y: u32,
    },

    /// A pixel result arrived for a pixel that was already written.
    #[fail(display = "Pixel {},{} was written twice", x, y)]
    DuplicatePixel {
        /// Column of the offending result.
        x: u32,
        /// Row of the offending result.
        y: u32,
    },

    /// The result channel closed before every pixel was written.
    #[fail(display = "Frame incomplete: pixel {},{} was never written", x, y)]
    IncompleteFrame {
        /// Column of the first missing pixel.
        x: u32,
        /// Row of the first missing pixel.
        y: u32,
    },

    /// A producer tried to submit a result after its aggregator stopped listening.
    #[fail(display = "Result submitted after the aggregator closed its channel")]
    ChannelClosed,

    /// A producer thread panicked before finishing its rows.
    #[fail(display = "A pixel producer panicked")]
    ProducerPanicked,

    /// An aggregator thread panicked before draining its channel.
    #[fail(display = "A frame aggregator panicked")]
    AggregatorPanicked,

    /// The shared row queue was poisoned by a panicking worker.
    #[fail(display = "The row queue was poisoned")]
    RowQueuePoisoned,

    /// The finished frame could not be stored.
    #[fail(display = "Could not persist frame: {}", _0)]
    Persist(#[cause] image::ImageError),
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, RenderError>;

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Persist(err)
    }
}

impl RenderError {
    /// True for the errors that reject a request before any work is
    /// started.
    pub fn is_configuration(&self) -> bool {
        match self {
            RenderError::InvalidExtent { .. }
            | RenderError::InvalidCenter { .. }
            | RenderError::InvalidDimensions { .. }
            | RenderError::InvalidIterations
            | RenderError::InvalidZoom { .. }
            | RenderError::InvalidThreads(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        assert!(RenderError::InvalidExtent { extent: 0.0 }.is_configuration());
        assert!(RenderError::InvalidIterations.is_configuration());
        assert!(!RenderError::ChannelClosed.is_configuration());
        assert!(!RenderError::IncompleteFrame { x: 0, y: 0 }.is_configuration());
    }

    #[test]
    fn messages_name_the_offending_pixel() {
        let err = RenderError::DuplicatePixel { x: 3, y: 7 };
        assert_eq!(format!("{}", err), "Pixel 3,7 was written twice");
    }
}
