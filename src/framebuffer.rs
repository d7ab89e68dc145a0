// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The finished frame, and the message that builds it a pixel at a
//! time.  A `Framebuffer` is only ever handed out once every pixel has
//! been written, and it has no mutating methods; the only code that
//! writes pixels is the aggregator, which works on the raw bytes before
//! the frame is sealed.

use image::{Rgba, RgbaImage};

use crate::errors::{RenderError, Result};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// One computed pixel on its way to the aggregator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PixelResult {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// The palette color for this pixel's escape time.
    pub color: Rgba<u8>,
}

/// A complete, read-only W x H RGBA image.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    image: RgbaImage,
}

impl Framebuffer {
    /// Seals a fully-written buffer of raw RGBA bytes.
    pub(crate) fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Result<Framebuffer> {
        RgbaImage::from_raw(width, height, raw)
            .map(|image| Framebuffer { image })
            .ok_or(RenderError::InvalidDimensions { width, height })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The color at a pixel.  Panics outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Every pixel, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = &Rgba<u8>> {
        self.image.pixels()
    }

    /// The raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Borrows the underlying image, for encoders.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}
