// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes the square window
//! onto the complex plane that we're currently looking at, and the
//! math that maps the integral pixel plane onto it.
//!
//! A single `extent` covers both axes.  For a square image that's a
//! uniform scale; for anything else the shorter axis gets stretched,
//! and we keep it that way.

use num::Complex;

use crate::errors::{RenderError, Result};

/// Where the view starts, and where a reset returns to.
pub const DEFAULT_CENTER: Complex<f64> = Complex { re: -0.5, im: 0.0 };

/// How much of the plane the default view spans.
pub const DEFAULT_EXTENT: f64 = 3.0;

/// The x, y of a pixel in the image.  The origin is the upper-left
/// corner and all values are non-negative.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub u32, pub u32);

/// Maps `x` linearly from the range `in_min..in_max` to the range
/// `out_min..out_max`.
pub fn translate(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// A center point on the complex plane and the amount of the plane
/// visible around it.  The extent is always positive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    center: Complex<f64>,
    extent: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            center: DEFAULT_CENTER,
            extent: DEFAULT_EXTENT,
        }
    }
}

impl Viewport {
    /// Constructor.  Rejects extents that aren't positive and finite,
    /// and centers that aren't finite.
    pub fn new(center: Complex<f64>, extent: f64) -> Result<Viewport> {
        if !center.re.is_finite() || !center.im.is_finite() {
            return Err(RenderError::InvalidCenter {
                re: center.re,
                im: center.im,
            });
        }
        if !(extent.is_finite() && extent > 0.0) {
            return Err(RenderError::InvalidExtent { extent });
        }
        Ok(Viewport { center, extent })
    }

    /// The default view: the whole set, centered on -0.5+0i.
    pub fn reset() -> Viewport {
        Viewport::default()
    }

    /// The point on the plane at the middle of the image.
    pub fn center(&self) -> Complex<f64> {
        self.center
    }

    /// The span of the plane covered by each image axis.
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Revalidates a viewport, for callers that got one some other way
    /// than `new()`.
    pub fn validate(&self) -> Result<()> {
        Viewport::new(self.center, self.extent).map(|_| ())
    }

    /// The upper-left corner of the visible square.
    pub fn origin(&self) -> Complex<f64> {
        Complex::new(
            self.center.re - self.extent / 2.0,
            self.center.im - self.extent / 2.0,
        )
    }

    /// Given a pixel of a `width` x `height` image, return the point on
    /// the complex plane it samples.  Each axis is its own linear map,
    /// `origin + index * extent / dimension`.
    pub fn pixel_to_plane(&self, pixel: Pixel, width: u32, height: u32) -> Complex<f64> {
        let origin = self.origin();
        Complex::new(
            origin.re + f64::from(pixel.0) * (self.extent / f64::from(width)),
            origin.im + f64::from(pixel.1) * (self.extent / f64::from(height)),
        )
    }

    /// Given a click offset from the middle of the image (in pixels),
    /// move the center to the point clicked and zoom in by `zoom`.
    ///
    /// The click is scaled with the zoomed-in extent and then
    /// multiplied back up by `zoom`, which lands it on the point that
    /// was under the cursor before the zoom.
    pub fn recenter(
        &self,
        offset_x: f64,
        offset_y: f64,
        width: u32,
        height: u32,
        zoom: f64,
    ) -> Result<Viewport> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(RenderError::InvalidZoom { factor: zoom });
        }
        let extent = self.extent / zoom;
        let (w, h) = (f64::from(width), f64::from(height));
        let delta = Complex::new(
            translate(offset_x, 0.0, w, 0.0, w * (extent / w)) * zoom,
            translate(offset_y, 0.0, h, 0.0, h * (extent / h)) * zoom,
        );
        Viewport::new(self.center + delta, extent)
    }
}
