// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs and dials of a render.  Once validated, a settings object
//! should not change for the life of a renderer.

use crate::errors::{RenderError, Result};

/// Default image width and height.
pub const DEFAULT_SIZE: u32 = 1280;

/// Default escape-time bound: three bands of 256.
pub const DEFAULT_ITERATIONS: usize = 256 * 3;

/// Default zoom applied by a primary click.
pub const DEFAULT_ZOOM: f64 = 4.0;

/// Everything about a frame except where it's looking.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// The escape-time bound, and the palette's saturation index.
    pub max_iterations: usize,
    /// How much a primary click zooms in.
    pub zoom_factor: f64,
    /// How many producer threads pull rows from the queue.
    pub workers: usize,
    /// Up to how many aggregator threads share the framebuffer, each
    /// owning a disjoint band of rows.
    pub aggregators: usize,
    /// Buffer depth of each result channel.  Zero makes every send a
    /// rendezvous with the aggregator.
    pub channel_capacity: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            max_iterations: DEFAULT_ITERATIONS,
            zoom_factor: DEFAULT_ZOOM,
            workers: num_cpus::get(),
            aggregators: 1,
            channel_capacity: 0,
        }
    }
}

impl RenderSettings {
    /// Default settings for an image of a given size.
    pub fn with_size(width: u32, height: u32) -> Self {
        RenderSettings {
            width,
            height,
            ..RenderSettings::default()
        }
    }

    /// The total number of pixels in a frame.
    pub fn len(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Describes that the image has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Rejects anything a render can't start with.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations == 0 {
            return Err(RenderError::InvalidIterations);
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0) {
            return Err(RenderError::InvalidZoom {
                factor: self.zoom_factor,
            });
        }
        if self.workers == 0 {
            return Err(RenderError::InvalidThreads(
                "at least one worker is required".to_string(),
            ));
        }
        if self.aggregators == 0 || self.aggregators > self.height as usize {
            return Err(RenderError::InvalidThreads(format!(
                "aggregator count must be between 1 and {}",
                self.height
            )));
        }
        Ok(())
    }

    /// How many rows each aggregator's band holds.  The last band may
    /// be shorter, and rounding up can leave fewer bands than
    /// aggregators requested.
    pub fn band_rows(&self) -> u32 {
        let aggregators = self.aggregators.max(1) as u32;
        (self.height + aggregators - 1) / aggregators
    }
}
