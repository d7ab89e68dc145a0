// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Maps escape-time iteration counts to colors.  The range of counts
//! is split into thirds: the first fades black to red, the second red
//! to yellow, the last yellow to white.  Points that never escaped are
//! painted black no matter where the ramp would have put them.  The
//! ramp also starts at black, so points that escape immediately share
//! that color with the interior.

use image::Rgba;

/// The color of points inside the set.
pub const INSIDE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// One color per iteration count, `0..=max_iterations`.  Built once,
/// shared read-only by every producer.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: Vec<Rgba<u8>>,
}

impl Palette {
    /// Builds the three-band ramp for a given iteration bound.
    pub fn build(max_iterations: usize) -> Palette {
        let third = (max_iterations / 3).max(1);
        let span = (third - 1).max(1);
        let ramp = |j: usize| (j * 255 / span).min(255) as u8;

        let mut colors: Vec<Rgba<u8>> = (0..=max_iterations)
            .map(|i| {
                let band = (i / third).min(2);
                let level = ramp(i - band * third);
                match band {
                    0 => Rgba([level, 0, 0, 255]),
                    1 => Rgba([255, level, 0, 255]),
                    _ => Rgba([255, 255, level, 255]),
                }
            })
            .collect();
        colors[max_iterations] = INSIDE;
        Palette { colors }
    }

    /// The iteration bound this palette was built for.
    pub fn max_iterations(&self) -> usize {
        self.colors.len() - 1
    }

    /// The number of entries, which is always `max_iterations + 1`.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// A palette always holds at least the saturation entry.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Looks up the color for an iteration count.  The evaluator never
    /// returns more than the bound, so an out-of-range count is a bug
    /// and panics.
    #[inline]
    pub fn color(&self, iterations: usize) -> Rgba<u8> {
        assert!(
            iterations < self.colors.len(),
            "iteration count {} outside palette of {}",
            iterations,
            self.colors.len()
        );
        self.colors[iterations]
    }

    /// True if the color is one this palette can produce.
    pub fn contains(&self, color: &Rgba<u8>) -> bool {
        self.colors.iter().any(|c| c == color)
    }
}
