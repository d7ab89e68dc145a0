// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The classic escape-time test.  A point `c` on the complex plane is
//! in the Mandelbrot set if repeatedly squaring and adding `c` never
//! carries it further than 2 from the origin.  We can't iterate
//! forever, so we stop at some limit and call anything that survives
//! that long "inside."

use num::Complex;

/// The squared escape radius.  Comparing `norm_sqr()` against 4 is the
/// same test as comparing `norm()` against 2, without the square root.
const ESCAPE_NORM_SQR: f64 = 4.0;

/// Returns the iteration at which the orbit of `c` escapes, or `limit`
/// if it never does.
///
/// The orbit starts at `z = c` rather than `z = 0`, so the first test
/// is against `c` itself: any point more than 2 from the origin
/// returns 0, and the origin (which never moves) returns `limit`.
pub fn escape_time(c: Complex<f64>, limit: usize) -> usize {
    let mut z = c;
    for i in 0..limit {
        if z.norm_sqr() > ESCAPE_NORM_SQR {
            return i;
        }
        z = z * z + c;
    }
    limit
}
