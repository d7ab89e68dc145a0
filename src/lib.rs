#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot zoom renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring and adding `c` never runs off to
//! infinity.  Coloring each pixel by how quickly its point *does* run
//! off gives the familiar picture; clicking a point recenters the view
//! on it and zooms in, and every new view is rendered from scratch.
//!
//! Rendering is embarrassingly parallel.  A pool of producer threads
//! takes rows from a shared queue and sends one colored `PixelResult`
//! per pixel over a channel.  The framebuffer is split into bands, and
//! each band has exactly one aggregator thread that writes it; nothing
//! else ever touches the buffer.  A frame is handed out only after
//! every producer has finished, every channel has closed and drained,
//! and every pixel has been written exactly once.

extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;

pub mod aggregator;
pub mod engine;
pub mod errors;
pub mod escape;
pub mod framebuffer;
pub mod orchestrator;
pub mod palette;
pub mod persist;
pub mod producer;
pub mod settings;
pub mod viewport;

pub use engine::Renderer;
pub use errors::{RenderError, Result};
pub use escape::escape_time;
pub use framebuffer::{Framebuffer, PixelResult};
pub use orchestrator::{Click, ClickAction, FrameState, Orchestrator};
pub use palette::Palette;
pub use persist::{FramePersister, PngFile};
pub use settings::RenderSettings;
pub use viewport::{translate, Pixel, Viewport};
