// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drives the view from one frame to the next.  The orchestrator owns
//! the current viewport, turns clicks into new viewports, renders each
//! one to completion and passes the finished frame on.  Because every
//! request takes `&mut self`, a new frame can't start until the last
//! one is done.

use log::{debug, error, info};

use crate::engine::Renderer;
use crate::errors::Result;
use crate::persist::FramePersister;
use crate::viewport::Viewport;

/// Where the orchestrator is in the life of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for a request.
    Idle,
    /// Producers and aggregators are running.
    Rendering,
    /// The frame is finished and being handed off.
    Complete,
}

/// What a click asks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
    /// Recenter on the clicked point and zoom in.
    ZoomIn,
    /// Go back to the default view.
    Reset,
}

/// A decoded click: where in the image, and what it means.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Click {
    /// Column, from the left edge of the image.
    pub x: i32,
    /// Row, from the top edge of the image.
    pub y: i32,
    /// What the click asks for.
    pub action: ClickAction,
}

impl Click {
    /// A primary click at `x`, `y`.
    pub fn zoom_in(x: i32, y: i32) -> Self {
        Click {
            x,
            y,
            action: ClickAction::ZoomIn,
        }
    }

    /// A secondary click; where it landed doesn't matter.
    pub fn reset() -> Self {
        Click {
            x: 0,
            y: 0,
            action: ClickAction::Reset,
        }
    }
}

/// Owns the viewport and sequences frames.
pub struct Orchestrator<P: FramePersister> {
    renderer: Renderer,
    persister: P,
    viewport: Viewport,
    state: FrameState,
}

impl<P: FramePersister> Orchestrator<P> {
    /// Starts at the default view.  Nothing is rendered until the first
    /// request.
    pub fn new(renderer: Renderer, persister: P) -> Self {
        Orchestrator {
            renderer,
            persister,
            viewport: Viewport::reset(),
            state: FrameState::Idle,
        }
    }

    /// The view the last successful frame was rendered from.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Where the current frame is.  Always `Idle` between requests.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// The engine frames are rendered with.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Whatever frames are handed to.
    pub fn persister(&self) -> &P {
        &self.persister
    }

    /// Routes a click to a zoom or a reset.
    pub fn handle_click(&mut self, click: Click) -> Result<()> {
        match click.action {
            ClickAction::ZoomIn => self.zoom_at(click.x, click.y),
            ClickAction::Reset => self.reset(),
        }
    }

    /// Renders the default view.
    pub fn reset(&mut self) -> Result<()> {
        info!("Resetting view");
        self.show(Viewport::reset())
    }

    /// Recenters on the pixel at `x`, `y` and zooms in by the
    /// configured factor.
    pub fn zoom_at(&mut self, x: i32, y: i32) -> Result<()> {
        let settings = self.renderer.settings();
        let (width, height) = (settings.width, settings.height);
        let offset_x = f64::from(x) - f64::from(width) / 2.0;
        let offset_y = f64::from(y) - f64::from(height) / 2.0;
        info!("Click at {},{}: offset {},{}", x, y, offset_x, offset_y);

        let next = self
            .viewport
            .recenter(offset_x, offset_y, width, height, settings.zoom_factor)?;
        info!(
            "Mapped input: {}; new view: center {}, extent {}",
            next.center() - self.viewport.center(),
            next.center(),
            next.extent()
        );
        self.show(next)
    }

    /// Renders the current view again, for instance after the last
    /// hand-off failed.
    pub fn redraw(&mut self) -> Result<()> {
        let viewport = self.viewport;
        self.show(viewport)
    }

    /// Renders `viewport` to completion and hands the frame off.  The
    /// viewport is kept once the frame renders, even if the hand-off
    /// fails, so `redraw` can retry it.
    pub fn show(&mut self, viewport: Viewport) -> Result<()> {
        self.transition(FrameState::Rendering);
        let frame = match self.renderer.render_frame(&viewport) {
            Ok(frame) => frame,
            Err(err) => {
                error!("Render failed: {}", err);
                self.transition(FrameState::Idle);
                return Err(err);
            }
        };
        self.viewport = viewport;
        self.transition(FrameState::Complete);

        let outcome = self.persister.persist(&frame);
        if let Err(ref err) = outcome {
            error!("Could not hand off frame: {}", err);
        }
        self.transition(FrameState::Idle);
        outcome
    }

    fn transition(&mut self, next: FrameState) {
        debug!("Frame state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
