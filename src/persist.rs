// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where finished frames go.  The engine doesn't care; whatever shows
//! the picture implements `FramePersister` and gets each frame after
//! it is complete.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::debug;

use crate::errors::Result;
use crate::framebuffer::Framebuffer;

/// Receives each completed frame.
pub trait FramePersister {
    /// Stores the frame.  A failure fails the request that produced the
    /// frame, but nothing else.
    fn persist(&mut self, frame: &Framebuffer) -> Result<()>;
}

/// Writes every frame to the same PNG file, replacing the last one.
#[derive(Clone, Debug)]
pub struct PngFile {
    path: PathBuf,
}

impl PngFile {
    /// Constructor.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        PngFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The file frames are written to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FramePersister for PngFile {
    fn persist(&mut self, frame: &Framebuffer) -> Result<()> {
        debug!("Saving frame to {}", self.path.display());
        frame
            .as_image()
            .save_with_format(&self.path, ImageFormat::Png)?;
        Ok(())
    }
}
