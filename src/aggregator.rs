// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The aggregator is the only code in the crate that writes pixels.
//! Each one owns a disjoint band of rows in the frame's raw buffer and
//! drains its own channel of `PixelResult`s into it.  Producers never
//! see the buffer; they only hold senders.
//!
//! An aggregator runs until its channel is both closed and empty, and
//! then checks that every pixel in its band was written exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::channel::Receiver;
use itertools::iproduct;
use log::debug;

use crate::errors::{RenderError, Result};
use crate::framebuffer::{PixelResult, CHANNELS};

/// Counts aggregator threads that are still inside their consume loop.
/// Decremented on the way out no matter how the loop ends.
struct LiveGuard<'a>(&'a AtomicUsize);

impl<'a> LiveGuard<'a> {
    fn enter(live: &'a AtomicUsize) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        LiveGuard(live)
    }
}

impl<'a> Drop for LiveGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Single writer for one band of the framebuffer.
pub struct Aggregator<'a> {
    index: usize,
    width: u32,
    first_row: u32,
    rows: u32,
    band: &'a mut [u8],
    written: Vec<bool>,
    receiver: Receiver<PixelResult>,
}

impl<'a> Aggregator<'a> {
    /// Takes ownership of `band`, the raw RGBA bytes of whole rows
    /// starting at `first_row`, and the receiving end of the channel
    /// that feeds it.
    pub fn new(
        index: usize,
        width: u32,
        first_row: u32,
        band: &'a mut [u8],
        receiver: Receiver<PixelResult>,
    ) -> Self {
        let pixels = band.len() / CHANNELS;
        let rows = if width == 0 { 0 } else { pixels as u32 / width };
        Aggregator {
            index,
            width,
            first_row,
            rows,
            band,
            written: vec![false; pixels],
            receiver,
        }
    }

    /// The rows this aggregator owns.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.first_row..self.first_row + self.rows
    }

    /// Drains the channel into the band.  Returns the number of pixels
    /// written once the channel is closed and empty.
    pub fn run(mut self, live: &AtomicUsize) -> Result<usize> {
        let _live = LiveGuard::enter(live);
        let mut processed = 0;
        let mut running = true;

        while running {
            match self.receiver.recv() {
                Ok(result) => {
                    self.apply(result)?;
                    processed += 1;
                }
                Err(_) => running = false,
            }
        }

        debug!(
            "Aggregator #{} processed {} messages for rows {:?}",
            self.index,
            processed,
            self.rows()
        );
        self.check_complete()?;
        Ok(processed)
    }

    fn apply(&mut self, result: PixelResult) -> Result<()> {
        let PixelResult { x, y, color } = result;
        if x >= self.width || !self.rows().contains(&y) {
            return Err(RenderError::PixelOutOfBounds { x, y });
        }
        let offset = ((y - self.first_row) as usize) * (self.width as usize) + (x as usize);
        if self.written[offset] {
            return Err(RenderError::DuplicatePixel { x, y });
        }
        self.written[offset] = true;
        self.band[offset * CHANNELS..(offset + 1) * CHANNELS].copy_from_slice(&color.0);
        Ok(())
    }

    fn check_complete(&self) -> Result<()> {
        let width = self.width as usize;
        match iproduct!(0..self.rows, 0..self.width)
            .find(|&(row, column)| !self.written[(row as usize) * width + column as usize])
        {
            Some((row, column)) => Err(RenderError::IncompleteFrame {
                x: column,
                y: self.first_row + row,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::{bounded, unbounded};
    use image::Rgba;
    use std::time::Duration;

    fn red(x: u32, y: u32) -> PixelResult {
        PixelResult {
            x,
            y,
            color: Rgba([255, 0, 0, 255]),
        }
    }

    #[test]
    fn drains_a_full_band_and_exits() {
        let live = AtomicUsize::new(0);
        let mut band = vec![0u8; 3 * 2 * CHANNELS];
        let (tx, rx) = bounded(0);
        let outcome = crossbeam::scope(|scope| {
            let agg = Aggregator::new(0, 3, 4, &mut band, rx);
            let handle = scope.spawn(|_| agg.run(&live));
            for (y, x) in iproduct!(4..6, 0..3) {
                tx.send(red(x, y)).unwrap();
            }
            drop(tx);
            handle.join().unwrap()
        })
        .unwrap();
        assert_eq!(outcome.unwrap(), 6);
        assert!(band.chunks(CHANNELS).all(|p| p == [255, 0, 0, 255]));
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn second_write_to_a_pixel_is_fatal() {
        let live = AtomicUsize::new(0);
        let mut band = vec![0u8; 2 * CHANNELS];
        let (tx, rx) = unbounded();
        tx.send(red(0, 0)).unwrap();
        tx.send(red(0, 0)).unwrap();
        drop(tx);
        let err = Aggregator::new(0, 2, 0, &mut band, rx).run(&live).unwrap_err();
        match err {
            RenderError::DuplicatePixel { x: 0, y: 0 } => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn results_outside_the_band_are_fatal() {
        let live = AtomicUsize::new(0);
        let mut band = vec![0u8; 2 * CHANNELS];
        let (tx, rx) = unbounded();
        tx.send(red(0, 1)).unwrap();
        drop(tx);
        let err = Aggregator::new(0, 2, 0, &mut band, rx).run(&live).unwrap_err();
        match err {
            RenderError::PixelOutOfBounds { x: 0, y: 1 } => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn closing_early_reports_the_first_missing_pixel() {
        let live = AtomicUsize::new(0);
        let mut band = vec![0u8; 2 * 2 * CHANNELS];
        let (tx, rx) = unbounded();
        tx.send(red(0, 10)).unwrap();
        tx.send(red(1, 10)).unwrap();
        tx.send(red(1, 11)).unwrap();
        drop(tx);
        let err = Aggregator::new(5, 2, 10, &mut band, rx).run(&live).unwrap_err();
        match err {
            RenderError::IncompleteFrame { x: 0, y: 11 } => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn a_burst_before_closing_still_terminates() {
        let live = AtomicUsize::new(0);
        let width = 64;
        let mut band = vec![0u8; (width * width) as usize * CHANNELS];
        let (tx, rx) = unbounded();
        let (done_tx, done_rx) = bounded(1);
        crossbeam::scope(|scope| {
            let agg = Aggregator::new(0, width, 0, &mut band, rx);
            let live = &live;
            scope.spawn(move |_| {
                let outcome = agg.run(live);
                done_tx.send(outcome.is_ok()).unwrap();
            });
            for (y, x) in iproduct!(0..width, 0..width) {
                tx.send(red(x, y)).unwrap();
            }
            drop(tx);
            assert_eq!(done_rx.recv_timeout(Duration::from_secs(10)), Ok(true));
        })
        .unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn an_empty_closed_channel_exits_immediately() {
        let live = AtomicUsize::new(0);
        let mut band = vec![];
        let (tx, rx) = bounded::<PixelResult>(0);
        drop(tx);
        assert_eq!(Aggregator::new(0, 4, 0, &mut band, rx).run(&live).unwrap(), 0);
    }
}
