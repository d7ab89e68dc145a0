// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Producers turn rows of pixels into `PixelResult`s.  A fixed pool of
//! workers pulls row numbers from a shared queue until it runs dry;
//! each row goes to exactly one worker, and the worker walks it left to
//! right, evaluating and coloring every pixel and handing the result to
//! a `ResultSink`.

use std::ops::Range;
use std::sync::Mutex;

use crossbeam::channel::Sender;

use crate::errors::{RenderError, Result};
use crate::escape::escape_time;
use crate::framebuffer::PixelResult;
use crate::palette::Palette;
use crate::viewport::{Pixel, Viewport};

/// Hands out each row of the image exactly once.
pub struct RowQueue {
    rows: Mutex<Range<u32>>,
}

impl RowQueue {
    /// A queue of rows `0..height`.
    pub fn new(height: u32) -> Self {
        RowQueue {
            rows: Mutex::new(0..height),
        }
    }

    /// Takes the next unclaimed row, or `None` when every row is gone.
    pub fn claim(&self) -> Result<Option<u32>> {
        let mut rows = self.rows.lock().map_err(|_| RenderError::RowQueuePoisoned)?;
        Ok(rows.next())
    }
}

/// The send-only half of the frame's result channels.  Results are
/// routed to whichever aggregator owns the row they belong to.
#[derive(Clone)]
pub struct ResultSink {
    senders: Vec<Sender<PixelResult>>,
    band_rows: u32,
}

impl ResultSink {
    /// One sender per band, in band order, where every band but the last
    /// holds `band_rows` rows.
    pub fn new(senders: Vec<Sender<PixelResult>>, band_rows: u32) -> Self {
        ResultSink {
            senders,
            band_rows: band_rows.max(1),
        }
    }

    /// Sends a result to its aggregator, blocking while that channel is
    /// full.  Sending to an aggregator that has already hung up is a
    /// broken frame, not something to retry.
    pub fn submit(&self, result: PixelResult) -> Result<()> {
        let band = (result.y / self.band_rows) as usize;
        let sender = self
            .senders
            .get(band)
            .ok_or(RenderError::PixelOutOfBounds {
                x: result.x,
                y: result.y,
            })?;
        sender.send(result).map_err(|_| RenderError::ChannelClosed)
    }
}

/// What one worker got through.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ProducerStats {
    /// Rows claimed and finished.
    pub rows: usize,
    /// Pixels submitted.
    pub pixels: usize,
    /// Pixels that never escaped.
    pub inside: usize,
}

/// Everything a worker needs to color a row.  All of it is read-only
/// and shared by reference across the pool.
pub struct RowProducer<'a> {
    viewport: &'a Viewport,
    palette: &'a Palette,
    width: u32,
    height: u32,
    #[cfg(test)]
    panic_on_row: Option<u32>,
}

impl<'a> RowProducer<'a> {
    /// Constructor.
    pub fn new(viewport: &'a Viewport, palette: &'a Palette, width: u32, height: u32) -> Self {
        RowProducer {
            viewport,
            palette,
            width,
            height,
            #[cfg(test)]
            panic_on_row: None,
        }
    }

    /// Makes the worker that claims `row` panic before coloring it.
    #[cfg(test)]
    pub(crate) fn panicking_on(mut self, row: Option<u32>) -> Self {
        self.panic_on_row = row;
        self
    }

    /// Colors one row, left to right, submitting each pixel as it goes.
    /// Returns how many pixels in the row were inside the set.
    pub fn render_row(&self, row: u32, sink: &ResultSink) -> Result<usize> {
        #[cfg(test)]
        {
            if self.panic_on_row == Some(row) {
                panic!("row {} failed", row);
            }
        }
        let limit = self.palette.max_iterations();
        let mut inside = 0;
        for column in 0..self.width {
            let point = self
                .viewport
                .pixel_to_plane(Pixel(column, row), self.width, self.height);
            let iterations = escape_time(point, limit);
            if iterations == limit {
                inside += 1;
            }
            sink.submit(PixelResult {
                x: column,
                y: row,
                color: self.palette.color(iterations),
            })?;
        }
        Ok(inside)
    }

    /// The worker loop: claim rows until the queue is empty.
    pub fn run(&self, rows: &RowQueue, sink: ResultSink) -> Result<ProducerStats> {
        let mut stats = ProducerStats::default();
        while let Some(row) = rows.claim()? {
            stats.inside += self.render_row(row, &sink)?;
            stats.rows += 1;
            stats.pixels += self.width as usize;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn every_row_is_claimed_exactly_once() {
        let queue = RowQueue::new(500);
        let mut claimed: Vec<u32> = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let queue = &queue;
                    scope.spawn(move |_| {
                        let mut mine = vec![];
                        while let Some(row) = queue.claim().unwrap() {
                            mine.push(row);
                        }
                        mine
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        })
        .unwrap();
        claimed.sort();
        assert_eq!(claimed, (0..500).collect::<Vec<u32>>());
    }

    #[test]
    fn sink_routes_by_band() {
        let (top_tx, top_rx) = unbounded();
        let (bottom_tx, bottom_rx) = unbounded();
        let sink = ResultSink::new(vec![top_tx, bottom_tx], 4);
        let color = image::Rgba([1, 2, 3, 255]);
        sink.submit(PixelResult { x: 0, y: 3, color }).unwrap();
        sink.submit(PixelResult { x: 0, y: 4, color }).unwrap();
        assert_eq!(top_rx.try_recv().unwrap().y, 3);
        assert_eq!(bottom_rx.try_recv().unwrap().y, 4);
        assert!(sink.submit(PixelResult { x: 0, y: 8, color }).is_err());
    }

    #[test]
    fn submitting_after_the_aggregator_hangs_up_fails() {
        let (tx, rx) = unbounded();
        let sink = ResultSink::new(vec![tx], 10);
        drop(rx);
        let err = sink
            .submit(PixelResult {
                x: 0,
                y: 0,
                color: image::Rgba([0, 0, 0, 255]),
            })
            .unwrap_err();
        match err {
            RenderError::ChannelClosed => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn a_row_comes_out_left_to_right() {
        let viewport = Viewport::default();
        let palette = Palette::build(50);
        let producer = RowProducer::new(&viewport, &palette, 16, 16);
        let (tx, rx) = unbounded();
        let sink = ResultSink::new(vec![tx], 16);
        producer.render_row(8, &sink).unwrap();
        drop(sink);
        let columns: Vec<u32> = rx.iter().map(|r| r.x).collect();
        assert_eq!(columns, (0..16).collect::<Vec<u32>>());
    }

    #[test]
    fn run_drains_the_queue() {
        let viewport = Viewport::default();
        let palette = Palette::build(20);
        let producer = RowProducer::new(&viewport, &palette, 8, 4);
        let queue = RowQueue::new(4);
        let (tx, rx) = unbounded();
        let stats = producer.run(&queue, ResultSink::new(vec![tx], 4)).unwrap();
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.pixels, 32);
        assert_eq!(rx.iter().count(), 32);
        assert_eq!(queue.claim().unwrap(), None);
    }
}
