// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render engine.  One call to `render_frame` allocates a fresh
//! buffer and fresh channels, splits the buffer into bands, starts an
//! aggregator per band and a pool of producers, and waits for all of
//! them.  Producers finish first; only then is the last sender
//! dropped, which is what lets the aggregators see their channels
//! close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam::channel;
use log::{debug, info};

use crate::aggregator::Aggregator;
use crate::errors::{RenderError, Result};
use crate::framebuffer::{Framebuffer, CHANNELS};
use crate::palette::Palette;
use crate::producer::{ProducerStats, ResultSink, RowProducer, RowQueue};
use crate::settings::RenderSettings;
use crate::viewport::Viewport;

/// Renders frames for one fixed set of settings.  The palette is built
/// once here and shared by every frame.
pub struct Renderer {
    settings: RenderSettings,
    palette: Palette,
    live_aggregators: AtomicUsize,
    #[cfg(test)]
    pub(crate) panic_on_row: Option<u32>,
}

impl Renderer {
    /// Validates the settings and builds the palette.
    pub fn new(settings: RenderSettings) -> Result<Self> {
        settings.validate()?;
        let palette = Palette::build(settings.max_iterations);
        Ok(Renderer {
            settings,
            palette,
            live_aggregators: AtomicUsize::new(0),
            #[cfg(test)]
            panic_on_row: None,
        })
    }

    /// The settings every frame is rendered with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The palette every frame is colored with.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// How many aggregator threads are currently draining a channel.
    /// Zero whenever no frame is in flight.
    pub fn live_aggregators(&self) -> usize {
        self.live_aggregators.load(Ordering::SeqCst)
    }

    /// Renders one complete frame of `viewport`.  Either every pixel is
    /// written exactly once, or the frame is thrown away and an error
    /// returned.
    pub fn render_frame(&self, viewport: &Viewport) -> Result<Framebuffer> {
        viewport.validate()?;
        let settings = &self.settings;
        let (width, height) = (settings.width, settings.height);
        let started = Instant::now();

        let mut raw = vec![0u8; settings.len() * CHANNELS];
        let band_rows = settings.band_rows();
        let band_len = (band_rows as usize) * (width as usize) * CHANNELS;

        let mut senders = Vec::with_capacity(settings.aggregators);
        let mut aggregators = Vec::with_capacity(settings.aggregators);
        for (index, band) in raw.chunks_mut(band_len).enumerate() {
            let (sender, receiver) = channel::bounded(settings.channel_capacity);
            senders.push(sender);
            aggregators.push(Aggregator::new(
                index,
                width,
                (index as u32) * band_rows,
                band,
                receiver,
            ));
        }
        debug!(
            "Frame {}x{}: {} workers, {} aggregators of {} rows",
            width,
            height,
            settings.workers,
            aggregators.len(),
            band_rows
        );

        let sink = ResultSink::new(senders, band_rows);
        let rows = RowQueue::new(height);
        let producer = RowProducer::new(viewport, &self.palette, width, height);
        #[cfg(test)]
        let producer = producer.panicking_on(self.panic_on_row);
        let live = &self.live_aggregators;

        let (produced, consumed) = crossbeam::scope(|scope| {
            let consumers: Vec<_> = aggregators
                .into_iter()
                .map(|aggregator| scope.spawn(move |_| aggregator.run(live)))
                .collect();

            let producers: Vec<_> = (0..settings.workers)
                .map(|_| {
                    let sink = sink.clone();
                    let (rows, producer) = (&rows, &producer);
                    scope.spawn(move |_| producer.run(rows, sink))
                })
                .collect();

            let produced: Vec<Result<ProducerStats>> = producers
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(RenderError::ProducerPanicked))
                })
                .collect();

            // Every producer is done; dropping the last sender closes the channels.
            drop(sink);

            let consumed: Vec<Result<usize>> = consumers
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(RenderError::AggregatorPanicked))
                })
                .collect();
            (produced, consumed)
        })
        .map_err(|_| RenderError::ProducerPanicked)?;

        let stats = settle(produced, consumed)?;
        info!(
            "Rendered {}x{} frame at {} (extent {}) in {:?}: {} rows, {} pixels inside the set",
            width,
            height,
            viewport.center(),
            viewport.extent(),
            started.elapsed(),
            stats.rows,
            stats.inside
        );
        Framebuffer::from_raw(width, height, raw)
    }
}

/// Folds the outcome of every thread into one.  A producer's own
/// failure explains everything downstream of it, so it wins; an
/// aggregator's failure explains producers that found their channel
/// closed, so it comes next.
fn settle(
    produced: Vec<Result<ProducerStats>>,
    consumed: Vec<Result<usize>>,
) -> Result<ProducerStats> {
    let mut totals = ProducerStats::default();
    let mut closed = None;
    for outcome in produced {
        match outcome {
            Ok(stats) => {
                totals.rows += stats.rows;
                totals.pixels += stats.pixels;
                totals.inside += stats.inside;
            }
            Err(RenderError::ChannelClosed) => closed = Some(RenderError::ChannelClosed),
            Err(err) => return Err(err),
        }
    }
    for outcome in consumed {
        outcome?;
    }
    match closed {
        Some(err) => Err(err),
        None => Ok(totals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::Complex;

    fn small(workers: usize, aggregators: usize) -> Renderer {
        let mut settings = RenderSettings::with_size(48, 48);
        settings.max_iterations = 60;
        settings.workers = workers;
        settings.aggregators = aggregators;
        Renderer::new(settings).unwrap()
    }

    #[test]
    fn renders_every_pixel_from_the_palette() {
        let renderer = small(4, 1);
        let frame = renderer.render_frame(&Viewport::default()).unwrap();
        assert_eq!((frame.width(), frame.height()), (48, 48));
        assert!(frame.pixels().all(|p| p.0[3] == 255));
        assert!(frame.pixels().all(|p| renderer.palette().contains(p)));
        assert_eq!(renderer.live_aggregators(), 0);
    }

    #[test]
    fn center_of_the_default_view_is_inside() {
        let renderer = small(2, 1);
        let frame = renderer.render_frame(&Viewport::default()).unwrap();
        // Pixel 24,24 samples -0.5+0i.
        assert_eq!(frame.pixel(24, 24), crate::palette::INSIDE);
    }

    #[test]
    fn bands_and_workers_do_not_change_the_picture() {
        let reference = small(1, 1).render_frame(&Viewport::default()).unwrap();
        for &(workers, aggregators) in &[(2, 1), (8, 3), (48, 48), (3, 7)] {
            let frame = small(workers, aggregators)
                .render_frame(&Viewport::default())
                .unwrap();
            assert_eq!(frame.as_bytes(), reference.as_bytes());
        }
    }

    #[test]
    fn buffered_channels_render_the_same_frame() {
        let reference = small(4, 2).render_frame(&Viewport::default()).unwrap();
        let mut settings = RenderSettings::with_size(48, 48);
        settings.max_iterations = 60;
        settings.workers = 4;
        settings.aggregators = 2;
        settings.channel_capacity = 256;
        let frame = Renderer::new(settings)
            .unwrap()
            .render_frame(&Viewport::default())
            .unwrap();
        assert_eq!(frame, reference);
    }

    #[test]
    fn far_away_views_are_uniform() {
        let renderer = small(3, 2);
        let viewport = Viewport::new(Complex::new(10.0, 10.0), 1.0).unwrap();
        let frame = renderer.render_frame(&viewport).unwrap();
        let first = renderer.palette().color(0);
        assert!(frame.pixels().all(|p| *p == first));
    }

    #[test]
    fn settle_prefers_the_root_cause() {
        let produced = vec![Err(RenderError::ChannelClosed), Ok(ProducerStats::default())];
        let consumed = vec![Ok(3), Err(RenderError::DuplicatePixel { x: 1, y: 2 })];
        match settle(produced, consumed) {
            Err(RenderError::DuplicatePixel { x: 1, y: 2 }) => {}
            other => panic!("unexpected {:?}", other),
        }

        let produced = vec![Err(RenderError::ProducerPanicked)];
        let consumed = vec![Err(RenderError::IncompleteFrame { x: 0, y: 0 })];
        match settle(produced, consumed) {
            Err(RenderError::ProducerPanicked) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn a_panicking_producer_aborts_the_frame() {
        let mut settings = RenderSettings::with_size(17, 17);
        settings.max_iterations = 40;
        settings.workers = 4;
        settings.aggregators = 3;
        let mut renderer = Renderer::new(settings).unwrap();
        renderer.panic_on_row = Some(5);
        match renderer.render_frame(&Viewport::default()) {
            Err(RenderError::ProducerPanicked) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(renderer.live_aggregators(), 0);

        renderer.panic_on_row = None;
        assert!(renderer.render_frame(&Viewport::default()).is_ok());
    }

    #[test]
    fn bad_settings_are_rejected_before_rendering() {
        let mut settings = RenderSettings::with_size(0, 8);
        settings.workers = 1;
        assert!(Renderer::new(settings).is_err());
    }
}
