#[macro_use]
extern crate criterion;
extern crate mandelview;
extern crate num;

use criterion::Criterion;
use mandelview::{escape_time, RenderSettings, Renderer, Viewport};
use num::Complex;

fn escape(c: &mut Criterion) {
    c.bench_function("escape_time near the boundary", |b| {
        b.iter(|| escape_time(Complex::new(-0.7453, 0.1127), 768))
    });
}

fn frame(c: &mut Criterion) {
    let mut settings = RenderSettings::with_size(128, 128);
    settings.max_iterations = 256;
    let renderer = Renderer::new(settings).unwrap();
    let viewport = Viewport::default();
    c.bench_function("render 128x128 frame", move |b| {
        b.iter(|| renderer.render_frame(&viewport).unwrap())
    });
}

criterion_group!(benches, escape, frame);
criterion_main!(benches);
