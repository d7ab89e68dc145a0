extern crate clap;
extern crate env_logger;
extern crate mandelview;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use log::info;
use mandelview::{
    Click, Orchestrator, PngFile, RenderError, RenderSettings, Renderer, Viewport,
};
use num::Complex;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

/// A click is either `X,Y` (zoom in there) or `reset`.
fn parse_click(s: &str) -> Option<Click> {
    if s == RESET {
        return Some(Click::reset());
    }
    parse_pair::<i32>(s, ',').map(|(x, y)| Click::zoom_in(x, y))
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const EXTENT: &str = "extent";
const ZOOM: &str = "zoom";
const THREADS: &str = "threads";
const AGGREGATORS: &str = "aggregators";
const ITERATIONS: &str = "iterations";
const CLICK: &str = "click";
const RESET: &str = "reset";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get() * 64;

    App::new("mandelview")
        .version("0.1.0")
        .about("Click-to-zoom Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("mandelview.png")
                .help("Output file; every frame overwrites it"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1280x1280")
                .validator(|s| validate_pair::<u32>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Center of the first view"),
        )
        .arg(
            Arg::with_name(EXTENT)
                .required(false)
                .long(EXTENT)
                .short("e")
                .takes_value(true)
                .default_value("3.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse extent",
                        "Extent must be positive",
                    )
                })
                .help("Span of the complex plane covered by the first view"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("4.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse zoom factor",
                        "Zoom factor must be positive",
                    )
                })
                .help("How far each click zooms in"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of producer threads [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(AGGREGATORS)
                .required(false)
                .long(AGGREGATORS)
                .short("a")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse aggregator count",
                        "Aggregator count must be at least 1",
                    )
                })
                .help("Number of aggregator threads, each owning a band of rows"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("768")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Maximum iterations per point"),
        )
        .arg(
            Arg::with_name(CLICK)
                .required(false)
                .long(CLICK)
                .short("k")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .validator(|s| match parse_click(&s) {
                    Some(_) => Ok(()),
                    None => Err("Clicks are X,Y or 'reset'".to_string()),
                })
                .help("Replay a click after the first frame: X,Y zooms in there, 'reset' resets"),
        )
        .get_matches()
}

fn settings(matches: &ArgMatches) -> RenderSettings {
    let (width, height) =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    RenderSettings {
        width,
        height,
        max_iterations: usize::from_str(matches.value_of(ITERATIONS).unwrap())
            .expect("Could not parse iteration count."),
        zoom_factor: f64::from_str(matches.value_of(ZOOM).unwrap())
            .expect("Could not parse zoom factor."),
        workers: matches
            .value_of(THREADS)
            .map(|s| usize::from_str(s).expect("Could not parse thread count."))
            .unwrap_or_else(num_cpus::get),
        aggregators: usize::from_str(matches.value_of(AGGREGATORS).unwrap())
            .expect("Could not parse aggregator count."),
        ..RenderSettings::default()
    }
}

fn run(matches: &ArgMatches) -> Result<(), RenderError> {
    let center =
        parse_complex(matches.value_of(CENTER).unwrap()).expect("Error parsing center point");
    let extent =
        f64::from_str(matches.value_of(EXTENT).unwrap()).expect("Error parsing extent");
    let clicks: Vec<Click> = matches
        .values_of(CLICK)
        .map(|values| values.filter_map(parse_click).collect())
        .unwrap_or_default();

    let renderer = Renderer::new(settings(matches))?;
    let output = PngFile::new(matches.value_of(OUTPUT).unwrap());
    let mut orchestrator = Orchestrator::new(renderer, output);

    orchestrator.show(Viewport::new(center, extent)?)?;
    for click in clicks {
        orchestrator.handle_click(click)?;
    }
    let view = orchestrator.viewport();
    info!(
        "Wrote {} (center {}, extent {})",
        orchestrator.persister().path().display(),
        view.center(),
        view.extent()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
