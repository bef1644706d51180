//! Capture/encode benchmark CLI for screen-grab.
//!
//! Runs the same request repeatedly and reports latency percentiles.
//!
//! Usage:
//!   cargo run -- <x> <y> <width> <height>                  Primary monitor, PNG
//!   cargo run -- <x> <y> <w> <h> --format jpeg --quality 80
//!   cargo run -- <x> <y> <w> <h> --image shot.png          Replay a saved screenshot
//!   cargo run -- <x> <y> <w> <h> --iterations 500

use std::sync::Arc;
use std::time::Instant;

use screen_grab_lib::capture::{ImageGrabber, MonitorGrabber};
use screen_grab_lib::{EncodeTarget, FrameGrabber, ScreenCapture};

struct Options {
    iterations: usize,
    target: EncodeTarget,
    quality: u8,
    image: Option<String>,
    rect: [i64; 4],
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("{}", e);
        eprintln!("Usage:");
        eprintln!("  capture-bench <x> <y> <width> <height> [--format jpeg|png] [--quality Q]");
        eprintln!("                [--iterations N] [--image <path>]");
        std::process::exit(1);
    });

    let grabber: Arc<dyn FrameGrabber> = match &options.image {
        Some(path) => match ImageGrabber::open(path) {
            Ok(grabber) => Arc::new(grabber),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => Arc::new(MonitorGrabber),
    };
    let encoder = options.target.encoder(options.quality).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let capture = ScreenCapture::new(grabber, encoder);

    let [x, y, width, height] = options.rect;
    let (x, y) = match (i32::try_from(x), i32::try_from(y)) {
        (Ok(x), Ok(y)) => (x, y),
        _ => {
            eprintln!("Origin out of range: {},{}", x, y);
            std::process::exit(1);
        }
    };

    println!("iteration,latency_ms,bytes");

    let mut latencies: Vec<f64> = Vec::with_capacity(options.iterations);
    for i in 0..options.iterations {
        let start = Instant::now();
        match capture.capture_screen_area(x, y, width, height) {
            Ok(image) => {
                let ms = start.elapsed().as_secs_f64() * 1000.0;
                println!("{},{:.2},{}", i, ms, image.buffer().len());
                latencies.push(ms);
            }
            Err(e) => {
                eprintln!("  WARNING: iteration {} failed: {} ({})", i, e, e.code());
            }
        }
    }

    if latencies.is_empty() {
        eprintln!("No successful iterations");
        std::process::exit(1);
    }

    latencies.sort_by(|a, b| a.total_cmp(b));
    let median = latencies[latencies.len() / 2];
    let p99_idx = ((latencies.len() as f64 * 0.99).ceil() as usize).min(latencies.len() - 1);
    let p99 = latencies[p99_idx];
    let avg: f64 = latencies.iter().sum::<f64>() / latencies.len() as f64;

    eprintln!("\n--- Benchmark Summary ---");
    eprintln!("  Format:           {}", options.target);
    eprintln!("  Region:           {}x{} at {},{}", width, height, x, y);
    eprintln!("  Iterations:       {}/{}", latencies.len(), options.iterations);
    eprintln!("  Median latency:   {:.2}ms", median);
    eprintln!("  Average latency:  {:.2}ms", avg);
    eprintln!("  P99 latency:      {:.2}ms", p99);
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        iterations: 100,
        target: EncodeTarget::Png,
        quality: 50,
        image: None,
        rect: [0; 4],
    };
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--iterations" => options.iterations = flag_value(&mut iter, arg)?,
            "--format" => options.target = flag_value(&mut iter, arg)?,
            "--quality" => options.quality = flag_value(&mut iter, arg)?,
            "--image" => options.image = Some(flag_value(&mut iter, arg)?),
            other => positional.push(
                other
                    .parse::<i64>()
                    .map_err(|_| format!("Not a number: {}", other))?,
            ),
        }
    }

    options.rect = positional
        .try_into()
        .map_err(|_| "Expected exactly four numbers: x y width height".to_string())?;
    Ok(options)
}

fn flag_value<'a, T: std::str::FromStr>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T, String> {
    let raw = iter.next().ok_or_else(|| format!("{} requires a value", flag))?;
    raw.parse()
        .map_err(|_| format!("Invalid value for {}: {}", flag, raw))
}
