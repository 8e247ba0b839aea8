// src/main.rs

use anyhow::{anyhow, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use wave_pyramid::source::{self, FileSource};
use wave_pyramid::waveform::{self, terminal, Resolution};
use wave_pyramid::{PyramidConfig, SharedPyramid, Viewport};

#[derive(Parser, Debug)]
#[command(name = "wave-pyramid", about = "Print one channel of an audio file at any zoom")]
struct Args {
    /// Audio file to read
    path: PathBuf,

    /// Channel to summarize
    #[arg(short, long, default_value_t = 0)]
    channel: usize,

    /// Ascending block sizes, e.g. 64,128,256
    #[arg(long, value_delimiter = ',')]
    factors: Option<Vec<usize>>,

    /// JSON config file (factors, width, height)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Samples per column
    #[arg(long, conflicts_with_all = ["percent", "select"])]
    zoom: Option<f64>,

    /// Share of the file to fit on screen
    #[arg(long, conflicts_with = "select")]
    percent: Option<f64>,

    /// Sample range to fit on screen, START:END
    #[arg(long, value_parser = parse_range)]
    select: Option<(u64, u64)>,

    /// First sample shown
    #[arg(long, default_value_t = 0)]
    offset: u64,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,
}

fn parse_range(s: &str) -> Result<(u64, u64), String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got {s:?}"))?;
    let start = a.trim().parse().map_err(|e| format!("bad start {a:?}: {e}"))?;
    let end = b.trim().parse().map_err(|e| format!("bad end {b:?}: {e}"))?;
    Ok((start, end))
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80)
}

fn format_time(samples: u64, sample_rate: u32) -> String {
    let secs = samples as f64 / sample_rate.max(1) as f64;
    format!("{}:{:05.2}", (secs / 60.0) as u64, secs % 60.0)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(p) => PyramidConfig::load(p)?,
        None => PyramidConfig::default(),
    };
    if let Some(f) = &args.factors {
        config.factors = f.clone();
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    let width = args.width.or(config.width).unwrap_or_else(terminal_width);

    let pyramid = config.build()?;
    let source = FileSource::open(&args.path, args.channel)?;
    let meta = source.info();
    let length = meta
        .duration_secs()
        .map(|secs| format!("{secs:.2}s"))
        .unwrap_or_else(|| "unknown length".to_string());
    info!(
        "{}: {} Hz, {} channel(s), {length}, reading channel {}",
        args.path.display(),
        meta.sample_rate,
        meta.channels,
        args.channel
    );

    let shared = SharedPyramid::new(pyramid);
    let total = shared
        .spawn_ingest(source)
        .join()
        .map_err(|_| anyhow!("ingest thread panicked"))?;

    let view = if let Some((start, end)) = args.select {
        Viewport::from_selection(start, end, width)
    } else if let Some(p) = args.percent {
        let mut v = Viewport::from_percent(p, total, width);
        v.scroll_to(args.offset);
        v
    } else if let Some(z) = args.zoom {
        Viewport::new(args.offset, z, width)
    } else {
        let mut v = Viewport::from_percent(100.0, total, width);
        v.scroll_to(args.offset);
        v
    };

    let (columns, resolution) = shared.with_pyramid(|p| {
        waveform::columns_for_view(p, &view, |offset, count| {
            source::read_window(&args.path, args.channel, offset, count)
        })
    })?;

    for line in terminal::render_ascii(&columns, config.height) {
        println!("{line}");
    }

    let from = format_time(view.offset(), meta.sample_rate);
    let to = format_time(view.offset() + view.window_len() as u64, meta.sample_rate);
    let tier = match resolution {
        Resolution::Level { level, absolute_factor } => {
            format!("level {} (x{absolute_factor})", level.0)
        }
        Resolution::Raw => "raw samples".to_string(),
    };
    println!(
        "{from} - {to} | {:.1} samples/col ({:.3}%) | {tier} | {} of {} columns",
        view.zoom(),
        view.percent_of(total),
        columns.len(),
        view.width()
    );
    shared.with_pyramid(|p| {
        for level in p.levels() {
            println!(
                "  x{:<6} {:>10} entries",
                level.absolute_factor(),
                level.values().len()
            );
        }
    });

    Ok(())
}
